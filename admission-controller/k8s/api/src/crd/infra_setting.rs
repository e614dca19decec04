use crate::Status;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Cluster-wide infrastructure placement settings for virtual services.
#[derive(Clone, Debug, Default, PartialEq, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "ako.vmware.com",
    version = "v1alpha1",
    derive = "PartialEq",
    kind = "AviInfraSetting",
    status = "Status"
)]
#[serde(default, rename_all = "camelCase")]
pub struct AviInfraSettingSpec {
    pub se_group: SeGroup,
    pub network: Network,
    pub l7_settings: L7Settings,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(default)]
pub struct SeGroup {
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct Network {
    pub vip_networks: Vec<VipNetwork>,
    pub node_networks: Vec<NodeNetwork>,
    pub enable_rhi: Option<bool>,
    pub bgp_peer_labels: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct VipNetwork {
    pub network_name: String,
    pub cidr: String,
    #[serde(rename = "v6cidr")]
    pub v6_cidr: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeNetwork {
    pub network_name: String,
    pub cidrs: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct L7Settings {
    pub shard_size: String,
}

impl Network {
    /// Route health injection is enabled only when explicitly requested.
    pub fn rhi_enabled(&self) -> bool {
        self.enable_rhi == Some(true)
    }
}
