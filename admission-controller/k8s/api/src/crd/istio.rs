//! Mesh-routing resources.
//!
//! These kinds are validated by the mesh's own admission webhook, so only the
//! fields needed to detect spec changes are modeled. Their schemas are owned
//! by the mesh installation.

use kube::CustomResource;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, CustomResource, Deserialize, Serialize)]
#[kube(
    group = "networking.istio.io",
    version = "v1alpha3",
    derive = "PartialEq",
    kind = "VirtualService",
    schema = "disabled",
    namespaced
)]
#[serde(default, rename_all = "camelCase")]
pub struct VirtualServiceSpec {
    pub hosts: Vec<String>,
    pub gateways: Vec<String>,
    pub http: Vec<Value>,
    pub tls: Vec<Value>,
    pub tcp: Vec<Value>,
    pub export_to: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, CustomResource, Deserialize, Serialize)]
#[kube(
    group = "networking.istio.io",
    version = "v1alpha3",
    derive = "PartialEq",
    kind = "DestinationRule",
    schema = "disabled",
    namespaced
)]
#[serde(default, rename_all = "camelCase")]
pub struct DestinationRuleSpec {
    pub host: String,
    pub traffic_policy: Option<Value>,
    pub subsets: Vec<Value>,
    pub export_to: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, CustomResource, Deserialize, Serialize)]
#[kube(
    group = "networking.istio.io",
    version = "v1alpha3",
    derive = "PartialEq",
    kind = "Gateway",
    schema = "disabled",
    namespaced
)]
#[serde(default, rename_all = "camelCase")]
pub struct GatewaySpec {
    pub selector: BTreeMap<String, String>,
    pub servers: Vec<Value>,
}
