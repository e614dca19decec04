use crate::Status;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Binds an ingress hostname to services in several member clusters.
#[derive(Clone, Debug, Default, PartialEq, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "ako.vmware.com",
    version = "v1alpha1",
    derive = "PartialEq",
    kind = "MultiClusterIngress",
    status = "Status",
    namespaced
)]
#[serde(default, rename_all = "camelCase")]
pub struct MultiClusterIngressSpec {
    pub hostname: String,
    pub secret_name: String,
    pub config: Vec<BackendConfig>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct BackendConfig {
    pub path: String,
    pub cluster_context: String,
    pub weight: i32,
    pub service: ServiceRef,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(default)]
pub struct ServiceRef {
    pub name: String,
    pub port: i32,
}

/// Imports the endpoints of a service running in another cluster.
#[derive(Clone, Debug, Default, PartialEq, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "ako.vmware.com",
    version = "v1alpha1",
    derive = "PartialEq",
    kind = "ServiceImport",
    status = "Status",
    namespaced
)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceImportSpec {
    pub cluster: String,
    pub namespace: String,
    pub service: String,
    pub svc_ports: Vec<BackendPort>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(default)]
pub struct BackendPort {
    pub port: i32,
    pub endpoints: Vec<Endpoint>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(default)]
pub struct Endpoint {
    pub ip: String,
    pub port: i32,
}
