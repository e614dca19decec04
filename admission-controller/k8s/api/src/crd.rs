pub mod host_rule;
pub mod http_rule;
pub mod infra_setting;
pub mod istio;
pub mod multi_cluster;

pub use self::{
    host_rule::{HostRule, HostRuleSpec},
    http_rule::{HttpRule, HttpRuleSpec},
    infra_setting::{AviInfraSetting, AviInfraSettingSpec},
    istio::{DestinationRule, Gateway, VirtualService},
    multi_cluster::{MultiClusterIngress, MultiClusterIngressSpec, ServiceImport, ServiceImportSpec},
};
