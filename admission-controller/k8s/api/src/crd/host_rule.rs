use crate::Status;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Overrides virtual service properties for a single FQDN.
#[derive(Clone, Debug, Default, PartialEq, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "ako.vmware.com",
    version = "v1alpha1",
    derive = "PartialEq",
    kind = "HostRule",
    status = "Status",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct HostRuleSpec {
    pub virtualhost: VirtualHost,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct VirtualHost {
    pub fqdn: String,
    pub fqdn_type: FqdnType,
    pub enable_virtual_host: Option<bool>,
    pub tls: Tls,
    pub http_policy: HttpPolicy,
    pub datascripts: Vec<String>,
    pub waf_policy: String,
    pub application_profile: String,
    pub analytics_profile: String,
    pub error_page_profile: String,
    pub gslb: Gslb,
    pub aliases: Vec<String>,
    pub tcp_settings: Option<TcpSettings>,
}

/// How the FQDN is matched against ingress hostnames.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum FqdnType {
    #[default]
    Exact,
    Wildcard,
    Contains,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct Tls {
    pub ssl_key_certificate: SslKeyCertificate,
    pub ssl_profile: String,
    pub termination: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct SslKeyCertificate {
    pub name: String,
    #[serde(rename = "type")]
    pub source: Option<CertificateSource>,
    pub alternate_certificate: AlternateCertificate,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(default)]
pub struct AlternateCertificate {
    pub name: String,
    #[serde(rename = "type")]
    pub source: Option<CertificateSource>,
}

/// Where a certificate is stored.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum CertificateSource {
    /// A certificate object on the load-balancer controller.
    #[serde(rename = "ref")]
    ControllerRef,
    /// A Kubernetes Secret in the HostRule's namespace.
    #[serde(rename = "secret")]
    Secret,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpPolicy {
    pub policy_sets: Vec<String>,
    pub overwrite: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct Gslb {
    pub fqdn: String,
    pub include_aliases: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct TcpSettings {
    pub listeners: Vec<Listener>,
    #[serde(rename = "loadBalancerIP")]
    pub load_balancer_ip: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct Listener {
    pub port: u16,
    #[serde(rename = "enableSSL")]
    pub enable_ssl: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sparse_spec() {
        let spec: HostRuleSpec = serde_json::from_value(serde_json::json!({
            "virtualhost": {
                "fqdn": "foo.example.com",
                "tls": {
                    "sslKeyCertificate": { "name": "cert", "type": "secret" }
                },
                "tcpSettings": {
                    "listeners": [{ "port": 443, "enableSSL": true }],
                    "loadBalancerIP": "10.1.1.1"
                }
            }
        }))
        .unwrap();

        let vh = spec.virtualhost;
        assert_eq!(vh.fqdn, "foo.example.com");
        assert_eq!(vh.fqdn_type, FqdnType::Exact);
        assert_eq!(
            vh.tls.ssl_key_certificate.source,
            Some(CertificateSource::Secret)
        );
        let tcp = vh.tcp_settings.expect("tcp settings must be parsed");
        assert_eq!(tcp.load_balancer_ip, "10.1.1.1");
        assert!(tcp.listeners[0].enable_ssl);
        assert!(vh.aliases.is_empty());
    }
}
