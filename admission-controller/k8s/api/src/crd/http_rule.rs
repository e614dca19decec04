use crate::Status;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Overrides pool properties for paths under an FQDN.
#[derive(Clone, Debug, Default, PartialEq, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "ako.vmware.com",
    version = "v1alpha1",
    derive = "PartialEq",
    kind = "HTTPRule",
    root = "HttpRule",
    status = "Status",
    namespaced
)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpRuleSpec {
    pub fqdn: String,
    pub paths: Vec<HttpRulePath>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpRulePath {
    pub target: String,
    pub load_balancer_policy: LoadBalancerPolicy,
    pub tls: PathTls,
    pub health_monitors: Vec<String>,
    pub application_persistence: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct LoadBalancerPolicy {
    pub algorithm: String,
    pub hash: String,
    pub host_header: String,
}

/// Re-encryption settings toward the backend pool.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct PathTls {
    #[serde(rename = "type")]
    pub kind: String,
    pub ssl_profile: String,
    #[serde(rename = "destinationCA")]
    pub destination_ca: String,
    pub pki_profile: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::Resource;

    #[test]
    fn resource_type() {
        assert_eq!(HttpRule::kind(&()), "HTTPRule");
        assert_eq!(HttpRule::group(&()), "ako.vmware.com");
        assert_eq!(HttpRule::plural(&()), "httprules");
    }

    #[test]
    fn parses_sparse_spec() {
        let rule: HttpRule = serde_json::from_value(serde_json::json!({
            "apiVersion": "ako.vmware.com/v1alpha1",
            "kind": "HTTPRule",
            "metadata": { "namespace": "default", "name": "rule" },
            "spec": {
                "fqdn": "foo.example.com",
                "paths": [{
                    "target": "/api",
                    "tls": { "type": "reencrypt", "destinationCA": "ca-pem" }
                }]
            }
        }))
        .unwrap();

        assert_eq!(rule.spec.fqdn, "foo.example.com");
        assert!(rule.status.is_none());
        let path = &rule.spec.paths[0];
        assert_eq!(path.tls.kind, "reencrypt");
        assert_eq!(path.tls.destination_ca, "ca-pem");
        assert!(path.health_monitors.is_empty());
    }
}
