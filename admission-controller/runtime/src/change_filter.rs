use crate::Resource;

/// Decides whether an update carries a change worth admitting.
///
/// A re-delivery of the same resource version is never significant. Beyond
/// that, kinds with local validation compare fingerprints over the spec and
/// admission state; every status write bumps the resource version, so
/// comparing versions alone would re-admit the controller's own writes
/// forever. Mesh kinds never receive a status from us and compare specs only.
pub fn is_significant(previous: &Resource, current: &Resource) -> bool {
    if previous.resource_version() == current.resource_version() {
        return false;
    }
    if current.kind().is_mesh() {
        return !previous.spec_eq(current);
    }
    previous.fingerprint() != current.fingerprint()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::k8s::{
        crd::{host_rule::VirtualHost, istio::GatewaySpec, HostRuleSpec},
        Gateway, HostRule, ObjectMeta, State, Status,
    };
    use maplit::btreemap;

    fn meta(version: &str) -> ObjectMeta {
        ObjectMeta {
            namespace: Some("default".to_string()),
            name: Some("obj".to_string()),
            resource_version: Some(version.to_string()),
            ..Default::default()
        }
    }

    fn hostrule(version: &str, fqdn: &str, status: Option<Status>) -> Resource {
        Resource::HostRule(HostRule {
            metadata: meta(version),
            spec: HostRuleSpec {
                virtualhost: VirtualHost {
                    fqdn: fqdn.to_string(),
                    ..Default::default()
                },
            },
            status,
        })
    }

    #[test]
    fn same_version_is_not_significant() {
        let a = hostrule("1", "a.example.com", None);
        let b = hostrule("1", "b.example.com", None);
        assert!(!is_significant(&a, &b));
    }

    #[test]
    fn reason_only_updates_are_not_significant() {
        let a = hostrule("1", "a.example.com", Some(Status::rejected("one")));
        let b = hostrule("2", "a.example.com", Some(Status::rejected("two")));
        assert!(!is_significant(&a, &b));
    }

    #[test]
    fn state_flips_and_spec_edits_are_significant() {
        let pending = hostrule("1", "a.example.com", None);
        let accepted = hostrule("2", "a.example.com", Some(Status::accepted()));
        assert_eq!(accepted.status().status, State::Accepted);
        assert!(is_significant(&pending, &accepted));

        let edited = hostrule("3", "b.example.com", Some(Status::accepted()));
        assert!(is_significant(&accepted, &edited));
    }

    #[test]
    fn mesh_kinds_compare_specs() {
        let gateway = |version: &str, app: &str| {
            Resource::Gateway(Gateway {
                metadata: meta(version),
                spec: GatewaySpec {
                    selector: btreemap! { "app".to_string() => app.to_string() },
                    servers: vec![],
                },
            })
        };
        assert!(!is_significant(&gateway("1", "a"), &gateway("2", "a")));
        assert!(is_significant(&gateway("2", "a"), &gateway("3", "b")));
    }
}
