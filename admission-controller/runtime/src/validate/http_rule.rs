use super::{References, Validate, Validator};
use crate::k8s::crd::http_rule::HttpRuleSpec;
use anyhow::{bail, Result};
use lb_admission_core::{ReconcileKey, ReferenceKind};

#[async_trait::async_trait]
impl Validate<HttpRuleSpec> for Validator {
    async fn validate(&self, key: &ReconcileKey, spec: &HttpRuleSpec) -> Result<()> {
        let mut refs = References::default();
        for path in &spec.paths {
            // Trust material for re-encryption comes from one source only.
            if !path.tls.pki_profile.is_empty() && !path.tls.destination_ca.is_empty() {
                bail!("pkiProfile and destinationCA cannot both be set for path {}", path.target);
            }
            refs.push(ReferenceKind::SslProfile, &path.tls.ssl_profile);
            refs.push(
                ReferenceKind::ApplicationPersistence,
                &path.application_persistence,
            );
            refs.push(ReferenceKind::PkiProfile, &path.tls.pki_profile);
            for monitor in &path.health_monitors {
                refs.push(ReferenceKind::HealthMonitor, monitor);
            }
        }

        self.check_references(key, &refs).await
    }
}
