use super::{References, Validate, Validator};
use crate::{
    index::Claim,
    k8s::crd::host_rule::{CertificateSource, FqdnType, HostRuleSpec, VirtualHost},
};
use ahash::AHashSet as HashSet;
use anyhow::{bail, Result};
use lb_admission_core::{ReconcileKey, ReferenceKind};
use std::net::IpAddr;

#[async_trait::async_trait]
impl Validate<HostRuleSpec> for Validator {
    async fn validate(&self, key: &ReconcileKey, spec: &HostRuleSpec) -> Result<()> {
        let vh = &spec.virtualhost;
        self.indexes.fqdns.check_fqdn(&key.id, &vh.fqdn)?;

        if let Some(tcp) = vh.tcp_settings.as_ref() {
            let ip = &tcp.load_balancer_ip;
            if !ip.is_empty() && ip.parse::<IpAddr>().is_err() {
                bail!("loadBalancerIP {ip} is not a valid IP");
            }
        }

        if !vh.gslb.fqdn.is_empty() && vh.gslb.fqdn == vh.fqdn {
            bail!("GSLB FQDN and local FQDN are same");
        }

        // A parent virtual service must be secure to host derived services.
        if let Some(tcp) = vh.tcp_settings.as_ref() {
            if !tcp.listeners.is_empty() && !tcp.listeners.iter().any(|l| l.enable_ssl) {
                bail!("Hosting parent virtualservice must have SSL enabled");
            }
        }

        validate_aliases(vh)?;
        self.indexes.fqdns.check_aliases(&key.id, &vh.aliases)?;

        let mut refs = References::default();
        refs.push(ReferenceKind::WafPolicy, &vh.waf_policy);
        refs.push(ReferenceKind::AppProfile, &vh.application_profile);
        refs.push(ReferenceKind::SslProfile, &vh.tls.ssl_profile);
        refs.push(ReferenceKind::AnalyticsProfile, &vh.analytics_profile);
        refs.push(ReferenceKind::ErrorPageProfile, &vh.error_page_profile);

        let cert = &vh.tls.ssl_key_certificate;
        let alternate = &cert.alternate_certificate;
        for (name, source) in [(&cert.name, cert.source), (&alternate.name, alternate.source)] {
            match source {
                Some(CertificateSource::ControllerRef) => {
                    refs.push(ReferenceKind::SslKeyCert, name);
                }
                Some(CertificateSource::Secret) if !name.is_empty() => {
                    self.secrets.ensure_exists(key.namespace(), name).await?;
                }
                _ => {}
            }
        }

        for policy in &vh.http_policy.policy_sets {
            refs.push(ReferenceKind::HttpPolicySet, policy);
        }
        for script in &vh.datascripts {
            refs.push(ReferenceKind::VsDatascript, script);
        }

        self.check_references(key, &refs).await?;

        // Names are claimed only once everything else has passed. The claim
        // re-checks for conflicts so that concurrent admissions cannot both
        // take the same name.
        self.indexes.fqdns.claim(
            &key.id,
            Claim {
                fqdn: vh.fqdn.clone(),
                aliases: vh.aliases.clone(),
            },
        )?;
        Ok(())
    }
}

fn validate_aliases(vh: &VirtualHost) -> Result<()> {
    if vh.aliases.is_empty() {
        return Ok(());
    }
    if vh.fqdn_type != FqdnType::Exact {
        bail!("Aliases is supported only when FQDN type is set as Exact");
    }
    if vh.aliases.contains(&vh.fqdn) {
        bail!("Duplicate entry found. Aliases field has same entry as the FQDN field");
    }
    let mut seen = HashSet::with_capacity(vh.aliases.len());
    if !vh.aliases.iter().all(|a| seen.insert(a.as_str())) {
        bail!("Aliases must be unique");
    }
    if !vh.gslb.fqdn.is_empty() && vh.aliases.contains(&vh.gslb.fqdn) {
        bail!("Aliases must not contain GSLB FQDN");
    }
    Ok(())
}
