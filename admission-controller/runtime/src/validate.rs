//! Per-kind admission rules.
//!
//! Each kind's rules are expressed as a [`Validate`] implementation that
//! `bail!`s with the rejection reason on the first failed check. Reference
//! checks run against the control plane through the [`ReferenceResolver`].

mod host_rule;
mod http_rule;
mod infra_setting;
mod multi_cluster;

use crate::{
    index::{ClusterInfo, Indexes},
    resolver::ReferenceResolver,
    Resource,
};
use anyhow::{bail, Result};
use lb_admission_core::{ReconcileKey, ReferenceKind, SecretLookup, Verdict};
use std::sync::Arc;

/// Admits resources of every locally-validated kind.
#[derive(Clone)]
pub struct Validator {
    resolver: ReferenceResolver,
    secrets: Arc<dyn SecretLookup>,
    indexes: Indexes,
    cluster: Arc<ClusterInfo>,
}

#[async_trait::async_trait]
trait Validate<T> {
    async fn validate(&self, key: &ReconcileKey, spec: &T) -> Result<()>;
}

/// The named references carried by a spec, in the order they were found.
///
/// Blank names mean "not configured" and are never recorded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct References(Vec<(ReferenceKind, String)>);

// === impl Validator ===

impl Validator {
    pub fn new(
        resolver: ReferenceResolver,
        secrets: Arc<dyn SecretLookup>,
        indexes: Indexes,
        cluster: Arc<ClusterInfo>,
    ) -> Self {
        Self {
            resolver,
            secrets,
            indexes,
            cluster,
        }
    }

    /// Validates a resource, returning `None` for kinds that are admitted
    /// without local validation.
    pub async fn admit(&self, key: &ReconcileKey, resource: &Resource) -> Option<Verdict> {
        let res = match resource {
            Resource::HostRule(r) => self.validate(key, &r.spec).await,
            Resource::HttpRule(r) => self.validate(key, &r.spec).await,
            Resource::AviInfraSetting(r) => self.validate(key, &r.spec).await,
            Resource::MultiClusterIngress(r) => self.validate(key, &r.spec).await,
            Resource::ServiceImport(r) => self.validate(key, &r.spec).await,
            Resource::VirtualService(_) | Resource::DestinationRule(_) | Resource::Gateway(_) => {
                return None
            }
        };
        match res {
            Ok(()) => Some(Verdict::Accepted),
            Err(error) => Some(Verdict::rejected(error)),
        }
    }

    /// Resolves every reference, failing on the first that may not be used.
    async fn check_references(&self, key: &ReconcileKey, refs: &References) -> Result<()> {
        for (kind, name) in refs.iter() {
            let result = self.resolver.resolve(key, kind, name).await;
            if let Some(reason) = result.rejection() {
                bail!("{reason}");
            }
        }
        Ok(())
    }
}

// === impl References ===

impl References {
    pub(crate) fn push(&mut self, kind: ReferenceKind, name: &str) {
        if name.is_empty() || self.0.iter().any(|(k, n)| *k == kind && n == name) {
            return;
        }
        self.0.push((kind, name.to_string()));
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (ReferenceKind, &str)> + '_ {
        self.0.iter().map(|(kind, name)| (*kind, name.as_str()))
    }
}
