//! Shared stores consulted and updated while admitting changes.
//!
//! Every store is constructed once at startup and handed to the admission
//! pipeline behind an [`Arc`]. Each store synchronizes internally, so callers
//! never hold a lock across an await point.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod cluster_info;
mod fqdn;
mod metrics;
mod namespace;
mod se_group;
mod version_cache;


pub use self::{
    cluster_info::{CloudType, ClusterInfo, ParseError, ServiceType},
    fqdn::{Claim, Conflict, FqdnIndex},
    metrics::IndexMetrics,
    namespace::{InvalidSelector, NamespaceFilter, NamespaceSelector},
    se_group::SeGroupLabelIndex,
    version_cache::ResourceVersionCache,
};
use std::sync::Arc;

/// The set of shared stores used by admission.
#[derive(Clone, Debug)]
pub struct Indexes {
    pub versions: Arc<ResourceVersionCache>,
    pub fqdns: Arc<FqdnIndex>,
    pub se_groups: Arc<SeGroupLabelIndex>,
    pub namespaces: Arc<NamespaceFilter>,
}

// === impl Indexes ===

impl Indexes {
    pub fn new(namespaces: NamespaceFilter) -> Self {
        Self {
            versions: Default::default(),
            fqdns: Default::default(),
            se_groups: Default::default(),
            namespaces: Arc::new(namespaces),
        }
    }
}

impl Default for Indexes {
    fn default() -> Self {
        Self::new(NamespaceFilter::default())
    }
}
