use crate::Indexes;
use prometheus_client::{
    encoding::EncodeLabelSet,
    metrics::{family::Family, gauge::Gauge},
    registry::Registry,
};

#[derive(Clone, Debug, Default)]
pub struct IndexMetrics {
    index_size: Family<IndexLabels, Gauge>,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct IndexLabels {
    index: String,
}

// === impl IndexMetrics ===

impl IndexMetrics {
    pub fn register(prom: &mut Registry) -> Self {
        let index_size = Family::default();
        prom.register(
            "index_size",
            "Gauge of the number of entries in each admission index",
            index_size.clone(),
        );
        Self { index_size }
    }

    /// Samples the current size of every index.
    pub fn observe(&self, indexes: &Indexes) {
        self.set("fqdn", indexes.fqdns.fqdn_count());
        self.set("alias", indexes.fqdns.alias_count());
        self.set("se_group", indexes.se_groups.len());
        self.set("resource_version", indexes.versions.len());
    }

    fn set(&self, index: &str, size: usize) {
        self.index_size
            .get_or_create(&IndexLabels {
                index: index.to_string(),
            })
            .set(size as i64);
    }
}
