use lb_admission_core::Kind;
use prometheus_client::{
    encoding::EncodeLabelSet,
    metrics::{counter::Counter, family::Family},
    registry::Registry,
};

#[derive(Clone, Debug, Default)]
pub struct StatusMetrics {
    writes: Family<KindLabels, Counter>,
    skips: Family<KindLabels, Counter>,
    failures: Family<KindLabels, Counter>,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct KindLabels {
    kind: String,
}

// === impl StatusMetrics ===

impl StatusMetrics {
    pub fn register(prom: &mut Registry) -> Self {
        let writes = Family::default();
        prom.register(
            "status_writes",
            "Count of admission verdicts written to resource status",
            writes.clone(),
        );

        let skips = Family::default();
        prom.register(
            "status_write_skips",
            "Count of status writes skipped because the status already reflected the verdict",
            skips.clone(),
        );

        let failures = Family::default();
        prom.register(
            "status_write_failures",
            "Count of status writes that failed",
            failures.clone(),
        );

        Self {
            writes,
            skips,
            failures,
        }
    }

    pub(crate) fn written(&self, kind: Kind) {
        self.writes.get_or_create(&KindLabels::new(kind)).inc();
    }

    pub(crate) fn skipped(&self, kind: Kind) {
        self.skips.get_or_create(&KindLabels::new(kind)).inc();
    }

    pub(crate) fn failed(&self, kind: Kind) {
        self.failures.get_or_create(&KindLabels::new(kind)).inc();
    }
}

impl KindLabels {
    fn new(kind: Kind) -> Self {
        Self {
            kind: kind.to_string(),
        }
    }
}
