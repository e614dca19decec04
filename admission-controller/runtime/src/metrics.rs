use lb_admission_core::{Kind, Verdict};
use prometheus_client::{
    encoding::EncodeLabelSet,
    metrics::{counter::Counter, family::Family, gauge::Gauge},
    registry::Registry,
};

#[derive(Clone, Debug, Default)]
pub struct AdmissionMetrics {
    events: Family<EventLabels, Counter>,
    verdicts: Family<VerdictLabels, Counter>,
}

#[derive(Clone, Debug, Default)]
pub struct QueueMetrics {
    adds: Family<ShardLabels, Counter>,
    depth: Family<ShardLabels, Gauge>,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct EventLabels {
    kind: String,
    op: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct VerdictLabels {
    kind: String,
    verdict: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct ShardLabels {
    shard: String,
}

// === impl AdmissionMetrics ===

impl AdmissionMetrics {
    pub fn register(prom: &mut Registry) -> Self {
        let events = Family::default();
        prom.register(
            "events",
            "Count of watch events received per kind and operation",
            events.clone(),
        );

        let verdicts = Family::default();
        prom.register(
            "verdicts",
            "Count of admission verdicts per kind",
            verdicts.clone(),
        );

        Self { events, verdicts }
    }

    pub(crate) fn event(&self, kind: Kind, op: &str) {
        self.events
            .get_or_create(&EventLabels {
                kind: kind.to_string(),
                op: op.to_string(),
            })
            .inc();
    }

    pub(crate) fn verdict(&self, kind: Kind, verdict: &Verdict) {
        let verdict = match verdict {
            Verdict::Accepted => "accepted",
            Verdict::Rejected(_) => "rejected",
        };
        self.verdicts
            .get_or_create(&VerdictLabels {
                kind: kind.to_string(),
                verdict: verdict.to_string(),
            })
            .inc();
    }
}

// === impl QueueMetrics ===

impl QueueMetrics {
    pub fn register(prom: &mut Registry) -> Self {
        let adds = Family::default();
        prom.register("queue_adds", "Count of keys added to each shard", adds.clone());

        let depth = Family::default();
        prom.register(
            "queue_depth",
            "Gauge of keys waiting in each shard",
            depth.clone(),
        );

        Self { adds, depth }
    }

    pub(crate) fn added(&self, shard: usize) {
        self.adds.get_or_create(&ShardLabels::new(shard)).inc();
    }

    pub(crate) fn set_depth(&self, shard: usize, depth: usize) {
        self.depth
            .get_or_create(&ShardLabels::new(shard))
            .set(depth as i64);
    }
}

impl ShardLabels {
    fn new(shard: usize) -> Self {
        Self {
            shard: shard.to_string(),
        }
    }
}
