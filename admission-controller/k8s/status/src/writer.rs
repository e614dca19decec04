use crate::StatusMetrics;
use ahash::AHashMap as HashMap;
use lb_admission_core::{ReconcileKey, Status, StatusSink, Verdict};
use parking_lot::Mutex;
use std::sync::Arc;

/// Persists admission verdicts onto resource status, idempotently.
///
/// A write is skipped when the observed status already reflects the verdict.
/// The writer also remembers the last status it wrote for each key along with
/// the resource version the verdict was computed from: re-deliveries of that
/// same version (which still carry the pre-write status) do not cause a
/// second write.
pub struct StatusWriter {
    sink: Arc<dyn StatusSink>,
    written: Mutex<HashMap<ReconcileKey, Written>>,
    metrics: StatusMetrics,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Unchanged,
    Failed,
}

#[derive(Debug)]
struct Written {
    resource_version: String,
    status: Status,
}

// === impl StatusWriter ===

impl StatusWriter {
    pub fn new(sink: Arc<dyn StatusSink>, metrics: StatusMetrics) -> Self {
        Self {
            sink,
            written: Default::default(),
            metrics,
        }
    }

    pub async fn write(
        &self,
        key: &ReconcileKey,
        resource_version: &str,
        observed: &Status,
        verdict: &Verdict,
    ) -> WriteOutcome {
        let status = verdict.to_status();
        if *observed == status || self.already_written(key, resource_version, &status) {
            tracing::debug!(%key, status = %status.status, "Status unchanged");
            self.metrics.skipped(key.kind);
            return WriteOutcome::Unchanged;
        }

        match self.sink.update_status(key, &status).await {
            Ok(()) => {
                tracing::info!(%key, status = %status.status, reason = %status.error, "Updated status");
                self.metrics.written(key.kind);
                self.written.lock().insert(
                    key.clone(),
                    Written {
                        resource_version: resource_version.to_string(),
                        status,
                    },
                );
                WriteOutcome::Written
            }
            Err(error) => {
                tracing::warn!(%key, %error, "Failed to update status");
                self.metrics.failed(key.kind);
                WriteOutcome::Failed
            }
        }
    }

    /// Forgets what was written for a deleted resource.
    pub fn forget(&self, key: &ReconcileKey) {
        self.written.lock().remove(key);
    }

    fn already_written(&self, key: &ReconcileKey, resource_version: &str, status: &Status) -> bool {
        self.written
            .lock()
            .get(key)
            .map(|w| w.resource_version == resource_version && w.status == *status)
            .unwrap_or(false)
    }
}
