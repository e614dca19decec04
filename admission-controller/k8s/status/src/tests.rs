use super::{sink::make_patch, *};
use lb_admission_core::{Kind, ReconcileKey, Status, StatusSink, Verdict};
use lb_admission_k8s_api as k8s;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::Arc;

#[derive(Default)]
struct RecordingSink {
    calls: Mutex<Vec<(ReconcileKey, Status)>>,
    fail: bool,
}

#[async_trait::async_trait]
impl StatusSink for RecordingSink {
    async fn update_status(&self, key: &ReconcileKey, status: &Status) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("connection refused");
        }
        self.calls.lock().push((key.clone(), status.clone()));
        Ok(())
    }
}

fn writer(sink: &Arc<RecordingSink>) -> StatusWriter {
    StatusWriter::new(sink.clone(), StatusMetrics::default())
}

fn key() -> ReconcileKey {
    ReconcileKey::new(Kind::HostRule, "default", "hr")
}

#[tokio::test]
async fn writes_new_verdicts() {
    let sink = Arc::new(RecordingSink::default());
    let writer = writer(&sink);

    let outcome = writer
        .write(&key(), "1", &Status::default(), &Verdict::Accepted)
        .await;
    assert_eq!(outcome, WriteOutcome::Written);
    assert_eq!(*sink.calls.lock(), vec![(key(), Status::accepted())]);
}

#[tokio::test]
async fn skips_when_observed_status_matches() {
    let sink = Arc::new(RecordingSink::default());
    let writer = writer(&sink);

    let outcome = writer
        .write(&key(), "1", &Status::accepted(), &Verdict::Accepted)
        .await;
    assert_eq!(outcome, WriteOutcome::Unchanged);

    let outcome = writer
        .write(
            &key(),
            "1",
            &Status::rejected("Aliases must be unique"),
            &Verdict::rejected("Aliases must be unique"),
        )
        .await;
    assert_eq!(outcome, WriteOutcome::Unchanged);
    assert!(sink.calls.lock().is_empty());
}

#[tokio::test]
async fn rewrites_when_reason_changes() {
    let sink = Arc::new(RecordingSink::default());
    let writer = writer(&sink);

    let outcome = writer
        .write(
            &key(),
            "1",
            &Status::rejected("Aliases must be unique"),
            &Verdict::rejected("Aliases must not contain GSLB FQDN"),
        )
        .await;
    assert_eq!(outcome, WriteOutcome::Written);
}

#[tokio::test]
async fn stale_redelivery_does_not_write_twice() {
    let sink = Arc::new(RecordingSink::default());
    let writer = writer(&sink);

    for _ in 0..2 {
        writer
            .write(&key(), "1", &Status::default(), &Verdict::Accepted)
            .await;
    }
    assert_eq!(sink.calls.lock().len(), 1);

    // A later version whose status was reset externally is written again.
    let outcome = writer
        .write(&key(), "2", &Status::default(), &Verdict::Accepted)
        .await;
    assert_eq!(outcome, WriteOutcome::Written);

    writer.forget(&key());
    let outcome = writer
        .write(&key(), "2", &Status::default(), &Verdict::Accepted)
        .await;
    assert_eq!(outcome, WriteOutcome::Written);
}

#[tokio::test]
async fn failures_are_not_remembered() {
    let sink = Arc::new(RecordingSink {
        fail: true,
        ..Default::default()
    });
    let writer = writer(&sink);

    let outcome = writer
        .write(&key(), "1", &Status::default(), &Verdict::Accepted)
        .await;
    assert_eq!(outcome, WriteOutcome::Failed);
    let outcome = writer
        .write(&key(), "1", &Status::default(), &Verdict::Accepted)
        .await;
    assert_eq!(outcome, WriteOutcome::Failed);
}

#[test]
fn status_patch_shape() {
    let patch = make_patch(&Status::rejected("config must not be empty"));
    assert_eq!(
        patch,
        k8s::Patch::Merge(serde_json::json!({
            "status": {
                "status": "Rejected",
                "error": "config must not be empty",
            }
        }))
    );
}
