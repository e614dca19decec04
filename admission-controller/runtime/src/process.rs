use crate::queue::Shard;
use anyhow::Result;
use lb_admission_core::{ProcessKey, ReconcileKey};
use std::sync::Arc;

/// Drains a shard, handing keys to `processor` one at a time.
///
/// Successfully processed keys have their backoff cleared; failed keys are
/// re-added through the rate limiter.
pub async fn process_shard(shard: Arc<Shard>, processor: Arc<dyn ProcessKey>) {
    while let Some(key) = shard.next().await {
        match processor.process(&key).await {
            Ok(()) => shard.forget(&key),
            Err(error) => {
                tracing::warn!(%key, %error, retries = shard.retries(&key), "Failed to process; requeueing");
                shard.add_rate_limited(key.clone());
            }
        }
        shard.done(&key);
    }
    tracing::debug!(shard = shard.index(), "Shard shut down");
}

/// The default downstream stage: logs every admitted key.
#[derive(Copy, Clone, Debug, Default)]
pub struct LogProcessor;

#[async_trait::async_trait]
impl ProcessKey for LogProcessor {
    async fn process(&self, key: &ReconcileKey) -> Result<()> {
        tracing::info!(%key, "Processing");
        Ok(())
    }
}
