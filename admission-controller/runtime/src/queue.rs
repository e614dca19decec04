//! A fixed set of ordered, rate-limited work queues.
//!
//! Keys are routed to a shard by a stable hash of their namespace, so all
//! keys of a namespace are processed in order by a single worker while
//! different namespaces proceed independently.
//!
//! Each shard follows the usual controller work queue semantics: a key that
//! is already pending is coalesced, and a key added while it is being
//! processed is delivered once more after processing completes.

use crate::metrics::QueueMetrics;
use ahash::{AHashMap as HashMap, AHashSet as HashSet};
use lb_admission_core::ReconcileKey;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tokio::{
    sync::Notify,
    time::{self, Duration, Instant},
};

pub struct ShardedQueue {
    shards: Vec<Arc<Shard>>,
    gate: SyncGate,
}

/// Pauses admission without tearing down the queues.
///
/// Checked before every validation and every enqueue.
#[derive(Clone, Debug, Default)]
pub struct SyncGate(Arc<AtomicBool>);

pub struct Shard {
    index: usize,
    state: Mutex<State>,
    limiter: Mutex<RateLimiter>,
    notify: Notify,
    metrics: QueueMetrics,
}

/// Combines per-key exponential backoff with an overall token bucket; the
/// effective delay is the larger of the two.
#[derive(Debug)]
pub struct RateLimiter {
    base: Duration,
    max: Duration,
    failures: HashMap<ReconcileKey, u32>,
    bucket: TokenBucket,
}

#[derive(Debug, Default)]
struct State {
    queue: VecDeque<ReconcileKey>,
    dirty: HashSet<ReconcileKey>,
    processing: HashSet<ReconcileKey>,
    waiting: HashSet<ReconcileKey>,
    shutting_down: bool,
}

#[derive(Debug)]
struct TokenBucket {
    rate: f64,
    burst: f64,
    tokens: f64,
    last: Option<Instant>,
}

/// Maps a namespace onto one of `count` shards.
pub fn shard_for(namespace: &str, count: usize) -> usize {
    let hash = Sha256::digest(namespace.as_bytes());
    let mut prefix = [0u8; 4];
    prefix.copy_from_slice(&hash[..4]);
    u32::from_le_bytes(prefix) as usize % count.max(1)
}

// === impl ShardedQueue ===

impl ShardedQueue {
    pub fn new(count: usize, gate: SyncGate, metrics: QueueMetrics) -> Self {
        let shards = (0..count.max(1))
            .map(|index| Arc::new(Shard::new(index, metrics.clone())))
            .collect();
        Self { shards, gate }
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    pub fn shards(&self) -> &[Arc<Shard>] {
        &self.shards
    }

    pub fn gate(&self) -> &SyncGate {
        &self.gate
    }

    /// Routes `key` to its namespace's shard. Returns false if admission is
    /// suspended.
    pub fn add(&self, key: ReconcileKey) -> bool {
        let index = shard_for(key.namespace(), self.shards.len());
        self.enqueue(index, key)
    }

    pub fn enqueue(&self, index: usize, key: ReconcileKey) -> bool {
        if self.gate.is_suspended() {
            tracing::debug!(%key, "Sync suspended; not enqueueing");
            return false;
        }
        let Some(shard) = self.shards.get(index) else {
            tracing::error!(%key, index, "No such shard");
            return false;
        };
        tracing::debug!(%key, shard = index, "Enqueueing");
        shard.add_rate_limited(key);
        true
    }

    pub fn shutdown(&self) {
        for shard in &self.shards {
            shard.shutdown();
        }
    }
}

// === impl SyncGate ===

impl SyncGate {
    pub fn suspend(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn resume(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_suspended(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

// === impl Shard ===

impl Shard {
    fn new(index: usize, metrics: QueueMetrics) -> Self {
        Self {
            index,
            state: Default::default(),
            limiter: Mutex::new(RateLimiter::default()),
            notify: Notify::new(),
            metrics,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Makes `key` available to the worker immediately.
    pub fn add(&self, key: ReconcileKey) {
        {
            let mut state = self.state.lock();
            if state.shutting_down || !state.dirty.insert(key.clone()) {
                return;
            }
            self.metrics.added(self.index);
            if state.processing.contains(&key) {
                // Redelivered by `done`.
                return;
            }
            state.queue.push_back(key);
            self.metrics.set_depth(self.index, state.queue.len());
        }
        self.notify.notify_one();
    }

    /// Adds `key` once the rate limiter permits it.
    pub fn add_rate_limited(self: &Arc<Self>, key: ReconcileKey) {
        let delay = self.limiter.lock().when(&key, Instant::now());
        if delay.is_zero() {
            self.add(key);
            return;
        }

        {
            let mut state = self.state.lock();
            if state.shutting_down || !state.waiting.insert(key.clone()) {
                return;
            }
        }
        tracing::trace!(%key, ?delay, "Delaying");
        let shard = self.clone();
        tokio::spawn(async move {
            time::sleep(delay).await;
            shard.state.lock().waiting.remove(&key);
            shard.add(key);
        });
    }

    /// Waits for the next key. Returns `None` once the shard is shut down and
    /// drained.
    pub async fn next(&self) -> Option<ReconcileKey> {
        loop {
            {
                let mut state = self.state.lock();
                if let Some(key) = state.queue.pop_front() {
                    state.dirty.remove(&key);
                    state.processing.insert(key.clone());
                    self.metrics.set_depth(self.index, state.queue.len());
                    return Some(key);
                }
                if state.shutting_down {
                    return None;
                }
            }
            self.notify.notified().await;
        }
    }

    /// Marks `key` as processed, redelivering it if it was added meanwhile.
    pub fn done(&self, key: &ReconcileKey) {
        let requeued = {
            let mut state = self.state.lock();
            state.processing.remove(key);
            if state.dirty.contains(key) {
                state.queue.push_back(key.clone());
                self.metrics.set_depth(self.index, state.queue.len());
                true
            } else {
                false
            }
        };
        if requeued {
            self.notify.notify_one();
        }
    }

    /// Clears the key's backoff.
    pub fn forget(&self, key: &ReconcileKey) {
        self.limiter.lock().forget(key);
    }

    pub fn retries(&self, key: &ReconcileKey) -> u32 {
        self.limiter.lock().retries(key)
    }

    pub fn len(&self) -> usize {
        self.state.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().queue.is_empty()
    }

    pub fn shutdown(&self) {
        self.state.lock().shutting_down = true;
        self.notify.notify_waiters();
        self.notify.notify_one();
    }
}

// === impl RateLimiter ===

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(5),
            Duration::from_secs(1000),
            10.0,
            100,
        )
    }
}

impl RateLimiter {
    pub fn new(base: Duration, max: Duration, rate: f64, burst: u32) -> Self {
        Self {
            base,
            max,
            failures: HashMap::new(),
            bucket: TokenBucket {
                rate,
                burst: burst as f64,
                tokens: burst as f64,
                last: None,
            },
        }
    }

    /// Returns how long to wait before `key` may be added.
    pub fn when(&mut self, key: &ReconcileKey, now: Instant) -> Duration {
        let failures = self.failures.entry(key.clone()).or_default();
        let exp = (*failures).min(63);
        *failures = failures.saturating_add(1);
        let backoff = self.base.as_secs_f64() * 2f64.powi(exp as i32);
        let backoff = Duration::from_secs_f64(backoff.min(self.max.as_secs_f64()));

        backoff.max(self.bucket.reserve(now))
    }

    pub fn forget(&mut self, key: &ReconcileKey) {
        self.failures.remove(key);
    }

    pub fn retries(&self, key: &ReconcileKey) -> u32 {
        self.failures.get(key).copied().unwrap_or(0)
    }
}

// === impl TokenBucket ===

impl TokenBucket {
    /// Takes a token, returning how long the caller must wait for it.
    fn reserve(&mut self, now: Instant) -> Duration {
        if let Some(last) = self.last {
            let elapsed = now.saturating_duration_since(last).as_secs_f64();
            self.tokens = (self.tokens + elapsed * self.rate).min(self.burst);
        }
        self.last = Some(now);
        if self.rate <= 0.0 {
            return Duration::ZERO;
        }
        self.tokens -= 1.0;
        if self.tokens >= 0.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(-self.tokens / self.rate)
    }
}
