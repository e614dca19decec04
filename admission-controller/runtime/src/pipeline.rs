use crate::{
    change_filter,
    index::{IndexMetrics, Indexes},
    k8s::{self, watcher, Informer, ResourceExt, WatchEvent},
    metrics::AdmissionMetrics,
    queue::ShardedQueue,
    status::StatusWriter,
    validate::Validator,
    Resource,
};
use ahash::AHashMap as HashMap;
use futures::prelude::*;
use lb_admission_core::{Kind, ReconcileKey, Verdict};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Filters, validates and enqueues watch events.
pub struct Pipeline {
    validator: Validator,
    writer: StatusWriter,
    queue: Arc<ShardedQueue>,
    indexes: Indexes,
    metrics: AdmissionMetrics,
    index_metrics: IndexMetrics,
    /// The latest state of namespace-filtered objects, by namespace, so that
    /// they can be admitted once their namespace is.
    held: Mutex<HashMap<String, HashMap<ReconcileKey, Resource>>>,
}

// === impl Pipeline ===

impl Pipeline {
    pub fn new(
        validator: Validator,
        writer: StatusWriter,
        queue: Arc<ShardedQueue>,
        indexes: Indexes,
        metrics: AdmissionMetrics,
        index_metrics: IndexMetrics,
    ) -> Self {
        Self {
            validator,
            writer,
            queue,
            indexes,
            metrics,
            index_metrics,
            held: Mutex::new(HashMap::new()),
        }
    }

    pub async fn handle(&self, event: WatchEvent<Resource>) {
        let op = match &event {
            WatchEvent::Add(_) => "add",
            WatchEvent::Update { .. } => "update",
            WatchEvent::Delete(_) => "delete",
        };
        let resource = event.object();
        let kind = resource.kind();
        let Some(key) = resource.key() else {
            let meta = resource.metadata();
            tracing::error!(
                %kind,
                namespace = ?meta.namespace,
                name = ?meta.name,
                "Dropping event for an object without a namespace or name",
            );
            return;
        };
        self.metrics.event(kind, op);

        if kind.is_namespace_filtered() {
            self.hold(&key, &event);
            if !self.indexes.namespaces.admits(key.namespace()) {
                tracing::debug!(%key, "Namespace is not admitted");
                return;
            }
        }

        match event {
            WatchEvent::Add(resource) => {
                tracing::debug!(%key, version = %resource.resource_version(), "ADD");
                if kind.is_mesh()
                    && self
                        .indexes
                        .versions
                        .is_current(&key, resource.resource_version())
                {
                    tracing::debug!(%key, "Version unchanged");
                    return;
                }
                self.admit(key, resource).await;
            }

            WatchEvent::Update { previous, current } => {
                tracing::debug!(%key, version = %current.resource_version(), "UPDATE");
                if !change_filter::is_significant(&previous, &current) {
                    tracing::trace!(%key, "Insignificant update");
                    return;
                }
                self.admit(key, current).await;
            }

            WatchEvent::Delete(_) => {
                tracing::debug!(%key, "DELETE");
                self.delete(key);
            }
        }

        self.index_metrics.observe(&self.indexes);
    }

    /// Admits the namespace-filtered objects already seen in a namespace.
    pub async fn readmit_namespace(&self, namespace: &str) {
        if !self.indexes.namespaces.admits(namespace) {
            return;
        }
        let held = self
            .held
            .lock()
            .get(namespace)
            .map(|objects| {
                objects
                    .iter()
                    .map(|(k, r)| (k.clone(), r.clone()))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        for (key, resource) in held {
            tracing::debug!(%key, "Namespace admitted");
            self.admit(key, resource).await;
        }
        self.index_metrics.observe(&self.indexes);
    }

    fn hold(&self, key: &ReconcileKey, event: &WatchEvent<Resource>) {
        let mut held = self.held.lock();
        match event {
            WatchEvent::Add(resource) | WatchEvent::Update { current: resource, .. } => {
                held.entry(key.namespace().to_string())
                    .or_default()
                    .insert(key.clone(), resource.clone());
            }
            WatchEvent::Delete(_) => {
                if let Some(objects) = held.get_mut(key.namespace()) {
                    objects.remove(key);
                    if objects.is_empty() {
                        held.remove(key.namespace());
                    }
                }
            }
        }
    }

    async fn admit(&self, key: ReconcileKey, resource: Resource) {
        if self.queue.gate().is_suspended() {
            tracing::debug!(%key, "Sync suspended; skipping admission");
            return;
        }

        let version = resource.resource_version();
        self.indexes.versions.put(key.clone(), version);

        if let Some(verdict) = self.validator.admit(&key, &resource).await {
            self.metrics.verdict(key.kind, &verdict);
            match &verdict {
                Verdict::Accepted => tracing::debug!(%key, "Accepted"),
                Verdict::Rejected(reason) => tracing::info!(%key, %reason, "Rejected"),
            }
            self.writer
                .write(&key, version, &resource.status(), &verdict)
                .await;
        }

        // Rejected resources are enqueued too, so that downstream can clean
        // up whatever an earlier accepted version configured.
        self.queue.add(key);
    }

    fn delete(&self, key: ReconcileKey) {
        self.indexes.versions.delete(&key);
        match key.kind {
            Kind::HostRule => {
                if let Some(claim) = self.indexes.fqdns.release(&key.id) {
                    tracing::debug!(%key, fqdn = %claim.fqdn, aliases = ?claim.aliases, "Released names");
                }
            }
            Kind::AviInfraSetting => {
                let groups = self.indexes.se_groups.release(&key);
                if !groups.is_empty() {
                    tracing::debug!(%key, ?groups, "Released placement groups");
                }
            }
            _ => {}
        }
        self.writer.forget(&key);
        self.queue.add(key);
    }
}

/// Feeds a resource watch through the pipeline.
pub async fn admit_all<T>(pipeline: Arc<Pipeline>, watch: impl Stream<Item = watcher::Event<T>> + Send)
where
    T: k8s::Resource + Clone + Send + Into<Resource>,
{
    let events = Informer::<T>::new().events(watch);
    tokio::pin!(events);
    while let Some(event) = events.next().await {
        pipeline.handle(event.map(Into::into)).await;
    }
}

/// Tracks namespace labels for the namespace admission filter.
///
/// `synced` fires once the initial namespace list has been indexed. Objects
/// in a namespace that becomes admitted are run through the pipeline again.
pub async fn index_namespaces(
    pipeline: Arc<Pipeline>,
    watch: impl Stream<Item = watcher::Event<k8s::Namespace>> + Send,
    synced: oneshot::Sender<()>,
) {
    let filter = pipeline.indexes.namespaces.clone();
    let mut informer = Informer::<k8s::Namespace>::new();
    let mut synced = Some(synced);
    tokio::pin!(watch);
    while let Some(event) = watch.next().await {
        let init_done = matches!(event, watcher::Event::InitDone);
        for event in informer.apply(event) {
            let changed = match &event {
                WatchEvent::Add(ns) | WatchEvent::Update { current: ns, .. } => {
                    filter.apply_namespace(&ns.name_any(), ns.metadata.labels.as_ref())
                }
                WatchEvent::Delete(ns) => filter.delete_namespace(&ns.name_any()),
            };
            if changed {
                let ns = event.object().name_any();
                let admitted = filter.admits(&ns);
                tracing::info!(namespace = %ns, admitted, "Namespace admission changed");
                if admitted {
                    pipeline.readmit_namespace(&ns).await;
                }
            }
        }
        if init_done {
            if let Some(tx) = synced.take() {
                tracing::info!(namespaces = informer.len(), "Namespaces indexed");
                let _ = tx.send(());
            }
        }
    }
}
