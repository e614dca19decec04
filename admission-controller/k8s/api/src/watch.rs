use ahash::{AHashMap as HashMap, AHashSet as HashSet};
use futures::prelude::*;
use kube::{runtime::watcher::Event, Resource, ResourceExt};

/// A change notification for a single object.
#[derive(Clone, Debug, PartialEq)]
pub enum WatchEvent<T> {
    Add(T),
    Update { previous: T, current: T },
    /// Carries the last known state of the deleted object.
    Delete(T),
}

/// Turns a watch stream into add/update/delete notifications.
///
/// The watch only reports the current state of each object, so the informer
/// holds the last-seen version of every object in order to pair updates with
/// their previous state. A relist (`Init` .. `InitDone`) may reveal that
/// objects were deleted while the watch was disconnected; those are reported
/// as deletions once the relist completes.
pub struct Informer<T> {
    objects: HashMap<ObjectKey, T>,
    relist: Option<HashSet<ObjectKey>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ObjectKey {
    namespace: Option<String>,
    name: String,
}

// === impl WatchEvent ===

impl<T> WatchEvent<T> {
    /// The most recent state of the object.
    pub fn object(&self) -> &T {
        match self {
            Self::Add(obj) | Self::Delete(obj) => obj,
            Self::Update { current, .. } => current,
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> WatchEvent<U> {
        match self {
            Self::Add(obj) => WatchEvent::Add(f(obj)),
            Self::Update { previous, current } => WatchEvent::Update {
                previous: f(previous),
                current: f(current),
            },
            Self::Delete(obj) => WatchEvent::Delete(f(obj)),
        }
    }
}

// === impl Informer ===

impl<T> Default for Informer<T> {
    fn default() -> Self {
        Self {
            objects: HashMap::new(),
            relist: None,
        }
    }
}

impl<T> Informer<T>
where
    T: Resource + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Adapts a (never-ending) watch stream into a stream of notifications.
    pub fn events<S>(mut self, watch: S) -> impl Stream<Item = WatchEvent<T>> + Send
    where
        S: Stream<Item = Event<T>> + Send,
        T: Send,
    {
        watch
            .map(move |event| stream::iter(self.apply(event)))
            .flatten()
    }

    pub fn apply(&mut self, event: Event<T>) -> Vec<WatchEvent<T>> {
        match event {
            Event::Init => {
                self.relist = Some(HashSet::new());
                vec![]
            }

            Event::InitApply(obj) => {
                let key = ObjectKey::of(&obj);
                if let Some(seen) = self.relist.as_mut() {
                    seen.insert(key.clone());
                }
                vec![self.upsert(key, obj)]
            }

            Event::InitDone => {
                let Some(seen) = self.relist.take() else {
                    return vec![];
                };
                let stale = self
                    .objects
                    .keys()
                    .filter(|key| !seen.contains(key))
                    .cloned()
                    .collect::<Vec<_>>();
                stale
                    .into_iter()
                    .filter_map(|key| self.objects.remove(&key))
                    .map(|obj| {
                        tracing::debug!(name = %obj.name_any(), "Object removed during relist");
                        WatchEvent::Delete(obj)
                    })
                    .collect()
            }

            Event::Apply(obj) => {
                let key = ObjectKey::of(&obj);
                vec![self.upsert(key, obj)]
            }

            Event::Delete(obj) => {
                let key = ObjectKey::of(&obj);
                self.objects.remove(&key);
                vec![WatchEvent::Delete(obj)]
            }
        }
    }

    fn upsert(&mut self, key: ObjectKey, obj: T) -> WatchEvent<T> {
        match self.objects.insert(key, obj.clone()) {
            None => WatchEvent::Add(obj),
            Some(previous) => WatchEvent::Update {
                previous,
                current: obj,
            },
        }
    }
}

impl ObjectKey {
    fn of<T: Resource>(obj: &T) -> Self {
        Self {
            namespace: obj.namespace(),
            name: obj.name_any(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{crd::HostRuleSpec, HostRule};
    use kube::api::ObjectMeta;

    fn mk_hostrule(ns: &str, name: &str, version: &str) -> HostRule {
        HostRule {
            metadata: ObjectMeta {
                namespace: Some(ns.to_string()),
                name: Some(name.to_string()),
                resource_version: Some(version.to_string()),
                ..Default::default()
            },
            spec: HostRuleSpec::default(),
            status: None,
        }
    }

    #[test]
    fn pairs_updates_with_previous_state() {
        let mut informer = Informer::new();

        let v1 = mk_hostrule("ns-0", "hr-0", "1");
        assert_eq!(
            informer.apply(Event::Apply(v1.clone())),
            vec![WatchEvent::Add(v1.clone())]
        );

        let v2 = mk_hostrule("ns-0", "hr-0", "2");
        assert_eq!(
            informer.apply(Event::Apply(v2.clone())),
            vec![WatchEvent::Update {
                previous: v1,
                current: v2.clone(),
            }]
        );

        assert_eq!(
            informer.apply(Event::Delete(v2.clone())),
            vec![WatchEvent::Delete(v2)]
        );
        assert!(informer.is_empty());
    }

    #[test]
    fn relist_reports_vanished_objects() {
        let mut informer = Informer::new();
        let keep = mk_hostrule("ns-0", "keep", "1");
        let gone = mk_hostrule("ns-1", "gone", "1");
        informer.apply(Event::Apply(keep.clone()));
        informer.apply(Event::Apply(gone.clone()));

        assert!(informer.apply(Event::Init).is_empty());
        assert_eq!(
            informer.apply(Event::InitApply(keep.clone())),
            vec![WatchEvent::Update {
                previous: keep.clone(),
                current: keep,
            }]
        );
        assert_eq!(
            informer.apply(Event::InitDone),
            vec![WatchEvent::Delete(gone)]
        );
        assert_eq!(informer.len(), 1);
    }
}
