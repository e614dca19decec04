use ahash::AHashMap as HashMap;
use lb_admission_core::ReconcileKey;
use parking_lot::RwLock;

/// Remembers the last resource version admitted for each key.
///
/// Entries live for the lifetime of the process; they are overwritten on
/// every admitted add or update and removed on delete.
#[derive(Debug, Default)]
pub struct ResourceVersionCache {
    versions: RwLock<HashMap<ReconcileKey, String>>,
}

// === impl ResourceVersionCache ===

impl ResourceVersionCache {
    pub fn get(&self, key: &ReconcileKey) -> Option<String> {
        self.versions.read().get(key).cloned()
    }

    /// Returns true if `version` is the version last recorded for `key`.
    pub fn is_current(&self, key: &ReconcileKey, version: &str) -> bool {
        self.versions
            .read()
            .get(key)
            .map(|v| v == version)
            .unwrap_or(false)
    }

    pub fn put(&self, key: ReconcileKey, version: impl Into<String>) {
        self.versions.write().insert(key, version.into());
    }

    pub fn delete(&self, key: &ReconcileKey) -> Option<String> {
        self.versions.write().remove(key)
    }

    pub fn len(&self) -> usize {
        self.versions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lb_admission_core::Kind;

    #[test]
    fn last_writer_wins() {
        let cache = ResourceVersionCache::default();
        let key = ReconcileKey::new(Kind::Gateway, "ns", "gw");
        assert_eq!(cache.get(&key), None);

        cache.put(key.clone(), "1");
        cache.put(key.clone(), "2");
        assert_eq!(cache.get(&key).as_deref(), Some("2"));
        assert!(cache.is_current(&key, "2"));
        assert!(!cache.is_current(&key, "1"));

        assert_eq!(cache.delete(&key).as_deref(), Some("2"));
        assert!(cache.is_empty());
    }
}
