use ahash::AHashMap as HashMap;
use lb_admission_core::ReconcileKey;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Records which AviInfraSetting is responsible for labeling each placement
/// group.
///
/// A group has at most one owner. Ownership is only ever recorded when the
/// group is vacant; it changes hands only after the owner releases it.
#[derive(Debug, Default)]
pub struct SeGroupLabelIndex {
    owners: RwLock<HashMap<String, ReconcileKey>>,
}

// === impl SeGroupLabelIndex ===

impl SeGroupLabelIndex {
    pub fn owner(&self, group: &str) -> Option<ReconcileKey> {
        self.owners.read().get(group).cloned()
    }

    /// Records `owner` for `group` if it has no owner yet.
    ///
    /// Returns true if `owner` owns the group afterwards.
    pub fn record(&self, group: &str, owner: &ReconcileKey) -> bool {
        let mut owners = self.owners.write();
        let current = owners
            .entry(group.to_string())
            .or_insert_with(|| owner.clone());
        current == owner
    }

    /// Releases every group owned by `owner`, returning their names.
    pub fn release(&self, owner: &ReconcileKey) -> Vec<String> {
        let mut owners = self.owners.write();
        let mut released = Vec::new();
        owners.retain(|group, o| {
            if o == owner {
                released.push(group.clone());
                return false;
            }
            true
        });
        released.sort();
        released
    }

    /// A point-in-time copy for diagnostics.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.owners
            .read()
            .iter()
            .map(|(group, owner)| (group.clone(), owner.to_string()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.owners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.read().is_empty()
    }
}
