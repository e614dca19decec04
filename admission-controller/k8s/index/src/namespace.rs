use ahash::AHashSet as HashSet;
use parking_lot::RwLock;
use std::{collections::BTreeMap, str::FromStr};

/// Decides which namespaces admit cross-cluster bindings.
///
/// Blocked namespaces are never admitted. When a selector is configured, a
/// namespace is admitted only while it carries the selector's label; label
/// state is fed from the namespace watch.
#[derive(Debug, Default)]
pub struct NamespaceFilter {
    blocked: HashSet<String>,
    selector: Option<NamespaceSelector>,
    selected: RwLock<HashSet<String>>,
}

/// A `key=value` label a namespace must carry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamespaceSelector {
    pub key: String,
    pub value: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("namespace selector must be of the form key=value: {0}")]
pub struct InvalidSelector(String);

// === impl NamespaceFilter ===

impl NamespaceFilter {
    pub fn new(
        blocked: impl IntoIterator<Item = String>,
        selector: Option<NamespaceSelector>,
    ) -> Self {
        Self {
            blocked: blocked.into_iter().filter(|ns| !ns.is_empty()).collect(),
            selector,
            selected: Default::default(),
        }
    }

    pub fn admits(&self, namespace: &str) -> bool {
        if self.blocked.contains(namespace) {
            return false;
        }
        match self.selector {
            None => true,
            Some(_) => self.selected.read().contains(namespace),
        }
    }

    /// Updates the filter from an observed namespace.
    ///
    /// Returns true if the namespace's admission changed.
    pub fn apply_namespace(&self, name: &str, labels: Option<&BTreeMap<String, String>>) -> bool {
        let Some(selector) = self.selector.as_ref() else {
            return false;
        };
        let matches = labels
            .and_then(|l| l.get(&selector.key))
            .map(|v| *v == selector.value)
            .unwrap_or(false);

        let mut selected = self.selected.write();
        if matches {
            selected.insert(name.to_string())
        } else {
            selected.remove(name)
        }
    }

    pub fn delete_namespace(&self, name: &str) -> bool {
        self.selected.write().remove(name)
    }

    pub fn has_selector(&self) -> bool {
        self.selector.is_some()
    }
}

// === impl NamespaceSelector ===

impl FromStr for NamespaceSelector {
    type Err = InvalidSelector;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => Ok(Self {
                key: key.trim().to_string(),
                value: value.trim().to_string(),
            }),
            _ => Err(InvalidSelector(s.to_string())),
        }
    }
}
