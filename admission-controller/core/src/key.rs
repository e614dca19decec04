use std::{fmt, str::FromStr};

/// The kinds of resources that flow through admission.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    HostRule,
    HttpRule,
    AviInfraSetting,
    MultiClusterIngress,
    ServiceImport,
    VirtualService,
    DestinationRule,
    Gateway,
}

/// Identifies a resource within its kind. Cluster-scoped resources have an
/// empty namespace.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId {
    pub namespace: String,
    pub name: String,
}

/// Identifies one managed resource across all kinds.
///
/// Renders as `{Kind}/{Namespace}/{Name}`, or `{Kind}/{Name}` for
/// cluster-scoped resources. This string is what the downstream stage reads
/// from the work queue.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReconcileKey {
    pub kind: Kind,
    pub id: ResourceId,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum KeyParseError {
    #[error("unknown resource kind: {0}")]
    UnknownKind(String),

    #[error("malformed reconcile key: {0}")]
    Malformed(String),
}

// === impl Kind ===

impl Kind {
    pub const ALL: [Kind; 8] = [
        Kind::HostRule,
        Kind::HttpRule,
        Kind::AviInfraSetting,
        Kind::MultiClusterIngress,
        Kind::ServiceImport,
        Kind::VirtualService,
        Kind::DestinationRule,
        Kind::Gateway,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HostRule => "HostRule",
            Self::HttpRule => "HTTPRule",
            Self::AviInfraSetting => "AviInfraSetting",
            Self::MultiClusterIngress => "MultiClusterIngress",
            Self::ServiceImport => "ServiceImport",
            Self::VirtualService => "VirtualService",
            Self::DestinationRule => "DestinationRule",
            Self::Gateway => "Gateway",
        }
    }

    /// Mesh-routing kinds are admitted by the mesh itself and never receive
    /// a status from this controller.
    pub fn is_mesh(&self) -> bool {
        matches!(
            self,
            Self::VirtualService | Self::DestinationRule | Self::Gateway
        )
    }

    /// Kinds whose admission depends on the namespace filter.
    pub fn is_namespace_filtered(&self) -> bool {
        matches!(self, Self::MultiClusterIngress | Self::ServiceImport)
    }

    pub fn is_cluster_scoped(&self) -> bool {
        matches!(self, Self::AviInfraSetting)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| KeyParseError::UnknownKind(s.to_string()))
    }
}

// === impl ResourceId ===

impl ResourceId {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            return f.write_str(&self.name);
        }
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

// === impl ReconcileKey ===

impl ReconcileKey {
    pub fn new(kind: Kind, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            id: ResourceId::new(namespace, name),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.id.namespace
    }

    pub fn name(&self) -> &str {
        &self.id.name
    }
}

impl fmt::Display for ReconcileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

impl FromStr for ReconcileKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, '/');
        let kind = parts
            .next()
            .ok_or_else(|| KeyParseError::Malformed(s.to_string()))?
            .parse::<Kind>()?;
        let (namespace, name) = match (parts.next(), parts.next()) {
            (Some(name), None) if kind.is_cluster_scoped() => ("", name),
            (Some(ns), Some(name)) if !kind.is_cluster_scoped() => (ns, name),
            _ => return Err(KeyParseError::Malformed(s.to_string())),
        };
        if name.is_empty() || (!kind.is_cluster_scoped() && namespace.is_empty()) {
            return Err(KeyParseError::Malformed(s.to_string()));
        }
        Ok(Self::new(kind, namespace, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_namespaced_key() {
        let key = ReconcileKey::new(Kind::HttpRule, "ns-0", "rule");
        assert_eq!(key.to_string(), "HTTPRule/ns-0/rule");
        assert_eq!("HTTPRule/ns-0/rule".parse::<ReconcileKey>(), Ok(key));
    }

    #[test]
    fn renders_cluster_scoped_key() {
        let key = ReconcileKey::new(Kind::AviInfraSetting, "", "infra");
        assert_eq!(key.to_string(), "AviInfraSetting/infra");
        assert_eq!("AviInfraSetting/infra".parse::<ReconcileKey>(), Ok(key));
    }

    #[test]
    fn rejects_malformed_keys() {
        assert_eq!(
            "Ingress/ns/name".parse::<ReconcileKey>(),
            Err(KeyParseError::UnknownKind("Ingress".to_string()))
        );
        assert!("HostRule/name".parse::<ReconcileKey>().is_err());
        assert!("HostRule//name".parse::<ReconcileKey>().is_err());
        assert!("AviInfraSetting/ns/name".parse::<ReconcileKey>().is_err());
    }
}
