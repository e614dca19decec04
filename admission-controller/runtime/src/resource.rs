use crate::k8s::{
    self, AviInfraSetting, DestinationRule, Gateway, HostRule, HttpRule, MultiClusterIngress,
    ObjectMeta, ServiceImport, VirtualService,
};
use lb_admission_core::{Kind, ReconcileKey, Status};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// A watched object of any admitted kind.
#[derive(Clone, Debug, PartialEq)]
pub enum Resource {
    HostRule(HostRule),
    HttpRule(HttpRule),
    AviInfraSetting(AviInfraSetting),
    MultiClusterIngress(MultiClusterIngress),
    ServiceImport(ServiceImport),
    VirtualService(VirtualService),
    DestinationRule(DestinationRule),
    Gateway(Gateway),
}

// === impl Resource ===

impl Resource {
    pub fn kind(&self) -> Kind {
        match self {
            Self::HostRule(_) => Kind::HostRule,
            Self::HttpRule(_) => Kind::HttpRule,
            Self::AviInfraSetting(_) => Kind::AviInfraSetting,
            Self::MultiClusterIngress(_) => Kind::MultiClusterIngress,
            Self::ServiceImport(_) => Kind::ServiceImport,
            Self::VirtualService(_) => Kind::VirtualService,
            Self::DestinationRule(_) => Kind::DestinationRule,
            Self::Gateway(_) => Kind::Gateway,
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            Self::HostRule(r) => &r.metadata,
            Self::HttpRule(r) => &r.metadata,
            Self::AviInfraSetting(r) => &r.metadata,
            Self::MultiClusterIngress(r) => &r.metadata,
            Self::ServiceImport(r) => &r.metadata,
            Self::VirtualService(r) => &r.metadata,
            Self::DestinationRule(r) => &r.metadata,
            Self::Gateway(r) => &r.metadata,
        }
    }

    /// Builds the object's reconcile key.
    ///
    /// Returns `None` for objects that cannot be identified: unnamed objects
    /// and namespaced objects without a namespace.
    pub fn key(&self) -> Option<ReconcileKey> {
        let kind = self.kind();
        let meta = self.metadata();
        let name = meta.name.as_deref().filter(|n| !n.is_empty())?;
        let namespace = if kind.is_cluster_scoped() {
            ""
        } else {
            meta.namespace.as_deref().filter(|ns| !ns.is_empty())?
        };
        Some(ReconcileKey::new(kind, namespace, name))
    }

    pub fn resource_version(&self) -> &str {
        self.metadata().resource_version.as_deref().unwrap_or_default()
    }

    /// The admission status currently recorded on the object. Mesh kinds
    /// never carry one.
    pub fn status(&self) -> Status {
        let status = match self {
            Self::HostRule(r) => r.status.as_ref(),
            Self::HttpRule(r) => r.status.as_ref(),
            Self::AviInfraSetting(r) => r.status.as_ref(),
            Self::MultiClusterIngress(r) => r.status.as_ref(),
            Self::ServiceImport(r) => r.status.as_ref(),
            Self::VirtualService(_) | Self::DestinationRule(_) | Self::Gateway(_) => None,
        };
        status.cloned().unwrap_or_default()
    }

    /// A content hash over the spec and the admission state.
    ///
    /// Status reasons and bookkeeping metadata do not contribute, so the
    /// fingerprint is unaffected by this controller's own reason updates.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = Sha256::new();
        hasher.update(self.spec_bytes());
        hasher.update(self.status().status.as_str().as_bytes());
        let hash = hasher.finalize();
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&hash[..8]);
        u64::from_le_bytes(prefix)
    }

    /// Structural equality of the specs of two objects.
    pub fn spec_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::HostRule(a), Self::HostRule(b)) => a.spec == b.spec,
            (Self::HttpRule(a), Self::HttpRule(b)) => a.spec == b.spec,
            (Self::AviInfraSetting(a), Self::AviInfraSetting(b)) => a.spec == b.spec,
            (Self::MultiClusterIngress(a), Self::MultiClusterIngress(b)) => a.spec == b.spec,
            (Self::ServiceImport(a), Self::ServiceImport(b)) => a.spec == b.spec,
            (Self::VirtualService(a), Self::VirtualService(b)) => a.spec == b.spec,
            (Self::DestinationRule(a), Self::DestinationRule(b)) => a.spec == b.spec,
            (Self::Gateway(a), Self::Gateway(b)) => a.spec == b.spec,
            _ => false,
        }
    }

    fn spec_bytes(&self) -> Vec<u8> {
        match self {
            Self::HostRule(r) => to_bytes(&r.spec),
            Self::HttpRule(r) => to_bytes(&r.spec),
            Self::AviInfraSetting(r) => to_bytes(&r.spec),
            Self::MultiClusterIngress(r) => to_bytes(&r.spec),
            Self::ServiceImport(r) => to_bytes(&r.spec),
            Self::VirtualService(r) => to_bytes(&r.spec),
            Self::DestinationRule(r) => to_bytes(&r.spec),
            Self::Gateway(r) => to_bytes(&r.spec),
        }
    }
}

fn to_bytes<T: Serialize>(spec: &T) -> Vec<u8> {
    // Specs are plain data with string-keyed maps; serialization cannot fail.
    serde_json::to_vec(spec).unwrap_or_default()
}

macro_rules! impl_from {
    ($($kind:ident),+) => {
        $(
            impl From<k8s::$kind> for Resource {
                fn from(r: k8s::$kind) -> Self {
                    Self::$kind(r)
                }
            }
        )+
    };
}

impl_from!(
    HostRule,
    HttpRule,
    AviInfraSetting,
    MultiClusterIngress,
    ServiceImport,
    VirtualService,
    DestinationRule,
    Gateway
);
