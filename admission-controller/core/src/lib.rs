#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod key;
pub mod reference;
pub mod remote;

pub use self::{
    key::{Kind, KeyParseError, ReconcileKey, ResourceId},
    reference::{ReferenceCheckResult, ReferenceKind},
    remote::{
        Collection, CollectionQuery, ControlPlane, ControlPlaneError, Label, ObjectQuery, ObjectRef,
        RemoteObject,
    },
};
pub use lb_admission_k8s_api::{State, Status};
use anyhow::Result;

/// The outcome of admitting a resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected(String),
}

/// Persists admission verdicts onto a resource's status sub-resource.
#[async_trait::async_trait]
pub trait StatusSink: Send + Sync {
    async fn update_status(&self, key: &ReconcileKey, status: &Status) -> Result<()>;
}

/// Looks up Kubernetes Secrets referenced by resources.
#[async_trait::async_trait]
pub trait SecretLookup: Send + Sync {
    /// Fails with a descriptive error when the secret cannot be read.
    async fn ensure_exists(&self, namespace: &str, name: &str) -> Result<()>;
}

/// The stage that consumes admitted keys from the work queue.
#[async_trait::async_trait]
pub trait ProcessKey: Send + Sync {
    async fn process(&self, key: &ReconcileKey) -> Result<()>;
}

// === impl Verdict ===

impl Verdict {
    pub fn rejected(reason: impl ToString) -> Self {
        Self::Rejected(reason.to_string())
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    pub fn state(&self) -> State {
        match self {
            Self::Accepted => State::Accepted,
            Self::Rejected(_) => State::Rejected,
        }
    }

    pub fn to_status(&self) -> Status {
        match self {
            Self::Accepted => Status::accepted(),
            Self::Rejected(reason) => Status::rejected(reason.clone()),
        }
    }
}
