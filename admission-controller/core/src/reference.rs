use std::fmt;

/// The kind of object a named reference in a resource spec points at.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReferenceKind {
    SslKeyCert,
    WafPolicy,
    HttpPolicySet,
    SslProfile,
    AppProfile,
    AnalyticsProfile,
    ErrorPageProfile,
    VsDatascript,
    HealthMonitor,
    ApplicationPersistence,
    PkiProfile,
    ServiceEngineGroup,
    Network,
}

/// The outcome of resolving one reference against the control plane.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReferenceCheckResult {
    pub found: bool,
    pub type_valid: bool,
    pub owned_by_self: bool,
    pub reason: String,
}

/// The only application profile subtype a reference may point at.
pub const ALLOWED_APPLICATION_PROFILE: &str = "APPLICATION_PROFILE_TYPE_HTTP";

// === impl ReferenceKind ===

impl ReferenceKind {
    /// The control plane's object type for this reference.
    pub fn object_type(&self) -> &'static str {
        match self {
            Self::SslKeyCert => "sslkeyandcertificate",
            Self::WafPolicy => "wafpolicy",
            Self::HttpPolicySet => "httppolicyset",
            Self::SslProfile => "sslprofile",
            Self::AppProfile => "applicationprofile",
            Self::AnalyticsProfile => "analyticsprofile",
            Self::ErrorPageProfile => "errorpageprofile",
            Self::VsDatascript => "vsdatascriptset",
            Self::HealthMonitor => "healthmonitor",
            Self::ApplicationPersistence => "applicationpersistenceprofile",
            Self::PkiProfile => "pkiprofile",
            Self::ServiceEngineGroup => "serviceenginegroup",
            Self::Network => "network",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.object_type())
    }
}

// === impl ReferenceCheckResult ===

impl ReferenceCheckResult {
    pub fn valid(kind: ReferenceKind, name: &str) -> Self {
        Self {
            found: true,
            type_valid: true,
            owned_by_self: false,
            reason: format!("{kind} \"{name}\" found on controller"),
        }
    }

    pub fn not_found(kind: ReferenceKind, name: &str) -> Self {
        Self {
            found: false,
            type_valid: false,
            owned_by_self: false,
            reason: format!("{kind} \"{name}\" not found on controller"),
        }
    }

    pub fn unparseable(kind: ReferenceKind, name: &str) -> Self {
        Self {
            found: true,
            type_valid: false,
            owned_by_self: false,
            reason: format!("{kind} \"{name}\" found on controller is invalid"),
        }
    }

    pub fn wrong_type(kind: ReferenceKind, name: &str, allowed: &str) -> Self {
        Self {
            found: true,
            type_valid: false,
            owned_by_self: false,
            reason: format!("{kind} \"{name}\" found on controller is invalid, must be of type: {allowed}"),
        }
    }

    pub fn mismatched_labels(kind: ReferenceKind, name: &str, labels: &str) -> Self {
        Self {
            found: true,
            type_valid: false,
            owned_by_self: false,
            reason: format!(
                "{kind} \"{name}\" found on controller is invalid, mismatched labels: {labels}"
            ),
        }
    }

    pub fn owned_by_self(kind: ReferenceKind, name: &str) -> Self {
        Self {
            found: true,
            type_valid: true,
            owned_by_self: true,
            reason: format!(
                "{kind} \"{name}\" Invalid operation, object referred is created by current operator instance"
            ),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.found && self.type_valid && !self.owned_by_self
    }

    /// Returns the rejection reason if the reference may not be used.
    pub fn rejection(&self) -> Option<&str> {
        if self.is_valid() {
            return None;
        }
        Some(&self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasons_name_the_object_type() {
        let res = ReferenceCheckResult::not_found(ReferenceKind::AppProfile, "p1");
        assert_eq!(
            res.rejection(),
            Some("applicationprofile \"p1\" not found on controller")
        );

        let res = ReferenceCheckResult::owned_by_self(ReferenceKind::HealthMonitor, "hm");
        assert!(res.found && res.type_valid);
        assert_eq!(
            res.rejection(),
            Some("healthmonitor \"hm\" Invalid operation, object referred is created by current operator instance")
        );

        let res = ReferenceCheckResult::valid(ReferenceKind::Network, "vip");
        assert_eq!(res.rejection(), None);
    }
}
