use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The admission state recorded on a resource's status sub-resource.
///
/// A resource that has never been admitted carries an empty state, which is
/// modeled as `Pending`.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema,
)]
pub enum State {
    #[default]
    #[serde(rename = "", alias = "Pending")]
    Pending,
    Accepted,
    Rejected,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct Status {
    #[serde(default)]
    pub status: State,

    /// Why the resource was rejected. Empty for accepted resources.
    #[serde(default)]
    pub error: String,
}

// === impl State ===

impl State {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Accepted => "Accepted",
            Self::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// === impl Status ===

impl Status {
    pub fn accepted() -> Self {
        Self {
            status: State::Accepted,
            error: String::new(),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            status: State::Rejected,
            error: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_status_is_pending() {
        let status: Status = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(status.status, State::Pending);

        let status: Status = serde_json::from_value(serde_json::json!({ "status": "" })).unwrap();
        assert_eq!(status.status, State::Pending);
    }

    #[test]
    fn serializes_verdicts() {
        let value = serde_json::to_value(Status::rejected("nope")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "status": "Rejected", "error": "nope" })
        );

        let value = serde_json::to_value(Status::accepted()).unwrap();
        assert_eq!(value, serde_json::json!({ "status": "Accepted", "error": "" }));
    }
}
