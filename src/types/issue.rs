//! Issue state and issue history entries.

use serde::{Deserialize, Serialize};

/// Open/closed state of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    /// Returns the value GitHub's REST API uses for this state.
    pub fn as_api_str(&self) -> &'static str {
        match self {
            IssueState::Open => "open",
            IssueState::Closed => "closed",
        }
    }
}

/// The kind of an entry in an issue's event timeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Closed,
    Reopened,
    /// Any other timeline event (`labeled`, `assigned`, ...), kept by name.
    Other(String),
}

impl TransitionKind {
    /// Maps the `event` field of the issue events API.
    pub fn from_api_name(name: &str) -> Self {
        match name {
            "closed" => TransitionKind::Closed,
            "reopened" => TransitionKind::Reopened,
            other => TransitionKind::Other(other.to_string()),
        }
    }
}

/// One entry of an issue's event history, in chronological order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssueTransition {
    pub kind: TransitionKind,
    /// Login of the user who caused the event, when GitHub reports one.
    pub actor: Option<String>,
}

impl IssueTransition {
    pub fn new(kind: TransitionKind) -> Self {
        IssueTransition { kind, actor: None }
    }

    pub fn closed() -> Self {
        Self::new(TransitionKind::Closed)
    }

    pub fn reopened() -> Self {
        Self::new(TransitionKind::Reopened)
    }

    pub fn is_closed(&self) -> bool {
        self.kind == TransitionKind::Closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_api_name() {
        assert_eq!(TransitionKind::from_api_name("closed"), TransitionKind::Closed);
        assert_eq!(TransitionKind::from_api_name("reopened"), TransitionKind::Reopened);
        assert_eq!(
            TransitionKind::from_api_name("labeled"),
            TransitionKind::Other("labeled".to_string())
        );
    }

    #[test]
    fn issue_state_api_values() {
        assert_eq!(IssueState::Open.as_api_str(), "open");
        assert_eq!(IssueState::Closed.as_api_str(), "closed");
        assert_eq!(serde_json::to_string(&IssueState::Closed).unwrap(), "\"closed\"");
    }
}
