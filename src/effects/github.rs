//! GitHub API effect types.
//!
//! These types describe GitHub API operations as data, without executing them.
//! The interpreter in [`crate::github`] executes these effects against the
//! actual GitHub API; tests use a recording interpreter instead.

use serde::{Deserialize, Serialize};

use crate::types::{CommentId, IssueNumber, IssueState, IssueTransition};

/// A GitHub API effect.
///
/// Each variant describes a GitHub API operation. Effects are repo-scoped:
/// the interpreter is constructed with a `RepoId`, so effects don't include it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GitHubEffect {
    // ─── Issue Queries ────────────────────────────────────────────────────────
    /// List the event timeline of an issue (closed, reopened, labeled, ...).
    ListIssueEvents {
        issue: IssueNumber,
        /// Page size requested from the API (GitHub caps this at 100).
        per_page: u8,
    },

    /// Run an issue search query and return the matching issue numbers.
    ///
    /// Search is not scoped by the interpreter; the query must carry its own
    /// `repo:` qualifier.
    SearchIssues { query: String },

    // ─── Issue Mutations ──────────────────────────────────────────────────────
    /// Open a new issue.
    CreateIssue {
        title: String,
        body: String,
        labels: Vec<String>,
    },

    /// Add labels to an existing issue.
    AddLabels {
        issue: IssueNumber,
        labels: Vec<String>,
    },

    /// Open or close an issue.
    SetIssueState {
        issue: IssueNumber,
        state: IssueState,
    },

    /// Post a comment on an issue.
    CreateComment { issue: IssueNumber, body: String },

    // ─── Repository ───────────────────────────────────────────────────────────
    /// List the names of all labels defined in the repository.
    ListLabels,
}

impl GitHubEffect {
    /// Returns true if executing this effect changes state on GitHub.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            GitHubEffect::CreateIssue { .. }
                | GitHubEffect::AddLabels { .. }
                | GitHubEffect::SetIssueState { .. }
                | GitHubEffect::CreateComment { .. }
        )
    }

    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            GitHubEffect::ListIssueEvents { .. } => "list_issue_events",
            GitHubEffect::SearchIssues { .. } => "search_issues",
            GitHubEffect::CreateIssue { .. } => "create_issue",
            GitHubEffect::AddLabels { .. } => "add_labels",
            GitHubEffect::SetIssueState { .. } => "set_issue_state",
            GitHubEffect::CreateComment { .. } => "create_comment",
            GitHubEffect::ListLabels => "list_labels",
        }
    }
}

// ─── Response Types ───────────────────────────────────────────────────────────

/// Response from a GitHub effect.
///
/// Each variant corresponds to the response from a particular effect type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum GitHubResponse {
    /// Response to `ListIssueEvents`.
    ///
    /// `may_be_incomplete` is set when the pagination limit was reached before
    /// the last page.
    IssueEvents {
        events: Vec<IssueTransition>,
        may_be_incomplete: bool,
    },

    /// Response to `SearchIssues`.
    ///
    /// `may_be_incomplete` is set when GitHub flagged the search as incomplete
    /// (timeout on its side) or when the pagination limit was reached.
    SearchResults {
        issues: Vec<IssueNumber>,
        may_be_incomplete: bool,
    },

    /// Response to `CreateIssue`.
    IssueCreated {
        /// The number of the newly created issue.
        number: IssueNumber,
    },

    /// Response to `AddLabels`.
    LabelsAdded,

    /// Response to `SetIssueState`.
    IssueStateSet,

    /// Response to `CreateComment`.
    CommentCreated {
        /// The ID of the newly created comment.
        id: CommentId,
    },

    /// Response to `ListLabels`.
    Labels(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransitionKind;
    use proptest::prelude::*;

    fn arb_issue() -> impl Strategy<Value = IssueNumber> {
        (1..=u32::MAX as u64).prop_map(IssueNumber)
    }

    fn arb_label() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9 ]{0,20}".prop_map(|s| s.to_string())
    }

    fn arb_text() -> impl Strategy<Value = String> {
        ".{0,200}".prop_map(|s| s.to_string())
    }

    fn arb_state() -> impl Strategy<Value = IssueState> {
        prop_oneof![Just(IssueState::Open), Just(IssueState::Closed)]
    }

    fn arb_transition() -> impl Strategy<Value = IssueTransition> {
        (
            prop_oneof![
                Just(TransitionKind::Closed),
                Just(TransitionKind::Reopened),
                "[a-z_]{1,12}".prop_map(TransitionKind::Other),
            ],
            proptest::option::of("[a-z][a-z0-9-]{0,15}"),
        )
            .prop_map(|(kind, actor)| IssueTransition { kind, actor })
    }

    fn arb_github_effect() -> impl Strategy<Value = GitHubEffect> {
        prop_oneof![
            (arb_issue(), 1u8..=100)
                .prop_map(|(issue, per_page)| GitHubEffect::ListIssueEvents { issue, per_page }),
            arb_text().prop_map(|query| GitHubEffect::SearchIssues { query }),
            (arb_text(), arb_text(), prop::collection::vec(arb_label(), 0..3)).prop_map(
                |(title, body, labels)| GitHubEffect::CreateIssue {
                    title,
                    body,
                    labels
                }
            ),
            (arb_issue(), prop::collection::vec(arb_label(), 1..3))
                .prop_map(|(issue, labels)| GitHubEffect::AddLabels { issue, labels }),
            (arb_issue(), arb_state())
                .prop_map(|(issue, state)| GitHubEffect::SetIssueState { issue, state }),
            (arb_issue(), arb_text())
                .prop_map(|(issue, body)| GitHubEffect::CreateComment { issue, body }),
            Just(GitHubEffect::ListLabels),
        ]
    }

    fn arb_github_response() -> impl Strategy<Value = GitHubResponse> {
        prop_oneof![
            (prop::collection::vec(arb_transition(), 0..6), any::<bool>()).prop_map(
                |(events, may_be_incomplete)| GitHubResponse::IssueEvents {
                    events,
                    may_be_incomplete
                }
            ),
            (prop::collection::vec(arb_issue(), 0..6), any::<bool>()).prop_map(
                |(issues, may_be_incomplete)| GitHubResponse::SearchResults {
                    issues,
                    may_be_incomplete
                }
            ),
            arb_issue().prop_map(|number| GitHubResponse::IssueCreated { number }),
            Just(GitHubResponse::LabelsAdded),
            Just(GitHubResponse::IssueStateSet),
            any::<u64>().prop_map(|id| GitHubResponse::CommentCreated { id: CommentId(id) }),
            prop::collection::vec(arb_label(), 0..5).prop_map(GitHubResponse::Labels),
        ]
    }

    proptest! {
        #[test]
        fn effect_serde_roundtrip(effect in arb_github_effect()) {
            let json = serde_json::to_string(&effect).unwrap();
            let parsed: GitHubEffect = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(effect, parsed);
        }

        #[test]
        fn response_serde_roundtrip(response in arb_github_response()) {
            let json = serde_json::to_string(&response).unwrap();
            let parsed: GitHubResponse = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(response, parsed);
        }
    }

    #[test]
    fn mutations_are_flagged() {
        assert!(!GitHubEffect::ListLabels.is_mutation());
        assert!(
            !GitHubEffect::SearchIssues {
                query: "repo:a/b".into()
            }
            .is_mutation()
        );
        assert!(
            GitHubEffect::SetIssueState {
                issue: IssueNumber(1),
                state: IssueState::Closed
            }
            .is_mutation()
        );
    }

    #[test]
    fn effect_json_is_tagged() {
        let effect = GitHubEffect::AddLabels {
            issue: IssueNumber(7),
            labels: vec!["auto closed".into()],
        };
        let json = serde_json::to_value(&effect).unwrap();
        assert_eq!(json["type"], "add_labels");
        assert_eq!(json["issue"], 7);
    }
}
