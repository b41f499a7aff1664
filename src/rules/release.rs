//! Follow-up release issues.
//!
//! When an issue labeled `release` and titled `Scheduled release for
//! <date>` is closed for the first time, a new release issue is opened for
//! the date two weeks later. Reopened-and-reclosed issues are ignored so
//! closing the same issue twice never schedules two follow-ups.
//!
//! Everything here is pure; the caller fetches the issue history and
//! executes the resulting [`FollowUpAction`].

use serde::{Deserialize, Serialize};

use crate::effects::GitHubEffect;
use crate::types::{IssueTransition, ScheduledDate};
use crate::webhooks::IssueEvent;

/// Label gating the rule.
pub const LABEL_NAME: &str = "release";

/// Label added to follow-up issues so they show up on the TSC agenda.
pub const TSC_AGENDA_LABEL: &str = "tsc agenda";

/// Weeks between consecutive scheduled releases.
pub const RELEASE_INTERVAL_WEEKS: u32 = 2;

/// Release guidelines linked from every new release issue.
pub const DEFAULT_GUIDELINES_URL: &str = "https://eslint.org/docs/maintainer-guide/releases";

/// What to do after a release issue closes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FollowUpAction {
    CreateIssue {
        title: String,
        body: String,
        labels: Vec<String>,
    },
    NoOp,
}

impl FollowUpAction {
    pub fn is_noop(&self) -> bool {
        matches!(self, FollowUpAction::NoOp)
    }

    /// The effects that carry out this action.
    pub fn into_effects(self) -> Vec<GitHubEffect> {
        match self {
            FollowUpAction::CreateIssue {
                title,
                body,
                labels,
            } => vec![GitHubEffect::CreateIssue {
                title,
                body,
                labels,
            }],
            FollowUpAction::NoOp => Vec::new(),
        }
    }
}

/// Parameters of the release rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRule {
    pub label: String,
    pub agenda_label: String,
    /// Link placed under "Resources" in the follow-up issue body.
    pub guidelines_url: String,
}

impl Default for ReleaseRule {
    fn default() -> Self {
        ReleaseRule {
            label: LABEL_NAME.to_string(),
            agenda_label: TSC_AGENDA_LABEL.to_string(),
            guidelines_url: DEFAULT_GUIDELINES_URL.to_string(),
        }
    }
}

impl ReleaseRule {
    /// True if the event carries the gating label.
    ///
    /// Checked before fetching the issue history so unrelated issues cost no
    /// API calls.
    pub fn applies_to(&self, event: &IssueEvent) -> bool {
        event.has_label(&self.label)
    }

    /// Decides the follow-up for a closed issue.
    ///
    /// `history` is the issue's event timeline. An empty history (GitHub
    /// had not indexed the close yet) counts as a single closure.
    pub fn evaluate(&self, event: &IssueEvent, history: &[IssueTransition]) -> FollowUpAction {
        if !self.applies_to(event) {
            return FollowUpAction::NoOp;
        }

        if closed_count(history) > 1 {
            return FollowUpAction::NoOp;
        }

        let Some(next) = ScheduledDate::parse_release_title(&event.title)
            .and_then(|date| date.add_weeks(RELEASE_INTERVAL_WEEKS))
        else {
            return FollowUpAction::NoOp;
        };

        FollowUpAction::CreateIssue {
            title: next.release_title(),
            body: self.issue_body(next),
            labels: vec![self.label.clone(), self.agenda_label.clone()],
        }
    }

    fn issue_body(&self, date: ScheduledDate) -> String {
        format!(
            "The scheduled release on {} is assigned to:\n\
             \n\
             * (needs volunteers)\n\
             * (needs volunteers)\n\
             \n\
             Please use this issue to document how the release went, any problems during \
             the release, and anything the team might want to know about the release \
             process. This issue should be closed after all patch releases have been \
             completed (or there was no patch release needed).\n\
             \n\
             Resources:\n\
             \n\
             * [Release guidelines]({})",
            date.format_long(),
            self.guidelines_url
        )
    }
}

/// Label gate of the default rule.
pub fn applies_to(event: &IssueEvent) -> bool {
    event.has_label(LABEL_NAME)
}

/// Evaluates the default rule.
///
/// # Examples
///
/// ```
/// use issue_bot::rules::release::{FollowUpAction, evaluate};
/// use issue_bot::types::{IssueNumber, IssueTransition, RepoId};
/// use issue_bot::webhooks::IssueEvent;
///
/// let event = IssueEvent::new(
///     RepoId::new("eslint", "eslint"),
///     IssueNumber(1),
///     "Scheduled release for June 3rd, 2021",
/// )
/// .with_labels(["release"]);
///
/// match evaluate(&event, &[IssueTransition::closed()]) {
///     FollowUpAction::CreateIssue { title, .. } => {
///         assert_eq!(title, "Scheduled release for June 17th, 2021");
///     }
///     FollowUpAction::NoOp => unreachable!(),
/// }
/// ```
pub fn evaluate(event: &IssueEvent, history: &[IssueTransition]) -> FollowUpAction {
    ReleaseRule::default().evaluate(event, history)
}

fn closed_count(history: &[IssueTransition]) -> usize {
    history.iter().filter(|t| t.is_closed()).count()
}
