//! Decisions of the stale-issue auto-closer.
//!
//! A scan runs only in repositories that define the closing label. Open
//! issues are split on the "accepted" label: accepted issues get a longer
//! inactivity window than unaccepted ones. Every stale issue is labeled,
//! closed, and commented on, in that order.

use chrono::{Days, NaiveDate};

use crate::effects::GitHubEffect;
use crate::types::{IssueNumber, IssueState, RepoId};

pub const AUTO_CLOSED_LABEL: &str = "auto closed";
pub const ACCEPTED_LABEL: &str = "accepted";
pub const ACCEPTED_INACTIVE_DAYS: u32 = 90;
pub const UNACCEPTED_INACTIVE_DAYS: u32 = 21;

/// Label names and inactivity windows of the auto-closer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoCloseSettings {
    /// Applied to closed issues; its absence disables the scan.
    pub closed_label: String,
    /// Partitions issues into the two windows.
    pub accepted_label: String,
    pub accepted_inactive_days: u32,
    pub unaccepted_inactive_days: u32,
}

impl Default for AutoCloseSettings {
    fn default() -> Self {
        AutoCloseSettings {
            closed_label: AUTO_CLOSED_LABEL.to_string(),
            accepted_label: ACCEPTED_LABEL.to_string(),
            accepted_inactive_days: ACCEPTED_INACTIVE_DAYS,
            unaccepted_inactive_days: UNACCEPTED_INACTIVE_DAYS,
        }
    }
}

/// One issue search and the inactivity window it encodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleQuery {
    pub query: String,
    pub inactive_days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanPlan {
    /// The repository lacks the closing label.
    Skip,
    Search(Vec<StaleQuery>),
}

/// Plans a scan of `repo` given its label names and today's date.
pub fn plan_scan<S: AsRef<str>>(
    repo: &RepoId,
    labels: &[S],
    today: NaiveDate,
    settings: &AutoCloseSettings,
) -> ScanPlan {
    if !labels
        .iter()
        .any(|label| label.as_ref() == settings.closed_label)
    {
        return ScanPlan::Skip;
    }

    let accepted = quote_label(&settings.accepted_label);
    ScanPlan::Search(vec![
        StaleQuery {
            query: stale_query(
                repo,
                today,
                settings.accepted_inactive_days,
                &format!("label:{accepted}"),
            ),
            inactive_days: settings.accepted_inactive_days,
        },
        StaleQuery {
            query: stale_query(
                repo,
                today,
                settings.unaccepted_inactive_days,
                &format!("-label:{accepted}"),
            ),
            inactive_days: settings.unaccepted_inactive_days,
        },
    ])
}

/// Effects closing one stale issue: label, close, then comment.
pub fn close_effects(
    issue: IssueNumber,
    inactive_days: u32,
    settings: &AutoCloseSettings,
) -> [GitHubEffect; 3] {
    [
        GitHubEffect::AddLabels {
            issue,
            labels: vec![settings.closed_label.clone()],
        },
        GitHubEffect::SetIssueState {
            issue,
            state: IssueState::Closed,
        },
        GitHubEffect::CreateComment {
            issue,
            body: closing_comment(inactive_days),
        },
    ]
}

/// The explanatory comment left on an auto-closed issue.
pub fn closing_comment(inactive_days: u32) -> String {
    format!(
        "Unfortunately, it looks like there wasn't enough interest from the team or \
         community to implement this change. While we wish we'd be able to accommodate \
         everyone's requests, we do need to prioritize. We've found that issues failing \
         to reach consensus after {inactive_days} days tend never to reach consensus, \
         and as such, we close those issues. This doesn't mean the idea isn't \
         interesting or useful, just that it's not something the team can commit to.\n\
         \n\
         Thanks for contributing to our project!"
    )
}

/// The last update date an issue may have and still count as stale.
pub fn cutoff_date(today: NaiveDate, inactive_days: u32) -> NaiveDate {
    today
        .checked_sub_days(Days::new(u64::from(inactive_days)))
        .unwrap_or(NaiveDate::MIN)
}

fn stale_query(repo: &RepoId, today: NaiveDate, inactive_days: u32, qualifier: &str) -> String {
    format!(
        "repo:{repo} is:issue is:open updated:<{} {qualifier}",
        cutoff_date(today, inactive_days).format("%Y-%m-%d")
    )
}

/// Quotes label names containing spaces for the search syntax.
fn quote_label(label: &str) -> String {
    if label.contains(char::is_whitespace) {
        format!("\"{label}\"")
    } else {
        label.to_string()
    }
}
