//! Typed events dispatched to plugins.
//!
//! Two sources produce events:
//!
//! - `issues` webhooks, parsed by [`super::parse_webhook`]
//! - the [`crate::scheduler`], which emits `schedule.repository` for every
//!   configured repository on each tick
//!
//! Every event has a dotted name (`issues.closed`, `schedule.repository`)
//! used by the plugin registry for dispatch.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::{IssueNumber, RepoId};

/// Event name for scheduled repository scans.
pub const SCHEDULE_REPOSITORY: &str = "schedule.repository";

/// A parsed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GitHubEvent {
    /// An issue was opened, closed, labeled, ...
    Issues {
        action: IssueAction,
        issue: IssueEvent,
    },

    /// A periodic scan of one repository.
    Schedule { repo: RepoId },
}

impl GitHubEvent {
    /// Returns the repository this event belongs to.
    pub fn repo_id(&self) -> &RepoId {
        match self {
            GitHubEvent::Issues { issue, .. } => &issue.repo,
            GitHubEvent::Schedule { repo } => repo,
        }
    }

    /// The top-level event name (`issues`, `schedule`).
    pub fn kind(&self) -> &'static str {
        match self {
            GitHubEvent::Issues { .. } => "issues",
            GitHubEvent::Schedule { .. } => "schedule",
        }
    }

    /// The full `event.action` name used for dispatch.
    pub fn name(&self) -> String {
        match self {
            GitHubEvent::Issues { action, .. } => format!("issues.{}", action.as_str()),
            GitHubEvent::Schedule { .. } => SCHEDULE_REPOSITORY.to_string(),
        }
    }
}

/// Action performed on an issue.
///
/// Actions not listed here (assigned, milestoned, transferred, ...) are
/// dropped by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueAction {
    Opened,
    Edited,
    Closed,
    Reopened,
    Labeled,
    Unlabeled,
}

impl IssueAction {
    pub fn from_api_name(name: &str) -> Option<Self> {
        match name {
            "opened" => Some(IssueAction::Opened),
            "edited" => Some(IssueAction::Edited),
            "closed" => Some(IssueAction::Closed),
            "reopened" => Some(IssueAction::Reopened),
            "labeled" => Some(IssueAction::Labeled),
            "unlabeled" => Some(IssueAction::Unlabeled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueAction::Opened => "opened",
            IssueAction::Edited => "edited",
            IssueAction::Closed => "closed",
            IssueAction::Reopened => "reopened",
            IssueAction::Labeled => "labeled",
            IssueAction::Unlabeled => "unlabeled",
        }
    }
}

/// The issue an `issues` webhook describes.
///
/// Built fresh for every delivery and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueEvent {
    pub repo: RepoId,
    pub number: IssueNumber,
    pub title: String,
    /// Names of the labels on the issue at delivery time.
    pub labels: BTreeSet<String>,
}

impl IssueEvent {
    pub fn new(repo: RepoId, number: IssueNumber, title: impl Into<String>) -> Self {
        IssueEvent {
            repo,
            number,
            title: title.into(),
            labels: BTreeSet::new(),
        }
    }

    /// Returns a copy carrying the given labels.
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels.extend(labels.into_iter().map(Into::into));
        self
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }
}
