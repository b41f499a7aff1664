//! GitHub webhook payload parser.
//!
//! Turns the `X-GitHub-Event` header plus the raw JSON body into a typed
//! [`GitHubEvent`].
//!
//! # Parsing Strategy
//!
//! 1. The event type is taken from the `X-GitHub-Event` header
//! 2. Only `issues` payloads are decoded; every other event type returns
//!    `Ok(None)` (ignored, not an error)
//! 3. `issues` actions the plugins never react to also return `Ok(None)`
//! 4. Malformed payloads return `Err` with details
//!
//! Payloads for issues that are really pull requests never arrive here:
//! GitHub sends those as `pull_request` events.

use std::collections::BTreeSet;

use serde::Deserialize;
use thiserror::Error;

use crate::types::{IssueNumber, RepoId};

use super::events::{GitHubEvent, IssueAction, IssueEvent};

/// Error type for webhook parsing failures.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON deserialization failed (includes missing required fields).
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A field was present but unusable.
    #[error("invalid field value for {field}: {value}")]
    InvalidField { field: &'static str, value: String },
}

/// Parses a webhook payload into a typed event.
///
/// * `Ok(Some(event))` - a tracked event
/// * `Ok(None)` - an event type or action nothing reacts to
/// * `Err(e)` - malformed payload or missing required fields
///
/// # Examples
///
/// ```
/// use issue_bot::webhooks::parse_webhook;
///
/// let payload = br#"{
///     "action": "closed",
///     "issue": {
///         "number": 42,
///         "title": "Scheduled release for June 3rd, 2021",
///         "labels": [{ "name": "release" }]
///     },
///     "repository": {
///         "owner": { "login": "octo-org" },
///         "name": "octo-repo"
///     }
/// }"#;
///
/// let event = parse_webhook("issues", payload).unwrap().unwrap();
/// assert_eq!(event.name(), "issues.closed");
/// ```
pub fn parse_webhook(event_type: &str, payload: &[u8]) -> Result<Option<GitHubEvent>, ParseError> {
    match event_type {
        "issues" => parse_issues(payload),
        _ => Ok(None),
    }
}

// ============================================================================
// Raw payload structures for deserialization
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawRepository {
    owner: RawOwner,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawOwner {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RawIssuesPayload {
    action: String,
    issue: RawIssue,
    repository: RawRepository,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    number: u64,
    title: String,
    #[serde(default)]
    labels: Vec<RawLabel>,
}

#[derive(Debug, Deserialize)]
struct RawLabel {
    name: String,
}

fn parse_issues(payload: &[u8]) -> Result<Option<GitHubEvent>, ParseError> {
    let raw: RawIssuesPayload = serde_json::from_slice(payload)?;

    let Some(action) = IssueAction::from_api_name(&raw.action) else {
        return Ok(None);
    };

    if raw.repository.owner.login.is_empty() || raw.repository.name.is_empty() {
        return Err(ParseError::InvalidField {
            field: "repository",
            value: format!("{}/{}", raw.repository.owner.login, raw.repository.name),
        });
    }

    let labels: BTreeSet<String> = raw.issue.labels.into_iter().map(|l| l.name).collect();

    Ok(Some(GitHubEvent::Issues {
        action,
        issue: IssueEvent {
            repo: RepoId::new(raw.repository.owner.login, raw.repository.name),
            number: IssueNumber(raw.issue.number),
            title: raw.issue.title,
            labels,
        },
    }))
}
