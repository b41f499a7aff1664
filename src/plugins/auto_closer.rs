//! Closes issues that have been inactive for too long.
//!
//! Runs on `schedule.repository`. Stale issues are found with two searches
//! (accepted and not accepted) and each is labeled, closed, and commented on.
//!
//! # Partial failures
//!
//! The three calls for one issue run in order and stop at the first failure,
//! so an issue is never closed without its label nor commented on while
//! still open. Nothing is rolled back: an issue left labeled but open is
//! still stale and is found again by the next scan, which replays the
//! sequence. One issue failing does not stop the others; the run reports
//! every failed issue in [`PluginError::PartialFailure`].

use std::collections::BTreeSet;
use std::fmt;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::actuator::{Actuator, ActuatorError};
use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse};
use crate::rules::auto_close::{self, AutoCloseSettings, ScanPlan};
use crate::types::IssueNumber;
use crate::webhooks::{GitHubEvent, SCHEDULE_REPOSITORY};

use super::{EventContext, HandlerFuture, PluginError, PluginRegistry};

pub const NAME: &str = "auto-closer";

pub fn register<G>(registry: &mut PluginRegistry<G>)
where
    G: GitHubInterpreter + Send + Sync,
    G::Error: fmt::Display + Send,
{
    registry.on(SCHEDULE_REPOSITORY, NAME, handle::<G>);
}

fn handle<G>(ctx: &EventContext<G>) -> HandlerFuture<'_>
where
    G: GitHubInterpreter + Send + Sync,
    G::Error: fmt::Display + Send,
{
    Box::pin(async move { scan_repository(ctx).await.map(|_| ()) })
}

/// Issues closed by one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub closed: Vec<IssueNumber>,
}

/// Handles `schedule.repository`.
pub async fn scan_repository<G>(ctx: &EventContext<G>) -> Result<ScanSummary, PluginError>
where
    G: GitHubInterpreter + Send + Sync,
    G::Error: fmt::Display + Send,
{
    let GitHubEvent::Schedule { repo } = &ctx.event else {
        return Err(PluginError::WrongEvent(ctx.event.name()));
    };
    let settings = &ctx.settings.auto_close;
    let actuator = ctx.actuator();

    let labels = match actuator.execute(GitHubEffect::ListLabels).await? {
        GitHubResponse::Labels(labels) => labels,
        other => return Err(ActuatorError::unexpected("list_labels", &other).into()),
    };

    let queries = match auto_close::plan_scan(repo, &labels, ctx.now.date_naive(), settings) {
        ScanPlan::Skip => {
            debug!(%repo, label = %settings.closed_label, "Closing label missing, skipping scan");
            return Ok(ScanSummary::default());
        }
        ScanPlan::Search(queries) => queries,
    };

    // All searches finish before the first mutation.
    let mut seen = BTreeSet::new();
    let mut targets = Vec::new();
    for query in queries {
        let issues = match actuator
            .execute(GitHubEffect::SearchIssues {
                query: query.query.clone(),
            })
            .await?
        {
            GitHubResponse::SearchResults {
                issues,
                may_be_incomplete,
            } => {
                if may_be_incomplete {
                    warn!(query = %query.query, found = issues.len(), "Search results may be incomplete");
                }
                issues
            }
            other => return Err(ActuatorError::unexpected("search_issues", &other).into()),
        };

        debug!(query = %query.query, found = issues.len(), "Stale issue search");
        for issue in issues {
            if seen.insert(issue) {
                targets.push((issue, query.inactive_days));
            }
        }
    }

    if targets.is_empty() {
        debug!(%repo, "No stale issues");
        return Ok(ScanSummary::default());
    }

    let attempted = targets.len();
    let results: Vec<_> = stream::iter(targets)
        .map(|(issue, days)| close_issue(&actuator, issue, days, settings))
        .buffer_unordered(ctx.settings.auto_close_concurrency.max(1))
        .collect()
        .await;

    let mut closed = Vec::new();
    let mut failed = Vec::new();
    for (issue, result) in results {
        match result {
            Ok(()) => closed.push(issue),
            Err(e) => failed.push((issue, e.to_string())),
        }
    }
    closed.sort();
    failed.sort();

    info!(%repo, closed = closed.len(), failed = failed.len(), "Auto-close scan finished");

    if failed.is_empty() {
        Ok(ScanSummary { closed })
    } else {
        Err(PluginError::PartialFailure { attempted, failed })
    }
}

/// Labels, closes, and comments on one issue, stopping at the first failure.
async fn close_issue<G>(
    actuator: &Actuator<'_, G>,
    issue: IssueNumber,
    inactive_days: u32,
    settings: &AutoCloseSettings,
) -> (IssueNumber, Result<(), ActuatorError>)
where
    G: GitHubInterpreter,
    G::Error: fmt::Display,
{
    let effects = auto_close::close_effects(issue, inactive_days, settings);
    let result = actuator.execute_all(effects).await.map(|_| ());
    match &result {
        Ok(()) => info!(%issue, inactive_days, "Auto-closed stale issue"),
        Err(e) => warn!(%issue, error = %e, "Failed to auto-close issue"),
    }
    (issue, result)
}
