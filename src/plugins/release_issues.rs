//! Opens the next scheduled release issue when the current one is closed.

use std::fmt;

use tracing::{debug, info, warn};

use crate::actuator::ActuatorError;
use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse};
use crate::rules::FollowUpAction;
use crate::webhooks::GitHubEvent;

use super::{EventContext, HandlerFuture, PluginError, PluginRegistry};

pub const NAME: &str = "release-issues";

pub fn register<G>(registry: &mut PluginRegistry<G>)
where
    G: GitHubInterpreter + Send + Sync,
    G::Error: fmt::Display + Send,
{
    registry.on("issues.closed", NAME, handle::<G>);
}

fn handle<G>(ctx: &EventContext<G>) -> HandlerFuture<'_>
where
    G: GitHubInterpreter + Send + Sync,
    G::Error: fmt::Display + Send,
{
    Box::pin(async move { on_issue_closed(ctx).await.map(|_| ()) })
}

/// Handles `issues.closed`, returning the action that was carried out.
pub async fn on_issue_closed<G>(ctx: &EventContext<G>) -> Result<FollowUpAction, PluginError>
where
    G: GitHubInterpreter + Send + Sync,
    G::Error: fmt::Display + Send,
{
    let GitHubEvent::Issues { issue, .. } = &ctx.event else {
        return Err(PluginError::WrongEvent(ctx.event.name()));
    };
    let rule = &ctx.settings.release;

    if !rule.applies_to(issue) {
        debug!(issue = %issue.number, label = %rule.label, "Issue lacks release label, skipping");
        return Ok(FollowUpAction::NoOp);
    }

    let actuator = ctx.actuator();
    let request = GitHubEffect::ListIssueEvents {
        issue: issue.number,
        per_page: ctx.settings.events_page_size,
    };
    let history = match actuator.execute(request).await? {
        GitHubResponse::IssueEvents {
            events,
            may_be_incomplete,
        } => {
            if may_be_incomplete {
                warn!(
                    issue = %issue.number,
                    fetched = events.len(),
                    "Issue history may be incomplete"
                );
            }
            events
        }
        other => return Err(ActuatorError::unexpected("list_issue_events", &other).into()),
    };

    let action = rule.evaluate(issue, &history);
    match &action {
        FollowUpAction::NoOp => {
            debug!(
                issue = %issue.number,
                title = %issue.title,
                history = history.len(),
                "No follow-up release issue"
            );
        }
        FollowUpAction::CreateIssue { title, .. } => {
            info!(repo = %issue.repo, closed = %issue.number, %title, "Opening next release issue");
            actuator.execute_all(action.clone().into_effects()).await?;
        }
    }

    Ok(action)
}
