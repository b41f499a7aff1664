//! GitHub effect interpreter using octocrab.
//!
//! This module implements the `GitHubInterpreter` trait, executing GitHub effects
//! against the real GitHub API via octocrab's raw REST helpers.
//!
//! Key implementation details:
//! - Listing effects walk pages with [`Paginator`], restarting from page one on retry
//! - Retry logic with exponential backoff for transient errors
//! - Response bodies are decoded into minimal private structs

use serde::{Deserialize, Serialize};

use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse};
use crate::types::{CommentId, IssueNumber, IssueState, IssueTransition, TransitionKind};

use super::client::OctocrabClient;
use super::error::GitHubApiError;
use super::pagination::{PageLimits, Paginator, SearchPage};
use super::retry::retry_with_backoff;

// ─── Raw Response Types ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawIssueEvent {
    event: String,
    actor: Option<RawActor>,
}

#[derive(Debug, Deserialize)]
struct RawActor {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RawLabel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawIssueRef {
    number: u64,
}

#[derive(Debug, Deserialize)]
struct RawComment {
    id: u64,
}

// ─── Interpreter Implementation ───────────────────────────────────────────────

impl GitHubInterpreter for OctocrabClient {
    type Error = GitHubApiError;

    async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, Self::Error> {
        interpret_github_effect(self, effect).await
    }
}

/// Interprets a GitHub effect, executing it against the GitHub API.
///
/// Transient failures are retried according to the client's settings; each
/// retry re-executes the whole effect (listings start again from page one).
pub async fn interpret_github_effect(
    client: &OctocrabClient,
    effect: GitHubEffect,
) -> Result<GitHubResponse, GitHubApiError> {
    let settings = *client.settings();
    let result = retry_with_backoff(settings.retry, settings.retry_policy, || {
        execute_effect(client, effect.clone())
    })
    .await;

    result.into_result()
}

/// Executes a single effect without retry logic.
async fn execute_effect(
    client: &OctocrabClient,
    effect: GitHubEffect,
) -> Result<GitHubResponse, GitHubApiError> {
    match effect {
        GitHubEffect::ListIssueEvents { issue, per_page } => {
            list_issue_events(client, issue, per_page).await
        }
        GitHubEffect::SearchIssues { query } => search_issues(client, query).await,
        GitHubEffect::CreateIssue {
            title,
            body,
            labels,
        } => create_issue(client, title, body, labels).await,
        GitHubEffect::AddLabels { issue, labels } => add_labels(client, issue, labels).await,
        GitHubEffect::SetIssueState { issue, state } => {
            set_issue_state(client, issue, state).await
        }
        GitHubEffect::CreateComment { issue, body } => create_comment(client, issue, body).await,
        GitHubEffect::ListLabels => list_labels(client).await,
    }
}

// ─── Queries ──────────────────────────────────────────────────────────────────

async fn list_issue_events(
    client: &OctocrabClient,
    issue: IssueNumber,
    per_page: u8,
) -> Result<GitHubResponse, GitHubApiError> {
    let limits = PageLimits::new(per_page, client.settings().pages.max_pages);
    let route = client.repo_route(&format!("issues/{}/events", issue.0));

    let collected =
        Paginator::<RawIssueEvent, Vec<RawIssueEvent>>::new(client.inner(), route, limits)
            .collect_all()
            .await?;

    let events = collected
        .items
        .into_iter()
        .map(|raw| IssueTransition {
            kind: TransitionKind::from_api_name(&raw.event),
            actor: raw.actor.map(|a| a.login),
        })
        .collect();

    Ok(GitHubResponse::IssueEvents {
        events,
        may_be_incomplete: collected.may_be_incomplete,
    })
}

async fn search_issues(
    client: &OctocrabClient,
    query: String,
) -> Result<GitHubResponse, GitHubApiError> {
    let collected = Paginator::<RawIssueRef, SearchPage<RawIssueRef>>::new(
        client.inner(),
        "/search/issues",
        client.settings().pages,
    )
    .with_param("q", query)
    .collect_all()
    .await?;

    Ok(GitHubResponse::SearchResults {
        issues: collected
            .items
            .into_iter()
            .map(|raw| IssueNumber(raw.number))
            .collect(),
        may_be_incomplete: collected.may_be_incomplete,
    })
}

async fn list_labels(client: &OctocrabClient) -> Result<GitHubResponse, GitHubApiError> {
    let collected = Paginator::<RawLabel, Vec<RawLabel>>::new(
        client.inner(),
        client.repo_route("labels"),
        client.settings().pages,
    )
    .collect_all()
    .await?;

    Ok(GitHubResponse::Labels(
        collected.items.into_iter().map(|l| l.name).collect(),
    ))
}

// ─── Mutations ────────────────────────────────────────────────────────────────

async fn create_issue(
    client: &OctocrabClient,
    title: String,
    body: String,
    labels: Vec<String>,
) -> Result<GitHubResponse, GitHubApiError> {
    #[derive(Serialize)]
    struct CreateIssueRequest {
        title: String,
        body: String,
        labels: Vec<String>,
    }

    let request = CreateIssueRequest {
        title,
        body,
        labels,
    };

    let created: RawIssueRef = client
        .inner()
        .post(client.repo_route("issues"), Some(&request))
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::IssueCreated {
        number: IssueNumber(created.number),
    })
}

async fn add_labels(
    client: &OctocrabClient,
    issue: IssueNumber,
    labels: Vec<String>,
) -> Result<GitHubResponse, GitHubApiError> {
    #[derive(Serialize)]
    struct AddLabelsRequest {
        labels: Vec<String>,
    }

    let _: serde_json::Value = client
        .inner()
        .post(
            client.repo_route(&format!("issues/{}/labels", issue.0)),
            Some(&AddLabelsRequest { labels }),
        )
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::LabelsAdded)
}

async fn set_issue_state(
    client: &OctocrabClient,
    issue: IssueNumber,
    state: IssueState,
) -> Result<GitHubResponse, GitHubApiError> {
    #[derive(Serialize)]
    struct UpdateIssueRequest {
        state: &'static str,
    }

    let _: serde_json::Value = client
        .inner()
        .patch(
            client.repo_route(&format!("issues/{}", issue.0)),
            Some(&UpdateIssueRequest {
                state: state.as_api_str(),
            }),
        )
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::IssueStateSet)
}

async fn create_comment(
    client: &OctocrabClient,
    issue: IssueNumber,
    body: String,
) -> Result<GitHubResponse, GitHubApiError> {
    #[derive(Serialize)]
    struct CommentRequest {
        body: String,
    }

    let comment: RawComment = client
        .inner()
        .post(
            client.repo_route(&format!("issues/{}/comments", issue.0)),
            Some(&CommentRequest { body }),
        )
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::CommentCreated {
        id: CommentId(comment.id),
    })
}
