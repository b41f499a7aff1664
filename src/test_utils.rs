//! Shared test utilities: a recording interpreter, an in-process GitHub API
//! double, and proptest generators.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{Method, Uri};
use octocrab::Octocrab;
use proptest::prelude::*;
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse, RepoScoped};
use crate::github::{ClientSettings, GitHubApiError, OctocrabClient, PageLimits, RetryPolicy};
use crate::types::{
    CommentId, IssueNumber, IssueTransition, RepoId, ScheduledDate, TransitionKind,
};
use crate::webhooks::IssueEvent;

type FailWhen = Arc<dyn Fn(&GitHubEffect) -> bool + Send + Sync>;

/// A fake GitHub that records every effect and answers from canned data.
///
/// Clones and repo-scoped copies share one call log.
#[derive(Clone)]
pub struct RecordingGitHub {
    repo: RepoId,
    calls: Arc<Mutex<Vec<(RepoId, GitHubEffect)>>>,
    labels: Vec<String>,
    history: Vec<IssueTransition>,
    /// `(needle, issues)`: a search whose query contains `needle` returns `issues`.
    searches: Vec<(String, Vec<IssueNumber>)>,
    fail_when: Option<FailWhen>,
    delay: Option<Duration>,
}

impl RecordingGitHub {
    pub fn new() -> Self {
        RecordingGitHub {
            repo: RepoId::new("test", "repo-test"),
            calls: Arc::new(Mutex::new(Vec::new())),
            labels: Vec::new(),
            history: Vec::new(),
            searches: Vec::new(),
            fail_when: None,
            delay: None,
        }
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_history(mut self, history: Vec<IssueTransition>) -> Self {
        self.history = history;
        self
    }

    pub fn with_search(mut self, needle: &str, issues: &[u64]) -> Self {
        self.searches.push((
            needle.to_string(),
            issues.iter().copied().map(IssueNumber).collect(),
        ));
        self
    }

    /// Makes every effect matching `predicate` fail permanently.
    pub fn failing_on(
        mut self,
        predicate: impl Fn(&GitHubEffect) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.fail_when = Some(Arc::new(predicate));
        self
    }

    /// Delays every response by `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// All recorded effects, in call order.
    pub fn calls(&self) -> Vec<GitHubEffect> {
        self.recorded().into_iter().map(|(_, e)| e).collect()
    }

    /// All recorded effects with the repository they targeted.
    pub fn recorded(&self) -> Vec<(RepoId, GitHubEffect)> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded effects matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&GitHubEffect) -> bool) -> usize {
        self.calls().iter().filter(|e| predicate(e)).count()
    }

    fn respond(&self, effect: &GitHubEffect) -> GitHubResponse {
        match effect {
            GitHubEffect::ListIssueEvents { .. } => GitHubResponse::IssueEvents {
                events: self.history.clone(),
                may_be_incomplete: false,
            },
            GitHubEffect::SearchIssues { query } => GitHubResponse::SearchResults {
                issues: self
                    .searches
                    .iter()
                    .find(|(needle, _)| query.contains(needle.as_str()))
                    .map(|(_, issues)| issues.clone())
                    .unwrap_or_default(),
                may_be_incomplete: false,
            },
            GitHubEffect::CreateIssue { .. } => GitHubResponse::IssueCreated {
                number: IssueNumber(1000),
            },
            GitHubEffect::AddLabels { .. } => GitHubResponse::LabelsAdded,
            GitHubEffect::SetIssueState { .. } => GitHubResponse::IssueStateSet,
            GitHubEffect::CreateComment { .. } => GitHubResponse::CommentCreated {
                id: CommentId(1),
            },
            GitHubEffect::ListLabels => GitHubResponse::Labels(self.labels.clone()),
        }
    }
}

impl Default for RecordingGitHub {
    fn default() -> Self {
        Self::new()
    }
}

impl GitHubInterpreter for RecordingGitHub {
    type Error = GitHubApiError;

    fn interpret(
        &self,
        effect: GitHubEffect,
    ) -> impl Future<Output = Result<GitHubResponse, Self::Error>> + Send {
        self.calls
            .lock()
            .unwrap()
            .push((self.repo.clone(), effect.clone()));

        let failed = self.fail_when.as_ref().is_some_and(|f| f(&effect));
        let response = self.respond(&effect);
        let delay = self.delay;

        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if failed {
                return Err(GitHubApiError::permanent_without_source(format!(
                    "injected failure for {}",
                    effect.name()
                )));
            }
            Ok(response)
        }
    }
}

impl RepoScoped for RecordingGitHub {
    fn scoped_to(&self, repo: &RepoId) -> Self {
        RecordingGitHub {
            repo: repo.clone(),
            ..self.clone()
        }
    }
}

// ─── HTTP double ──────────────────────────────────────────────────────────────

/// One HTTP request received by [`MockGitHubApi`].
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    /// JSON body, or `Null` for bodiless requests.
    pub body: Value,
}

impl CapturedRequest {
    /// The `page` query parameter, defaulting to the first page.
    pub fn page(&self) -> usize {
        self.query
            .get("page")
            .and_then(|p| p.parse().ok())
            .unwrap_or(1)
    }

    pub fn per_page(&self) -> usize {
        self.query
            .get("per_page")
            .and_then(|p| p.parse().ok())
            .unwrap_or(30)
    }
}

type Responder = Arc<dyn Fn(&CapturedRequest) -> Value + Send + Sync>;

#[derive(Clone)]
struct MockState {
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    responder: Responder,
}

/// A local HTTP server standing in for `api.github.com`.
///
/// Every request is captured and answered with `200` and the JSON returned
/// by the responder.
pub struct MockGitHubApi {
    uri: String,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    server: JoinHandle<()>,
}

impl MockGitHubApi {
    pub async fn start(
        responder: impl Fn(&CapturedRequest) -> Value + Send + Sync + 'static,
    ) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            requests: Arc::clone(&requests),
            responder: Arc::new(responder),
        };
        let router = axum::Router::new().fallback(capture).with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        MockGitHubApi {
            uri: format!("http://{addr}"),
            requests,
            server,
        }
    }

    /// An octocrab instance whose base URI is this server.
    pub fn octocrab(&self) -> Octocrab {
        Octocrab::builder()
            .base_uri(self.uri.as_str())
            .unwrap()
            .personal_token("test-token".to_string())
            .build()
            .unwrap()
    }

    /// A client for `repo` that never retries.
    pub fn client(&self, repo: RepoId, pages: PageLimits) -> OctocrabClient {
        OctocrabClient::new(
            self.octocrab(),
            repo,
            ClientSettings {
                retry_policy: RetryPolicy::NoRetry,
                pages,
                ..ClientSettings::default()
            },
        )
    }

    /// Requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for MockGitHubApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn capture(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Json<Value> {
    let request = CapturedRequest {
        method,
        path: uri.path().to_string(),
        query,
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    };
    let response = (state.responder)(&request);
    state.requests.lock().unwrap().push(request);
    Json(response)
}

// ─── Generators ───────────────────────────────────────────────────────────────

/// Dates whose two-week successor still has a four-digit year.
pub fn arb_scheduled_date() -> impl Strategy<Value = ScheduledDate> {
    (1000i32..=9998, 1u32..=12, 1u32..=31)
        .prop_filter_map("valid calendar date", |(y, m, d)| {
            ScheduledDate::from_ymd(y, m, d)
        })
}

pub fn arb_transition() -> impl Strategy<Value = IssueTransition> {
    prop_oneof![
        Just(IssueTransition::closed()),
        Just(IssueTransition::reopened()),
        "[a-z_]{1,12}".prop_map(|name| IssueTransition::new(TransitionKind::from_api_name(&name))),
    ]
}

pub fn arb_history() -> impl Strategy<Value = Vec<IssueTransition>> {
    prop::collection::vec(arb_transition(), 0..8)
}

pub fn arb_repo_id() -> impl Strategy<Value = RepoId> {
    ("[a-z][a-z0-9-]{0,15}", "[a-z][a-z0-9._-]{0,15}")
        .prop_map(|(owner, repo)| RepoId::new(owner, repo))
}

pub fn arb_issue_event() -> impl Strategy<Value = IssueEvent> {
    (
        arb_repo_id(),
        1u64..100_000,
        ".{0,60}",
        prop::collection::btree_set("[a-z ]{1,12}", 0..4),
    )
        .prop_map(|(repo, number, title, labels)| IssueEvent {
            repo,
            number: IssueNumber(number),
            title,
            labels,
        })
}
