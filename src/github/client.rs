//! Octocrab client wrapper scoped to a specific repository.
//!
//! This module provides `OctocrabClient`, which wraps an `Octocrab` instance
//! and scopes all operations to a specific repository. This matches the design
//! where effects are repo-scoped (the `GitHubEffect` enum doesn't include repo info).

use std::time::Duration;

use octocrab::Octocrab;

use crate::effects::RepoScoped;
use crate::types::RepoId;

use super::pagination::PageLimits;
use super::retry::{RetryConfig, RetryPolicy};

/// Retry and pagination behavior shared by every scoped client.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClientSettings {
    pub retry: RetryConfig,
    pub retry_policy: RetryPolicy,
    pub pages: PageLimits,
}

/// Builds an octocrab instance authenticated with a personal access token.
///
/// `timeout` bounds connecting to GitHub and reading each response.
pub fn build_octocrab(
    token: impl Into<String>,
    timeout: Option<Duration>,
) -> Result<Octocrab, octocrab::Error> {
    Octocrab::builder()
        .personal_token(token.into())
        .set_connect_timeout(timeout)
        .set_read_timeout(timeout)
        .build()
}

/// A GitHub API client scoped to a specific repository.
///
/// All operations performed through this client target the same repository,
/// matching the design where `GitHubEffect` variants don't include repo info.
#[derive(Clone)]
pub struct OctocrabClient {
    /// The underlying octocrab client.
    client: Octocrab,

    /// The repository this client is scoped to.
    repo: RepoId,

    settings: ClientSettings,
}

impl OctocrabClient {
    /// Creates a new client scoped to the given repository.
    pub fn new(client: Octocrab, repo: RepoId, settings: ClientSettings) -> Self {
        Self {
            client,
            repo,
            settings,
        }
    }

    /// Creates a client not yet scoped to any repository.
    ///
    /// Webhook deliveries and scheduled scans call [`RepoScoped::scoped_to`]
    /// on it before running effects.
    pub fn unscoped(client: Octocrab, settings: ClientSettings) -> Self {
        Self::new(client, RepoId::new("", ""), settings)
    }

    /// Creates a client from a GitHub token with default settings.
    pub fn from_token(token: impl Into<String>, repo: RepoId) -> Result<Self, octocrab::Error> {
        let client = build_octocrab(token, None)?;
        Ok(Self::new(client, repo, ClientSettings::default()))
    }

    /// Returns a client for another repository sharing this client's connection
    /// pool and settings.
    pub fn rescoped(&self, repo: RepoId) -> Self {
        Self::new(self.client.clone(), repo, self.settings)
    }

    /// Returns a reference to the underlying octocrab client.
    pub fn inner(&self) -> &Octocrab {
        &self.client
    }

    /// Returns the repository this client is scoped to.
    pub fn repo(&self) -> &RepoId {
        &self.repo
    }

    /// Returns the repository owner.
    pub fn owner(&self) -> &str {
        &self.repo.owner
    }

    /// Returns the repository name.
    pub fn repo_name(&self) -> &str {
        &self.repo.repo
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Returns a copy that handles transient errors according to `policy`.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.settings.retry_policy = policy;
        self
    }

    /// Builds a `/repos/{owner}/{repo}/...` route.
    pub fn repo_route(&self, suffix: &str) -> String {
        format!("/repos/{}/{}/{}", self.owner(), self.repo_name(), suffix)
    }
}

impl RepoScoped for OctocrabClient {
    fn scoped_to(&self, repo: &RepoId) -> Self {
        self.rescoped(repo.clone())
    }
}

impl std::fmt::Debug for OctocrabClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OctocrabClient")
            .field("repo", &self.repo)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn retry_policy_survives_rescoping() {
        let octocrab = Octocrab::builder().build().unwrap();
        let client = OctocrabClient::unscoped(octocrab, ClientSettings::default())
            .with_retry_policy(RetryPolicy::NoRetry);

        let scoped = client.scoped_to(&RepoId::new("eslint", "eslint"));

        assert_eq!(scoped.settings().retry_policy, RetryPolicy::NoRetry);
        assert_eq!(scoped.repo_route("labels"), "/repos/eslint/eslint/labels");
    }
}
