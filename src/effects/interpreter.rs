//! Effect interpreter trait.
//!
//! The trait-based design enables:
//! - The octocrab-backed interpreter in [`crate::github`]
//! - Recording interpreters for testing
//! - Wrapping interpreters (e.g. dry-run logging)

use std::future::Future;

use crate::types::RepoId;

use super::github::{GitHubEffect, GitHubResponse};

/// Interprets GitHub effects against the GitHub API.
///
/// Implementations are constructed with a `RepoId`, so all effects executed
/// through a single interpreter instance are scoped to that repository.
///
/// # Example (mock for testing)
///
/// ```ignore
/// struct MockGitHubInterpreter {
///     responses: HashMap<GitHubEffect, GitHubResponse>,
/// }
///
/// impl GitHubInterpreter for MockGitHubInterpreter {
///     type Error = anyhow::Error;
///
///     async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, Self::Error> {
///         self.responses.get(&effect)
///             .cloned()
///             .ok_or_else(|| anyhow!("unexpected effect: {:?}", effect))
///     }
/// }
/// ```
pub trait GitHubInterpreter {
    /// The error type returned by this interpreter.
    type Error;

    /// Execute a GitHub effect and return its response.
    fn interpret(
        &self,
        effect: GitHubEffect,
    ) -> impl Future<Output = Result<GitHubResponse, Self::Error>> + Send;
}

/// An interpreter that can be re-targeted at another repository.
///
/// Webhook deliveries and scheduled scans name their repository, so the
/// server keeps one template interpreter and scopes a copy per event.
pub trait RepoScoped {
    /// Returns an interpreter for `repo` sharing this one's connection and settings.
    fn scoped_to(&self, repo: &RepoId) -> Self;
}
