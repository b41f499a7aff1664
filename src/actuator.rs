//! Effect execution with a per-call timeout and cancellation.
//!
//! The [`Actuator`] is the only place plugins touch the network. It runs
//! [`GitHubEffect`]s one at a time through a [`GitHubInterpreter`], bounding
//! each call by an optional timeout and abandoning it when the shutdown token
//! fires. Retries happen below, inside the interpreter.

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace, warn};

use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse};

/// Errors from effect execution.
#[derive(Debug, Error)]
pub enum ActuatorError {
    /// Shutdown was requested before or during the call.
    #[error("operation cancelled")]
    Cancelled,

    /// The call did not finish within the configured timeout.
    #[error("{effect} timed out after {after:?}")]
    Timeout {
        effect: &'static str,
        after: Duration,
    },

    /// The interpreter reported a failure (after its own retries).
    #[error("GitHub API error: {0}")]
    GitHub(String),

    /// The interpreter answered with the wrong response variant.
    #[error("unexpected response to {effect}: {response}")]
    UnexpectedResponse {
        effect: &'static str,
        response: String,
    },
}

impl ActuatorError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ActuatorError::Cancelled)
    }

    pub(crate) fn unexpected(effect: &'static str, response: &GitHubResponse) -> Self {
        ActuatorError::UnexpectedResponse {
            effect,
            response: format!("{response:?}"),
        }
    }
}

/// Executes effects against one repository.
///
/// # Example
///
/// ```ignore
/// let actuator = Actuator::new(&client).with_timeout(Some(Duration::from_secs(30)));
/// let responses = actuator.execute_all(action.into_effects()).await?;
/// ```
pub struct Actuator<'a, G> {
    github: &'a G,
    timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl<'a, G> Actuator<'a, G>
where
    G: GitHubInterpreter,
    G::Error: fmt::Display,
{
    /// Creates an actuator with no timeout and a token that never fires.
    pub fn new(github: &'a G) -> Self {
        Actuator {
            github,
            timeout: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Executes one effect.
    #[instrument(skip_all, fields(effect = effect.name(), mutation = effect.is_mutation()))]
    pub async fn execute(&self, effect: GitHubEffect) -> Result<GitHubResponse, ActuatorError> {
        if self.cancel.is_cancelled() {
            debug!("Cancellation detected before effect execution");
            return Err(ActuatorError::Cancelled);
        }

        trace!(?effect, "Executing GitHub effect");
        let name = effect.name();
        let call = self.github.interpret(effect);

        let result = tokio::select! {
            biased;

            _ = self.cancel.cancelled() => {
                debug!("GitHub effect cancelled");
                return Err(ActuatorError::Cancelled);
            }
            result = with_optional_timeout(self.timeout, call) => result,
        };

        match result {
            Some(Ok(response)) => Ok(response),
            Some(Err(e)) => {
                warn!(error = %e, "GitHub effect failed");
                Err(ActuatorError::GitHub(e.to_string()))
            }
            None => {
                let after = self.timeout.unwrap_or_default();
                warn!(?after, "GitHub effect timed out");
                Err(ActuatorError::Timeout {
                    effect: name,
                    after,
                })
            }
        }
    }

    /// Executes effects in order, stopping at the first failure.
    pub async fn execute_all(
        &self,
        effects: impl IntoIterator<Item = GitHubEffect>,
    ) -> Result<Vec<GitHubResponse>, ActuatorError> {
        let mut responses = Vec::new();
        for effect in effects {
            responses.push(self.execute(effect).await?);
        }
        Ok(responses)
    }
}

/// Awaits `fut`, returning `None` if it outlives `timeout`.
async fn with_optional_timeout<F: Future>(timeout: Option<Duration>, fut: F) -> Option<F::Output> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut).await.ok(),
        None => Some(fut.await),
    }
}
