//! HTTP server for the issue bot.
//!
//! This module implements the HTTP server that:
//! - Accepts webhooks from GitHub, validates signatures, and dispatches them
//!   to plugins
//! - Provides health checks for liveness probes
//!
//! # Endpoints
//!
//! - `POST /webhook` - Accepts GitHub webhook deliveries
//! - `GET /health` - Returns 200 if server is running

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::effects::{GitHubInterpreter, RepoScoped};
use crate::plugins::{PluginRegistry, PluginSettings};
use crate::webhooks::WebhookSecret;

pub mod health;
pub mod webhook;

pub use health::health_handler;
pub use webhook::{WebhookError, webhook_handler};

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor.
pub struct AppState<G> {
    inner: Arc<AppStateInner<G>>,
}

impl<G> Clone for AppState<G> {
    fn clone(&self) -> Self {
        AppState {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct AppStateInner<G> {
    /// Webhook secret for HMAC-SHA256 signature verification.
    webhook_secret: WebhookSecret,

    registry: Arc<PluginRegistry<G>>,

    /// Template interpreter, scoped to each delivery's repository.
    github: G,

    settings: Arc<PluginSettings>,

    /// Cancelled on shutdown; in-flight handlers stop at their next call.
    shutdown: CancellationToken,
}

impl<G> AppState<G>
where
    G: GitHubInterpreter + RepoScoped + Send + Sync + 'static,
    G::Error: fmt::Display + Send,
{
    pub fn new(
        webhook_secret: WebhookSecret,
        registry: Arc<PluginRegistry<G>>,
        github: G,
        settings: Arc<PluginSettings>,
        shutdown: CancellationToken,
    ) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                webhook_secret,
                registry,
                github,
                settings,
                shutdown,
            }),
        }
    }

    pub fn webhook_secret(&self) -> &WebhookSecret {
        &self.inner.webhook_secret
    }

    pub fn registry(&self) -> &PluginRegistry<G> {
        &self.inner.registry
    }

    pub fn github(&self) -> &G {
        &self.inner.github
    }

    pub fn settings(&self) -> &Arc<PluginSettings> {
        &self.inner.settings
    }

    pub fn shutdown(&self) -> &CancellationToken {
        &self.inner.shutdown
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router<G>(app_state: AppState<G>) -> axum::Router
where
    G: GitHubInterpreter + RepoScoped + Send + Sync + 'static,
    G::Error: fmt::Display + Send,
{
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/webhook", post(webhook_handler::<G>))
        .route("/health", get(health_handler))
        .with_state(app_state)
}
