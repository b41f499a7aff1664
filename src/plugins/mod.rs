//! Plugins and the event registry that dispatches to them.
//!
//! A plugin is a set of handler functions registered under event names.
//! The registry is built once at startup and passed to the server and the
//! scheduler; there is no global handler table.
//!
//! # Dispatch
//!
//! An event named `issues.closed` runs the handlers registered under
//! `issues.closed` and under `issues`, in registration order. Every matching
//! handler runs even if an earlier one fails; failures are collected in the
//! [`DispatchReport`].

pub mod auto_closer;
pub mod release_issues;

use std::collections::BTreeMap;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::actuator::{Actuator, ActuatorError};
use crate::effects::GitHubInterpreter;
use crate::rules::{AutoCloseSettings, ReleaseRule};
use crate::types::IssueNumber;
use crate::webhooks::GitHubEvent;

/// Errors surfaced by plugin handlers.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error(transparent)]
    Actuator(#[from] ActuatorError),

    /// Some issues of an auto-close run could not be processed.
    #[error("{} of {attempted} issues failed: {}", failed.len(), describe_failures(failed))]
    PartialFailure {
        attempted: usize,
        failed: Vec<(IssueNumber, String)>,
    },

    /// The handler was dispatched an event it does not understand.
    #[error("cannot handle event {0}")]
    WrongEvent(String),
}

fn describe_failures(failed: &[(IssueNumber, String)]) -> String {
    failed
        .iter()
        .map(|(issue, reason)| format!("{issue}: {reason}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Settings shared by every plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginSettings {
    pub release: ReleaseRule,
    pub auto_close: AutoCloseSettings,
    /// Page size when listing an issue's events.
    pub events_page_size: u8,
    /// Upper bound on a single GitHub call, retries included.
    pub request_timeout: Option<Duration>,
    /// Issues the auto-closer processes at once.
    pub auto_close_concurrency: usize,
}

impl Default for PluginSettings {
    fn default() -> Self {
        PluginSettings {
            release: ReleaseRule::default(),
            auto_close: AutoCloseSettings::default(),
            events_page_size: 100,
            request_timeout: None,
            auto_close_concurrency: 4,
        }
    }
}

/// Everything a handler sees for one event.
pub struct EventContext<G> {
    pub event: GitHubEvent,
    /// Interpreter scoped to the event's repository.
    pub github: G,
    pub settings: Arc<PluginSettings>,
    /// Wall-clock time the event is processed at.
    pub now: DateTime<Utc>,
    pub cancel: CancellationToken,
}

impl<G> EventContext<G>
where
    G: GitHubInterpreter,
    G::Error: fmt::Display,
{
    pub fn new(event: GitHubEvent, github: G, settings: Arc<PluginSettings>) -> Self {
        EventContext {
            event,
            github,
            settings,
            now: Utc::now(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// An actuator over this context's interpreter, timeout, and shutdown token.
    pub fn actuator(&self) -> Actuator<'_, G> {
        Actuator::new(&self.github)
            .with_timeout(self.settings.request_timeout)
            .with_cancellation(self.cancel.clone())
    }
}

pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<(), PluginError>> + Send + 'a>>;

/// A plugin entry point.
pub type Handler<G> = for<'a> fn(&'a EventContext<G>) -> HandlerFuture<'a>;

struct Registration<G> {
    seq: usize,
    plugin: &'static str,
    handler: Handler<G>,
}

/// One handler failure.
#[derive(Debug)]
pub struct PluginFailure {
    pub plugin: &'static str,
    pub error: PluginError,
}

/// What a dispatch did.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Plugins that ran, in order.
    pub ran: Vec<&'static str>,
    pub failures: Vec<PluginFailure>,
}

impl DispatchReport {
    /// True if no handler was registered for the event.
    pub fn is_ignored(&self) -> bool {
        self.ran.is_empty()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Maps event names to handlers.
pub struct PluginRegistry<G> {
    handlers: BTreeMap<String, Vec<Registration<G>>>,
    next_seq: usize,
}

impl<G> Default for PluginRegistry<G> {
    fn default() -> Self {
        PluginRegistry {
            handlers: BTreeMap::new(),
            next_seq: 0,
        }
    }
}

impl<G> PluginRegistry<G>
where
    G: GitHubInterpreter + Send + Sync,
    G::Error: fmt::Display + Send,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry with every built-in plugin.
    pub fn with_default_plugins() -> Self {
        let mut registry = Self::new();
        release_issues::register(&mut registry);
        auto_closer::register(&mut registry);
        registry
    }

    /// Registers `handler` for events named `event` (`issues` or `issues.closed`).
    pub fn on(&mut self, event: &str, plugin: &'static str, handler: Handler<G>) -> &mut Self {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.handlers
            .entry(event.to_string())
            .or_default()
            .push(Registration {
                seq,
                plugin,
                handler,
            });
        self
    }

    /// Event names with at least one handler.
    pub fn event_names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Plugins registered under exactly `event`.
    pub fn plugins_for(&self, event: &str) -> Vec<&'static str> {
        self.handlers
            .get(event)
            .map(|regs| regs.iter().map(|r| r.plugin).collect())
            .unwrap_or_default()
    }

    /// True if dispatching `event` would run anything.
    pub fn handles(&self, event: &GitHubEvent) -> bool {
        !self.matching(event).is_empty()
    }

    fn matching(&self, event: &GitHubEvent) -> Vec<&Registration<G>> {
        let name = event.name();
        let mut matched: Vec<&Registration<G>> = [name.as_str(), event.kind()]
            .into_iter()
            .filter_map(|key| self.handlers.get(key))
            .flatten()
            .collect();
        matched.sort_by_key(|r| r.seq);
        matched.dedup_by_key(|r| r.seq);
        matched
    }

    /// Runs every handler matching the context's event.
    pub async fn dispatch(&self, ctx: &EventContext<G>) -> DispatchReport {
        let mut report = DispatchReport::default();
        let matched = self.matching(&ctx.event);

        if matched.is_empty() {
            debug!(event = %ctx.event.name(), "No plugin handles event");
            return report;
        }

        for registration in matched {
            debug!(
                event = %ctx.event.name(),
                plugin = registration.plugin,
                "Running plugin"
            );
            report.ran.push(registration.plugin);
            if let Err(error) = (registration.handler)(ctx).await {
                warn!(
                    event = %ctx.event.name(),
                    repo = %ctx.event.repo_id(),
                    plugin = registration.plugin,
                    error = %error,
                    "Plugin failed"
                );
                report.failures.push(PluginFailure {
                    plugin: registration.plugin,
                    error,
                });
            }
        }

        report
    }
}
