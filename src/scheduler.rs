//! Periodic `schedule.repository` events.
//!
//! Each configured repository gets its own task that dispatches a scan
//! through the plugin registry at a fixed interval. First ticks are
//! staggered by a delay derived from the repository name, so restarting the
//! bot does not scan every repository at the same moment.
//!
//! Tasks stop when the shutdown token is cancelled; a scan in flight is
//! abandoned at its next GitHub call.

use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::effects::{GitHubInterpreter, RepoScoped};
use crate::plugins::{DispatchReport, EventContext, PluginRegistry, PluginSettings};
use crate::types::RepoId;
use crate::webhooks::GitHubEvent;

/// Default time between scans of one repository (one day).
pub const DEFAULT_SCHEDULE_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Which repositories to scan and how often.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub repos: Vec<RepoId>,
    pub interval: Duration,
}

impl ScheduleConfig {
    pub fn new(repos: Vec<RepoId>, interval: Duration) -> Self {
        ScheduleConfig { repos, interval }
    }

    /// Delay before the first scan of `repo`.
    ///
    /// Deterministic per repository and below half the interval.
    pub fn initial_delay(&self, repo: &RepoId) -> Duration {
        let max_ms = (self.interval.as_millis() / 2).max(1) as u64;
        Duration::from_millis(repo_hash(repo) % max_ms)
    }
}

fn repo_hash(repo: &RepoId) -> u64 {
    let mut hasher = DefaultHasher::new();
    repo.hash(&mut hasher);
    hasher.finish()
}

/// Drives scheduled scans for a set of repositories.
pub struct Scheduler<G> {
    registry: Arc<PluginRegistry<G>>,
    github: G,
    settings: Arc<PluginSettings>,
    config: ScheduleConfig,
    shutdown: CancellationToken,
}

impl<G> Scheduler<G>
where
    G: GitHubInterpreter + RepoScoped + Send + Sync + 'static,
    G::Error: fmt::Display + Send,
{
    /// `github` is a template interpreter; each repository gets a scoped copy.
    pub fn new(
        registry: Arc<PluginRegistry<G>>,
        github: G,
        settings: Arc<PluginSettings>,
        config: ScheduleConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Scheduler {
            registry,
            github,
            settings,
            config,
            shutdown,
        }
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    /// Spawns one task per repository.
    pub fn spawn(self) -> Vec<JoinHandle<()>> {
        if self.config.repos.is_empty() {
            info!("No repositories scheduled for scanning");
        }

        self.config
            .repos
            .iter()
            .map(|repo| {
                let task = RepoSchedule {
                    registry: Arc::clone(&self.registry),
                    github: self.github.scoped_to(repo),
                    settings: Arc::clone(&self.settings),
                    repo: repo.clone(),
                    interval: self.config.interval,
                    initial_delay: self.config.initial_delay(repo),
                    cancel: self.shutdown.child_token(),
                };
                tokio::spawn(task.run())
            })
            .collect()
    }

    /// Scans `repo` once, immediately.
    pub async fn scan_now(&self, repo: &RepoId) -> DispatchReport {
        run_scan(
            &self.registry,
            self.github.scoped_to(repo),
            &self.settings,
            repo,
            &self.shutdown,
        )
        .await
    }
}

struct RepoSchedule<G> {
    registry: Arc<PluginRegistry<G>>,
    github: G,
    settings: Arc<PluginSettings>,
    repo: RepoId,
    interval: Duration,
    initial_delay: Duration,
    cancel: CancellationToken,
}

impl<G> RepoSchedule<G>
where
    G: GitHubInterpreter + RepoScoped + Send + Sync + 'static,
    G::Error: fmt::Display + Send,
{
    async fn run(self) {
        debug!(
            repo = %self.repo,
            initial_delay_ms = self.initial_delay.as_millis() as u64,
            interval_secs = self.interval.as_secs(),
            "Starting repository schedule"
        );

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return,
            _ = tokio::time::sleep(self.initial_delay) => {}
        }

        let mut ticker = tokio::time::interval(self.interval.max(MIN_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            run_scan(
                &self.registry,
                self.github.scoped_to(&self.repo),
                &self.settings,
                &self.repo,
                &self.cancel,
            )
            .await;
        }

        debug!(repo = %self.repo, "Repository schedule stopped");
    }
}

async fn run_scan<G>(
    registry: &PluginRegistry<G>,
    github: G,
    settings: &Arc<PluginSettings>,
    repo: &RepoId,
    cancel: &CancellationToken,
) -> DispatchReport
where
    G: GitHubInterpreter + Send + Sync,
    G::Error: fmt::Display + Send,
{
    let ctx = EventContext::new(
        GitHubEvent::Schedule { repo: repo.clone() },
        github,
        Arc::clone(settings),
    )
    .with_cancellation(cancel.clone());

    let report = registry.dispatch(&ctx).await;
    if report.is_success() {
        debug!(%repo, plugins = ?report.ran, "Scheduled scan finished");
    } else {
        warn!(%repo, failures = report.failures.len(), "Scheduled scan had failures");
    }
    report
}
