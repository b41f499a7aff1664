//! Command-line and environment configuration.
//!
//! Every option can be given as a flag or through its environment variable;
//! secrets are normally passed through the environment only.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::github::{ClientSettings, PageLimits, RetryConfig, RetryPolicy};
use crate::plugins::PluginSettings;
use crate::rules::release::DEFAULT_GUIDELINES_URL;
use crate::rules::{AutoCloseSettings, ReleaseRule};
use crate::scheduler::ScheduleConfig;
use crate::types::RepoId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("webhook secret must not be empty")]
    EmptyWebhookSecret,

    #[error("GitHub token must not be empty")]
    EmptyToken,

    #[error("schedule interval must be at least one second")]
    ZeroScheduleInterval,

    #[error("auto-close concurrency must be at least 1")]
    ZeroConcurrency,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "issue-bot")]
#[command(about = "GitHub bot that schedules release issues and auto-closes stale issues")]
pub struct Config {
    /// Address the webhook server listens on
    #[arg(long, env = "ISSUE_BOT_LISTEN_ADDR", default_value = "0.0.0.0:3000")]
    pub listen_addr: SocketAddr,

    /// Secret configured on the GitHub webhook
    #[arg(long, env = "GITHUB_WEBHOOK_SECRET", hide_env_values = true)]
    pub webhook_secret: String,

    /// Personal access token used for API calls
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: String,

    /// Repositories scanned by the auto-closer (comma-separated owner/repo)
    #[arg(
        long = "scheduled-repo",
        env = "ISSUE_BOT_SCHEDULED_REPOS",
        value_delimiter = ','
    )]
    pub scheduled_repos: Vec<RepoId>,

    /// Seconds between scans of each scheduled repository
    #[arg(long, env = "ISSUE_BOT_SCHEDULE_INTERVAL_SECS", default_value_t = 86_400)]
    pub schedule_interval_secs: u64,

    /// Page size when listing issue events
    #[arg(
        long,
        env = "ISSUE_BOT_EVENTS_PAGE_SIZE",
        default_value_t = 100,
        value_parser = clap::value_parser!(u8).range(1..=100)
    )]
    pub events_page_size: u8,

    /// Maximum pages fetched per listing or search
    #[arg(long, env = "ISSUE_BOT_MAX_PAGES", default_value_t = 10)]
    pub max_pages: u32,

    /// Retries for transient GitHub errors
    #[arg(long, env = "ISSUE_BOT_MAX_RETRIES", default_value_t = 3)]
    pub max_retries: u32,

    /// Timeout for one GitHub call including retries, in seconds (0 disables)
    #[arg(long, env = "ISSUE_BOT_REQUEST_TIMEOUT_SECS", default_value_t = 60)]
    pub request_timeout_secs: u64,

    /// Issues the auto-closer processes concurrently
    #[arg(long, env = "ISSUE_BOT_AUTO_CLOSE_CONCURRENCY", default_value_t = 4)]
    pub auto_close_concurrency: usize,

    /// Retry transient GitHub errors while answering a webhook delivery
    #[arg(long, env = "ISSUE_BOT_WEBHOOK_RETRIES", default_value_t = false)]
    pub webhook_retries: bool,

    /// Link to the release guidelines in new release issues
    #[arg(long, env = "ISSUE_BOT_RELEASE_GUIDELINES_URL", default_value = DEFAULT_GUIDELINES_URL)]
    pub release_guidelines_url: String,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.webhook_secret.is_empty() {
            return Err(ConfigError::EmptyWebhookSecret);
        }
        if self.github_token.trim().is_empty() {
            return Err(ConfigError::EmptyToken);
        }
        if self.schedule_interval_secs == 0 {
            return Err(ConfigError::ZeroScheduleInterval);
        }
        if self.auto_close_concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            retry: RetryConfig::DEFAULT.with_max_retries(self.max_retries),
            pages: PageLimits::new(100, self.max_pages),
            ..ClientSettings::default()
        }
    }

    /// Retry policy for effects run while GitHub waits on a delivery.
    ///
    /// GitHub gives up on a delivery after 10 seconds, less than the default
    /// backoff schedule, so webhook effects fail fast unless retries are
    /// enabled. Scheduled scans always retry.
    pub fn webhook_retry_policy(&self) -> RetryPolicy {
        if self.webhook_retries {
            RetryPolicy::RetryTransient
        } else {
            RetryPolicy::NoRetry
        }
    }

    pub fn plugin_settings(&self) -> PluginSettings {
        PluginSettings {
            release: ReleaseRule {
                guidelines_url: self.release_guidelines_url.clone(),
                ..ReleaseRule::default()
            },
            auto_close: AutoCloseSettings::default(),
            events_page_size: self.events_page_size,
            request_timeout: self.request_timeout(),
            auto_close_concurrency: self.auto_close_concurrency,
        }
    }

    pub fn schedule_config(&self) -> ScheduleConfig {
        ScheduleConfig::new(
            self.scheduled_repos.clone(),
            Duration::from_secs(self.schedule_interval_secs),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Config {
        let mut args = vec![
            "issue-bot",
            "--webhook-secret",
            "s3cret",
            "--github-token",
            "ghp_test",
        ];
        args.extend_from_slice(extra);
        Config::try_parse_from(args).unwrap()
    }

    #[test]
    fn defaults() {
        let config = parse(&[]);

        assert_eq!(config.listen_addr, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.schedule_interval_secs, 86_400);
        assert_eq!(config.events_page_size, 100);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(60)));
        assert!(config.validate().is_ok());

        let plugins = config.plugin_settings();
        assert_eq!(plugins.auto_close, AutoCloseSettings::default());
        assert_eq!(plugins.release, ReleaseRule::default());
        assert_eq!(plugins.auto_close_concurrency, 4);

        let client = config.client_settings();
        assert_eq!(client.retry, RetryConfig::DEFAULT);
        assert_eq!(client.pages, PageLimits::DEFAULT);
    }

    #[test]
    fn scheduled_repos_are_comma_separated() {
        let config = parse(&["--scheduled-repo", "eslint/eslint,https://github.com/eslint/espree"]);
        assert_eq!(
            config.scheduled_repos,
            vec![RepoId::new("eslint", "eslint"), RepoId::new("eslint", "espree")]
        );
        assert_eq!(config.schedule_config().repos.len(), 2);
    }

    #[test]
    fn invalid_repo_is_rejected() {
        let result = Config::try_parse_from([
            "issue-bot",
            "--webhook-secret",
            "s",
            "--github-token",
            "t",
            "--scheduled-repo",
            "not-a-repo",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn page_size_is_range_checked() {
        let result = Config::try_parse_from([
            "issue-bot",
            "--webhook-secret",
            "s",
            "--github-token",
            "t",
            "--events-page-size",
            "101",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn webhook_retries_are_opt_in() {
        assert_eq!(parse(&[]).webhook_retry_policy(), RetryPolicy::NoRetry);
        assert_eq!(
            parse(&["--webhook-retries"]).webhook_retry_policy(),
            RetryPolicy::RetryTransient
        );
        assert_eq!(
            parse(&[]).client_settings().retry_policy,
            RetryPolicy::RetryTransient
        );
    }

    #[test]
    fn zero_timeout_disables() {
        let config = parse(&["--request-timeout-secs", "0"]);
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.plugin_settings().request_timeout, None);
    }

    #[test]
    fn validation_errors() {
        assert_eq!(
            parse(&["--schedule-interval-secs", "0"]).validate(),
            Err(ConfigError::ZeroScheduleInterval)
        );
        assert_eq!(
            parse(&["--auto-close-concurrency", "0"]).validate(),
            Err(ConfigError::ZeroConcurrency)
        );

        let mut config = parse(&[]);
        config.github_token = "  ".into();
        assert_eq!(config.validate(), Err(ConfigError::EmptyToken));
    }
}
