//! GitHub API client and effect interpreter.
//!
//! This module provides the implementation for executing GitHub effects via the octocrab
//! library. It implements the `GitHubInterpreter` trait defined in the effects module.
//!
//! Key features:
//! - Exponential backoff retry for transient failures
//! - Distinguishes transient vs permanent errors
//! - Bounded, restartable pagination for list and search endpoints

mod client;
mod error;
mod interpreter;
mod pagination;
mod retry;

pub use client::{ClientSettings, OctocrabClient, build_octocrab};
pub use error::{GitHubApiError, GitHubErrorKind};
pub use interpreter::interpret_github_effect;
pub use pagination::{Collected, PageBody, PageCursor, PageLimits, Paginator, SearchPage};
pub use retry::{RetryConfig, RetryPolicy, RetryResult, retry_with_backoff};
