//! Core domain types for the issue bot.
//!
//! This module contains the identifiers and value types shared by the rules,
//! the effect layer, and the webhook parser.

pub mod date;
pub mod ids;
pub mod issue;

pub use date::{RELEASE_TITLE_PREFIX, ScheduledDate};
pub use ids::{CommentId, DeliveryId, InvalidRepoId, IssueNumber, RepoId};
pub use issue::{IssueState, IssueTransition, TransitionKind};
