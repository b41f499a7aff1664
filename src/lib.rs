//! Issue Bot - GitHub webhook plugins for issue housekeeping.
//!
//! Two plugins ship with the bot: `release-issues` opens the next scheduled
//! release issue when the current one is closed, and `auto-closer` closes
//! issues that have been inactive for too long.
//!
//! Plugins never call GitHub directly; they describe [`effects`] that an
//! interpreter executes, which keeps the rules testable without a network.

pub mod actuator;
pub mod config;
pub mod effects;
pub mod github;
pub mod plugins;
pub mod rules;
pub mod scheduler;
pub mod server;
pub mod types;
pub mod webhooks;

#[cfg(test)]
pub(crate) mod test_utils;
