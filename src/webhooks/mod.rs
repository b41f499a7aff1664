//! Webhook handling for GitHub events.
//!
//! This module provides:
//! - Signature verification for webhook payloads (HMAC-SHA256)
//! - Typed events and the payload parser

pub mod events;
pub mod parser;
pub mod signature;

pub use events::{GitHubEvent, IssueAction, IssueEvent, SCHEDULE_REPOSITORY};
pub use parser::{ParseError, parse_webhook};
pub use signature::{
    WebhookSecret, compute_signature, format_signature_header, parse_signature_header,
    verify_signature,
};
