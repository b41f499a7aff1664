//! Webhook endpoint handler.
//!
//! Accepts GitHub webhook deliveries, validates signatures, parses the
//! payload, and runs the matching plugins before answering. GitHub marks a
//! delivery failed on any non-2xx status, so a handler failure answers 502
//! and the delivery can be redelivered from the GitHub UI.

use std::fmt;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::AppState;
use crate::effects::{GitHubInterpreter, RepoScoped};
use crate::plugins::EventContext;
use crate::types::DeliveryId;
use crate::webhooks::{ParseError, parse_webhook};

/// Header name for GitHub event type.
const HEADER_EVENT: &str = "x-github-event";
/// Header name for GitHub delivery ID.
const HEADER_DELIVERY: &str = "x-github-delivery";
/// Header name for GitHub signature.
const HEADER_SIGNATURE: &str = "x-hub-signature-256";

/// Errors that can occur when processing a webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Missing required header.
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    /// Invalid signature.
    #[error("invalid signature")]
    InvalidSignature,

    /// Body is not a valid payload for its event type.
    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] ParseError),

    /// At least one plugin failed.
    #[error("{event}: {failed} plugin(s) failed: {message}")]
    HandlerFailed {
        event: String,
        failed: usize,
        message: String,
    },
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::MissingHeader(_) => StatusCode::BAD_REQUEST,
            WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,
            WebhookError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            WebhookError::HandlerFailed { .. } => StatusCode::BAD_GATEWAY,
        };

        (status, self.to_string()).into_response()
    }
}

/// Webhook handler.
///
/// # Request
///
/// - Method: POST
/// - Required headers:
///   - `X-GitHub-Event`: Event type (e.g., "issues")
///   - `X-GitHub-Delivery`: Unique delivery ID (UUID format)
///   - `X-Hub-Signature-256`: HMAC-SHA256 signature of the payload
/// - Body: JSON webhook payload
///
/// # Response
///
/// - 200 OK: every matching plugin succeeded
/// - 202 Accepted: no plugin handles the event
/// - 400 Bad Request: Missing header or invalid payload
/// - 401 Unauthorized: Invalid signature
/// - 502 Bad Gateway: a plugin failed (usually a GitHub API error)
///
/// # Example
///
/// ```ignore
/// POST /webhook HTTP/1.1
/// X-GitHub-Event: issues
/// X-GitHub-Delivery: 550e8400-e29b-41d4-a716-446655440000
/// X-Hub-Signature-256: sha256=...
/// Content-Type: application/json
///
/// {"action": "closed", "issue": {...}, "repository": {...}}
///
/// HTTP/1.1 200 OK
/// ```
pub async fn webhook_handler<G>(
    State(app_state): State<AppState<G>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, &'static str), WebhookError>
where
    G: GitHubInterpreter + RepoScoped + Send + Sync + 'static,
    G::Error: fmt::Display + Send,
{
    let event_type = get_header(&headers, HEADER_EVENT)?;
    let delivery_id = DeliveryId::new(get_header(&headers, HEADER_DELIVERY)?);
    let signature_header = get_header(&headers, HEADER_SIGNATURE)?;

    debug!(
        delivery_id = %delivery_id,
        event_type = %event_type,
        "Received webhook"
    );

    // Verify signature before any parsing.
    if !app_state.webhook_secret().verify(&body, &signature_header) {
        warn!(delivery_id = %delivery_id, "Invalid webhook signature");
        return Err(WebhookError::InvalidSignature);
    }

    let Some(event) = parse_webhook(&event_type, &body).inspect_err(|e| {
        warn!(delivery_id = %delivery_id, error = %e, "Malformed webhook payload");
    })?
    else {
        debug!(delivery_id = %delivery_id, event_type = %event_type, "Ignoring event");
        return Ok((StatusCode::ACCEPTED, "Ignored"));
    };

    if !app_state.registry().handles(&event) {
        debug!(delivery_id = %delivery_id, event = %event.name(), "No plugin for event");
        return Ok((StatusCode::ACCEPTED, "Ignored"));
    }

    let event_name = event.name();
    let repo = event.repo_id().clone();
    let ctx = EventContext::new(
        event,
        app_state.github().scoped_to(&repo),
        app_state.settings().clone(),
    )
    .with_cancellation(app_state.shutdown().child_token());

    let report = app_state.registry().dispatch(&ctx).await;

    if report.is_success() {
        info!(
            delivery_id = %delivery_id,
            event = %event_name,
            repo = %repo,
            plugins = ?report.ran,
            "Webhook handled"
        );
        Ok((StatusCode::OK, "OK"))
    } else {
        let message = report
            .failures
            .iter()
            .map(|f| format!("{}: {}", f.plugin, f.error))
            .collect::<Vec<_>>()
            .join("; ");
        Err(WebhookError::HandlerFailed {
            event: event_name,
            failed: report.failures.len(),
            message,
        })
    }
}

/// Extracts a required header value as a string.
fn get_header(headers: &HeaderMap, name: &'static str) -> Result<String, WebhookError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .ok_or(WebhookError::MissingHeader(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_header_extracts_value() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_EVENT, "issues".parse().unwrap());

        assert_eq!(get_header(&headers, HEADER_EVENT).unwrap(), "issues");
        assert!(matches!(
            get_header(&headers, HEADER_DELIVERY),
            Err(WebhookError::MissingHeader(HEADER_DELIVERY))
        ));
    }

    #[test]
    fn error_status_codes() {
        let cases = [
            (WebhookError::MissingHeader(HEADER_EVENT), StatusCode::BAD_REQUEST),
            (WebhookError::InvalidSignature, StatusCode::UNAUTHORIZED),
            (
                WebhookError::HandlerFailed {
                    event: "issues.closed".into(),
                    failed: 1,
                    message: "boom".into(),
                },
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }
}
