//! Webhook endpoint handler.
//!
//! Validates the delivery, hands it to the dispatcher and answers straight
//! away. Handler work happens on background tasks; its outcome never reaches
//! the HTTP response.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use tracing::{debug, info, info_span, warn};

use super::AppState;
use crate::dispatch::DispatchOutcome;
use crate::webhooks::ValidationError;

/// Webhook handler.
///
/// # Response
///
/// - 200 OK: delivery accepted (including unsupported event types and
///   payloads that fail to decode, which are logged and dropped)
/// - 400 Bad Request: missing header, unknown client or wrong content type
/// - 403 Forbidden: missing or invalid signature
/// - 405 Method Not Allowed: anything but POST
/// - 500 Internal Server Error: the body could not be read
///
/// # Example
///
/// ```ignore
/// POST /github-hook HTTP/1.1
/// X-GitHub-Event: pull_request
/// X-GitHub-Delivery: 550e8400-e29b-41d4-a716-446655440000
/// X-Hub-Signature-256: sha256=...
/// Content-Type: application/json
///
/// {"action": "opened", "pull_request": {...}, "repository": {...}}
///
/// HTTP/1.1 200 OK
/// ```
pub async fn webhook_handler(
    State(app_state): State<AppState>,
    request: Request,
) -> Result<(StatusCode, &'static str), ValidationError> {
    let envelope = app_state.validator().validate(request).await?;

    let span = info_span!(
        "webhook",
        event_type = %envelope.event_type,
        delivery_id = %envelope.delivery_id,
    );
    span.in_scope(|| {
        info!("Received webhook");
        match app_state
            .dispatcher()
            .dispatch(&envelope.event_type, &envelope.payload)
        {
            Ok(DispatchOutcome::Scheduled) => debug!("Handler scheduled"),
            Ok(outcome) => debug!(?outcome, "Webhook not handled"),
            Err(e) => warn!(error = %e, "Dropping undecodable webhook payload"),
        }
    });

    Ok((StatusCode::OK, "OK"))
}
