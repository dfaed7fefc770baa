//! Authentication of inbound webhook requests.
//!
//! A request is accepted only if every check below passes, evaluated in order
//! and stopping at the first failure:
//!
//! | # | Check | Rejection |
//! |---|-------|-----------|
//! | 1 | method is `POST` | 405 |
//! | - | `User-Agent` matches the configured client id (if any) | 400 |
//! | 2 | `X-GitHub-Event` present | 400 |
//! | 3 | `X-GitHub-Delivery` present | 400 |
//! | 4 | `X-Hub-Signature-256` present | 403 |
//! | 5 | `Content-Type` is exactly `application/json` | 400 |
//! | 6 | body readable | 500 |
//! | 7 | HMAC of the body matches the signature | 403 |
//!
//! The secret is fetched from the [`SecretSource`] for every request, so a
//! rotated secret takes effect on the next delivery.

use std::fmt;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::Request;
use axum::http::{HeaderMap, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::debug;

use super::signature::verify_signature;
use crate::types::DeliveryId;

/// Header name for GitHub event type.
pub const HEADER_EVENT: &str = "x-github-event";
/// Header name for GitHub delivery ID.
pub const HEADER_DELIVERY: &str = "x-github-delivery";
/// Header name for GitHub signature.
pub const HEADER_SIGNATURE: &str = "x-hub-signature-256";

/// The only accepted request media type.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Default cap on a delivery body. GitHub caps payloads at 25 MB.
pub const DEFAULT_BODY_LIMIT: usize = 25 * 1024 * 1024;

/// Reasons a request is refused before any parsing happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("405 Method not allowed")]
    MethodNotAllowed,

    #[error("400 Bad Request: unknown User-Agent Header")]
    UnknownClient,

    #[error("400 Bad Request: Missing X-GitHub-Event Header")]
    MissingEvent,

    #[error("400 Bad Request: Missing X-GitHub-Delivery Header")]
    MissingDelivery,

    #[error("403 Forbidden: Missing X-Hub-Signature")]
    MissingSignature,

    #[error(
        "400 Bad Request: Hook only accepts content-type: application/json - please reconfigure this hook on GitHub"
    )]
    WrongContentType,

    #[error("500 Internal Server Error: Failed to read request body")]
    UnreadableBody,

    #[error("403 Forbidden: Invalid X-Hub-Signature")]
    InvalidSignature,
}

impl ValidationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ValidationError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ValidationError::UnknownClient
            | ValidationError::MissingEvent
            | ValidationError::MissingDelivery
            | ValidationError::WrongContentType => StatusCode::BAD_REQUEST,
            ValidationError::MissingSignature | ValidationError::InvalidSignature => {
                StatusCode::FORBIDDEN
            }
            ValidationError::UnreadableBody => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ValidationError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

/// Supplies the current webhook signing secret.
///
/// Called once per validated request; implementations may return a different
/// value each time.
pub trait SecretSource: Send + Sync {
    fn secret(&self) -> Vec<u8>;
}

impl<F> SecretSource for F
where
    F: Fn() -> Vec<u8> + Send + Sync,
{
    fn secret(&self) -> Vec<u8> {
        self()
    }
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventEnvelope {
    /// The `X-GitHub-Event` tag, e.g. `pull_request`.
    pub event_type: String,
    pub delivery_id: DeliveryId,
    /// The exact bytes the signature was computed over.
    pub payload: Bytes,
}

/// Checks inbound requests against the rules in the module docs.
#[derive(Clone)]
pub struct WebhookValidator {
    secret: Arc<dyn SecretSource>,
    client_id: Option<String>,
    body_limit: usize,
}

impl fmt::Debug for WebhookValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookValidator")
            .field("client_id", &self.client_id)
            .field("body_limit", &self.body_limit)
            .finish_non_exhaustive()
    }
}

impl WebhookValidator {
    pub fn new(secret: impl SecretSource + 'static) -> Self {
        WebhookValidator {
            secret: Arc::new(secret),
            client_id: None,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Requires every request to carry this exact `User-Agent`.
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Bodies larger than `limit` bytes count as unreadable.
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// Validates `request`, consuming its body.
    pub async fn validate(&self, request: Request) -> Result<EventEnvelope, ValidationError> {
        let (parts, body) = request.into_parts();
        let result = self.check(&parts.method, &parts.headers, body).await;
        if let Err(e) = &result {
            debug!(status = e.status_code().as_u16(), reason = %e, "Rejected webhook");
        }
        result
    }

    async fn check(
        &self,
        method: &Method,
        headers: &HeaderMap,
        body: Body,
    ) -> Result<EventEnvelope, ValidationError> {
        if *method != Method::POST {
            return Err(ValidationError::MethodNotAllowed);
        }

        if let Some(expected) = &self.client_id
            && header_str(headers, header::USER_AGENT.as_str()) != Some(expected.as_str())
        {
            return Err(ValidationError::UnknownClient);
        }

        let event_type =
            header_str(headers, HEADER_EVENT).ok_or(ValidationError::MissingEvent)?;
        let delivery_id =
            header_str(headers, HEADER_DELIVERY).ok_or(ValidationError::MissingDelivery)?;
        let signature =
            header_str(headers, HEADER_SIGNATURE).ok_or(ValidationError::MissingSignature)?;

        if header_str(headers, header::CONTENT_TYPE.as_str()) != Some(JSON_CONTENT_TYPE) {
            return Err(ValidationError::WrongContentType);
        }

        let payload = axum::body::to_bytes(body, self.body_limit)
            .await
            .map_err(|_| ValidationError::UnreadableBody)?;

        if !verify_signature(&self.secret.secret(), &payload, signature) {
            return Err(ValidationError::InvalidSignature);
        }

        Ok(EventEnvelope {
            event_type: event_type.to_string(),
            delivery_id: DeliveryId::new(delivery_id),
            payload,
        })
    }
}

/// Returns a header's value if present and valid ASCII.
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
