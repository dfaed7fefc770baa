//! GitHub API error types.
//!
//! Every facade operation fails with [`GitHubApiError`]. The error keeps the
//! remote status and message as GitHub reported them; the only interpretation
//! applied is the transient/permanent split used by the transport's retry loop:
//!
//! - **Transient**: 5xx, 429, rate-limited 403, network failures
//! - **Permanent**: everything else, including 404

use http::StatusCode;
use std::fmt;
use thiserror::Error;

/// The kind of GitHub API error, categorized for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitHubErrorKind {
    /// Safe to retry with backoff.
    Transient,
    /// Retrying will not help.
    Permanent,
}

impl GitHubErrorKind {
    pub fn is_retriable(&self) -> bool {
        matches!(self, GitHubErrorKind::Transient)
    }
}

/// A failed GitHub API call.
#[derive(Debug, Error)]
pub struct GitHubApiError {
    pub kind: GitHubErrorKind,

    /// The HTTP status code, if a response was received.
    pub status_code: Option<u16>,

    /// GitHub's `message` field, or a description of the local failure.
    pub message: String,

    /// The underlying octocrab error, if the failure came from octocrab.
    #[source]
    pub source: Option<octocrab::Error>,
}

impl fmt::Display for GitHubApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "GitHub API error (HTTP {}): {}", code, self.message),
            None => write!(f, "GitHub API error: {}", self.message),
        }
    }
}

impl GitHubApiError {
    /// Builds an error from a non-success HTTP response.
    pub fn from_status(status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: classify_status(status, &message, None),
            status_code: Some(status.as_u16()),
            message,
            source: None,
        }
    }

    /// Categorizes an octocrab error.
    pub fn from_octocrab(err: octocrab::Error) -> Self {
        if let octocrab::Error::GitHub { source, .. } = &err {
            let status = source.status_code;
            let message = source.message.clone();
            return Self {
                kind: classify_status(status, &message, source.documentation_url.as_deref()),
                status_code: Some(status.as_u16()),
                message,
                source: Some(err),
            };
        }

        let kind = if is_network_error(&err) {
            GitHubErrorKind::Transient
        } else {
            GitHubErrorKind::Permanent
        };
        Self {
            kind,
            status_code: None,
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Creates a permanent error without an octocrab source.
    pub fn permanent_without_source(message: impl Into<String>) -> Self {
        Self {
            kind: GitHubErrorKind::Permanent,
            status_code: None,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a transient error without an octocrab source.
    pub fn transient_without_source(message: impl Into<String>) -> Self {
        Self {
            kind: GitHubErrorKind::Transient,
            status_code: None,
            message: message.into(),
            source: None,
        }
    }

    pub fn is_retriable(&self) -> bool {
        self.kind.is_retriable()
    }

    /// True if GitHub answered 404.
    pub fn is_not_found(&self) -> bool {
        self.status_code == Some(StatusCode::NOT_FOUND.as_u16())
    }
}

fn classify_status(
    status: StatusCode,
    message: &str,
    documentation_url: Option<&str>,
) -> GitHubErrorKind {
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        return GitHubErrorKind::Transient;
    }
    if status == StatusCode::FORBIDDEN && is_rate_limit_message(message, documentation_url) {
        return GitHubErrorKind::Transient;
    }
    GitHubErrorKind::Permanent
}

/// Primary and secondary rate limits both answer 403 with a message saying so.
fn is_rate_limit_message(message: &str, documentation_url: Option<&str>) -> bool {
    message.to_lowercase().contains("rate limit")
        || documentation_url.is_some_and(|url| url.contains("rate-limit"))
}

/// Transport-level failures where no response was received.
fn is_network_error(err: &octocrab::Error) -> bool {
    matches!(
        err,
        octocrab::Error::Http { .. } | octocrab::Error::Hyper { .. } | octocrab::Error::Service { .. }
    )
}

/// Extracts GitHub's `message` field from an error body.
pub(crate) fn extract_github_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
}
