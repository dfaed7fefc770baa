//! Authenticated GitHub REST client.
//!
//! [`GitHubClient`] is the facade robots use to act on GitHub. This file holds
//! construction and the transport primitives every operation goes through;
//! the operations themselves live in `issues`, `pulls`, `repos` and `orgs`.
//!
//! Requests use octocrab's raw interface so the transport sees status codes
//! and the `Link` header directly. Idempotent reads retry transient failures;
//! mutations are sent once.

use http::header::LINK;
use http::{StatusCode, Uri};
use octocrab::Octocrab;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::{GitHubApiError, extract_github_message};
use super::pagination::{PER_PAGE, Page, PageCursor, Traversal, paginate};
use super::retry::{RetryConfig, retry_with_backoff};

/// Result type for facade operations.
pub type Result<T> = std::result::Result<T, GitHubApiError>;

/// Supplies the API credential. Called once, when the client is built.
pub trait TokenSource {
    fn token(&self) -> String;
}

impl<F> TokenSource for F
where
    F: Fn() -> String,
{
    fn token(&self) -> String {
        self()
    }
}

/// HTTP verbs used by the facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verb {
    Get,
    Post,
    Patch,
    Put,
    Delete,
}

/// A successful response, body already read.
struct RawResponse {
    status: StatusCode,
    next: Option<PageCursor>,
    body: String,
}

/// A GitHub API client authenticated with a bearer token.
#[derive(Clone)]
pub struct GitHubClient {
    client: Octocrab,
    retry: RetryConfig,
}

impl GitHubClient {
    /// Builds a client, reading the token from `token` once.
    ///
    /// `base_uri` overrides `https://api.github.com`, for GitHub Enterprise
    /// (`https://ghe.example.com/api/v3`) or a test server.
    pub fn new(token: &impl TokenSource, base_uri: Option<&str>) -> Result<Self> {
        let mut builder = Octocrab::builder()
            .personal_token(token.token())
            .add_retry_config(octocrab::service::middleware::retry::RetryConfig::None);
        if let Some(base_uri) = base_uri {
            let uri: Uri = base_uri.parse().map_err(|e| {
                GitHubApiError::permanent_without_source(format!(
                    "invalid API base URI {base_uri}: {e}"
                ))
            })?;
            builder = builder.base_uri(uri).map_err(GitHubApiError::from_octocrab)?;
        }
        let client = builder.build().map_err(GitHubApiError::from_octocrab)?;
        Ok(Self::from_octocrab(client))
    }

    /// Wraps a pre-configured Octocrab instance (e.g. a GitHub App
    /// installation client).
    ///
    /// Build it with `add_retry_config(RetryConfig::None)`. Octocrab's own
    /// retry layer re-sends mutations on 5xx.
    pub fn from_octocrab(client: Octocrab) -> Self {
        Self {
            client,
            retry: RetryConfig::DEFAULT,
        }
    }

    /// Replaces the retry policy for idempotent reads.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Returns a reference to the underlying octocrab client.
    pub fn inner(&self) -> &Octocrab {
        &self.client
    }

    // ─── Transport ────────────────────────────────────────────────────────────

    async fn execute<B: Serialize + ?Sized>(
        &self,
        verb: Verb,
        route: &str,
        body: Option<&B>,
    ) -> Result<RawResponse> {
        let uri: Uri = route.parse().map_err(|e| {
            GitHubApiError::permanent_without_source(format!("invalid route {route}: {e}"))
        })?;

        let response = match verb {
            Verb::Get => self.client._get(uri).await,
            Verb::Post => self.client._post(uri, body).await,
            Verb::Patch => self.client._patch(uri, body).await,
            Verb::Put => self.client._put(uri, body).await,
            Verb::Delete => self.client._delete(uri, body).await,
        }
        .map_err(GitHubApiError::from_octocrab)?;

        let status = response.status();
        let next = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .and_then(PageCursor::from_link_header);
        let body = self
            .client
            .body_to_string(response)
            .await
            .map_err(GitHubApiError::from_octocrab)?;

        debug!(verb = ?verb, route, status = status.as_u16(), "GitHub API call");

        if !status.is_success() {
            let message = extract_github_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            });
            return Err(GitHubApiError::from_status(status, message));
        }

        Ok(RawResponse { status, next, body })
    }

    /// GET with retry, decoding the JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, route: &str) -> Result<T> {
        let response = retry_with_backoff(self.retry, move || {
            self.execute::<()>(Verb::Get, route, None)
        })
        .await?;
        decode(route, &response.body)
    }

    /// GET with retry, for endpoints that answer with a bare status.
    pub(crate) async fn get_status(&self, route: &str) -> Result<StatusCode> {
        retry_with_backoff(self.retry, move || {
            self.execute::<()>(Verb::Get, route, None)
        })
        .await
        .map(|response| response.status)
    }

    /// Sends `body` once and decodes the JSON response.
    pub(crate) async fn send_json<T, B>(&self, verb: Verb, route: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.execute(verb, route, Some(body)).await?;
        decode(route, &response.body)
    }

    /// Sends a request once, discarding any response body.
    pub(crate) async fn send<B: Serialize + ?Sized>(
        &self,
        verb: Verb,
        route: &str,
        body: Option<&B>,
    ) -> Result<StatusCode> {
        self.execute(verb, route, body).await.map(|r| r.status)
    }

    /// Fetches one page of a listing.
    pub(crate) async fn get_page<T: DeserializeOwned>(
        &self,
        route: &str,
        cursor: PageCursor,
    ) -> Result<Page<T>> {
        let separator = if route.contains('?') { '&' } else { '?' };
        let paged = format!(
            "{route}{separator}per_page={PER_PAGE}&page={}",
            cursor.page()
        );
        let route = paged.as_str();
        let response = retry_with_backoff(self.retry, move || {
            self.execute::<()>(Verb::Get, route, None)
        })
        .await?;
        Ok(Page {
            items: decode(route, &response.body)?,
            next: response.next,
        })
    }

    /// Walks every page of a listing.
    pub(crate) async fn list<T: DeserializeOwned>(
        &self,
        route: &str,
    ) -> Traversal<T, GitHubApiError> {
        paginate(PageCursor::first(), move |cursor| self.get_page(route, cursor)).await
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

fn decode<T: DeserializeOwned>(route: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| {
        GitHubApiError::permanent_without_source(format!("decoding response of {route}: {e}"))
    })
}

/// Turns a 404 from a removal into success: the thing is already gone.
pub(crate) fn ignore_not_found<T>(result: Result<T>, what: &str) -> Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if e.is_not_found() => {
            debug!(what, "Already absent, treating removal as done");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Percent-encodes one path segment (label names, logins, branch names).
pub(crate) fn segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

/// Percent-encodes a repository file path, keeping its `/` separators.
pub(crate) fn file_path(raw: &str) -> String {
    raw.split('/').map(segment).collect::<Vec<_>>().join("/")
}
