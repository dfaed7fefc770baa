//! Typed access to the GitHub REST API.
//!
//! [`GitHubClient`] is the facade handlers call back into GitHub through.
//! Operations are grouped by resource:
//!
//! - `issues`: issue state, comments, labels, assignees, timeline
//! - `pulls`: pull request state, merging, commits, files, review comments
//! - `repos`: repository metadata, labels, collaborators, branches, contents
//! - `orgs`: organisation members and repositories, the authenticated user
//!
//! Every listing walks all pages through [`paginate`] and returns a
//! [`Traversal`], so items fetched before a failure stay available. Removals
//! treat a 404 as success. Other failures surface as [`GitHubApiError`] with
//! GitHub's own message.

mod client;
mod error;
mod issues;
pub mod models;
mod orgs;
mod pagination;
mod pulls;
mod repos;
mod retry;

pub use client::{GitHubClient, Result, TokenSource};
pub use error::{GitHubApiError, GitHubErrorKind};
pub use pagination::{PER_PAGE, Page, PageCursor, Traversal, paginate};
pub use repos::Permission;
pub use retry::{RetryConfig, retry_with_backoff};
