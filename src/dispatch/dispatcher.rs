//! Concurrent handler execution with drain-on-shutdown.
//!
//! # Lifecycle of one delivery
//!
//! ```text
//! validated envelope ──► parse ──► table lookup ──► spawn task ──► handler
//!                          │             │                           │
//!                          ▼             ▼                           ▼
//!                    Unsupported     NoHandler               logged, swallowed
//! ```
//!
//! [`Dispatcher::dispatch`] returns as soon as the task is spawned, so the
//! webhook response never waits on handler work. Every spawned task is
//! counted until it finishes, whatever the outcome, and
//! [`Dispatcher::wait`] blocks until that count drops to zero.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, Span, debug, error, info, info_span};

use super::registry::{HandlerTable, Job};
use crate::webhooks::{GitHubEvent, ParseError, parse_webhook};

/// What happened to a delivery handed to [`Dispatcher::dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A handler task was spawned.
    Scheduled,
    /// The event type is not one the robot understands.
    Unsupported,
    /// The event type is known but nothing is registered for it.
    NoHandler,
}

/// Routes parsed events to their handlers, one task per event.
///
/// Tasks run in parallel with no ordering between them, including events for
/// the same pull request. Handlers that care about ordering must serialize
/// themselves.
#[derive(Debug)]
pub struct Dispatcher {
    handlers: Arc<HandlerTable>,
    /// Counts in-flight handler tasks. Kept closed so that `wait` returns
    /// whenever it is empty; a closed tracker still accepts tasks.
    tracker: TaskTracker,
    /// Present when the number of concurrently running handlers is bounded.
    limit: Option<Arc<Semaphore>>,
}

impl Dispatcher {
    /// A dispatcher with no cap on concurrently running handlers.
    pub fn new(handlers: Arc<HandlerTable>) -> Self {
        let tracker = TaskTracker::new();
        tracker.close();
        Dispatcher {
            handlers,
            tracker,
            limit: None,
        }
    }

    /// Lets at most `max` handlers run at once. Dispatch still returns
    /// immediately and counts the task as in flight; the task waits for a
    /// slot before calling its handler. `max` is clamped to
    /// `1..=Semaphore::MAX_PERMITS`.
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.limit = Some(Arc::new(Semaphore::new(max.clamp(1, Semaphore::MAX_PERMITS))));
        self
    }

    /// The handlers this dispatcher routes to.
    pub fn handlers(&self) -> &HandlerTable {
        &self.handlers
    }

    /// Decodes the payload and schedules its handler.
    ///
    /// Must be called from within a Tokio runtime. A decode failure is
    /// returned to the caller; unsupported kinds and kinds without a handler
    /// are not errors.
    pub fn dispatch(&self, event_type: &str, payload: &[u8]) -> Result<DispatchOutcome, ParseError> {
        let Some(event) = parse_webhook(event_type, payload)? else {
            debug!(event_type, "Unsupported event type, dropping");
            return Ok(DispatchOutcome::Unsupported);
        };

        let span = handler_span(&event);
        let Some(job) = self.handlers.job(event) else {
            span.in_scope(|| debug!(event_type, "No handler registered, dropping"));
            return Ok(DispatchOutcome::NoHandler);
        };

        let limit = self.limit.clone();
        self.tracker.spawn(run(job, limit).instrument(span));
        Ok(DispatchOutcome::Scheduled)
    }

    /// Number of handler tasks that have been spawned and not yet finished.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Waits until no handler task is in flight.
    ///
    /// Tasks dispatched while waiting are waited for too. Stop feeding new
    /// deliveries first, or this may not return.
    pub async fn wait(&self) {
        self.tracker.wait().await;
    }
}

async fn run(job: Job, limit: Option<Arc<Semaphore>>) {
    let _permit = match limit {
        Some(semaphore) => match semaphore.acquire_owned().await {
            Ok(permit) => Some(permit),
            Err(_) => {
                error!("Worker pool closed, handler not run");
                return;
            }
        },
        None => None,
    };

    match AssertUnwindSafe(async move { job().await })
        .catch_unwind()
        .await
    {
        Ok(Ok(())) => info!("Handler finished"),
        Ok(Err(e)) => {
            let chain = format!("{e:#}");
            error!(error = %chain, "Handler failed");
        }
        Err(panic) => error!(panic = panic_message(panic.as_ref()), "Handler panicked"),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// The span a handler runs in, carrying the fields needed to trace a failure
/// back to the GitHub object it concerns.
fn handler_span(event: &GitHubEvent) -> Span {
    let repository = event.repository();
    let org = repository.owner.login.as_str();
    let repo = repository.name.as_str();

    match event {
        GitHubEvent::Issues(e) => info_span!(
            "handler",
            kind = "issues",
            org,
            repo,
            url = %e.issue.html_url,
            action = %e.action,
        ),
        GitHubEvent::PullRequest(e) => info_span!(
            "handler",
            kind = "pull_request",
            org,
            repo,
            url = %e.pull_request.html_url,
            action = %e.action,
        ),
        GitHubEvent::IssueComment(e) => info_span!(
            "handler",
            kind = "issue_comment",
            org,
            repo,
            url = %e.comment.html_url,
            action = %e.action,
        ),
        GitHubEvent::Push(e) => info_span!(
            "handler",
            kind = "push",
            org,
            repo,
            git_ref = %e.git_ref,
            head = %e.after,
        ),
        GitHubEvent::Status(e) => info_span!(
            "handler",
            kind = "status",
            org,
            repo,
            context = %e.context,
            sha = %e.sha,
            state = %e.state,
            id = e.id,
        ),
        GitHubEvent::PullRequestReview(e) => info_span!(
            "handler",
            kind = "pull_request_review",
            org,
            repo,
            review_id = e.review.id,
            reviewer = %e.review.user.login,
            url = %e.review.html_url,
        ),
        GitHubEvent::PullRequestReviewComment(e) => info_span!(
            "handler",
            kind = "pull_request_review_comment",
            org,
            repo,
            review_id = ?e.comment.pull_request_review_id,
            reviewer = %e.comment.user.login,
            url = %e.comment.html_url,
        ),
        GitHubEvent::CommitComment(e) => info_span!(
            "handler",
            kind = "commit_comment",
            org,
            repo,
            commit = ?e.comment.commit_id,
            reviewer = %e.comment.user.login,
            url = %e.comment.html_url,
        ),
    }
}
