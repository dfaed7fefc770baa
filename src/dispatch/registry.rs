//! Handler registration.
//!
//! A robot registers at most one handler per event kind, once, before the
//! server starts. [`HandlerTableBuilder`] collects the handlers; the finished
//! [`HandlerTable`] has no mutating methods, so the dispatcher can share it
//! across tasks without locking.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::warn;

use crate::webhooks::events::{
    CommitCommentEvent, IssueCommentEvent, IssuesEvent, PullRequestEvent,
    PullRequestReviewCommentEvent, PullRequestReviewEvent, PushEvent, StatusEvent,
};
use crate::webhooks::{EventKind, GitHubEvent, IssuePrInfo};

/// The future a handler returns.
pub type HandlerFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

/// A handler invocation bound to its event, ready to run on a task.
pub(crate) type Job = Box<dyn FnOnce() -> HandlerFuture + Send>;

/// One registered handler plus the filter deciding which events it takes.
struct Slot<E> {
    accepts: fn(&E) -> bool,
    call: Arc<dyn Fn(E) -> HandlerFuture + Send + Sync>,
}

impl<E: Send + 'static> Slot<E> {
    fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Slot {
            accepts: |_| true,
            call: Arc::new(move |event| Box::pin(handler(event)) as HandlerFuture),
        }
    }

    fn job(&self, event: E) -> Option<Job> {
        if !(self.accepts)(&event) {
            return None;
        }
        let call = Arc::clone(&self.call);
        Some(Box::new(move || call(event)))
    }
}

/// Event kind to handler mapping. Immutable once built.
#[derive(Default)]
pub struct HandlerTable {
    issues: Option<Slot<IssuesEvent>>,
    pull_request: Option<Slot<PullRequestEvent>>,
    push: Option<Slot<PushEvent>>,
    issue_comment: Option<Slot<IssueCommentEvent>>,
    review: Option<Slot<PullRequestReviewEvent>>,
    review_comment: Option<Slot<PullRequestReviewCommentEvent>>,
    status: Option<Slot<StatusEvent>>,
    commit_comment: Option<Slot<CommitCommentEvent>>,
}

impl HandlerTable {
    pub fn builder() -> HandlerTableBuilder {
        HandlerTableBuilder::default()
    }

    /// True if some handler is registered for `kind`.
    pub fn handles(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::Issues => self.issues.is_some(),
            EventKind::PullRequest => self.pull_request.is_some(),
            EventKind::Push => self.push.is_some(),
            EventKind::IssueComment => self.issue_comment.is_some(),
            EventKind::PullRequestReview => self.review.is_some(),
            EventKind::PullRequestReviewComment => self.review_comment.is_some(),
            EventKind::Status => self.status.is_some(),
            EventKind::CommitComment => self.commit_comment.is_some(),
        }
    }

    /// Kinds with a registered handler, in [`EventKind::ALL`] order.
    pub fn kinds(&self) -> Vec<EventKind> {
        EventKind::ALL
            .into_iter()
            .filter(|kind| self.handles(*kind))
            .collect()
    }

    /// Binds `event` to its handler. `None` if nothing takes the event.
    pub(crate) fn job(&self, event: GitHubEvent) -> Option<Job> {
        fn bind<E: Send + 'static>(slot: &Option<Slot<E>>, event: E) -> Option<Job> {
            slot.as_ref()?.job(event)
        }

        match event {
            GitHubEvent::Issues(e) => bind(&self.issues, e),
            GitHubEvent::PullRequest(e) => bind(&self.pull_request, e),
            GitHubEvent::Push(e) => bind(&self.push, e),
            GitHubEvent::IssueComment(e) => bind(&self.issue_comment, e),
            GitHubEvent::PullRequestReview(e) => bind(&self.review, e),
            GitHubEvent::PullRequestReviewComment(e) => bind(&self.review_comment, e),
            GitHubEvent::Status(e) => bind(&self.status, e),
            GitHubEvent::CommitComment(e) => bind(&self.commit_comment, e),
        }
    }
}

impl fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerTable")
            .field("kinds", &self.kinds())
            .finish()
    }
}

/// Collects handlers before the table is frozen.
///
/// Registering a second handler for a kind replaces the first and logs a
/// warning.
///
/// ```
/// use github_robot::dispatch::HandlerTable;
///
/// let table = HandlerTable::builder()
///     .on_push(|event| async move {
///         tracing::info!(git_ref = %event.git_ref, "pushed");
///         Ok(())
///     })
///     .build();
/// assert_eq!(table.kinds().len(), 1);
/// ```
#[derive(Default)]
pub struct HandlerTableBuilder {
    table: HandlerTable,
}

macro_rules! register {
    ($(#[$meta:meta])* $method:ident, $field:ident, $event:ty, $kind:expr) => {
        $(#[$meta])*
        pub fn $method<F, Fut>(mut self, handler: F) -> Self
        where
            F: Fn($event) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
        {
            replace(&mut self.table.$field, Slot::new(handler), $kind);
            self
        }
    };
}

impl HandlerTableBuilder {
    register!(on_issue, issues, IssuesEvent, EventKind::Issues);
    register!(on_pull_request, pull_request, PullRequestEvent, EventKind::PullRequest);
    register!(on_push, push, PushEvent, EventKind::Push);
    register!(
        /// Comments on issues and on pull request conversations alike.
        on_issue_comment,
        issue_comment,
        IssueCommentEvent,
        EventKind::IssueComment
    );
    register!(on_status, status, StatusEvent, EventKind::Status);
    register!(on_review, review, PullRequestReviewEvent, EventKind::PullRequestReview);
    register!(
        on_review_comment,
        review_comment,
        PullRequestReviewCommentEvent,
        EventKind::PullRequestReviewComment
    );
    register!(on_commit_comment, commit_comment, CommitCommentEvent, EventKind::CommitComment);

    /// Registers one handler for pull request events and for comments on
    /// pull requests. Comments on plain issues are dropped.
    ///
    /// Occupies both the `pull_request` and `issue_comment` kinds.
    pub fn on_issue_pr_info<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(IssuePrInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let handler = Arc::new(handler);

        let for_prs = Arc::clone(&handler);
        replace(
            &mut self.table.pull_request,
            Slot::new(move |event| for_prs(IssuePrInfo::PullRequest(event))),
            EventKind::PullRequest,
        );

        let comments = Slot {
            accepts: IssueCommentEvent::is_on_pull_request,
            ..Slot::new(move |event| handler(IssuePrInfo::PullRequestComment(event)))
        };
        replace(&mut self.table.issue_comment, comments, EventKind::IssueComment);
        self
    }

    pub fn build(self) -> HandlerTable {
        self.table
    }
}

fn replace<E>(slot: &mut Option<Slot<E>>, handler: Slot<E>, kind: EventKind) {
    if slot.replace(handler).is_some() {
        warn!(kind = %kind, "Replacing previously registered handler");
    }
}
