//! GitHub webhook event types.
//!
//! Typed representations of the webhook events a robot can subscribe to. The
//! set is closed: anything not listed here is reported as unsupported by the
//! parser and dropped before dispatch.
//!
//! # Event Types
//!
//! | `X-GitHub-Event` | Variant |
//! |---|---|
//! | `issues` | [`GitHubEvent::Issues`] |
//! | `pull_request` | [`GitHubEvent::PullRequest`] |
//! | `push` | [`GitHubEvent::Push`] |
//! | `issue_comment` | [`GitHubEvent::IssueComment`] |
//! | `pull_request_review` | [`GitHubEvent::PullRequestReview`] |
//! | `pull_request_review_comment` | [`GitHubEvent::PullRequestReviewComment`] |
//! | `status` | [`GitHubEvent::Status`] |
//! | `commit_comment` | [`GitHubEvent::CommitComment`] |
//!
//! Payload structs only model the fields robots commonly read; unknown fields
//! are ignored. Actions GitHub adds later decode to an `Other` variant rather
//! than failing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{CommentId, RepoId};

/// The kinds of event a handler can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Issues,
    PullRequest,
    Push,
    IssueComment,
    PullRequestReview,
    PullRequestReviewComment,
    Status,
    CommitComment,
}

impl EventKind {
    pub const ALL: [EventKind; 8] = [
        EventKind::Issues,
        EventKind::PullRequest,
        EventKind::Push,
        EventKind::IssueComment,
        EventKind::PullRequestReview,
        EventKind::PullRequestReviewComment,
        EventKind::Status,
        EventKind::CommitComment,
    ];

    /// Maps an `X-GitHub-Event` tag to a kind. Unknown tags give `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }

    /// The `X-GitHub-Event` tag for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Issues => "issues",
            EventKind::PullRequest => "pull_request",
            EventKind::Push => "push",
            EventKind::IssueComment => "issue_comment",
            EventKind::PullRequestReview => "pull_request_review",
            EventKind::PullRequestReviewComment => "pull_request_review_comment",
            EventKind::Status => "status",
            EventKind::CommitComment => "commit_comment",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed GitHub webhook event. Exactly one variant per supported tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GitHubEvent {
    Issues(IssuesEvent),
    PullRequest(PullRequestEvent),
    Push(PushEvent),
    /// A comment on the conversation tab of an issue or pull request.
    IssueComment(IssueCommentEvent),
    PullRequestReview(PullRequestReviewEvent),
    /// A comment on a pull request diff.
    PullRequestReviewComment(PullRequestReviewCommentEvent),
    /// A commit status was created (legacy Status API).
    Status(StatusEvent),
    CommitComment(CommitCommentEvent),
}

impl GitHubEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GitHubEvent::Issues(_) => EventKind::Issues,
            GitHubEvent::PullRequest(_) => EventKind::PullRequest,
            GitHubEvent::Push(_) => EventKind::Push,
            GitHubEvent::IssueComment(_) => EventKind::IssueComment,
            GitHubEvent::PullRequestReview(_) => EventKind::PullRequestReview,
            GitHubEvent::PullRequestReviewComment(_) => EventKind::PullRequestReviewComment,
            GitHubEvent::Status(_) => EventKind::Status,
            GitHubEvent::CommitComment(_) => EventKind::CommitComment,
        }
    }

    /// The repository the event happened in.
    pub fn repository(&self) -> &Repository {
        match self {
            GitHubEvent::Issues(e) => &e.repository,
            GitHubEvent::PullRequest(e) => &e.repository,
            GitHubEvent::Push(e) => &e.repository,
            GitHubEvent::IssueComment(e) => &e.repository,
            GitHubEvent::PullRequestReview(e) => &e.repository,
            GitHubEvent::PullRequestReviewComment(e) => &e.repository,
            GitHubEvent::Status(e) => &e.repository,
            GitHubEvent::CommitComment(e) => &e.repository,
        }
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Declares an action enum that decodes from GitHub's snake_case strings and
/// keeps unrecognised values in `Other`.
macro_rules! action_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
            /// An action this crate does not name.
            Other(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $($name::$variant => $text,)+
                    $name::Other(s) => s,
                }
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                match s.as_str() {
                    $($text => $name::$variant,)+
                    _ => $name::Other(s),
                }
            }
        }

        impl From<$name> for String {
            fn from(action: $name) -> String {
                action.as_str().to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

action_enum! {
    /// Action performed on an issue.
    IssueAction {
        Opened => "opened",
        Edited => "edited",
        Closed => "closed",
        Reopened => "reopened",
        Labeled => "labeled",
        Unlabeled => "unlabeled",
        Assigned => "assigned",
        Unassigned => "unassigned",
    }
}

action_enum! {
    /// Action performed on a pull request.
    PrAction {
        Opened => "opened",
        Edited => "edited",
        Closed => "closed",
        Reopened => "reopened",
        /// New commits were pushed to the head branch.
        Synchronize => "synchronize",
        Labeled => "labeled",
        Unlabeled => "unlabeled",
        Assigned => "assigned",
        Unassigned => "unassigned",
        ReadyForReview => "ready_for_review",
        ConvertedToDraft => "converted_to_draft",
    }
}

action_enum! {
    /// Action performed on any kind of comment.
    CommentAction {
        Created => "created",
        Edited => "edited",
        Deleted => "deleted",
    }
}

action_enum! {
    /// Action performed on a pull request review.
    ReviewAction {
        Submitted => "submitted",
        Edited => "edited",
        Dismissed => "dismissed",
    }
}

action_enum! {
    /// State reported by a commit status.
    StatusState {
        Pending => "pending",
        Success => "success",
        Failure => "failure",
        Error => "error",
    }
}

// ============================================================================
// Shared payload objects
// ============================================================================

/// A GitHub account (user, bot or organization).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub login: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// The repository block that every event carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub owner: User,
    pub html_url: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub default_branch: Option<String>,
}

impl Repository {
    pub fn repo_id(&self) -> RepoId {
        RepoId::new(self.owner.login.clone(), self.name.clone())
    }
}

/// Present on an issue when the issue is actually a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestLink {
    #[serde(default)]
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub state: String,
    pub html_url: String,
    pub user: User,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub assignees: Vec<User>,
    #[serde(default)]
    pub pull_request: Option<PullRequestLink>,
}

impl Issue {
    /// True if this "issue" is the conversation of a pull request.
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

/// One end of a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitRef {
    /// Branch name.
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub sha: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub state: String,
    pub html_url: String,
    pub user: User,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub assignees: Vec<User>,
    pub head: GitRef,
    pub base: GitRef,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub merged: bool,
    #[serde(default)]
    pub merge_commit_sha: Option<String>,
}

/// An issue or commit comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    #[serde(default)]
    pub body: String,
    pub html_url: String,
    pub user: User,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Set on commit comments.
    #[serde(default)]
    pub commit_id: Option<String>,
    /// Set on commit comments attached to a file line.
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: u64,
    pub user: User,
    #[serde(default)]
    pub body: Option<String>,
    /// `approved`, `changes_requested`, `commented` or `dismissed`.
    pub state: String,
    pub html_url: String,
    #[serde(default)]
    pub commit_id: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

/// A comment on a line of a pull request diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewComment {
    pub id: CommentId,
    #[serde(default)]
    pub pull_request_review_id: Option<u64>,
    #[serde(default)]
    pub body: String,
    pub html_url: String,
    pub user: User,
    pub path: String,
    pub commit_id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushCommit {
    pub id: String,
    pub message: String,
    #[serde(default)]
    pub url: Option<String>,
}

// ============================================================================
// Events
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuesEvent {
    pub action: IssueAction,
    pub issue: Issue,
    pub repository: Repository,
    pub sender: User,
    /// The label added or removed, for `labeled`/`unlabeled`.
    #[serde(default)]
    pub label: Option<Label>,
}

impl IssuesEvent {
    pub fn is_opened(&self) -> bool {
        self.action == IssueAction::Opened
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestEvent {
    pub action: PrAction,
    pub number: u64,
    pub pull_request: PullRequest,
    pub repository: Repository,
    pub sender: User,
    /// The label added or removed, for `labeled`/`unlabeled`.
    #[serde(default)]
    pub label: Option<Label>,
}

impl PullRequestEvent {
    pub fn is_opened(&self) -> bool {
        self.action == PrAction::Opened
    }

    /// New commits were pushed to the head branch.
    pub fn is_source_branch_changed(&self) -> bool {
        self.action == PrAction::Synchronize
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushEvent {
    /// Full ref that was pushed, e.g. `refs/heads/main`.
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub before: String,
    /// The new head SHA.
    pub after: String,
    #[serde(default)]
    pub created: bool,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub forced: bool,
    #[serde(default)]
    pub commits: Vec<PushCommit>,
    pub repository: Repository,
    pub sender: User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCommentEvent {
    pub action: CommentAction,
    pub issue: Issue,
    pub comment: Comment,
    pub repository: Repository,
    pub sender: User,
}

impl IssueCommentEvent {
    pub fn is_created(&self) -> bool {
        self.action == CommentAction::Created
    }

    /// GitHub delivers pull request conversation comments as issue comments.
    pub fn is_on_pull_request(&self) -> bool {
        self.issue.is_pull_request()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestReviewEvent {
    pub action: ReviewAction,
    pub review: Review,
    pub pull_request: PullRequest,
    pub repository: Repository,
    pub sender: User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestReviewCommentEvent {
    pub action: CommentAction,
    pub comment: ReviewComment,
    pub pull_request: PullRequest,
    pub repository: Repository,
    pub sender: User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub id: u64,
    pub sha: String,
    pub state: StatusState,
    /// The status context, e.g. `ci/build`.
    pub context: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub target_url: Option<String>,
    pub repository: Repository,
    pub sender: User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitCommentEvent {
    pub action: CommentAction,
    pub comment: Comment,
    pub repository: Repository,
    pub sender: User,
}
