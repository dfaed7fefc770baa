//! GitHub webhook payload parser.
//!
//! Decodes a validated payload into a typed [`GitHubEvent`], choosing the
//! schema from the `X-GitHub-Event` tag.
//!
//! # Parsing Strategy
//!
//! 1. The tag selects exactly one payload schema
//! 2. Unknown tags return `Ok(None)`: unsupported, not an error
//! 3. Malformed JSON or a missing required field returns `Err`
//! 4. Decoded events are checked for an addressable repository (and a
//!    non-zero issue/PR number where one is carried)
//!
//! Nothing is defaulted silently: a payload that does not match its schema is
//! always reported.

use serde::de::DeserializeOwned;
use thiserror::Error;

use super::events::{EventKind, GitHubEvent, Repository};

/// Error type for webhook parsing failures.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON deserialization failed (includes missing required fields).
    #[error("malformed {kind} payload: {source}")]
    Json {
        kind: EventKind,
        #[source]
        source: serde_json::Error,
    },

    /// A field decoded but holds a value that cannot address anything.
    #[error("invalid field value for {field}: {value:?}")]
    InvalidField { field: &'static str, value: String },
}

/// Parses a webhook payload into a typed event.
///
/// # Returns
///
/// * `Ok(Some(event))` - Successfully parsed a supported event type
/// * `Ok(None)` - Unknown event type (ignored, not an error)
/// * `Err(e)` - Malformed payload or missing required fields
///
/// # Examples
///
/// ```
/// use github_robot::webhooks::{GitHubEvent, parse_webhook};
///
/// let payload = br#"{
///     "ref": "refs/heads/main",
///     "before": "0000000000000000000000000000000000000000",
///     "after": "6dcb09b5b57875f334f61aebed695e2e4193db5e",
///     "repository": {
///         "name": "hello-world",
///         "full_name": "octocat/hello-world",
///         "owner": { "id": 1, "login": "octocat" },
///         "html_url": "https://github.com/octocat/hello-world"
///     },
///     "sender": { "id": 1, "login": "octocat" }
/// }"#;
///
/// let event = parse_webhook("push", payload).unwrap();
/// assert!(matches!(event, Some(GitHubEvent::Push(_))));
///
/// assert!(parse_webhook("deployment", payload).unwrap().is_none());
/// ```
pub fn parse_webhook(event_type: &str, payload: &[u8]) -> Result<Option<GitHubEvent>, ParseError> {
    let Some(kind) = EventKind::from_tag(event_type) else {
        return Ok(None);
    };
    parse_event(kind, payload).map(Some)
}

/// Parses a payload whose kind is already known.
pub fn parse_event(kind: EventKind, payload: &[u8]) -> Result<GitHubEvent, ParseError> {
    let event = match kind {
        EventKind::Issues => GitHubEvent::Issues(decode(kind, payload)?),
        EventKind::PullRequest => GitHubEvent::PullRequest(decode(kind, payload)?),
        EventKind::Push => GitHubEvent::Push(decode(kind, payload)?),
        EventKind::IssueComment => GitHubEvent::IssueComment(decode(kind, payload)?),
        EventKind::PullRequestReview => GitHubEvent::PullRequestReview(decode(kind, payload)?),
        EventKind::PullRequestReviewComment => {
            GitHubEvent::PullRequestReviewComment(decode(kind, payload)?)
        }
        EventKind::Status => GitHubEvent::Status(decode(kind, payload)?),
        EventKind::CommitComment => GitHubEvent::CommitComment(decode(kind, payload)?),
    };

    check_repository(event.repository())?;
    match &event {
        GitHubEvent::Issues(e) => check_number("issue.number", e.issue.number)?,
        GitHubEvent::IssueComment(e) => check_number("issue.number", e.issue.number)?,
        GitHubEvent::PullRequest(e) => check_number("pull_request.number", e.pull_request.number)?,
        GitHubEvent::PullRequestReview(e) => {
            check_number("pull_request.number", e.pull_request.number)?
        }
        GitHubEvent::PullRequestReviewComment(e) => {
            check_number("pull_request.number", e.pull_request.number)?
        }
        GitHubEvent::Push(_) | GitHubEvent::Status(_) | GitHubEvent::CommitComment(_) => {}
    }

    Ok(event)
}

fn decode<T: DeserializeOwned>(kind: EventKind, payload: &[u8]) -> Result<T, ParseError> {
    serde_json::from_slice(payload).map_err(|source| ParseError::Json { kind, source })
}

// ============================================================================
// Post-decode checks
// ============================================================================

fn check_repository(repository: &Repository) -> Result<(), ParseError> {
    if repository.owner.login.is_empty() {
        return Err(ParseError::InvalidField {
            field: "repository.owner.login",
            value: String::new(),
        });
    }
    if repository.name.is_empty() {
        return Err(ParseError::InvalidField {
            field: "repository.name",
            value: String::new(),
        });
    }
    Ok(())
}

fn check_number(field: &'static str, number: u64) -> Result<(), ParseError> {
    if number == 0 {
        return Err(ParseError::InvalidField {
            field,
            value: number.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures;
    use crate::webhooks::events::{CommentAction, PrAction, ReviewAction, StatusState};

    fn parse(tag: &str, payload: serde_json::Value) -> Result<Option<GitHubEvent>, ParseError> {
        parse_webhook(tag, &serde_json::to_vec(&payload).unwrap())
    }

    // ========================================================================
    // Supported kinds
    // ========================================================================

    #[test]
    fn parses_pull_request_opened() {
        let event = parse("pull_request", fixtures::pull_request("opened", 42, "alice", &["bug"]))
            .unwrap()
            .unwrap();

        match event {
            GitHubEvent::PullRequest(e) => {
                assert_eq!(e.action, PrAction::Opened);
                assert_eq!(e.pull_request.number, 42);
                assert_eq!(e.pull_request.user.login, "alice");
                assert_eq!(e.pull_request.labels[0].name, "bug");
                assert_eq!(e.pull_request.head.ref_name, "feature");
                assert_eq!(e.repository.repo_id().to_string(), "octocat/hello-world");
                assert!(e.is_opened());
            }
            _ => panic!("Expected PullRequest event"),
        }
    }

    #[test]
    fn parses_issue_comment_on_pull_request() {
        let event = parse("issue_comment", fixtures::issue_comment(7, "bob", true))
            .unwrap()
            .unwrap();

        match event {
            GitHubEvent::IssueComment(e) => {
                assert_eq!(e.action, CommentAction::Created);
                assert_eq!(e.issue.number, 7);
                assert!(e.is_created());
                assert!(e.is_on_pull_request());
            }
            _ => panic!("Expected IssueComment event"),
        }
    }

    #[test]
    fn parses_issue_comment_on_plain_issue() {
        match parse("issue_comment", fixtures::issue_comment(7, "bob", false)).unwrap() {
            Some(GitHubEvent::IssueComment(e)) => assert!(!e.is_on_pull_request()),
            other => panic!("Expected IssueComment event, got {other:?}"),
        }
    }

    #[test]
    fn parses_issues() {
        match parse("issues", fixtures::issue("opened", 3, "carol")).unwrap() {
            Some(GitHubEvent::Issues(e)) => {
                assert!(e.is_opened());
                assert_eq!(e.issue.user.login, "carol");
            }
            other => panic!("Expected Issues event, got {other:?}"),
        }
    }

    #[test]
    fn parses_push() {
        match parse("push", fixtures::push("refs/heads/main")).unwrap() {
            Some(GitHubEvent::Push(e)) => {
                assert_eq!(e.git_ref, "refs/heads/main");
                assert_eq!(e.commits.len(), 1);
            }
            other => panic!("Expected Push event, got {other:?}"),
        }
    }

    #[test]
    fn parses_status() {
        match parse("status", fixtures::status("failure")).unwrap() {
            Some(GitHubEvent::Status(e)) => {
                assert_eq!(e.state, StatusState::Failure);
                assert_eq!(e.context, "ci/build");
            }
            other => panic!("Expected Status event, got {other:?}"),
        }
    }

    #[test]
    fn parses_review_and_review_comment() {
        match parse("pull_request_review", fixtures::review(5, "dave")).unwrap() {
            Some(GitHubEvent::PullRequestReview(e)) => {
                assert_eq!(e.action, ReviewAction::Submitted);
                assert_eq!(e.review.user.login, "dave");
            }
            other => panic!("Expected PullRequestReview event, got {other:?}"),
        }

        match parse("pull_request_review_comment", fixtures::review_comment(5, "erin")).unwrap() {
            Some(GitHubEvent::PullRequestReviewComment(e)) => {
                assert_eq!(e.comment.path, "src/lib.rs");
                assert_eq!(e.comment.pull_request_review_id, Some(900));
            }
            other => panic!("Expected PullRequestReviewComment event, got {other:?}"),
        }
    }

    #[test]
    fn parses_commit_comment() {
        match parse("commit_comment", fixtures::commit_comment("frank")).unwrap() {
            Some(GitHubEvent::CommitComment(e)) => {
                assert_eq!(e.comment.commit_id.as_deref(), Some(fixtures::HEAD_SHA));
            }
            other => panic!("Expected CommitComment event, got {other:?}"),
        }
    }

    // ========================================================================
    // Unsupported and malformed
    // ========================================================================

    #[test]
    fn unknown_tag_is_unsupported_not_error() {
        for tag in ["check_suite", "deployment", "ping", ""] {
            assert!(parse_webhook(tag, b"not even json").unwrap().is_none());
        }
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = parse_webhook("push", b"{").unwrap_err();
        assert!(matches!(
            err,
            ParseError::Json {
                kind: EventKind::Push,
                ..
            }
        ));
    }

    #[test]
    fn missing_required_field_is_reported() {
        let mut payload = fixtures::pull_request("opened", 42, "alice", &[]);
        payload["pull_request"]
            .as_object_mut()
            .unwrap()
            .remove("user");
        assert!(matches!(
            parse("pull_request", payload),
            Err(ParseError::Json { .. })
        ));
    }

    #[test]
    fn empty_repository_owner_is_rejected() {
        let mut payload = fixtures::push("refs/heads/main");
        payload["repository"]["owner"]["login"] = "".into();
        assert!(matches!(
            parse("push", payload),
            Err(ParseError::InvalidField {
                field: "repository.owner.login",
                ..
            })
        ));
    }

    #[test]
    fn zero_number_is_rejected() {
        assert!(matches!(
            parse("issues", fixtures::issue("opened", 0, "carol")),
            Err(ParseError::InvalidField {
                field: "issue.number",
                ..
            })
        ));
    }
}
