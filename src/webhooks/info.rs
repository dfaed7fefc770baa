//! A uniform view over pull request activity.
//!
//! Robots often react the same way to a pull request being opened and to a
//! comment on its conversation tab: both name a repository, a number, a label
//! set and an author. [`IssuePrInfo`] is the closed set of events that carry
//! that information. Comments on plain issues are not part of it.

use std::collections::HashSet;

use super::events::{GitHubEvent, IssueCommentEvent, Label, PullRequestEvent};
use crate::types::{InvalidAddress, IssuePrAddress};

/// Label names attached to an issue or PR when the event was sent.
pub type LabelSet = HashSet<String>;

/// Pull request activity seen through a variant-independent interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssuePrInfo {
    PullRequest(PullRequestEvent),
    /// An `issue_comment` event whose issue is a pull request.
    PullRequestComment(IssueCommentEvent),
}

impl IssuePrInfo {
    /// Picks the adapter for `event`, or `None` if the event carries no pull
    /// request identity (pushes, statuses, comments on plain issues, ...).
    pub fn from_event(event: GitHubEvent) -> Option<Self> {
        match event {
            GitHubEvent::PullRequest(e) => Some(IssuePrInfo::PullRequest(e)),
            GitHubEvent::IssueComment(e) => Self::from_comment(e),
            _ => None,
        }
    }

    /// Wraps a comment event if it is attached to a pull request.
    pub fn from_comment(event: IssueCommentEvent) -> Option<Self> {
        event
            .is_on_pull_request()
            .then_some(IssuePrInfo::PullRequestComment(event))
    }

    /// Owner login and repository name.
    pub fn org_repo(&self) -> (&str, &str) {
        let repository = match self {
            IssuePrInfo::PullRequest(e) => &e.repository,
            IssuePrInfo::PullRequestComment(e) => &e.repository,
        };
        (&repository.owner.login, &repository.name)
    }

    pub fn number(&self) -> u64 {
        match self {
            IssuePrInfo::PullRequest(e) => e.pull_request.number,
            IssuePrInfo::PullRequestComment(e) => e.issue.number,
        }
    }

    /// The PR's labels as of the event.
    pub fn labels(&self) -> LabelSet {
        self.label_list().iter().map(|l| l.name.clone()).collect()
    }

    pub fn has_label(&self, name: &str) -> bool {
        self.label_list().iter().any(|l| l.name == name)
    }

    /// Login of the pull request's author (not of a commenter).
    pub fn author(&self) -> &str {
        match self {
            IssuePrInfo::PullRequest(e) => &e.pull_request.user.login,
            IssuePrInfo::PullRequestComment(e) => &e.issue.user.login,
        }
    }

    /// The webhook action, e.g. `opened` or `created`.
    pub fn action(&self) -> &str {
        match self {
            IssuePrInfo::PullRequest(e) => e.action.as_str(),
            IssuePrInfo::PullRequestComment(e) => e.action.as_str(),
        }
    }

    pub fn html_url(&self) -> &str {
        match self {
            IssuePrInfo::PullRequest(e) => &e.pull_request.html_url,
            IssuePrInfo::PullRequestComment(e) => &e.issue.html_url,
        }
    }

    /// The address to use for follow-up API calls on this PR.
    pub fn address(&self) -> Result<IssuePrAddress, InvalidAddress> {
        let (org, repo) = self.org_repo();
        IssuePrAddress::new(org, repo, self.number())
    }

    fn label_list(&self) -> &[Label] {
        match self {
            IssuePrInfo::PullRequest(e) => &e.pull_request.labels,
            IssuePrInfo::PullRequestComment(e) => &e.issue.labels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures;
    use crate::webhooks::parse_webhook;

    fn info(tag: &str, payload: serde_json::Value) -> Option<IssuePrInfo> {
        let event = parse_webhook(tag, &serde_json::to_vec(&payload).unwrap())
            .unwrap()
            .unwrap();
        IssuePrInfo::from_event(event)
    }

    #[test]
    fn pull_request_opened_exposes_number_labels_and_author() {
        let info = info(
            "pull_request",
            fixtures::pull_request("opened", 42, "alice", &["bug"]),
        )
        .unwrap();

        assert_eq!(info.number(), 42);
        assert_eq!(info.labels(), LabelSet::from(["bug".to_string()]));
        assert_eq!(info.author(), "alice");
        assert_eq!(info.org_repo(), ("octocat", "hello-world"));
        assert_eq!(info.action(), "opened");
    }

    #[test]
    fn comment_on_pull_request_reads_the_issue() {
        let info = info(
            "issue_comment",
            fixtures::issue_comment_with_labels(9, "alice", true, &["lgtm", "bug", "lgtm"]),
        )
        .unwrap();

        assert!(matches!(info, IssuePrInfo::PullRequestComment(_)));
        assert_eq!(info.number(), 9);
        assert_eq!(info.author(), "alice");
        assert_eq!(info.labels().len(), 2);
        assert!(info.has_label("lgtm"));
        assert_eq!(info.address().unwrap().to_string(), "octocat/hello-world#9");
    }

    #[test]
    fn comment_on_plain_issue_has_no_info() {
        assert!(info("issue_comment", fixtures::issue_comment(9, "alice", false)).is_none());
    }

    #[test]
    fn other_variants_have_no_info() {
        assert!(info("push", fixtures::push("refs/heads/main")).is_none());
        assert!(info("status", fixtures::status("success")).is_none());
        assert!(info("issues", fixtures::issue("opened", 1, "alice")).is_none());
    }

    #[test]
    fn both_variants_agree_on_the_same_pr() {
        let from_pr = info(
            "pull_request",
            fixtures::pull_request("synchronize", 12, "alice", &["bug"]),
        )
        .unwrap();
        let from_comment = info(
            "issue_comment",
            fixtures::issue_comment_with_labels(12, "alice", true, &["bug"]),
        )
        .unwrap();

        assert_eq!(from_pr.org_repo(), from_comment.org_repo());
        assert_eq!(from_pr.number(), from_comment.number());
        assert_eq!(from_pr.labels(), from_comment.labels());
        assert_eq!(from_pr.author(), from_comment.author());
    }
}
