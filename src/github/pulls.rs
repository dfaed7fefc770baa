//! Pull request operations.
//!
//! Labels, assignees and conversation comments on a pull request go through
//! the issue endpoints; review comments have their own.

use serde::Serialize;
use serde_json::json;

use super::client::{GitHubClient, Result, Verb, ignore_not_found};
use super::error::GitHubApiError;
use super::issues::issue_route;
use super::models::{
    Comment, Commit, IssueState, Label, MergeMethod, MergeResult, PullRequest, PullRequestFile,
    PullRequestUpdate, ReviewComment, StateFilter,
};
use super::pagination::Traversal;
use crate::types::{CommentId, IssuePrAddress, RepoId};

fn pull_route(addr: &IssuePrAddress, tail: &str) -> String {
    format!(
        "/repos/{}/{}/pulls/{}{tail}",
        addr.org(),
        addr.repo(),
        addr.number()
    )
}

fn review_comment_route(repo: &RepoId, id: CommentId) -> String {
    format!("/repos/{}/{}/pulls/comments/{id}", repo.owner, repo.repo)
}

#[derive(Serialize)]
struct MergeRequest<'a> {
    merge_method: MergeMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    commit_message: Option<&'a str>,
    /// Refuse to merge if the head moved since the robot looked at it.
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

impl GitHubClient {
    pub async fn get_pull_request(&self, addr: &IssuePrAddress) -> Result<PullRequest> {
        self.get_json(&pull_route(addr, "")).await
    }

    pub async fn list_pull_requests(
        &self,
        repo: &RepoId,
        state: StateFilter,
    ) -> Traversal<PullRequest, GitHubApiError> {
        let route = format!(
            "/repos/{}/{}/pulls?state={}",
            repo.owner,
            repo.repo,
            state.as_str()
        );
        self.list(&route).await
    }

    pub async fn update_pull_request(
        &self,
        addr: &IssuePrAddress,
        update: &PullRequestUpdate,
    ) -> Result<PullRequest> {
        self.send_json(Verb::Patch, &pull_route(addr, ""), update)
            .await
    }

    pub async fn close_pull_request(&self, addr: &IssuePrAddress) -> Result<PullRequest> {
        let update = PullRequestUpdate {
            state: Some(IssueState::Closed),
            ..Default::default()
        };
        self.update_pull_request(addr, &update).await
    }

    pub async fn reopen_pull_request(&self, addr: &IssuePrAddress) -> Result<PullRequest> {
        let update = PullRequestUpdate {
            state: Some(IssueState::Open),
            ..Default::default()
        };
        self.update_pull_request(addr, &update).await
    }

    /// Merges a pull request.
    ///
    /// `expected_head` makes GitHub refuse (409) if the head SHA has moved.
    /// An unmergeable pull request is a 405 and comes back as a permanent
    /// error carrying GitHub's message.
    pub async fn merge_pull_request(
        &self,
        addr: &IssuePrAddress,
        method: MergeMethod,
        message: Option<&str>,
        expected_head: Option<&str>,
    ) -> Result<MergeResult> {
        let body = MergeRequest {
            merge_method: method,
            commit_message: message,
            sha: expected_head,
        };
        self.send_json(Verb::Put, &pull_route(addr, "/merge"), &body)
            .await
    }

    pub async fn list_pull_request_commits(
        &self,
        addr: &IssuePrAddress,
    ) -> Traversal<Commit, GitHubApiError> {
        self.list(&pull_route(addr, "/commits")).await
    }

    pub async fn list_pull_request_files(
        &self,
        addr: &IssuePrAddress,
    ) -> Traversal<PullRequestFile, GitHubApiError> {
        self.list(&pull_route(addr, "/files")).await
    }

    // ─── Issue-side operations ────────────────────────────────────────────────

    pub async fn get_pull_request_labels(
        &self,
        addr: &IssuePrAddress,
    ) -> Traversal<Label, GitHubApiError> {
        self.list_issue_labels(addr).await
    }

    pub async fn add_pull_request_labels(
        &self,
        addr: &IssuePrAddress,
        labels: &[&str],
    ) -> Result<Vec<Label>> {
        self.add_issue_labels(addr, labels).await
    }

    pub async fn remove_pull_request_label(&self, addr: &IssuePrAddress, label: &str) -> Result<()> {
        self.remove_issue_label(addr, label).await
    }

    pub async fn assign_pull_request(&self, addr: &IssuePrAddress, logins: &[&str]) -> Result<()> {
        let body = json!({ "assignees": logins });
        self.send(Verb::Post, &issue_route(addr, "/assignees"), Some(&body))
            .await
            .map(|_| ())
    }

    pub async fn unassign_pull_request(&self, addr: &IssuePrAddress, logins: &[&str]) -> Result<()> {
        self.unassign_issue(addr, logins).await
    }

    // ─── Conversation comments ────────────────────────────────────────────────

    pub async fn list_pull_request_comments(
        &self,
        addr: &IssuePrAddress,
    ) -> Traversal<Comment, GitHubApiError> {
        self.list_issue_comments(addr).await
    }

    pub async fn create_pull_request_comment(
        &self,
        addr: &IssuePrAddress,
        body: &str,
    ) -> Result<Comment> {
        self.create_issue_comment(addr, body).await
    }

    pub async fn update_pull_request_comment(
        &self,
        repo: &RepoId,
        id: CommentId,
        body: &str,
    ) -> Result<Comment> {
        self.update_issue_comment(repo, id, body).await
    }

    pub async fn delete_pull_request_comment(&self, repo: &RepoId, id: CommentId) -> Result<()> {
        self.delete_issue_comment(repo, id).await
    }

    // ─── Review comments ──────────────────────────────────────────────────────

    /// Comments attached to lines of the diff.
    pub async fn list_review_comments(
        &self,
        addr: &IssuePrAddress,
    ) -> Traversal<ReviewComment, GitHubApiError> {
        self.list(&pull_route(addr, "/comments")).await
    }

    /// Replies in the thread of an existing review comment.
    pub async fn reply_to_review_comment(
        &self,
        addr: &IssuePrAddress,
        in_reply_to: CommentId,
        body: &str,
    ) -> Result<ReviewComment> {
        let route = pull_route(addr, &format!("/comments/{in_reply_to}/replies"));
        self.send_json(Verb::Post, &route, &json!({ "body": body }))
            .await
    }

    pub async fn update_review_comment(
        &self,
        repo: &RepoId,
        id: CommentId,
        body: &str,
    ) -> Result<ReviewComment> {
        self.send_json(
            Verb::Patch,
            &review_comment_route(repo, id),
            &json!({ "body": body }),
        )
        .await
    }

    pub async fn delete_review_comment(&self, repo: &RepoId, id: CommentId) -> Result<()> {
        let result = self
            .send::<()>(Verb::Delete, &review_comment_route(repo, id), None)
            .await;
        ignore_not_found(result, "review comment")
    }
}
