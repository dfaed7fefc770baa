//! Issue operations: state, comments, labels, assignees and timeline.
//!
//! Pull requests are issues as far as comments, labels and assignees go; the
//! pull request variants in `pulls` delegate here.

use serde_json::json;

use super::client::{GitHubClient, Result, Verb, ignore_not_found, segment};
use super::error::GitHubApiError;
use super::models::{
    Comment, Issue, IssueState, IssueUpdate, Label, NewIssue, TimelineEvent, User,
};
use super::pagination::Traversal;
use crate::types::{CommentId, IssuePrAddress, RepoId};

pub(crate) fn issue_route(addr: &IssuePrAddress, tail: &str) -> String {
    format!(
        "/repos/{}/{}/issues/{}{tail}",
        addr.org(),
        addr.repo(),
        addr.number()
    )
}

fn comment_route(repo: &RepoId, id: CommentId) -> String {
    format!("/repos/{}/{}/issues/comments/{id}", repo.owner, repo.repo)
}

impl GitHubClient {
    // ─── Issue state ──────────────────────────────────────────────────────────

    pub async fn get_issue(&self, addr: &IssuePrAddress) -> Result<Issue> {
        self.get_json(&issue_route(addr, "")).await
    }

    pub async fn create_issue(&self, repo: &RepoId, issue: &NewIssue) -> Result<Issue> {
        let route = format!("/repos/{}/{}/issues", repo.owner, repo.repo);
        self.send_json(Verb::Post, &route, issue).await
    }

    pub async fn update_issue(&self, addr: &IssuePrAddress, update: &IssueUpdate) -> Result<Issue> {
        self.send_json(Verb::Patch, &issue_route(addr, ""), update)
            .await
    }

    pub async fn close_issue(&self, addr: &IssuePrAddress) -> Result<Issue> {
        self.set_issue_state(addr, IssueState::Closed).await
    }

    pub async fn reopen_issue(&self, addr: &IssuePrAddress) -> Result<Issue> {
        self.set_issue_state(addr, IssueState::Open).await
    }

    async fn set_issue_state(&self, addr: &IssuePrAddress, state: IssueState) -> Result<Issue> {
        let update = IssueUpdate {
            state: Some(state),
            ..Default::default()
        };
        self.update_issue(addr, &update).await
    }

    // ─── Comments ─────────────────────────────────────────────────────────────

    /// All conversation comments, oldest first.
    pub async fn list_issue_comments(
        &self,
        addr: &IssuePrAddress,
    ) -> Traversal<Comment, GitHubApiError> {
        self.list(&issue_route(addr, "/comments")).await
    }

    pub async fn create_issue_comment(&self, addr: &IssuePrAddress, body: &str) -> Result<Comment> {
        self.send_json(
            Verb::Post,
            &issue_route(addr, "/comments"),
            &json!({ "body": body }),
        )
        .await
    }

    pub async fn update_issue_comment(
        &self,
        repo: &RepoId,
        id: CommentId,
        body: &str,
    ) -> Result<Comment> {
        self.send_json(Verb::Patch, &comment_route(repo, id), &json!({ "body": body }))
            .await
    }

    /// Deletes a comment. A comment that is already gone counts as deleted.
    pub async fn delete_issue_comment(&self, repo: &RepoId, id: CommentId) -> Result<()> {
        let result = self
            .send::<()>(Verb::Delete, &comment_route(repo, id), None)
            .await;
        ignore_not_found(result, "comment")
    }

    // ─── Labels ───────────────────────────────────────────────────────────────

    pub async fn list_issue_labels(&self, addr: &IssuePrAddress) -> Traversal<Label, GitHubApiError> {
        self.list(&issue_route(addr, "/labels")).await
    }

    /// Adds labels, keeping existing ones. Returns the resulting label list.
    pub async fn add_issue_labels(
        &self,
        addr: &IssuePrAddress,
        labels: &[&str],
    ) -> Result<Vec<Label>> {
        self.send_json(
            Verb::Post,
            &issue_route(addr, "/labels"),
            &json!({ "labels": labels }),
        )
        .await
    }

    /// Removes one label. A label that is not attached counts as removed.
    pub async fn remove_issue_label(&self, addr: &IssuePrAddress, label: &str) -> Result<()> {
        let route = issue_route(addr, &format!("/labels/{}", segment(label)));
        let result = self.send::<()>(Verb::Delete, &route, None).await;
        ignore_not_found(result, "label")
    }

    // ─── Assignees ────────────────────────────────────────────────────────────

    pub async fn assign_issue(&self, addr: &IssuePrAddress, logins: &[&str]) -> Result<Issue> {
        self.send_json(
            Verb::Post,
            &issue_route(addr, "/assignees"),
            &json!({ "assignees": logins }),
        )
        .await
    }

    /// Removes assignees. Missing issues count as already unassigned.
    pub async fn unassign_issue(&self, addr: &IssuePrAddress, logins: &[&str]) -> Result<()> {
        let result = self
            .send(
                Verb::Delete,
                &issue_route(addr, "/assignees"),
                Some(&json!({ "assignees": logins })),
            )
            .await;
        ignore_not_found(result, "assignees")
    }

    // ─── Timeline ─────────────────────────────────────────────────────────────

    /// Every timeline entry (labels, references, reviews, ...), oldest first.
    pub async fn list_timeline(
        &self,
        addr: &IssuePrAddress,
    ) -> Traversal<TimelineEvent, GitHubApiError> {
        self.list(&issue_route(addr, "/timeline")).await
    }

    /// Lists the assignable users of a repository.
    pub async fn list_assignees(&self, repo: &RepoId) -> Traversal<User, GitHubApiError> {
        self.list(&format!("/repos/{}/{}/assignees", repo.owner, repo.repo))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::client::test_support::{api_path, client_for};
    use crate::test_utils::fixtures;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn addr() -> IssuePrAddress {
        IssuePrAddress::new("octocat", "hello-world", 7).unwrap()
    }

    fn comment_json(id: u64, body: &str) -> serde_json::Value {
        json!({
            "id": id,
            "body": body,
            "html_url": format!("https://github.com/octocat/hello-world/issues/7#issuecomment-{id}"),
            "user": fixtures::user("robot"),
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    #[tokio::test]
    async fn removing_absent_label_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(api_path(
                "/repos/octocat/hello-world/issues/7/labels/needs%20review",
            )))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"message": "Label does not exist"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .remove_issue_label(&addr(), "needs review")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn removing_label_surfaces_other_errors() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "Must have admin rights"})))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .remove_issue_label(&addr(), "bug")
            .await
            .unwrap_err();
        assert_eq!(err.status_code, Some(403));
        assert_eq!(err.message, "Must have admin rights");
    }

    #[tokio::test]
    async fn deleting_absent_comment_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(api_path("/repos/octocat/hello-world/issues/comments/99")))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .delete_issue_comment(&RepoId::new("octocat", "hello-world"), CommentId(99))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn create_comment_posts_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(api_path("/repos/octocat/hello-world/issues/7/comments")))
            .and(body_json(json!({"body": "hello"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(comment_json(1, "hello")))
            .expect(1)
            .mount(&server)
            .await;

        let comment = client_for(&server)
            .create_issue_comment(&addr(), "hello")
            .await
            .unwrap();
        assert_eq!(comment.id, CommentId(1));
        assert_eq!(comment.user.login, "robot");
    }

    #[tokio::test]
    async fn failed_comment_is_posted_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(api_path("/repos/octocat/hello-world/issues/7/comments")))
            .respond_with(ResponseTemplate::new(502))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server)
            .create_issue_comment(&addr(), "hello")
            .await
            .unwrap_err();
        assert_eq!(err.status_code, Some(502));
        assert!(err.is_retriable());
    }

    #[tokio::test]
    async fn close_issue_patches_state() {
        let server = MockServer::start().await;
        let mut closed = fixtures::issue("closed", 7, "alice")["issue"].clone();
        closed["state"] = "closed".into();
        Mock::given(method("PATCH"))
            .and(path(api_path("/repos/octocat/hello-world/issues/7")))
            .and(body_json(json!({"state": "closed"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(closed))
            .expect(1)
            .mount(&server)
            .await;

        let issue = client_for(&server).close_issue(&addr()).await.unwrap();
        assert_eq!(issue.state, "closed");
    }

    #[tokio::test]
    async fn add_labels_returns_resulting_set() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(api_path("/repos/octocat/hello-world/issues/7/labels")))
            .and(body_json(json!({"labels": ["bug", "lgtm"]})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"name": "bug"}, {"name": "lgtm"}])),
            )
            .mount(&server)
            .await;

        let labels = client_for(&server)
            .add_issue_labels(&addr(), &["bug", "lgtm"])
            .await
            .unwrap();
        assert_eq!(labels.len(), 2);
    }
}
