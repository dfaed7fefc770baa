//! Repository operations: metadata, labels, collaborators, branches and
//! file contents.

use serde_json::json;

use super::client::{GitHubClient, Result, Verb, file_path, ignore_not_found, segment};
use super::error::GitHubApiError;
use super::models::{
    Branch, BranchProtection, Content, FileCommit, GitReference, Label, NewFile, NewFileBody,
    NewLabel, NewRepository, Repository, RepositoryPermission, RepositoryUpdate, Tree, User,
};
use super::pagination::Traversal;
use crate::types::RepoId;

fn repo_route(repo: &RepoId, tail: &str) -> String {
    format!("/repos/{}/{}{tail}", repo.owner, repo.repo)
}

/// Permission granted when adding a collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Pull,
    Triage,
    #[default]
    Push,
    Maintain,
    Admin,
}

impl GitHubClient {
    // ─── Repository metadata ──────────────────────────────────────────────────

    pub async fn get_repository(&self, repo: &RepoId) -> Result<Repository> {
        self.get_json(&repo_route(repo, "")).await
    }

    /// Creates a repository under `org`, or under the authenticated user when
    /// `org` is `None`.
    pub async fn create_repository(
        &self,
        org: Option<&str>,
        repo: &NewRepository,
    ) -> Result<Repository> {
        let route = match org {
            Some(org) => format!("/orgs/{}/repos", segment(org)),
            None => "/user/repos".to_string(),
        };
        self.send_json(Verb::Post, &route, repo).await
    }

    pub async fn update_repository(
        &self,
        repo: &RepoId,
        update: &RepositoryUpdate,
    ) -> Result<Repository> {
        self.send_json(Verb::Patch, &repo_route(repo, ""), update)
            .await
    }

    // ─── Labels ───────────────────────────────────────────────────────────────

    pub async fn list_repository_labels(&self, repo: &RepoId) -> Traversal<Label, GitHubApiError> {
        self.list(&repo_route(repo, "/labels")).await
    }

    pub async fn create_repository_label(&self, repo: &RepoId, label: &NewLabel) -> Result<Label> {
        self.send_json(Verb::Post, &repo_route(repo, "/labels"), label)
            .await
    }

    // ─── Collaborators ────────────────────────────────────────────────────────

    pub async fn list_collaborators(&self, repo: &RepoId) -> Traversal<User, GitHubApiError> {
        self.list(&repo_route(repo, "/collaborators")).await
    }

    /// GitHub answers 204 for collaborators and 404 for everyone else.
    pub async fn is_collaborator(&self, repo: &RepoId, login: &str) -> Result<bool> {
        let route = repo_route(repo, &format!("/collaborators/{}", segment(login)));
        match self.get_status(&route).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Invites `login`. Returns whether an invitation was created (201) rather
    /// than the user already having access (204).
    pub async fn add_collaborator(
        &self,
        repo: &RepoId,
        login: &str,
        permission: Permission,
    ) -> Result<bool> {
        let route = repo_route(repo, &format!("/collaborators/{}", segment(login)));
        let status = self
            .send(Verb::Put, &route, Some(&json!({ "permission": permission })))
            .await?;
        Ok(status == http::StatusCode::CREATED)
    }

    pub async fn remove_collaborator(&self, repo: &RepoId, login: &str) -> Result<()> {
        let route = repo_route(repo, &format!("/collaborators/{}", segment(login)));
        let result = self.send::<()>(Verb::Delete, &route, None).await;
        ignore_not_found(result, "collaborator")
    }

    pub async fn get_collaborator_permission(
        &self,
        repo: &RepoId,
        login: &str,
    ) -> Result<RepositoryPermission> {
        let route = repo_route(
            repo,
            &format!("/collaborators/{}/permission", segment(login)),
        );
        self.get_json(&route).await
    }

    // ─── Branches and refs ────────────────────────────────────────────────────

    pub async fn list_branches(&self, repo: &RepoId) -> Traversal<Branch, GitHubApiError> {
        self.list(&repo_route(repo, "/branches")).await
    }

    /// Looks up a ref such as `heads/main` or `tags/v1.0`.
    pub async fn get_ref(&self, repo: &RepoId, git_ref: &str) -> Result<GitReference> {
        let git_ref = git_ref.strip_prefix("refs/").unwrap_or(git_ref);
        self.get_json(&repo_route(repo, &format!("/git/ref/{}", file_path(git_ref))))
            .await
    }

    /// Creates `branch` pointing at `sha`.
    pub async fn create_branch(&self, repo: &RepoId, branch: &str, sha: &str) -> Result<GitReference> {
        let body = json!({ "ref": format!("refs/heads/{branch}"), "sha": sha });
        self.send_json(Verb::Post, &repo_route(repo, "/git/refs"), &body)
            .await
    }

    pub async fn set_branch_protection(
        &self,
        repo: &RepoId,
        branch: &str,
        protection: &BranchProtection,
    ) -> Result<()> {
        let route = repo_route(repo, &format!("/branches/{}/protection", segment(branch)));
        self.send(Verb::Put, &route, Some(protection)).await.map(|_| ())
    }

    pub async fn remove_branch_protection(&self, repo: &RepoId, branch: &str) -> Result<()> {
        let route = repo_route(repo, &format!("/branches/{}/protection", segment(branch)));
        let result = self.send::<()>(Verb::Delete, &route, None).await;
        ignore_not_found(result, "branch protection")
    }

    // ─── Trees and contents ───────────────────────────────────────────────────

    /// Reads a tree by SHA or branch name; `recursive` lists every subtree.
    pub async fn get_tree(&self, repo: &RepoId, tree: &str, recursive: bool) -> Result<Tree> {
        let mut route = repo_route(repo, &format!("/git/trees/{}", segment(tree)));
        if recursive {
            route.push_str("?recursive=1");
        }
        self.get_json(&route).await
    }

    /// Reads a file at `path`, from `git_ref` or the default branch.
    pub async fn get_contents(
        &self,
        repo: &RepoId,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Content> {
        let mut route = repo_route(repo, &format!("/contents/{}", file_path(path)));
        if let Some(git_ref) = git_ref {
            route.push_str(&format!("?ref={}", segment(git_ref)));
        }
        self.get_json(&route).await
    }

    pub async fn create_file(&self, repo: &RepoId, path: &str, file: &NewFile) -> Result<FileCommit> {
        let route = repo_route(repo, &format!("/contents/{}", file_path(path)));
        self.send_json(Verb::Put, &route, &NewFileBody::from(file))
            .await
    }
}
