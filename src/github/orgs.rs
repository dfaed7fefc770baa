//! Organisation and account operations.

use super::client::{GitHubClient, Result, segment};
use super::error::GitHubApiError;
use super::models::{Organization, Repository, User};
use super::pagination::Traversal;

impl GitHubClient {
    pub async fn list_org_repositories(&self, org: &str) -> Traversal<Repository, GitHubApiError> {
        self.list(&format!("/orgs/{}/repos", segment(org))).await
    }

    pub async fn list_org_members(&self, org: &str) -> Traversal<User, GitHubApiError> {
        self.list(&format!("/orgs/{}/members", segment(org))).await
    }

    /// Organisations the authenticated account belongs to.
    pub async fn list_user_orgs(&self) -> Traversal<Organization, GitHubApiError> {
        self.list("/user/orgs").await
    }

    /// The account the client's token belongs to.
    pub async fn get_authenticated_user(&self) -> Result<User> {
        self.get_json("/user").await
    }
}

#[cfg(test)]
mod tests {
    use crate::github::client::test_support::{api_path, client_for};
    use crate::test_utils::fixtures;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn members_are_collected_across_pages() {
        let server = MockServer::start().await;
        let route = "/orgs/acme/members";
        let next = format!(
            "<{}{}?per_page=100&page=2>; rel=\"next\"",
            server.uri(),
            api_path(route)
        );
        Mock::given(method("GET"))
            .and(path(api_path(route)))
            .and(query_param("page", "1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([fixtures::user("alice"), fixtures::user("bob")]))
                    .insert_header("Link", next.as_str()),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(api_path(route)))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([fixtures::user("carol")])))
            .expect(1)
            .mount(&server)
            .await;

        let members = client_for(&server)
            .list_org_members("acme")
            .await
            .into_result()
            .unwrap();
        let logins: Vec<_> = members.iter().map(|u| u.login.as_str()).collect();
        assert_eq!(logins, vec!["alice", "bob", "carol"]);
    }

    #[tokio::test]
    async fn user_orgs_single_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(api_path("/user/orgs")))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "login": "acme"}])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let orgs = client_for(&server).list_user_orgs().await;
        assert!(orgs.is_complete());
        assert_eq!(orgs.items[0].login, "acme");
    }

    #[tokio::test]
    async fn authenticated_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(api_path("/user")))
            .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::user("robot")))
            .mount(&server)
            .await;

        let user = client_for(&server).get_authenticated_user().await.unwrap();
        assert_eq!(user.login, "robot");
    }
}
