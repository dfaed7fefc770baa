//! Shared test helpers: signed requests, payload fixtures and proptest strategies.

use axum::body::Body;
use axum::http::{Method, Request, header};
use proptest::prelude::*;

use crate::types::IssuePrAddress;
use crate::webhooks::Signature;
use crate::webhooks::validator::{HEADER_DELIVERY, HEADER_EVENT, HEADER_SIGNATURE};

/// Webhook secret used by every signed test request.
pub const SECRET: &[u8] = b"test-webhook-secret";

/// Builds a POST to `/github-hook` that passes validation with [`SECRET`].
pub fn signed_request(event_type: &str, body: &[u8]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/github-hook")
        .header(HEADER_EVENT, event_type)
        .header(HEADER_DELIVERY, "delivery-1")
        .header(HEADER_SIGNATURE, Signature::compute(SECRET, body).to_header())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_vec()))
        .unwrap()
}

pub fn arb_address() -> impl Strategy<Value = IssuePrAddress> {
    ("[a-z][a-z0-9-]{0,10}", "[a-z][a-z0-9-]{0,10}", 1u64..100_000)
        .prop_map(|(org, repo, n)| IssuePrAddress::new(org, repo, n).unwrap())
}

/// JSON payloads shaped like GitHub's, trimmed to the fields the models read.
pub mod fixtures {
    use serde_json::{Value, json};

    pub const HEAD_SHA: &str = "6dcb09b5b57875f334f61aebed695e2e4193db5e";

    pub fn user(login: &str) -> Value {
        json!({ "id": login.len() as u64 + 1000, "login": login })
    }

    pub fn repository() -> Value {
        json!({
            "name": "hello-world",
            "full_name": "octocat/hello-world",
            "owner": user("octocat"),
            "html_url": "https://github.com/octocat/hello-world",
            "private": false,
            "default_branch": "main"
        })
    }

    fn labels(names: &[&str]) -> Value {
        names
            .iter()
            .map(|name| json!({ "name": name, "color": "ededed" }))
            .collect()
    }

    pub fn pull_request_object(number: u64, author: &str, label_names: &[&str]) -> Value {
        json!({
            "number": number,
            "title": "Add feature",
            "body": "Implements the feature",
            "state": "open",
            "html_url": format!("https://github.com/octocat/hello-world/pull/{number}"),
            "user": user(author),
            "labels": labels(label_names),
            "assignees": [],
            "head": { "ref": "feature", "sha": HEAD_SHA, "label": "octocat:feature" },
            "base": { "ref": "main", "sha": "0000000000000000000000000000000000000001" },
            "draft": false,
            "merged": false,
            "merge_commit_sha": null
        })
    }

    pub fn pull_request(action: &str, number: u64, author: &str, label_names: &[&str]) -> Value {
        json!({
            "action": action,
            "number": number,
            "pull_request": pull_request_object(number, author, label_names),
            "repository": repository(),
            "sender": user(author)
        })
    }

    fn issue_object(number: u64, author: &str, label_names: &[&str], on_pr: bool) -> Value {
        let mut issue = json!({
            "number": number,
            "title": "Something is broken",
            "body": null,
            "state": "open",
            "html_url": format!("https://github.com/octocat/hello-world/issues/{number}"),
            "user": user(author),
            "labels": labels(label_names),
            "assignees": []
        });
        if on_pr {
            issue["pull_request"] = json!({
                "html_url": format!("https://github.com/octocat/hello-world/pull/{number}")
            });
        }
        issue
    }

    pub fn issue(action: &str, number: u64, author: &str) -> Value {
        json!({
            "action": action,
            "issue": issue_object(number, author, &[], false),
            "repository": repository(),
            "sender": user(author)
        })
    }

    /// An `issue_comment` payload; the issue author is `author`.
    pub fn issue_comment_with_labels(
        number: u64,
        author: &str,
        on_pr: bool,
        label_names: &[&str],
    ) -> Value {
        json!({
            "action": "created",
            "issue": issue_object(number, author, label_names, on_pr),
            "comment": {
                "id": 5001,
                "body": "/lgtm",
                "html_url": format!("https://github.com/octocat/hello-world/issues/{number}#issuecomment-5001"),
                "user": user("commenter"),
                "created_at": "2024-01-01T00:00:00Z"
            },
            "repository": repository(),
            "sender": user("commenter")
        })
    }

    pub fn issue_comment(number: u64, author: &str, on_pr: bool) -> Value {
        issue_comment_with_labels(number, author, on_pr, &[])
    }

    pub fn push(git_ref: &str) -> Value {
        json!({
            "ref": git_ref,
            "before": "0000000000000000000000000000000000000000",
            "after": HEAD_SHA,
            "created": false,
            "deleted": false,
            "forced": false,
            "commits": [{ "id": HEAD_SHA, "message": "Fix bug", "url": null }],
            "repository": repository(),
            "sender": user("octocat")
        })
    }

    pub fn status(state: &str) -> Value {
        json!({
            "id": 77,
            "sha": HEAD_SHA,
            "state": state,
            "context": "ci/build",
            "description": "Build finished",
            "target_url": "https://ci.example.com/builds/1",
            "repository": repository(),
            "sender": user("ci-bot")
        })
    }

    pub fn review(number: u64, reviewer: &str) -> Value {
        json!({
            "action": "submitted",
            "review": {
                "id": 900,
                "user": user(reviewer),
                "body": "Looks good",
                "state": "approved",
                "html_url": format!("https://github.com/octocat/hello-world/pull/{number}#pullrequestreview-900"),
                "commit_id": HEAD_SHA,
                "submitted_at": "2024-01-01T00:00:00Z"
            },
            "pull_request": pull_request_object(number, "alice", &[]),
            "repository": repository(),
            "sender": user(reviewer)
        })
    }

    pub fn review_comment(number: u64, author: &str) -> Value {
        json!({
            "action": "created",
            "comment": {
                "id": 6001,
                "pull_request_review_id": 900,
                "body": "nit: rename",
                "html_url": format!("https://github.com/octocat/hello-world/pull/{number}#discussion_r6001"),
                "user": user(author),
                "path": "src/lib.rs",
                "commit_id": HEAD_SHA
            },
            "pull_request": pull_request_object(number, "alice", &[]),
            "repository": repository(),
            "sender": user(author)
        })
    }

    pub fn commit_comment(author: &str) -> Value {
        json!({
            "action": "created",
            "comment": {
                "id": 7001,
                "body": "Nice commit",
                "html_url": format!("https://github.com/octocat/hello-world/commit/{HEAD_SHA}#commitcomment-7001"),
                "user": user(author),
                "commit_id": HEAD_SHA,
                "path": null
            },
            "repository": repository(),
            "sender": user(author)
        })
    }
}
