//! Newtype wrappers for identifiers used across webhook intake and API calls.
//!
//! These keep an issue number from being passed where a comment id is expected,
//! and give every remote mutation a single validated address type.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A repository identifier (owner/repo format).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    pub owner: String,
    pub repo: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        RepoId {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Rejected components of an [`IssuePrAddress`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidAddress {
    #[error("organization must not be empty")]
    EmptyOrg,

    #[error("repository must not be empty")]
    EmptyRepo,

    #[error("issue/PR number must be greater than zero")]
    ZeroNumber,
}

/// The identity of a single issue or pull request: `org/repo#number`.
///
/// GitHub numbers issues and pull requests from one shared sequence, so the same
/// address type serves both. Construction enforces non-empty `org` and `repo`
/// and a positive `number`; the API facade relies on that and does not
/// re-check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct IssuePrAddress {
    org: String,
    repo: String,
    number: u64,
}

impl IssuePrAddress {
    pub fn new(
        org: impl Into<String>,
        repo: impl Into<String>,
        number: u64,
    ) -> Result<Self, InvalidAddress> {
        let org = org.into();
        let repo = repo.into();
        if org.is_empty() {
            return Err(InvalidAddress::EmptyOrg);
        }
        if repo.is_empty() {
            return Err(InvalidAddress::EmptyRepo);
        }
        if number == 0 {
            return Err(InvalidAddress::ZeroNumber);
        }
        Ok(IssuePrAddress { org, repo, number })
    }

    /// Builds an address inside an already-known repository.
    pub fn in_repo(repo: &RepoId, number: u64) -> Result<Self, InvalidAddress> {
        Self::new(repo.owner.clone(), repo.repo.clone(), number)
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn repo_id(&self) -> RepoId {
        RepoId::new(self.org.clone(), self.repo.clone())
    }
}

impl fmt::Display for IssuePrAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.org, self.repo, self.number)
    }
}

/// A GitHub webhook delivery ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryId(pub String);

impl DeliveryId {
    pub fn new(s: impl Into<String>) -> Self {
        DeliveryId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeliveryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for DeliveryId {
    fn from(s: String) -> Self {
        DeliveryId(s)
    }
}

/// A GitHub comment ID (issue comments and review comments share the type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(pub u64);

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CommentId {
    fn from(n: u64) -> Self {
        CommentId(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod issue_pr_address {
        use super::*;
        use proptest::prelude::*;

        #[test]
        fn rejects_empty_org() {
            assert_eq!(
                IssuePrAddress::new("", "repo", 1),
                Err(InvalidAddress::EmptyOrg)
            );
        }

        #[test]
        fn rejects_empty_repo() {
            assert_eq!(
                IssuePrAddress::new("org", "", 1),
                Err(InvalidAddress::EmptyRepo)
            );
        }

        #[test]
        fn rejects_zero_number() {
            assert_eq!(
                IssuePrAddress::new("org", "repo", 0),
                Err(InvalidAddress::ZeroNumber)
            );
        }

        #[test]
        fn display_format() {
            let addr = IssuePrAddress::new("octocat", "hello-world", 42).unwrap();
            assert_eq!(addr.to_string(), "octocat/hello-world#42");
        }

        #[test]
        fn in_repo_copies_owner_and_name() {
            let repo = RepoId::new("octocat", "hello-world");
            let addr = IssuePrAddress::in_repo(&repo, 7).unwrap();
            assert_eq!(addr.repo_id(), repo);
            assert_eq!(addr.number(), 7);
        }

        proptest! {
            #[test]
            fn valid_components_always_accepted(
                org in "[a-z][a-z0-9-]{0,15}",
                repo in "[a-z][a-z0-9_.-]{0,15}",
                number in 1u64..u64::MAX,
            ) {
                let addr = IssuePrAddress::new(org.clone(), repo.clone(), number).unwrap();
                prop_assert_eq!(addr.org(), org.as_str());
                prop_assert_eq!(addr.repo(), repo.as_str());
                prop_assert_eq!(addr.number(), number);
            }
        }
    }

    mod repo_id {
        use super::*;

        #[test]
        fn display_format() {
            let repo = RepoId::new("owner", "repo");
            assert_eq!(repo.to_string(), "owner/repo");
        }
    }

    mod delivery_id {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn serde_is_transparent(s in "[a-f0-9-]{1,36}") {
                let id = DeliveryId::new(s.clone());
                let json = serde_json::to_string(&id).unwrap();
                prop_assert_eq!(json, format!("\"{}\"", s));
            }
        }
    }
}
