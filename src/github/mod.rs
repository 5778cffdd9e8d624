pub mod auth;
pub mod client;

pub use auth::{GitHubToken, TOKEN_COOKIE};
pub use client::{GitHubClient, GitHubSource};

use std::fmt;

use crate::error::{AppError, Result};

/// `owner/name` repository identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let owner = owner.into();
        let name = name.into();
        let valid = |s: &str| !s.is_empty() && !s.contains('/') && s != "." && s != "..";
        if !valid(&owner) || !valid(&name) {
            return Err(AppError::BadRequest(format!(
                "invalid repository: {}/{}",
                owner, name
            )));
        }
        Ok(Self { owner, name })
    }

    pub fn parse(full_name: &str) -> Result<Self> {
        let (owner, name) = full_name
            .trim()
            .split_once('/')
            .ok_or_else(|| AppError::BadRequest(format!("expected owner/name, got {:?}", full_name)))?;
        Self::new(owner, name)
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_owner_and_name() {
        let repo = RepoId::parse(" octo/demo ").unwrap();
        assert_eq!(repo.owner, "octo");
        assert_eq!(repo.name, "demo");
        assert_eq!(repo.to_string(), "octo/demo");
    }

    #[test]
    fn rejects_malformed_identifiers() {
        for bad in ["", "octo", "octo/", "/demo", "a/b/c", "../x"] {
            assert!(matches!(RepoId::parse(bad), Err(AppError::BadRequest(_))), "{}", bad);
        }
    }
}
