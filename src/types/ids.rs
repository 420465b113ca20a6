//! Newtype wrappers for domain identifiers.
//!
//! These types keep pull request numbers, comment ids, commit hashes and
//! issue keys from being mixed up, and make signatures self-documenting.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

static TITLE_ISSUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:([A-Za-z][A-Za-z0-9]*)-)?([0-9]+)\s*:").unwrap());

/// A pull request number within a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrNumber(pub u64);

impl fmt::Display for PrNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for PrNumber {
    fn from(n: u64) -> Self {
        PrNumber(n)
    }
}

/// Error returned when a string is not a full 40-character hex commit hash.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid commit SHA {0:?}: expected 40 hex characters")]
pub struct InvalidSha(pub String);

/// A git commit SHA (40 hex characters).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sha(pub String);

impl Sha {
    /// Creates a new Sha from a string without validating it.
    pub fn new(s: impl Into<String>) -> Self {
        Sha(s.into())
    }

    /// Parses a full hex SHA, normalizing it to lowercase.
    pub fn parse(s: impl AsRef<str>) -> Result<Self, InvalidSha> {
        let s = s.as_ref().trim();
        if s.len() == 40 && s.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(Sha(s.to_ascii_lowercase()))
        } else {
            Err(InvalidSha(s.to_string()))
        }
    }

    /// Returns the SHA as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns a short (7-character) version of the SHA for display.
    pub fn short(&self) -> &str {
        self.0.get(..7).unwrap_or(&self.0)
    }

    /// Returns the 8-character abbreviation used in branch names.
    pub fn abbreviate(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl fmt::Display for Sha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Sha {
    fn from(s: &str) -> Self {
        Sha(s.to_string())
    }
}

/// A repository identifier (owner/repo format).
///
/// Serialized as the `owner/repo` string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
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

    /// Returns `owner/repo`.
    pub fn full_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Error returned when a repository name is not of the form `owner/repo`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid repository name {0:?}: expected owner/repo")]
pub struct InvalidRepoId(pub String);

impl FromStr for RepoId {
    type Err = InvalidRepoId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, repo))
                if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') =>
            {
                Ok(RepoId::new(owner, repo))
            }
            _ => Err(InvalidRepoId(s.to_string())),
        }
    }
}

impl TryFrom<String> for RepoId {
    type Error = InvalidRepoId;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<RepoId> for String {
    fn from(id: RepoId) -> Self {
        id.to_string()
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

/// A forge comment ID (pull request or commit comment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
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

/// An issue-tracker key such as `JDK-8123456`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueId(pub String);

impl IssueId {
    pub fn new(s: impl Into<String>) -> Self {
        IssueId(s.into())
    }

    /// Builds a key from a project and a number, e.g. `("JDK", "123")`.
    pub fn in_project(project: &str, number: &str) -> Self {
        IssueId(format!("{}-{}", project.to_ascii_uppercase(), number))
    }

    /// The issue a pull request title refers to, as in `8123456: Fix foo`.
    ///
    /// A bare number belongs to `project`; a prefixed key must name it.
    pub fn from_title(title: &str, project: &str) -> Option<Self> {
        let caps = TITLE_ISSUE.captures(title)?;
        match caps.get(1) {
            Some(prefix) if !prefix.as_str().eq_ignore_ascii_case(project) => None,
            _ => Some(IssueId::in_project(project, &caps[2])),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The project prefix, if the key has one.
    pub fn project(&self) -> Option<&str> {
        self.0.split_once('-').map(|(p, _)| p)
    }

    /// The key without its project prefix.
    pub fn short_id(&self) -> &str {
        self.0.split_once('-').map(|(_, n)| n).unwrap_or(&self.0)
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
