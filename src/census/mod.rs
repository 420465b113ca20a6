//! Project role registry.
//!
//! A census snapshot maps platform logins to project identities and roles.
//! Snapshots are immutable once parsed; freshness is handled by
//! [`cache::CensusCache`], which swaps in whole new snapshots.

pub mod cache;
pub mod source;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use cache::CensusCache;
pub use source::{CensusSource, FileCensusSource, ForgeCensusSource};

use crate::config::CensusLocation;
use crate::effects::ForgeInterpreter;

/// Errors from loading a census.
#[derive(Debug, Error)]
pub enum CensusError {
    #[error("census could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("census I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("census source failed: {0}")]
    Source(String),
}

/// Project roles, ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Contributor,
    Author,
    Committer,
    Reviewer,
    Lead,
}

impl Role {
    pub fn title(&self) -> &'static str {
        match self {
            Role::Contributor => "Contributor",
            Role::Author => "Author",
            Role::Committer => "Committer",
            Role::Reviewer => "Reviewer",
            Role::Lead => "Lead",
        }
    }
}

/// A person known to the census.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
    /// Forge logins mapped to this identity.
    #[serde(default)]
    pub logins: Vec<String>,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
struct CensusDocument {
    version: u64,
    domain: String,
    #[serde(default)]
    contributors: Vec<Contributor>,
    #[serde(default)]
    integrators: BTreeSet<String>,
}

/// An immutable census for one ref.
#[derive(Debug, Clone)]
pub struct CensusSnapshot {
    version: u64,
    domain: String,
    content_hash: String,
    contributors: BTreeMap<String, Contributor>,
    by_login: HashMap<String, String>,
    integrators: BTreeSet<String>,
}

impl CensusSnapshot {
    /// Parses a census document. `content_hash` identifies the raw content.
    pub fn from_json(json: &str, content_hash: impl Into<String>) -> Result<Self, CensusError> {
        let doc: CensusDocument = serde_json::from_str(json)?;
        let mut by_login = HashMap::new();
        let mut contributors = BTreeMap::new();
        for c in doc.contributors {
            for login in &c.logins {
                by_login.insert(login.to_ascii_lowercase(), c.username.clone());
            }
            contributors.insert(c.username.clone(), c);
        }
        Ok(CensusSnapshot {
            version: doc.version,
            domain: doc.domain,
            content_hash: content_hash.into(),
            contributors,
            by_login,
            integrators: doc
                .integrators
                .into_iter()
                .map(|l| l.to_ascii_lowercase())
                .collect(),
        })
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// Looks up a census identity by census username.
    pub fn contributor(&self, username: &str) -> Option<&Contributor> {
        self.contributors.get(username)
    }

    /// Looks up the census identity mapped to a forge login.
    pub fn contributor_for_login(&self, login: &str) -> Option<&Contributor> {
        self.by_login
            .get(&login.to_ascii_lowercase())
            .and_then(|u| self.contributors.get(u))
    }

    pub fn role_of(&self, login: &str) -> Option<Role> {
        self.contributor_for_login(login).map(|c| c.role)
    }

    pub fn is_committer(&self, login: &str) -> bool {
        self.role_of(login).is_some_and(|r| r >= Role::Committer)
    }

    pub fn is_reviewer(&self, login: &str) -> bool {
        self.role_of(login).is_some_and(|r| r >= Role::Reviewer)
    }

    pub fn is_integrator(&self, login: &str) -> bool {
        self.integrators.contains(&login.to_ascii_lowercase())
    }

    /// `Full Name <username@domain>`, if the census records a full name.
    pub fn full_identity(&self, username: &str) -> Option<String> {
        let c = self.contributor(username)?;
        let name = c.full_name.as_deref()?;
        Some(format!("{} <{}@{}>", name, c.username, self.domain))
    }
}

/// Returns the census at `location` through `cache`.
pub async fn load<F: ForgeInterpreter>(
    cache: &CensusCache,
    location: &CensusLocation,
    forge: &F,
) -> Result<Arc<CensusSnapshot>, CensusError> {
    match location {
        CensusLocation::File { path } => cache.get(&FileCensusSource::new(path)).await,
        CensusLocation::Repository {
            repository,
            path,
            git_ref,
        } => {
            let source = ForgeCensusSource::new(forge, repository.clone(), path, git_ref);
            cache.get(&source).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "version": 7,
        "domain": "example.org",
        "contributors": [
            {"username": "alice", "full_name": "Alice Smith", "logins": ["alice-gh"], "role": "reviewer"},
            {"username": "bob", "full_name": "Bob Jones", "logins": ["BobGH"], "role": "committer"},
            {"username": "carol", "logins": ["carol-gh"], "role": "author"}
        ],
        "integrators": ["Alice-GH"]
    }"#;

    #[test]
    fn parses_roles_and_logins() {
        let census = CensusSnapshot::from_json(SAMPLE, "h").unwrap();
        assert_eq!(census.version(), 7);
        assert!(census.is_reviewer("alice-gh"));
        assert!(census.is_committer("bobgh"));
        assert!(!census.is_reviewer("BobGH"));
        assert!(!census.is_committer("carol-gh"));
        assert!(census.is_integrator("alice-gh"));
        assert!(!census.is_integrator("bobgh"));
        assert_eq!(census.role_of("stranger"), None);
    }

    #[test]
    fn full_identity_needs_full_name() {
        let census = CensusSnapshot::from_json(SAMPLE, "h").unwrap();
        assert_eq!(
            census.full_identity("alice").as_deref(),
            Some("Alice Smith <alice@example.org>")
        );
        assert_eq!(census.full_identity("carol"), None);
        assert_eq!(census.full_identity("nobody"), None);
    }

    #[test]
    fn role_order() {
        assert!(Role::Lead > Role::Reviewer);
        assert!(Role::Reviewer > Role::Committer);
        assert!(Role::Committer > Role::Author);
        assert!(Role::Author > Role::Contributor);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(matches!(
            CensusSnapshot::from_json("{\"version\": 1}", "h"),
            Err(CensusError::Parse(_))
        ));
    }
}
