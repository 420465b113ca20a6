//! Issue-tracker types.
//!
//! Tracker data is not fully trusted: resolution and status may be missing
//! even on closed issues, so they are `Option`s and every predicate treats a
//! missing value as "not satisfied".

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::ids::IssueId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueState {
    Open,
    Closed,
}

/// Typed relation of an issue link, as seen from the issue holding the link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkRelation {
    /// The linked issue is the CSR for this issue.
    CsrFor,
    /// This issue is a CSR; the linked issue is the change it covers.
    CsrOf,
    /// The linked issue backports this issue.
    BackportedBy,
    /// This issue is a backport of the linked issue.
    BackportOf,
    Other(String),
}

impl LinkRelation {
    /// Maps a tracker link phrase (e.g. `"csr for"`) to a relation.
    pub fn from_phrase(phrase: &str) -> Self {
        match phrase.trim().to_ascii_lowercase().as_str() {
            "csr for" => LinkRelation::CsrFor,
            "csr of" => LinkRelation::CsrOf,
            "backported by" => LinkRelation::BackportedBy,
            "backport of" => LinkRelation::BackportOf,
            other => LinkRelation::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueLink {
    pub relation: LinkRelation,
    pub target: IssueId,
}

/// Issue types that count as the "main" issue of a change.
pub const PRIMARY_TYPES: &[&str] = &["Bug", "New Feature", "Enhancement", "Task", "Sub-task"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: IssueId,
    pub title: String,
    pub issue_type: Option<String>,
    pub state: IssueState,
    pub resolution: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub fix_versions: BTreeSet<String>,
    #[serde(default)]
    pub links: Vec<IssueLink>,
    #[serde(default)]
    pub labels: BTreeSet<String>,
    /// JEP number, when the issue is a JEP that has one allocated.
    #[serde(default)]
    pub jep_number: Option<String>,
    pub web_url: String,
}

impl Issue {
    pub fn is_open(&self) -> bool {
        self.state == IssueState::Open
    }

    pub fn is_type(&self, name: &str) -> bool {
        self.issue_type.as_deref() == Some(name)
    }

    pub fn is_primary(&self) -> bool {
        self.issue_type
            .as_deref()
            .is_some_and(|t| PRIMARY_TYPES.contains(&t))
    }

    /// Closed with the given resolution. A missing resolution never matches.
    pub fn is_closed_as(&self, resolution: &str) -> bool {
        self.state == IssueState::Closed && self.resolution.as_deref() == Some(resolution)
    }

    /// Ids of linked issues with the given relation, in link order.
    pub fn linked(&self, relation: &LinkRelation) -> Vec<&IssueId> {
        self.links
            .iter()
            .filter(|l| &l.relation == relation)
            .map(|l| &l.target)
            .collect()
    }

    /// A JEP counts as targeted once it reached one of the late statuses, or
    /// was closed as delivered.
    pub fn is_targeted_jep(&self) -> bool {
        match self.status.as_deref() {
            Some("Targeted" | "Integrated" | "Completed") => true,
            Some("Closed") => self.resolution.as_deref() == Some("Delivered"),
            _ => false,
        }
    }
}
