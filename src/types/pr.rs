//! Pull request types as observed from the forge.
//!
//! The reconciliation pass treats a pull request as a document to be read and
//! patched: these types are snapshots, never mutated in place to reflect
//! pending changes (see [`crate::desired::DesiredState`] for that).

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{CommentId, PrNumber, RepoId, Sha};

/// The state of a pull request.
///
/// `Integrated` carries the commit that landed the change on the target
/// branch; a pull request is never integrated without one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PrState {
    Open,
    Closed,
    Integrated { commit: Sha },
}

impl PrState {
    pub fn is_open(&self) -> bool {
        matches!(self, PrState::Open)
    }

    pub fn is_integrated(&self) -> bool {
        matches!(self, PrState::Integrated { .. })
    }

    /// Closed without being integrated.
    pub fn is_abandoned(&self) -> bool {
        matches!(self, PrState::Closed)
    }

    pub fn integrated_commit(&self) -> Option<&Sha> {
        match self {
            PrState::Integrated { commit } => Some(commit),
            _ => None,
        }
    }
}

/// A pull request snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub repo: RepoId,
    pub number: PrNumber,
    pub title: String,
    pub body: String,
    /// Forge login of the author.
    pub author: String,
    pub labels: BTreeSet<String>,
    pub state: PrState,
    pub source_ref: String,
    pub target_ref: String,
    pub head_sha: Sha,
}

impl PullRequest {
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    pub fn is_author(&self, login: &str) -> bool {
        self.author.eq_ignore_ascii_case(login)
    }
}

/// A comment on a pull request or a commit.
///
/// Comments are always handled in the chronological order the forge returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// The verdict of a single review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewVerdict {
    Approved,
    ChangesRequested,
    Commented,
    Dismissed,
}

/// A review submitted on a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub reviewer: String,
    pub verdict: ReviewVerdict,
    pub sha: Option<Sha>,
    pub submitted_at: DateTime<Utc>,
}

/// Collapses a review list to the latest verdict per reviewer.
///
/// Plain comments do not override an earlier approval or rejection, matching
/// how the forge itself computes review decisions.
pub fn latest_reviews(reviews: &[Review]) -> BTreeMap<String, &Review> {
    let mut ordered: Vec<&Review> = reviews.iter().collect();
    ordered.sort_by_key(|r| r.submitted_at);

    let mut latest = BTreeMap::new();
    for review in ordered {
        let key = review.reviewer.to_ascii_lowercase();
        if review.verdict == ReviewVerdict::Commented && latest.contains_key(&key) {
            continue;
        }
        latest.insert(key, review);
    }
    latest
}

/// Logins whose latest review approves the pull request.
pub fn approvers(reviews: &[Review]) -> Vec<String> {
    latest_reviews(reviews)
        .into_values()
        .filter(|r| r.verdict == ReviewVerdict::Approved)
        .map(|r| r.reviewer.clone())
        .collect()
}
