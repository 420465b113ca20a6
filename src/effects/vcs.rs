//! Version-control effect types.
//!
//! The VCS collaborator works on a scratch repository: it fetches from and
//! pushes to remotes identified by [`RepoId`], never touching a checkout that
//! a human uses.

use serde::{Deserialize, Serialize};

use crate::types::{RepoId, Sha};

/// Outcome of applying a commit onto a branch tip.
///
/// A conflict is a reported outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CherryPickOutcome {
    /// The change applied and produced this new commit.
    Clean { commit: Sha },
    /// The change conflicts in these paths; nothing was committed.
    Conflict { paths: Vec<String> },
    /// The target already contains the change.
    NoOp,
}

/// A VCS effect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VcsEffect {
    /// Resolves a branch of a remote repository to its tip.
    ResolveBranch { repo: RepoId, branch: String },

    /// Applies `commit` (fetched from `source`) onto the tip of
    /// `target:branch`, committing with `message` when it applies.
    CherryPick {
        source: RepoId,
        commit: Sha,
        target: RepoId,
        branch: String,
        message: String,
    },

    /// Pushes a commit previously produced by `CherryPick` to a branch.
    Push {
        repo: RepoId,
        commit: Sha,
        branch: String,
        force: bool,
    },
}

/// Response from a VCS effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum VcsResponse {
    Resolved(Option<Sha>),
    CherryPick(CherryPickOutcome),
    Pushed,
}
