//! Forge effect types.
//!
//! These describe forge API operations as data. Effects without an explicit
//! repository are scoped to the repository the interpreter was built for;
//! cross-repository lookups (backport targets, census files) name theirs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Comment, CommentId, PrNumber, PullRequest, RepoId, Review, Sha};

/// Requested open/closed state for a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrStateChange {
    Open,
    Closed,
}

/// A forge API effect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ForgeEffect {
    // ─── Pull Request Queries ─────────────────────────────────────────────────
    GetPr { pr: PrNumber },
    ListOpenPrs,
    ListComments { pr: PrNumber },
    ListReviews { pr: PrNumber },
    /// Paths touched by the pull request as a whole.
    ListChangedFiles { pr: PrNumber },
    /// Paths changed between two commits.
    CompareFiles { base: Sha, head: Sha },

    // ─── Pull Request Mutations ───────────────────────────────────────────────
    PostComment { pr: PrNumber, body: String },
    UpdateComment { comment_id: CommentId, body: String },
    AddLabel { pr: PrNumber, label: String },
    RemoveLabel { pr: PrNumber, label: String },
    SetBody { pr: PrNumber, body: String },
    SetTitle { pr: PrNumber, title: String },
    SetState { pr: PrNumber, state: PrStateChange },

    // ─── Commits ──────────────────────────────────────────────────────────────
    GetCommit { commit: Sha },
    ListCommitComments { commit: Sha },
    /// Commit comments created after `since`, repository-wide.
    ListRecentCommitComments { since: DateTime<Utc> },
    PostCommitComment { commit: Sha, body: String },

    // ─── Branches and Files ───────────────────────────────────────────────────
    ListBranches { repo: RepoId },
    DefaultBranch { repo: RepoId },
    CreateBranch { branch: String, commit: Sha },
    GetFileContents {
        repo: RepoId,
        path: String,
        git_ref: String,
    },
}

/// A branch and the commit it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchData {
    pub name: String,
    pub head: Sha,
}

/// Commit metadata needed for backport descriptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitData {
    pub sha: Sha,
    pub author_name: String,
    pub author_email: String,
    pub authored_at: DateTime<Utc>,
    pub message: String,
}

/// A commit comment together with the commit it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitComment {
    pub commit: Sha,
    pub comment: Comment,
}

/// Response from a forge effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ForgeResponse {
    Pr(Box<PullRequest>),
    PrList(Vec<PullRequest>),
    Comments(Vec<Comment>),
    Reviews(Vec<Review>),
    Files(Vec<String>),
    CommentPosted { id: CommentId },
    Commit(CommitData),
    CommitComments(Vec<CommitComment>),
    Branches(Vec<BranchData>),
    DefaultBranch(String),
    FileContents(String),
    /// Mutation acknowledged.
    Done,
}

impl ForgeEffect {
    /// Whether the effect changes forge state.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            ForgeEffect::PostComment { .. }
                | ForgeEffect::UpdateComment { .. }
                | ForgeEffect::AddLabel { .. }
                | ForgeEffect::RemoveLabel { .. }
                | ForgeEffect::SetBody { .. }
                | ForgeEffect::SetTitle { .. }
                | ForgeEffect::SetState { .. }
                | ForgeEffect::PostCommitComment { .. }
                | ForgeEffect::CreateBranch { .. }
        )
    }
}
