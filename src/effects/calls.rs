//! Typed wrappers around the interpreters.
//!
//! Each helper issues one effect and unpacks the matching response variant,
//! turning a mismatched variant into [`EffectError::UnexpectedResponse`].

use chrono::{DateTime, Utc};

use super::EffectError;
use super::forge::{BranchData, CommitComment, CommitData, ForgeEffect, ForgeResponse};
use super::interpreter::{ForgeInterpreter, TrackerInterpreter, VcsInterpreter};
use super::tracker::{TrackerEffect, TrackerResponse};
use super::vcs::{CherryPickOutcome, VcsEffect, VcsResponse};
use crate::types::{
    Comment, CommentId, Issue, IssueId, LinkRelation, PrNumber, PullRequest, RepoId, Review, Sha,
};

async fn forge_call<F: ForgeInterpreter>(
    forge: &F,
    effect: ForgeEffect,
) -> Result<(ForgeEffect, ForgeResponse), EffectError> {
    let response = forge
        .interpret(effect.clone())
        .await
        .map_err(EffectError::forge)?;
    Ok((effect, response))
}

// ─── Forge Queries ────────────────────────────────────────────────────────────

pub async fn get_pr<F: ForgeInterpreter>(forge: &F, pr: PrNumber) -> Result<PullRequest, EffectError> {
    match forge_call(forge, ForgeEffect::GetPr { pr }).await? {
        (_, ForgeResponse::Pr(pr)) => Ok(*pr),
        (e, other) => Err(EffectError::unexpected(&e, &other)),
    }
}

pub async fn list_open_prs<F: ForgeInterpreter>(forge: &F) -> Result<Vec<PullRequest>, EffectError> {
    match forge_call(forge, ForgeEffect::ListOpenPrs).await? {
        (_, ForgeResponse::PrList(prs)) => Ok(prs),
        (e, other) => Err(EffectError::unexpected(&e, &other)),
    }
}

pub async fn list_comments<F: ForgeInterpreter>(
    forge: &F,
    pr: PrNumber,
) -> Result<Vec<Comment>, EffectError> {
    match forge_call(forge, ForgeEffect::ListComments { pr }).await? {
        (_, ForgeResponse::Comments(comments)) => Ok(comments),
        (e, other) => Err(EffectError::unexpected(&e, &other)),
    }
}

pub async fn list_reviews<F: ForgeInterpreter>(
    forge: &F,
    pr: PrNumber,
) -> Result<Vec<Review>, EffectError> {
    match forge_call(forge, ForgeEffect::ListReviews { pr }).await? {
        (_, ForgeResponse::Reviews(reviews)) => Ok(reviews),
        (e, other) => Err(EffectError::unexpected(&e, &other)),
    }
}

pub async fn list_changed_files<F: ForgeInterpreter>(
    forge: &F,
    pr: PrNumber,
) -> Result<Vec<String>, EffectError> {
    match forge_call(forge, ForgeEffect::ListChangedFiles { pr }).await? {
        (_, ForgeResponse::Files(files)) => Ok(files),
        (e, other) => Err(EffectError::unexpected(&e, &other)),
    }
}

pub async fn compare_files<F: ForgeInterpreter>(
    forge: &F,
    base: Sha,
    head: Sha,
) -> Result<Vec<String>, EffectError> {
    match forge_call(forge, ForgeEffect::CompareFiles { base, head }).await? {
        (_, ForgeResponse::Files(files)) => Ok(files),
        (e, other) => Err(EffectError::unexpected(&e, &other)),
    }
}

pub async fn get_commit<F: ForgeInterpreter>(forge: &F, commit: Sha) -> Result<CommitData, EffectError> {
    match forge_call(forge, ForgeEffect::GetCommit { commit }).await? {
        (_, ForgeResponse::Commit(data)) => Ok(data),
        (e, other) => Err(EffectError::unexpected(&e, &other)),
    }
}

pub async fn list_commit_comments<F: ForgeInterpreter>(
    forge: &F,
    commit: Sha,
) -> Result<Vec<Comment>, EffectError> {
    match forge_call(forge, ForgeEffect::ListCommitComments { commit }).await? {
        (_, ForgeResponse::CommitComments(comments)) => {
            Ok(comments.into_iter().map(|c| c.comment).collect())
        }
        (e, other) => Err(EffectError::unexpected(&e, &other)),
    }
}

pub async fn list_recent_commit_comments<F: ForgeInterpreter>(
    forge: &F,
    since: DateTime<Utc>,
) -> Result<Vec<CommitComment>, EffectError> {
    match forge_call(forge, ForgeEffect::ListRecentCommitComments { since }).await? {
        (_, ForgeResponse::CommitComments(comments)) => Ok(comments),
        (e, other) => Err(EffectError::unexpected(&e, &other)),
    }
}

pub async fn list_branches<F: ForgeInterpreter>(
    forge: &F,
    repo: RepoId,
) -> Result<Vec<BranchData>, EffectError> {
    match forge_call(forge, ForgeEffect::ListBranches { repo }).await? {
        (_, ForgeResponse::Branches(branches)) => Ok(branches),
        (e, other) => Err(EffectError::unexpected(&e, &other)),
    }
}

pub async fn default_branch<F: ForgeInterpreter>(
    forge: &F,
    repo: RepoId,
) -> Result<String, EffectError> {
    match forge_call(forge, ForgeEffect::DefaultBranch { repo }).await? {
        (_, ForgeResponse::DefaultBranch(name)) => Ok(name),
        (e, other) => Err(EffectError::unexpected(&e, &other)),
    }
}

pub async fn file_contents<F: ForgeInterpreter>(
    forge: &F,
    repo: RepoId,
    path: String,
    git_ref: String,
) -> Result<String, EffectError> {
    match forge_call(forge, ForgeEffect::GetFileContents { repo, path, git_ref }).await? {
        (_, ForgeResponse::FileContents(text)) => Ok(text),
        (e, other) => Err(EffectError::unexpected(&e, &other)),
    }
}

// ─── Forge Mutations ──────────────────────────────────────────────────────────

pub async fn post_comment<F: ForgeInterpreter>(
    forge: &F,
    pr: PrNumber,
    body: String,
) -> Result<CommentId, EffectError> {
    match forge_call(forge, ForgeEffect::PostComment { pr, body }).await? {
        (_, ForgeResponse::CommentPosted { id }) => Ok(id),
        (e, other) => Err(EffectError::unexpected(&e, &other)),
    }
}

/// Applies a mutation whose only meaningful response is an acknowledgement.
///
/// `PostComment` and `PostCommitComment` answer with the new comment id,
/// which is accepted and dropped here.
pub async fn apply_forge<F: ForgeInterpreter>(
    forge: &F,
    effect: ForgeEffect,
) -> Result<(), EffectError> {
    match forge_call(forge, effect).await? {
        (_, ForgeResponse::Done | ForgeResponse::CommentPosted { .. }) => Ok(()),
        (e, other) => Err(EffectError::unexpected(&e, &other)),
    }
}

// ─── Tracker ──────────────────────────────────────────────────────────────────

async fn tracker_call<T: TrackerInterpreter>(
    tracker: &T,
    effect: TrackerEffect,
) -> Result<(TrackerEffect, TrackerResponse), EffectError> {
    let response = tracker
        .interpret(effect.clone())
        .await
        .map_err(EffectError::tracker)?;
    Ok((effect, response))
}

pub async fn get_issue<T: TrackerInterpreter>(
    tracker: &T,
    id: IssueId,
) -> Result<Option<Issue>, EffectError> {
    match tracker_call(tracker, TrackerEffect::GetIssue { id }).await? {
        (_, TrackerResponse::Issue(issue)) => Ok(issue.map(|i| *i)),
        (e, other) => Err(EffectError::unexpected(&e, &other)),
    }
}

pub async fn linked_issues<T: TrackerInterpreter>(
    tracker: &T,
    id: IssueId,
    relation: LinkRelation,
) -> Result<Vec<Issue>, EffectError> {
    match tracker_call(tracker, TrackerEffect::GetLinkedIssues { id, relation }).await? {
        (_, TrackerResponse::Issues(issues)) => Ok(issues),
        (e, other) => Err(EffectError::unexpected(&e, &other)),
    }
}

pub async fn find_jep<T: TrackerInterpreter>(
    tracker: &T,
    number: String,
) -> Result<Option<Issue>, EffectError> {
    match tracker_call(tracker, TrackerEffect::FindJep { number }).await? {
        (_, TrackerResponse::Issue(issue)) => Ok(issue.map(|i| *i)),
        (e, other) => Err(EffectError::unexpected(&e, &other)),
    }
}

pub async fn updated_since<T: TrackerInterpreter>(
    tracker: &T,
    project: String,
    since: DateTime<Utc>,
) -> Result<Vec<IssueId>, EffectError> {
    match tracker_call(tracker, TrackerEffect::UpdatedSince { project, since }).await? {
        (_, TrackerResponse::Updated(ids)) => Ok(ids),
        (e, other) => Err(EffectError::unexpected(&e, &other)),
    }
}

pub async fn apply_tracker<T: TrackerInterpreter>(
    tracker: &T,
    effect: TrackerEffect,
) -> Result<(), EffectError> {
    match tracker_call(tracker, effect).await? {
        (_, TrackerResponse::Done) => Ok(()),
        (e, other) => Err(EffectError::unexpected(&e, &other)),
    }
}

// ─── VCS ──────────────────────────────────────────────────────────────────────

async fn vcs_call<V: VcsInterpreter>(
    vcs: &V,
    effect: VcsEffect,
) -> Result<(VcsEffect, VcsResponse), EffectError> {
    let response = vcs
        .interpret(effect.clone())
        .await
        .map_err(EffectError::vcs)?;
    Ok((effect, response))
}

pub async fn resolve_branch<V: VcsInterpreter>(
    vcs: &V,
    repo: RepoId,
    branch: String,
) -> Result<Option<Sha>, EffectError> {
    match vcs_call(vcs, VcsEffect::ResolveBranch { repo, branch }).await? {
        (_, VcsResponse::Resolved(sha)) => Ok(sha),
        (e, other) => Err(EffectError::unexpected(&e, &other)),
    }
}

pub async fn cherry_pick<V: VcsInterpreter>(
    vcs: &V,
    effect: VcsEffect,
) -> Result<CherryPickOutcome, EffectError> {
    match vcs_call(vcs, effect).await? {
        (_, VcsResponse::CherryPick(outcome)) => Ok(outcome),
        (e, other) => Err(EffectError::unexpected(&e, &other)),
    }
}

pub async fn push<V: VcsInterpreter>(
    vcs: &V,
    repo: RepoId,
    commit: Sha,
    branch: String,
) -> Result<(), EffectError> {
    let effect = VcsEffect::Push {
        repo,
        commit,
        branch,
        force: true,
    };
    match vcs_call(vcs, effect).await? {
        (_, VcsResponse::Pushed) => Ok(()),
        (e, other) => Err(EffectError::unexpected(&e, &other)),
    }
}
