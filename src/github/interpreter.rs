//! Forge effect interpreter using octocrab.
//!
//! Most calls go through octocrab's generic REST methods with small payload
//! types defined here, decoding only the fields the bot reads. Every effect
//! is retried as a whole on transient errors.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::effects::{
    BranchData, CommitComment, CommitData, ForgeEffect, ForgeInterpreter, ForgeResponse,
    PrStateChange,
};
use crate::types::{
    Comment, CommentId, PrNumber, PrState, PullRequest, RepoId, Review, ReviewVerdict, Sha,
};

use super::client::{GitHubForge, route_for};
use super::error::GitHubApiError;
use super::retry::retry_with_backoff;

const PER_PAGE: u32 = 100;

/// Stop paginating after this many pages; larger listings are truncated.
const MAX_PAGES: u32 = 30;

// ─── Payloads ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RawLabel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawRef {
    #[serde(rename = "ref")]
    name: String,
    sha: String,
}

#[derive(Debug, Deserialize)]
struct RawPull {
    number: u64,
    title: String,
    body: Option<String>,
    user: Option<RawUser>,
    #[serde(default)]
    labels: Vec<RawLabel>,
    state: String,
    merged_at: Option<DateTime<Utc>>,
    merge_commit_sha: Option<String>,
    head: RawRef,
    base: RawRef,
}

#[derive(Debug, Deserialize)]
struct RawComment {
    id: u64,
    user: Option<RawUser>,
    body: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct RawCommitComment {
    commit_id: String,
    #[serde(flatten)]
    comment: RawComment,
}

#[derive(Debug, Deserialize)]
struct RawReview {
    user: Option<RawUser>,
    state: String,
    commit_id: Option<String>,
    submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct RawFile {
    filename: String,
}

#[derive(Debug, Deserialize)]
struct RawCompare {
    #[serde(default)]
    files: Vec<RawFile>,
}

#[derive(Debug, Deserialize)]
struct RawSignature {
    name: String,
    email: String,
    date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct RawCommitDetail {
    author: RawSignature,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RawCommit {
    sha: String,
    commit: RawCommitDetail,
}

#[derive(Debug, Deserialize)]
struct RawBranchCommit {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct RawBranch {
    name: String,
    commit: RawBranchCommit,
}

#[derive(Debug, Deserialize)]
struct RawRepository {
    default_branch: String,
}

#[derive(Debug, Serialize)]
struct PageQuery {
    per_page: u32,
    page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<&'static str>,
}

// ─── Conversions ──────────────────────────────────────────────────────────────

fn parse_sha(raw: &str, what: &str) -> Result<Sha, GitHubApiError> {
    Sha::parse(raw).map_err(|e| GitHubApiError::permanent(format!("invalid {what}: {e}")))
}

fn login(user: Option<RawUser>) -> String {
    user.map(|u| u.login).unwrap_or_else(|| "ghost".to_string())
}

fn to_pull_request(repo: &RepoId, raw: RawPull) -> Result<PullRequest, GitHubApiError> {
    let state = match (raw.merged_at, raw.merge_commit_sha.as_deref()) {
        (Some(_), Some(sha)) => PrState::Integrated {
            commit: parse_sha(sha, "merge commit SHA")?,
        },
        // Merged, but the merge commit is not visible yet.
        (Some(_), None) => {
            return Err(GitHubApiError::transient(format!(
                "PR {} is merged but merge_commit_sha is not yet available",
                raw.number
            )));
        }
        (None, _) if raw.state == "closed" => PrState::Closed,
        (None, _) => PrState::Open,
    };
    Ok(PullRequest {
        repo: repo.clone(),
        number: PrNumber(raw.number),
        title: raw.title,
        body: raw.body.unwrap_or_default(),
        author: login(raw.user),
        labels: raw.labels.into_iter().map(|l| l.name).collect(),
        state,
        source_ref: raw.head.name,
        target_ref: raw.base.name,
        head_sha: parse_sha(&raw.head.sha, "head SHA")?,
    })
}

fn to_comment(raw: RawComment) -> Comment {
    Comment {
        id: CommentId(raw.id),
        author: login(raw.user),
        body: raw.body.unwrap_or_default(),
        created_at: raw.created_at,
    }
}

fn to_commit_comment(raw: RawCommitComment) -> Result<CommitComment, GitHubApiError> {
    Ok(CommitComment {
        commit: parse_sha(&raw.commit_id, "commit SHA")?,
        comment: to_comment(raw.comment),
    })
}

/// Pending reviews have no verdict yet and are skipped.
fn to_review(raw: RawReview) -> Option<Review> {
    let verdict = match raw.state.as_str() {
        "APPROVED" => ReviewVerdict::Approved,
        "CHANGES_REQUESTED" => ReviewVerdict::ChangesRequested,
        "COMMENTED" => ReviewVerdict::Commented,
        "DISMISSED" => ReviewVerdict::Dismissed,
        _ => return None,
    };
    Some(Review {
        reviewer: login(raw.user),
        verdict,
        sha: raw.commit_id.as_deref().and_then(|s| Sha::parse(s).ok()),
        submitted_at: raw.submitted_at?,
    })
}

fn to_commit(raw: RawCommit) -> Result<CommitData, GitHubApiError> {
    Ok(CommitData {
        sha: parse_sha(&raw.sha, "commit SHA")?,
        author_name: raw.commit.author.name,
        author_email: raw.commit.author.email,
        authored_at: raw.commit.author.date,
        message: raw.commit.message,
    })
}

/// Percent-encodes a path segment such as a label name.
fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

// ─── Interpreter Implementation ───────────────────────────────────────────────

impl ForgeInterpreter for GitHubForge {
    type Error = GitHubApiError;

    async fn interpret(&self, effect: ForgeEffect) -> Result<ForgeResponse, Self::Error> {
        retry_with_backoff(self.retry_config, self.retry_policy, || {
            self.execute(effect.clone())
        })
        .await
    }
}

impl GitHubForge {
    async fn execute(&self, effect: ForgeEffect) -> Result<ForgeResponse, GitHubApiError> {
        let repo = self.repo_route();
        match effect {
            ForgeEffect::GetPr { pr } => {
                let raw: RawPull = self.get(format!("{repo}/pulls/{}", pr.0)).await?;
                Ok(ForgeResponse::Pr(Box::new(to_pull_request(self.repo(), raw)?)))
            }
            ForgeEffect::ListOpenPrs => {
                let raws: Vec<RawPull> = self.get_all(format!("{repo}/pulls"), Some("open")).await?;
                let mut prs = Vec::with_capacity(raws.len());
                for raw in raws {
                    let number = raw.number;
                    match to_pull_request(self.repo(), raw) {
                        Ok(pr) => prs.push(pr),
                        Err(e) => warn!(pr = number, error = %e, "skipping unreadable pull request"),
                    }
                }
                Ok(ForgeResponse::PrList(prs))
            }
            ForgeEffect::ListComments { pr } => {
                let raws: Vec<RawComment> =
                    self.get_all(format!("{repo}/issues/{}/comments", pr.0), None).await?;
                Ok(ForgeResponse::Comments(raws.into_iter().map(to_comment).collect()))
            }
            ForgeEffect::ListReviews { pr } => {
                let raws: Vec<RawReview> =
                    self.get_all(format!("{repo}/pulls/{}/reviews", pr.0), None).await?;
                Ok(ForgeResponse::Reviews(raws.into_iter().filter_map(to_review).collect()))
            }
            ForgeEffect::ListChangedFiles { pr } => {
                let raws: Vec<RawFile> =
                    self.get_all(format!("{repo}/pulls/{}/files", pr.0), None).await?;
                Ok(ForgeResponse::Files(raws.into_iter().map(|f| f.filename).collect()))
            }
            ForgeEffect::CompareFiles { base, head } => {
                let raw: RawCompare = self.get(format!("{repo}/compare/{base}...{head}")).await?;
                Ok(ForgeResponse::Files(raw.files.into_iter().map(|f| f.filename).collect()))
            }
            ForgeEffect::PostComment { pr, body } => {
                let raw: RawComment = self
                    .inner()
                    .post(format!("{repo}/issues/{}/comments", pr.0), Some(&json!({ "body": body })))
                    .await?;
                Ok(ForgeResponse::CommentPosted { id: CommentId(raw.id) })
            }
            ForgeEffect::UpdateComment { comment_id, body } => {
                let _: Value = self
                    .inner()
                    .patch(
                        format!("{repo}/issues/comments/{comment_id}"),
                        Some(&json!({ "body": body })),
                    )
                    .await?;
                Ok(ForgeResponse::Done)
            }
            ForgeEffect::AddLabel { pr, label } => {
                let _: Value = self
                    .inner()
                    .post(
                        format!("{repo}/issues/{}/labels", pr.0),
                        Some(&json!({ "labels": [label] })),
                    )
                    .await?;
                Ok(ForgeResponse::Done)
            }
            ForgeEffect::RemoveLabel { pr, label } => {
                let route = format!("{repo}/issues/{}/labels/{}", pr.0, encode_segment(&label));
                let deleted: Result<Value, _> = self.inner().delete(route, None::<&()>).await;
                match deleted {
                    Ok(_) => Ok(ForgeResponse::Done),
                    Err(e) => {
                        let e = GitHubApiError::from(e);
                        if e.is_not_found() {
                            debug!(pr = %pr, label = %label, "label already absent");
                            Ok(ForgeResponse::Done)
                        } else {
                            Err(e)
                        }
                    }
                }
            }
            ForgeEffect::SetBody { pr, body } => {
                self.patch_pull(pr, json!({ "body": body })).await
            }
            ForgeEffect::SetTitle { pr, title } => {
                self.patch_pull(pr, json!({ "title": title })).await
            }
            ForgeEffect::SetState { pr, state } => {
                let state = match state {
                    PrStateChange::Open => "open",
                    PrStateChange::Closed => "closed",
                };
                self.patch_pull(pr, json!({ "state": state })).await
            }
            ForgeEffect::GetCommit { commit } => {
                let raw: RawCommit = self.get(format!("{repo}/commits/{commit}")).await?;
                Ok(ForgeResponse::Commit(to_commit(raw)?))
            }
            ForgeEffect::ListCommitComments { commit } => {
                let raws: Vec<RawCommitComment> =
                    self.get_all(format!("{repo}/commits/{commit}/comments"), None).await?;
                let comments = raws
                    .into_iter()
                    .map(to_commit_comment)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ForgeResponse::CommitComments(comments))
            }
            ForgeEffect::ListRecentCommitComments { since } => {
                let comments = self.recent_commit_comments(&repo, since).await?;
                Ok(ForgeResponse::CommitComments(comments))
            }
            ForgeEffect::PostCommitComment { commit, body } => {
                let raw: RawComment = self
                    .inner()
                    .post(format!("{repo}/commits/{commit}/comments"), Some(&json!({ "body": body })))
                    .await?;
                Ok(ForgeResponse::CommentPosted { id: CommentId(raw.id) })
            }
            ForgeEffect::ListBranches { repo: target } => {
                let raws: Vec<RawBranch> =
                    self.get_all(format!("{}/branches", route_for(&target)), None).await?;
                let branches = raws
                    .into_iter()
                    .map(|b| {
                        Ok(BranchData {
                            head: parse_sha(&b.commit.sha, "branch head")?,
                            name: b.name,
                        })
                    })
                    .collect::<Result<Vec<_>, GitHubApiError>>()?;
                Ok(ForgeResponse::Branches(branches))
            }
            ForgeEffect::DefaultBranch { repo: target } => {
                let raw: RawRepository = self.get(route_for(&target)).await?;
                Ok(ForgeResponse::DefaultBranch(raw.default_branch))
            }
            ForgeEffect::CreateBranch { branch, commit } => {
                let _: Value = self
                    .inner()
                    .post(
                        format!("{repo}/git/refs"),
                        Some(&json!({ "ref": format!("refs/heads/{branch}"), "sha": commit })),
                    )
                    .await?;
                Ok(ForgeResponse::Done)
            }
            ForgeEffect::GetFileContents {
                repo: target,
                path,
                git_ref,
            } => {
                let items = self
                    .inner()
                    .repos(&target.owner, &target.repo)
                    .get_content()
                    .path(&path)
                    .r#ref(&git_ref)
                    .send()
                    .await?;
                let text = items
                    .items
                    .first()
                    .and_then(|item| item.decoded_content())
                    .ok_or_else(|| {
                        GitHubApiError::permanent(format!("{path} at {git_ref} in {target} is not a file"))
                    })?;
                Ok(ForgeResponse::FileContents(text))
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, route: String) -> Result<T, GitHubApiError> {
        Ok(self.inner().get(route, None::<&()>).await?)
    }

    /// Follows page numbers until a short page.
    async fn get_all<T: DeserializeOwned>(
        &self,
        route: String,
        state: Option<&'static str>,
    ) -> Result<Vec<T>, GitHubApiError> {
        let mut all = Vec::new();
        for page in 1..=MAX_PAGES {
            let query = PageQuery {
                per_page: PER_PAGE,
                page,
                state,
            };
            let items: Vec<T> = self.inner().get(&route, Some(&query)).await?;
            let last = items.len() < PER_PAGE as usize;
            all.extend(items);
            if last {
                return Ok(all);
            }
        }
        warn!(route = %route, pages = MAX_PAGES, "listing truncated");
        Ok(all)
    }

    async fn patch_pull(&self, pr: PrNumber, body: Value) -> Result<ForgeResponse, GitHubApiError> {
        let route = format!("{}/pulls/{}", self.repo_route(), pr.0);
        let _: Value = self.inner().patch(route, Some(&body)).await?;
        Ok(ForgeResponse::Done)
    }

    /// Repository commit comments are listed oldest first, so walk the
    /// pages backwards until one starts before `since`.
    async fn recent_commit_comments(
        &self,
        repo: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<CommitComment>, GitHubApiError> {
        let route = format!("{repo}/comments");
        let query = |page| PageQuery {
            per_page: PER_PAGE,
            page,
            state: None,
        };
        let first: octocrab::Page<RawCommitComment> =
            self.inner().get(&route, Some(&query(1))).await?;
        let last = first.number_of_pages().unwrap_or(1).max(1);
        let mut first = Some(first.items);

        let mut pages = Vec::new();
        let mut page = last;
        for _ in 0..MAX_PAGES {
            let items = if page == 1
                && let Some(items) = first.take()
            {
                items
            } else {
                let items: Vec<RawCommitComment> =
                    self.inner().get(&route, Some(&query(page))).await?;
                items
            };
            let reached_older = items.first().is_some_and(|c| c.comment.created_at <= since);
            pages.push(items);
            if reached_older || page <= 1 {
                break;
            }
            page -= 1;
        }

        let mut comments = Vec::new();
        for raw in pages.into_iter().rev().flatten() {
            if raw.comment.created_at > since {
                comments.push(to_commit_comment(raw)?);
            }
        }
        Ok(comments)
    }
}
