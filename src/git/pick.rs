//! Cherry-picking a commit onto another repository's branch.

use std::path::Path;

use tracing::{debug, info};

use crate::effects::CherryPickOutcome;
use crate::types::Sha;

use super::worktree::ScratchWorktree;
use super::{
    GitConfig, GitResult, check_output, ensure_store, fetch, git_command, git_commit_command,
    has_commit, rev_parse, run_git_stdout,
};

/// What to pick and where.
#[derive(Debug, Clone)]
pub struct PickRequest<'a> {
    /// URL of the repository holding `commit`.
    pub source_url: &'a str,
    pub commit: &'a Sha,
    /// URL of the repository whose `branch` receives the pick.
    pub target_url: &'a str,
    pub branch: &'a str,
    /// Message of the new commit.
    pub message: &'a str,
}

/// Author of a commit, kept on the picked commit.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Author {
    name: String,
    email: String,
    date: String,
}

fn author_of(store: &Path, commit: &Sha) -> GitResult<Author> {
    let out = run_git_stdout(
        store,
        &["log", "-1", "--format=%an%x00%ae%x00%aI", commit.as_str()],
    )?;
    let mut parts = out.splitn(3, '\0');
    Ok(Author {
        name: parts.next().unwrap_or_default().to_string(),
        email: parts.next().unwrap_or_default().to_string(),
        date: parts.next().unwrap_or_default().to_string(),
    })
}

/// Applies `request.commit` on top of `request.branch` of the target.
///
/// Nothing is pushed; a clean pick leaves the new commit in the store.
pub fn cherry_pick(config: &GitConfig, request: &PickRequest<'_>) -> GitResult<CherryPickOutcome> {
    let store = ensure_store(config)?;
    let tip = fetch(&store, request.target_url, request.branch)?;
    if !has_commit(&store, request.commit)? {
        fetch(&store, request.source_url, request.commit.as_str())?;
    }
    let author = author_of(&store, request.commit)?;

    let name = format!(
        "pick-{}-{}",
        request.commit.abbreviate(),
        request.branch.replace('/', "-")
    );
    let worktree = ScratchWorktree::create(config, &name, &tip)?;
    let dir = worktree.path();

    let pick_args = ["cherry-pick", "--no-commit", request.commit.as_str()];
    let picked = git_command(dir).args(pick_args).output()?;
    if !picked.status.success() {
        let conflicts = conflicted_paths(dir)?;
        if conflicts.is_empty() {
            check_output(&pick_args, picked)?;
        }
        info!(
            commit = %request.commit.short(),
            branch = request.branch,
            files = conflicts.len(),
            "cherry-pick conflicts"
        );
        return Ok(CherryPickOutcome::Conflict { paths: conflicts });
    }

    let staged = git_command(dir)
        .args(["diff", "--cached", "--quiet"])
        .output()?;
    if staged.status.success() {
        debug!(commit = %request.commit.short(), branch = request.branch, "change already present");
        return Ok(CherryPickOutcome::NoOp);
    }

    let mut commit_args = vec![
        "commit",
        "--quiet",
        "--no-verify",
        "--cleanup=whitespace",
        "-m",
        request.message,
    ];
    if config.commit_identity.signing_key.is_some() {
        commit_args.push("-S");
    }
    let committed = git_commit_command(dir, &config.commit_identity)
        .args(&commit_args)
        .env("GIT_AUTHOR_NAME", &author.name)
        .env("GIT_AUTHOR_EMAIL", &author.email)
        .env("GIT_AUTHOR_DATE", &author.date)
        .output()?;
    check_output(&commit_args, committed)?;

    let commit = rev_parse(dir, "HEAD")?;
    info!(
        source = %request.commit.short(),
        commit = %commit.short(),
        branch = request.branch,
        "cherry-picked"
    );
    Ok(CherryPickOutcome::Clean { commit })
}

fn conflicted_paths(dir: &Path) -> GitResult<Vec<String>> {
    let out = run_git_stdout(dir, &["diff", "--name-only", "--diff-filter=U"])?;
    Ok(out
        .lines()
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}
