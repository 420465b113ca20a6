//! Local git operations for backports.
//!
//! Every repository the bot touches shares one bare object store under
//! [`GitConfig::base_dir`]. Commits from any fork are fetched into it, and
//! cherry-picks run in short-lived detached worktrees of that store, so the
//! commit a pick produces can be pushed to any remote afterwards.
//!
//! The functions here are synchronous; [`LocalGit`] runs them on the blocking
//! pool and serializes access to the store.

pub mod local;
pub mod pick;
pub mod push;
pub mod worktree;

#[cfg(test)]
mod fixture;

use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::types::{RepoId, Sha};

pub use local::LocalGit;

/// Errors from git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Git command failed.
    #[error("git command failed: {command}\nstderr: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// Push was rejected by the remote.
    #[error("push rejected: {details}")]
    PushRejected { details: String },

    /// Worktree operation failed.
    #[error("worktree error: {details}")]
    WorktreeError { details: String },

    /// Invalid SHA format.
    #[error("invalid SHA: {0}")]
    InvalidSha(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking task running git did not complete.
    #[error("git task failed: {0}")]
    TaskFailed(String),
}

/// Result type for git operations.
pub type GitResult<T> = Result<T, GitError>;

/// Identity used for creating commits.
///
/// This is passed via `-c` flags to git commands, so commits can be created
/// with global and system configuration disabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitIdentity {
    /// The committer name (git `user.name`).
    pub name: String,

    /// The committer email (git `user.email`).
    pub email: String,

    /// GPG signing key ID. If present, commits are signed with `-S`.
    pub signing_key: Option<String>,
}

/// Configuration for git operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitConfig {
    /// Base directory for the object store and scratch worktrees.
    pub base_dir: PathBuf,

    /// Prefix of remote repository URLs; `owner/repo.git` is appended.
    pub remote_base: String,

    /// Committer identity of backport commits. The original author is kept.
    pub commit_identity: CommitIdentity,
}

impl GitConfig {
    /// The shared bare object store.
    pub fn store_dir(&self) -> PathBuf {
        self.base_dir.join("store.git")
    }

    /// Directory holding scratch worktrees.
    pub fn scratch_dir(&self) -> PathBuf {
        self.base_dir.join("scratch")
    }

    /// Clone URL of `repo`, without credentials.
    pub fn remote_url(&self, repo: &RepoId) -> String {
        format!(
            "{}/{}/{}.git",
            self.remote_base.trim_end_matches('/'),
            repo.owner,
            repo.repo
        )
    }

    /// Clone URL of `repo`, carrying `token` when the remote is HTTP(S).
    pub fn authenticated_url(&self, repo: &RepoId, token: Option<&str>) -> String {
        let url = self.remote_url(repo);
        match token {
            Some(token) => match url.split_once("://") {
                Some((scheme, rest)) if scheme.starts_with("http") => {
                    format!("{scheme}://x-access-token:{token}@{rest}")
                }
                _ => url,
            },
            None => url,
        }
    }
}

static CREDENTIALS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<scheme>[a-z][a-z0-9+.-]*://)[^/@\s]+@").expect("credential pattern is valid")
});

/// Strips `user:password@` from any URL in `text`.
pub(crate) fn redact(text: &str) -> String {
    CREDENTIALS.replace_all(text, "${scheme}").into_owned()
}

/// Create a git Command with clean environment (no system/user config).
///
/// Ignoring system and user configuration keeps hooks, aliases and rerere
/// out of the bot's operations.
pub(crate) fn git_command(workdir: &Path) -> std::process::Command {
    use std::process::Command;

    let mut cmd = Command::new("git");
    cmd.current_dir(workdir);

    cmd.env("GIT_CONFIG_NOSYSTEM", "1");
    cmd.env("GIT_CONFIG_GLOBAL", "/dev/null");
    cmd.env("GIT_TERMINAL_PROMPT", "0");

    cmd
}

/// Create a git Command configured for commit operations.
///
/// Extends [`git_command`] with `-c user.name`, `-c user.email` and, when a
/// signing key is set, `-c user.signingkey`. Callers pass `-S` to sign.
pub(crate) fn git_commit_command(
    workdir: &Path,
    identity: &CommitIdentity,
) -> std::process::Command {
    let mut cmd = git_command(workdir);

    cmd.arg("-c");
    cmd.arg(format!("user.name={}", identity.name));
    cmd.arg("-c");
    cmd.arg(format!("user.email={}", identity.email));

    if let Some(ref key) = identity.signing_key {
        cmd.arg("-c");
        cmd.arg(format!("user.signingkey={}", key));
    }

    cmd
}

/// Turns a finished command into its output, or a [`GitError`] naming it.
pub(crate) fn check_output(args: &[&str], output: Output) -> GitResult<Output> {
    if output.status.success() {
        Ok(output)
    } else {
        Err(GitError::CommandFailed {
            command: redact(&format!("git {}", args.join(" "))),
            stderr: redact(&String::from_utf8_lossy(&output.stderr)),
        })
    }
}

/// Run a git command in the given working directory.
pub fn run_git_sync(workdir: &Path, args: &[&str]) -> GitResult<Output> {
    let output = git_command(workdir).args(args).output()?;
    check_output(args, output)
}

/// Run a git command and return stdout as a string.
pub fn run_git_stdout(workdir: &Path, args: &[&str]) -> GitResult<String> {
    let output = run_git_sync(workdir, args)?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Resolve a revision to a full SHA.
pub fn rev_parse(workdir: &Path, rev: &str) -> GitResult<Sha> {
    let out = run_git_stdout(workdir, &["rev-parse", "--verify", rev])?;
    Sha::parse(&out).map_err(|_| GitError::InvalidSha(out))
}

/// Whether `commit` is present in the repository at `workdir`.
pub fn has_commit(workdir: &Path, commit: &Sha) -> GitResult<bool> {
    let object = format!("{}^{{commit}}", commit);
    let output = git_command(workdir)
        .args(["cat-file", "-e", &object])
        .output()?;
    Ok(output.status.success())
}

/// Creates the shared bare store if it does not exist yet.
pub fn ensure_store(config: &GitConfig) -> GitResult<PathBuf> {
    let store = config.store_dir();
    if !store.join("HEAD").exists() {
        std::fs::create_dir_all(&store)?;
        run_git_sync(&store, &["init", "--bare", "--quiet"])?;
    }
    Ok(store)
}

/// Fetches `refspec` from `url` into the store and returns what it resolved to.
pub fn fetch(store: &Path, url: &str, refspec: &str) -> GitResult<Sha> {
    run_git_sync(store, &["fetch", "--quiet", "--no-tags", url, refspec])?;
    rev_parse(store, "FETCH_HEAD")
}
