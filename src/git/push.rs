//! Talking to remotes: resolving branch tips and pushing picked commits.

use std::path::Path;

use crate::types::Sha;

use super::{GitError, GitResult, git_command, redact, run_git_stdout};

/// The tip of `branch` on the remote at `url`, if the branch exists.
pub fn remote_tip(workdir: &Path, url: &str, branch: &str) -> GitResult<Option<Sha>> {
    let wanted = format!("refs/heads/{}", branch);
    let out = run_git_stdout(workdir, &["ls-remote", "--heads", url, &wanted])?;

    // Format: "SHA\trefs/heads/branch"; patterns match by suffix, so compare exactly.
    for line in out.lines() {
        let Some((sha, name)) = line.split_once('\t') else {
            continue;
        };
        if name == wanted {
            return Sha::parse(sha)
                .map(Some)
                .map_err(|_| GitError::InvalidSha(sha.to_string()));
        }
    }
    Ok(None)
}

/// Pushes `commit` from the store to `branch` at `url`.
///
/// With `force`, the branch is overwritten whatever it held.
pub fn push_commit(store: &Path, url: &str, commit: &Sha, branch: &str, force: bool) -> GitResult<()> {
    let refspec = format!("{}:refs/heads/{}", commit, branch);
    let mut args = vec!["push", "--quiet"];
    if force {
        args.push("--force");
    }
    args.push(url);
    args.push(&refspec);

    let output = git_command(store).args(&args).output()?;
    if output.status.success() {
        return Ok(());
    }

    let stderr = redact(&String::from_utf8_lossy(&output.stderr));
    if stderr.contains("non-fast-forward") || stderr.contains("rejected") {
        return Err(GitError::PushRejected { details: stderr });
    }
    Err(GitError::CommandFailed {
        command: redact(&format!("git {}", args.join(" "))),
        stderr,
    })
}
