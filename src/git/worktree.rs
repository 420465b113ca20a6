//! Scratch worktrees for cherry-picks.
//!
//! A scratch worktree is checked out in detached HEAD mode at the tip of the
//! target branch and removed when its guard drops. Worktrees left behind by
//! a crash are pruned at startup.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::types::Sha;

use super::{GitConfig, GitError, GitResult, run_git_sync};

/// A detached worktree of the store, removed on drop.
#[derive(Debug)]
pub struct ScratchWorktree {
    store: PathBuf,
    path: PathBuf,
}

impl ScratchWorktree {
    /// Checks out `commit` in a new worktree named `name`.
    ///
    /// A leftover worktree of the same name is removed first.
    pub fn create(config: &GitConfig, name: &str, commit: &Sha) -> GitResult<Self> {
        let store = config.store_dir();
        let path = config.scratch_dir().join(name);
        if path.exists() {
            remove(&store, &path)?;
        }
        std::fs::create_dir_all(config.scratch_dir())?;

        let path_str = path.to_str().ok_or_else(|| GitError::WorktreeError {
            details: format!("non UTF-8 worktree path {}", path.display()),
        })?;
        run_git_sync(
            &store,
            &[
                "worktree",
                "add",
                "--quiet",
                "--detach",
                path_str,
                commit.as_str(),
            ],
        )?;
        debug!(path = %path.display(), commit = %commit.short(), "created scratch worktree");
        Ok(ScratchWorktree { store, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchWorktree {
    fn drop(&mut self) {
        if let Err(e) = remove(&self.store, &self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to remove scratch worktree");
        }
    }
}

fn remove(store: &Path, path: &Path) -> GitResult<()> {
    let path_str = path.to_string_lossy();
    let removed = run_git_sync(store, &["worktree", "remove", "--force", &path_str]);
    if removed.is_err() && path.exists() {
        std::fs::remove_dir_all(path)?;
    }
    run_git_sync(store, &["worktree", "prune"])?;
    Ok(())
}

/// Removes every scratch worktree. Called once before the first pick.
pub fn clear_scratch(config: &GitConfig) -> GitResult<()> {
    let store = config.store_dir();
    let scratch = config.scratch_dir();
    if scratch.exists() {
        for entry in std::fs::read_dir(&scratch)? {
            let entry = entry?;
            debug!(path = %entry.path().display(), "removing leftover scratch worktree");
            std::fs::remove_dir_all(entry.path())?;
        }
    }
    if store.join("HEAD").exists() {
        run_git_sync(&store, &["worktree", "prune"])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::fixture::Remotes;

    #[test]
    fn worktree_is_removed_on_drop() {
        let remotes = Remotes::new();
        let tip = remotes.seed_store();
        let config = remotes.config();

        let path = {
            let worktree = ScratchWorktree::create(&config, "pick-test", &tip).unwrap();
            assert!(worktree.path().join("README.md").exists());
            worktree.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn leftover_worktree_is_replaced() {
        let remotes = Remotes::new();
        let tip = remotes.seed_store();
        let config = remotes.config();

        let first = ScratchWorktree::create(&config, "pick-test", &tip).unwrap();
        std::mem::forget(first);
        let second = ScratchWorktree::create(&config, "pick-test", &tip).unwrap();
        assert!(second.path().join("README.md").exists());
    }

    #[test]
    fn clear_scratch_removes_everything() {
        let remotes = Remotes::new();
        let tip = remotes.seed_store();
        let config = remotes.config();

        let worktree = ScratchWorktree::create(&config, "pick-a", &tip).unwrap();
        std::mem::forget(worktree);
        clear_scratch(&config).unwrap();
        assert_eq!(std::fs::read_dir(config.scratch_dir()).unwrap().count(), 0);
    }
}
