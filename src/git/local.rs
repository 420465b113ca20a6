//! [`VcsInterpreter`] backed by the local git binary.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::effects::{VcsEffect, VcsInterpreter, VcsResponse};

use super::pick::{PickRequest, cherry_pick};
use super::push::{push_commit, remote_tip};
use super::worktree::clear_scratch;
use super::{GitConfig, GitError, GitResult, ensure_store};

/// Runs VCS effects with git, one at a time, on the blocking pool.
#[derive(Clone)]
pub struct LocalGit {
    inner: Arc<Inner>,
}

struct Inner {
    config: GitConfig,
    token: Option<String>,
    /// Whether leftovers of an earlier run were cleared. Held for the whole
    /// of each effect, as the store and its scratch directory are shared.
    prepared: Mutex<bool>,
}

impl std::fmt::Debug for LocalGit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalGit")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl LocalGit {
    /// `token` authenticates fetches and pushes over HTTP(S).
    pub fn new(config: GitConfig, token: Option<String>) -> Self {
        LocalGit {
            inner: Arc::new(Inner {
                config,
                token,
                prepared: Mutex::new(false),
            }),
        }
    }

    async fn run(&self, effect: VcsEffect) -> GitResult<VcsResponse> {
        let mut prepared = self.inner.prepared.lock().await;
        let inner = Arc::clone(&self.inner);
        let first = !*prepared;
        let response = tokio::task::spawn_blocking(move || {
            if first {
                ensure_store(&inner.config)?;
                clear_scratch(&inner.config)?;
            }
            execute(&inner, effect)
        })
        .await
        .map_err(|e| GitError::TaskFailed(e.to_string()))??;
        *prepared = true;
        Ok(response)
    }
}

fn execute(inner: &Inner, effect: VcsEffect) -> GitResult<VcsResponse> {
    let config = &inner.config;
    let token = inner.token.as_deref();
    match effect {
        VcsEffect::ResolveBranch { repo, branch } => {
            let store = config.store_dir();
            let url = config.authenticated_url(&repo, token);
            Ok(VcsResponse::Resolved(remote_tip(&store, &url, &branch)?))
        }
        VcsEffect::CherryPick {
            source,
            commit,
            target,
            branch,
            message,
        } => {
            let source_url = config.authenticated_url(&source, token);
            let target_url = config.authenticated_url(&target, token);
            let outcome = cherry_pick(
                config,
                &PickRequest {
                    source_url: &source_url,
                    commit: &commit,
                    target_url: &target_url,
                    branch: &branch,
                    message: &message,
                },
            )?;
            Ok(VcsResponse::CherryPick(outcome))
        }
        VcsEffect::Push {
            repo,
            commit,
            branch,
            force,
        } => {
            let url = config.authenticated_url(&repo, token);
            push_commit(&config.store_dir(), &url, &commit, &branch, force)?;
            debug!(%repo, %branch, commit = %commit.short(), "pushed");
            Ok(VcsResponse::Pushed)
        }
    }
}

impl VcsInterpreter for LocalGit {
    type Error = GitError;

    #[instrument(skip(self), level = "debug")]
    async fn interpret(&self, effect: VcsEffect) -> Result<VcsResponse, Self::Error> {
        self.run(effect).await
    }
}
