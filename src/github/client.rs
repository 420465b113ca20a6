//! Octocrab client wrapper scoped to the bot's repository.

use octocrab::Octocrab;

use crate::types::RepoId;

use super::retry::{RetryConfig, RetryPolicy};

/// A GitHub API client scoped to one repository.
///
/// Effects that do not name a repository run against this one.
#[derive(Clone)]
pub struct GitHubForge {
    client: Octocrab,
    repo: RepoId,
    pub(super) retry_config: RetryConfig,
    pub(super) retry_policy: RetryPolicy,
}

impl GitHubForge {
    pub fn new(client: Octocrab, repo: RepoId) -> Self {
        Self {
            client,
            repo,
            retry_config: RetryConfig::DEFAULT,
            retry_policy: RetryPolicy::RetryTransient,
        }
    }

    /// Creates a client authenticated with a personal or installation token.
    pub fn from_token(token: impl Into<String>, repo: RepoId) -> Result<Self, octocrab::Error> {
        let client = Octocrab::builder().personal_token(token.into()).build()?;
        Ok(Self::new(client, repo))
    }

    pub fn with_retry(mut self, config: RetryConfig, policy: RetryPolicy) -> Self {
        self.retry_config = config;
        self.retry_policy = policy;
        self
    }

    pub fn inner(&self) -> &Octocrab {
        &self.client
    }

    pub fn repo(&self) -> &RepoId {
        &self.repo
    }

    /// `/repos/{owner}/{repo}` of the scoped repository.
    pub(super) fn repo_route(&self) -> String {
        route_for(&self.repo)
    }
}

pub(super) fn route_for(repo: &RepoId) -> String {
    format!("/repos/{}/{}", repo.owner, repo.repo)
}

impl std::fmt::Debug for GitHubForge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubForge")
            .field("repo", &self.repo)
            .finish_non_exhaustive()
    }
}
