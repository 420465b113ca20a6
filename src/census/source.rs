//! Where census documents come from.

use std::future::Future;
use std::path::PathBuf;

use super::CensusError;
use crate::effects::ForgeInterpreter;
use crate::effects::calls;
use crate::types::RepoId;

/// A place a raw census document can be fetched from.
pub trait CensusSource: Send + Sync {
    /// Cache key identifying the ref this source reads.
    fn key(&self) -> String;

    /// Fetches the raw census document.
    fn fetch(&self) -> impl Future<Output = Result<String, CensusError>> + Send;
}

/// Reads the census from a local file.
#[derive(Debug, Clone)]
pub struct FileCensusSource {
    path: PathBuf,
}

impl FileCensusSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileCensusSource { path: path.into() }
    }
}

impl CensusSource for FileCensusSource {
    fn key(&self) -> String {
        format!("file:{}", self.path.display())
    }

    async fn fetch(&self) -> Result<String, CensusError> {
        Ok(tokio::fs::read_to_string(&self.path).await?)
    }
}

/// Reads the census from a file in a forge repository at a given ref.
#[derive(Debug)]
pub struct ForgeCensusSource<'a, F> {
    forge: &'a F,
    repo: RepoId,
    path: String,
    git_ref: String,
}

impl<'a, F: ForgeInterpreter> ForgeCensusSource<'a, F> {
    pub fn new(forge: &'a F, repo: RepoId, path: impl Into<String>, git_ref: impl Into<String>) -> Self {
        ForgeCensusSource {
            forge,
            repo,
            path: path.into(),
            git_ref: git_ref.into(),
        }
    }
}

impl<F: ForgeInterpreter> CensusSource for ForgeCensusSource<'_, F> {
    fn key(&self) -> String {
        format!("{}/{}@{}", self.repo, self.path, self.git_ref)
    }

    async fn fetch(&self) -> Result<String, CensusError> {
        calls::file_contents(
            self.forge,
            self.repo.clone(),
            self.path.clone(),
            self.git_ref.clone(),
        )
        .await
        .map_err(|e| CensusError::Source(e.to_string()))
    }
}
