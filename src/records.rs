//! Which pull requests depend on which issues.
//!
//! Tracker updates carry no pull request reference. Each pull request pass
//! records the issues it read (main issue, CSR, JEP) here, and the issue
//! sweep looks updated issues up to find the pull requests to re-run.
//!
//! # Persistence
//!
//! The index is saved as `records.json` with write-to-temp-then-rename, so a
//! restart keeps the mapping. A missing file is an empty index.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::types::{IssueId, PrNumber};

#[derive(Debug, Error)]
pub enum RecordsError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Index {
    /// Issue to the pull requests that read it.
    by_issue: BTreeMap<IssueId, BTreeSet<PrNumber>>,
    /// Pull request to the issues it last recorded.
    by_pr: BTreeMap<PrNumber, BTreeSet<IssueId>>,
}

/// Issue to pull request index of one repository.
#[derive(Debug)]
pub struct PrRecords {
    path: Option<PathBuf>,
    index: Mutex<Index>,
}

impl PrRecords {
    /// An index that is never written to disk.
    pub fn in_memory() -> Self {
        PrRecords {
            path: None,
            index: Mutex::new(Index::default()),
        }
    }

    /// Loads the index stored at `path`, or starts empty when there is none.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RecordsError> {
        let path = path.into();
        let index = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Index::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(PrRecords {
            path: Some(path),
            index: Mutex::new(index),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Index> {
        self.index.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replaces the issues recorded for `pr`.
    ///
    /// Saving is best effort: a failed write is logged and the in-memory
    /// index stays authoritative until the next successful save.
    pub fn record(&self, pr: PrNumber, issues: impl IntoIterator<Item = IssueId>) {
        let issues: BTreeSet<IssueId> = issues.into_iter().collect();
        let snapshot = {
            let mut index = self.lock();
            let unchanged = match index.by_pr.get(&pr) {
                Some(previous) => previous == &issues,
                None => issues.is_empty(),
            };
            if unchanged {
                return;
            }
            if let Some(previous) = index.by_pr.remove(&pr) {
                for issue in previous {
                    if let Some(prs) = index.by_issue.get_mut(&issue) {
                        prs.remove(&pr);
                        if prs.is_empty() {
                            index.by_issue.remove(&issue);
                        }
                    }
                }
            }
            for issue in &issues {
                index.by_issue.entry(issue.clone()).or_default().insert(pr);
            }
            if !issues.is_empty() {
                index.by_pr.insert(pr, issues);
            }
            index.clone()
        };
        if let Some(path) = &self.path
            && let Err(e) = save_atomic(path, &snapshot)
        {
            warn!(path = %path.display(), error = %e, "failed to save pull request records");
        }
    }

    /// Drops everything recorded for `pr`.
    pub fn forget(&self, pr: PrNumber) {
        self.record(pr, std::iter::empty());
    }

    /// Pull requests that read `issue`.
    pub fn prs_for(&self, issue: &IssueId) -> Vec<PrNumber> {
        self.lock()
            .by_issue
            .get(issue)
            .map(|prs| prs.iter().copied().collect())
            .unwrap_or_default()
    }
}

fn fsync_dir(dir: &Path) -> io::Result<()> {
    OpenOptions::new().read(true).open(dir)?.sync_all()
}

fn save_atomic(path: &Path, index: &Index) -> Result<(), RecordsError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("json.tmp");
    let bytes = serde_json::to_vec_pretty(index)?;
    {
        let mut file: File = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp_path, path)?;
    if let Some(parent) = path.parent() {
        fsync_dir(parent)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn ids(names: &[&str]) -> Vec<IssueId> {
        names.iter().map(|n| IssueId::new(*n)).collect()
    }

    #[test]
    fn rerecording_moves_pull_request() {
        let records = PrRecords::in_memory();
        records.record(PrNumber(1), ids(&["JDK-1", "CSR-1"]));
        records.record(PrNumber(2), ids(&["JDK-1"]));
        assert_eq!(records.prs_for(&IssueId::new("JDK-1")), vec![PrNumber(1), PrNumber(2)]);

        records.record(PrNumber(1), ids(&["JDK-9"]));
        assert_eq!(records.prs_for(&IssueId::new("JDK-1")), vec![PrNumber(2)]);
        assert!(records.prs_for(&IssueId::new("CSR-1")).is_empty());
        assert_eq!(records.prs_for(&IssueId::new("JDK-9")), vec![PrNumber(1)]);
    }

    #[test]
    fn forget_removes_every_entry() {
        let records = PrRecords::in_memory();
        records.record(PrNumber(3), ids(&["JDK-3"]));
        records.forget(PrNumber(3));
        assert!(records.prs_for(&IssueId::new("JDK-3")).is_empty());
    }

    #[test]
    fn survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("records.json");
        {
            let records = PrRecords::open(&path).unwrap();
            records.record(PrNumber(7), ids(&["JDK-7"]));
        }
        let reopened = PrRecords::open(&path).unwrap();
        assert_eq!(reopened.prs_for(&IssueId::new("JDK-7")), vec![PrNumber(7)]);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn missing_file_is_empty_and_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let records = PrRecords::open(dir.path().join("absent.json")).unwrap();
        assert!(records.prs_for(&IssueId::new("JDK-1")).is_empty());

        let corrupt = dir.path().join("corrupt.json");
        std::fs::write(&corrupt, "{not json").unwrap();
        assert!(matches!(PrRecords::open(&corrupt), Err(RecordsError::Json(_))));
    }

    #[test]
    fn unrecorded_pull_request_without_issues_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.json");
        let records = PrRecords::open(&path).unwrap();
        records.record(PrNumber(4), ids(&[]));
        records.forget(PrNumber(5));
        assert!(!path.exists());

        records.record(PrNumber(4), ids(&["JDK-4"]));
        assert!(path.exists());
    }
}
