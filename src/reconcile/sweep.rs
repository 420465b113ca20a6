//! Periodic discovery of work that no webhook announced.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::{ReconcileError, Steward};
use crate::effects::calls;
use crate::effects::{ForgeInterpreter, TrackerInterpreter, VcsInterpreter};
use crate::types::{LinkRelation, PrNumber, Sha};

impl<F, T, V> Steward<F, T, V>
where
    F: ForgeInterpreter,
    T: TrackerInterpreter,
    V: VcsInterpreter,
{
    /// Pull requests that read an issue updated since `since`.
    ///
    /// An updated CSR also reaches the pull requests of the issue it covers
    /// and of that issue's backports, since a new CSR is not recorded yet.
    pub async fn sweep_issues(&self, since: DateTime<Utc>) -> Result<Vec<PrNumber>, ReconcileError> {
        let Some(project) = &self.config.issue_project else {
            return Ok(Vec::new());
        };
        let updated = calls::updated_since(&self.tracker, project.clone(), since).await?;
        let mut prs = BTreeSet::new();
        for id in &updated {
            prs.extend(self.records.prs_for(id));
            let covered = calls::linked_issues(&self.tracker, id.clone(), LinkRelation::CsrOf).await?;
            for main in &covered {
                prs.extend(self.records.prs_for(&main.id));
                let related = main
                    .linked(&LinkRelation::BackportedBy)
                    .into_iter()
                    .chain(main.linked(&LinkRelation::BackportOf));
                for other in related {
                    prs.extend(self.records.prs_for(other));
                }
            }
        }
        debug!(issues = updated.len(), prs = prs.len(), "issue sweep");
        Ok(prs.into_iter().collect())
    }

    /// Every open pull request.
    pub async fn sweep_open_prs(&self) -> Result<Vec<PrNumber>, ReconcileError> {
        let prs = calls::list_open_prs(&self.forge).await?;
        Ok(prs.into_iter().map(|pr| pr.number).collect())
    }

    /// Commits commented on since `since`, oldest comment first.
    pub async fn sweep_commits(&self, since: DateTime<Utc>) -> Result<Vec<Sha>, ReconcileError> {
        let comments = calls::list_recent_commit_comments(&self.forge, since).await?;
        let mut seen = BTreeSet::new();
        Ok(comments
            .into_iter()
            .map(|c| c.commit)
            .filter(|commit| seen.insert(commit.clone()))
            .collect())
    }
}
