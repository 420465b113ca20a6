//! Periodic sweeps feeding the scheduler.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{PollConfig, Scheduler, WorkKey};
use crate::effects::{ForgeInterpreter, TrackerInterpreter, VcsInterpreter};
use crate::reconcile::{ReconcileError, Steward};

/// Work found by one sweep: pull requests whose issues changed, commits with
/// new comments, then every open pull request.
///
/// Duplicates across the three lists are left in; the scheduler folds them.
pub async fn sweep_once<F, T, V>(
    steward: &Steward<F, T, V>,
    since: DateTime<Utc>,
) -> Result<Vec<WorkKey>, ReconcileError>
where
    F: ForgeInterpreter,
    T: TrackerInterpreter,
    V: VcsInterpreter,
{
    let mut keys: Vec<WorkKey> = steward
        .sweep_issues(since)
        .await?
        .into_iter()
        .map(WorkKey::Pr)
        .collect();
    keys.extend(steward.sweep_commits(since).await?.into_iter().map(WorkKey::Commit));
    keys.extend(steward.sweep_open_prs().await?.into_iter().map(WorkKey::Pr));
    Ok(keys)
}

/// Sweeps on the poll schedule until `cancel` fires.
///
/// A failed sweep keeps its start time, so the next one covers the same
/// window again.
pub async fn run_sweeps<F, T, V>(
    steward: Arc<Steward<F, T, V>>,
    scheduler: Scheduler,
    poll: PollConfig,
    cancel: CancellationToken,
) where
    F: ForgeInterpreter,
    T: TrackerInterpreter,
    V: VcsInterpreter,
{
    let repo = steward.config.repo.clone();
    let interval = poll.poll_interval_with_jitter(&repo);
    let first = poll.initial_delay(&repo);
    info!(%repo, first_in_secs = first.as_secs(), interval_secs = interval.as_secs(), "sweeps scheduled");

    let mut since = Utc::now() - poll.poll_interval;
    let mut delay = first;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }
        delay = interval;

        let started = Utc::now();
        let window_start = since - poll.overlap;
        match sweep_once(&*steward, window_start).await {
            Ok(keys) => {
                let mut scheduled = 0;
                for key in keys {
                    match scheduler.submit(key) {
                        Ok(true) => scheduled += 1,
                        Ok(false) => {}
                        Err(e) => {
                            debug!(error = %e, "scheduler gone, sweeps stopping");
                            return;
                        }
                    }
                }
                info!(scheduled, "sweep finished");
                since = started;
            }
            Err(e) => warn!(error = %e, "sweep failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        FakeForge, FakeTracker, FakeVcs, TestSteward, at, comment, pull_request, sha,
    };
    use crate::types::{IssueId, PrNumber};

    #[tokio::test]
    async fn sweep_collects_every_kind_of_work() {
        let forge = FakeForge::new();
        forge.put_pr(pull_request(3));
        forge.add_commit_comment(&sha(9), comment(1, "duke", "/backport jdk17u"));
        let tracker = FakeTracker::new();
        tracker.mark_updated(&["JDK-1"]);
        let steward = TestSteward::new(forge, tracker, FakeVcs::new());
        steward.records.record(PrNumber(8), [IssueId::new("JDK-1")]);

        let keys = sweep_once(&*steward, at(0)).await.unwrap();
        assert_eq!(
            keys,
            vec![
                WorkKey::Pr(PrNumber(8)),
                WorkKey::Commit(sha(9)),
                WorkKey::Pr(PrNumber(3)),
            ]
        );
    }

    #[tokio::test]
    async fn sweep_failure_is_reported() {
        let forge = FakeForge::new();
        let steward = TestSteward::new(forge, FakeTracker::new(), FakeVcs::new());
        steward.forge.fail_next("502 Bad Gateway");

        assert!(sweep_once(&*steward, at(0)).await.is_err());
    }
}
