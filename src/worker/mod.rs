//! Work scheduling: keyed passes, follow-ups and periodic sweeps.
//!
//! Webhook events and sweeps produce [`WorkKey`]s. The [`Scheduler`] runs
//! one reconciliation pass per key at a time on the [`Steward`].
//!
//! # Module Structure
//!
//! - [`scheduler`]: per-key serialization and the concurrency bound
//! - [`sweeper`]: periodic sweeps
//! - [`poll`]: sweep interval and jitter

mod poll;
pub mod scheduler;
pub mod sweeper;

use std::fmt;

use tokio_util::sync::CancellationToken;
use tracing::debug;

pub use poll::PollConfig;
pub use scheduler::{Scheduler, SchedulerClosed, WorkQueue, WorkRunner};
pub use sweeper::{run_sweeps, sweep_once};

use crate::effects::{ForgeInterpreter, TrackerInterpreter, VcsInterpreter};
use crate::reconcile::{ReconcileError, Steward};
use crate::types::{PrNumber, Sha};

/// A unit of work: one pull request or one commented commit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WorkKey {
    Pr(PrNumber),
    Commit(Sha),
}

impl fmt::Display for WorkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkKey::Pr(number) => write!(f, "pr {number}"),
            WorkKey::Commit(sha) => write!(f, "commit {}", sha.short()),
        }
    }
}

impl<F, T, V> WorkRunner for Steward<F, T, V>
where
    F: ForgeInterpreter + 'static,
    T: TrackerInterpreter + 'static,
    V: VcsInterpreter + 'static,
{
    async fn run(&self, key: &WorkKey, cancel: &CancellationToken) -> Result<(), ReconcileError> {
        match key {
            WorkKey::Pr(number) => {
                let summary = self.reconcile_pr(*number, cancel).await?;
                debug!(pr = %number, commands = summary.commands, effects = summary.effects, "pr pass");
            }
            WorkKey::Commit(commit) => {
                let answered = self.reconcile_commit(commit, cancel).await?;
                debug!(commit = %commit.short(), answered, "commit pass");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers;
    use crate::test_utils::{FakeForge, FakeTracker, FakeVcs, TestSteward, comment, pull_request, sha};
    use std::sync::Arc;
    use std::time::Duration;

    /// Lets the scheduler own the harness, temporary census included.
    struct Harness(TestSteward);

    impl WorkRunner for Harness {
        async fn run(&self, key: &WorkKey, cancel: &CancellationToken) -> Result<(), ReconcileError> {
            (*self.0).run(key, cancel).await
        }
    }

    fn help_requested() -> FakeForge {
        let forge = FakeForge::new();
        forge.put_pr(pull_request(1));
        forge.add_comment(PrNumber(1), comment(10, "author-gh", "/help"));
        forge
    }

    fn answered(forge: &FakeForge) -> bool {
        forge
            .comments(PrNumber(1))
            .iter()
            .any(|c| c.author == "steward" && c.body.contains(&markers::reply_marker("10")))
    }

    #[test]
    fn keys_display_briefly() {
        assert_eq!(WorkKey::Pr(PrNumber(12)).to_string(), "pr #12");
        assert_eq!(
            WorkKey::Commit(sha(1)).to_string(),
            format!("commit {}", sha(1).short())
        );
    }

    #[tokio::test]
    async fn steward_runs_a_pr_pass() {
        let steward = TestSteward::new(help_requested(), FakeTracker::new(), FakeVcs::new());

        steward
            .run(&WorkKey::Pr(PrNumber(1)), &CancellationToken::new())
            .await
            .unwrap();

        assert!(answered(&steward.forge));
    }

    #[tokio::test]
    async fn scheduler_drives_the_steward() {
        let harness = Arc::new(Harness(TestSteward::new(
            help_requested(),
            FakeTracker::new(),
            FakeVcs::new(),
        )));
        let (scheduler, queue) = Scheduler::new(2);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(queue.run(harness.clone(), cancel.clone()));

        scheduler.submit(WorkKey::Pr(PrNumber(1))).unwrap();
        tokio::time::timeout(Duration::from_secs(5), async {
            while scheduler.in_flight() > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        assert!(answered(&harness.0.forge));
        cancel.cancel();
        task.await.unwrap();
    }
}
