//! Keyed work scheduling.
//!
//! At most one pass runs per [`WorkKey`]. Submitting a key that is already
//! running marks it for exactly one follow-up pass, however many times it is
//! submitted meanwhile; the follow-up starts from fresh state once the
//! current pass ends. A semaphore bounds how many keys run at once.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::WorkKey;
use crate::reconcile::ReconcileError;

/// The scheduler's work queue has shut down.
#[derive(Debug, Error)]
#[error("scheduler stopped; {0} not scheduled")]
pub struct SchedulerClosed(pub WorkKey);

/// Runs one pass for a key.
pub trait WorkRunner: Send + Sync + 'static {
    fn run(
        &self,
        key: &WorkKey,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<(), ReconcileError>> + Send;
}

#[derive(Debug, Default)]
struct Slot {
    follow_up: bool,
}

type Slots = Arc<Mutex<HashMap<WorkKey, Slot>>>;

fn lock(slots: &Slots) -> MutexGuard<'_, HashMap<WorkKey, Slot>> {
    slots.lock().unwrap_or_else(|e| e.into_inner())
}

/// Handle for submitting work. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Scheduler {
    slots: Slots,
    tx: mpsc::UnboundedSender<WorkKey>,
}

/// The receiving half; [`WorkQueue::run`] drives the passes.
#[derive(Debug)]
pub struct WorkQueue {
    slots: Slots,
    rx: mpsc::UnboundedReceiver<WorkKey>,
    permits: Arc<Semaphore>,
}

impl Scheduler {
    pub fn new(max_concurrency: usize) -> (Scheduler, WorkQueue) {
        let slots = Slots::default();
        let (tx, rx) = mpsc::unbounded_channel();
        let queue = WorkQueue {
            slots: slots.clone(),
            rx,
            permits: Arc::new(Semaphore::new(max_concurrency.max(1))),
        };
        (Scheduler { slots, tx }, queue)
    }

    /// Schedules a pass for `key`. Returns whether a new pass was started
    /// (`false` when it was folded into a follow-up).
    pub fn submit(&self, key: WorkKey) -> Result<bool, SchedulerClosed> {
        let mut slots = lock(&self.slots);
        if let Some(slot) = slots.get_mut(&key) {
            slot.follow_up = true;
            debug!(%key, "already scheduled, follow-up pass queued");
            return Ok(false);
        }
        self.tx.send(key.clone()).map_err(|e| SchedulerClosed(e.0))?;
        slots.insert(key, Slot::default());
        Ok(true)
    }

    /// Keys currently queued or running.
    pub fn in_flight(&self) -> usize {
        lock(&self.slots).len()
    }
}

impl WorkQueue {
    /// Runs passes until `cancel` fires, then waits for running passes to
    /// see the cancellation and finish.
    pub async fn run<R: WorkRunner>(mut self, runner: Arc<R>, cancel: CancellationToken) {
        let mut running = JoinSet::new();
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                Some(key) = self.rx.recv() => {
                    running.spawn(run_key(
                        key,
                        runner.clone(),
                        self.slots.clone(),
                        self.permits.clone(),
                        cancel.clone(),
                    ));
                }
                Some(done) = running.join_next(), if !running.is_empty() => {
                    if let Err(e) = done {
                        warn!(error = %e, "work task failed");
                    }
                }
                else => break,
            }
        }
        info!(running = running.len(), "scheduler stopping");
        while running.join_next().await.is_some() {}
    }
}

async fn run_key<R: WorkRunner>(
    key: WorkKey,
    runner: Arc<R>,
    slots: Slots,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
) {
    loop {
        let permit = tokio::select! {
            _ = cancel.cancelled() => break,
            permit = permits.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };
        match runner.run(&key, &cancel).await {
            Ok(()) => debug!(%key, "pass finished"),
            Err(e) if e.is_cancelled() => debug!(%key, "pass cancelled"),
            // The key is not re-queued; the next sweep or event retries it.
            Err(e) => warn!(%key, error = %e, "pass failed"),
        }
        drop(permit);

        let mut slots = lock(&slots);
        match slots.get_mut(&key) {
            Some(slot) if slot.follow_up && !cancel.is_cancelled() => slot.follow_up = false,
            _ => {
                slots.remove(&key);
                return;
            }
        }
    }
    lock(&slots).remove(&key);
}
