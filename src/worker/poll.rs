//! Sweep timing.
//!
//! Webhooks drive most passes, but deliveries get lost and issue-tracker
//! changes never produce one. Sweeps run every `poll_interval` plus a
//! per-repository jitter, and the first sweep is staggered by a delay derived
//! from the repository id so restarts of several bots do not line up.

use std::hash::{Hash, Hasher};
use std::time::Duration;

use crate::types::RepoId;

const DEFAULT_POLL_INTERVAL_SECS: u64 = 600;

const DEFAULT_JITTER_PERCENT: u8 = 20;

/// Sweeps look back this far before the previous sweep, so changes made
/// while the last sweep was running are not missed.
const DEFAULT_OVERLAP_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Configure via `PR_STEWARD_POLL_INTERVAL_MINS`.
    pub poll_interval: Duration,

    /// 0-100; the interval is stretched by up to this many percent.
    pub jitter_percent: u8,

    pub overlap: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PollConfig {
    pub fn new() -> Self {
        PollConfig {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            jitter_percent: DEFAULT_JITTER_PERCENT,
            overlap: Duration::from_secs(DEFAULT_OVERLAP_SECS),
        }
    }

    /// Reads `PR_STEWARD_POLL_INTERVAL_MINS`; anything unparsable or zero
    /// keeps the default.
    pub fn from_env() -> Self {
        Self::from_minutes(std::env::var("PR_STEWARD_POLL_INTERVAL_MINS").ok().as_deref())
    }

    fn from_minutes(value: Option<&str>) -> Self {
        let minutes = value
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|&m| m > 0)
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS / 60);
        PollConfig {
            poll_interval: Duration::from_secs(minutes * 60),
            ..Self::new()
        }
    }

    /// `interval * (1 + (hash(repo) % jitter_percent) / 100)`
    pub fn poll_interval_with_jitter(&self, repo: &RepoId) -> Duration {
        if self.jitter_percent == 0 {
            return self.poll_interval;
        }
        let jitter = (repo_hash(repo) % self.jitter_percent as u64) as f64 / 100.0;
        self.poll_interval.mul_f64(1.0 + jitter)
    }

    /// `hash(repo) % (interval / 2)`
    pub fn initial_delay(&self, repo: &RepoId) -> Duration {
        let max_delay = (self.poll_interval.as_secs() / 2).max(1);
        Duration::from_secs(repo_hash(repo) % max_delay)
    }
}

fn repo_hash(repo: &RepoId) -> u64 {
    let mut hasher = std::hash::DefaultHasher::new();
    repo.hash(&mut hasher);
    hasher.finish()
}
