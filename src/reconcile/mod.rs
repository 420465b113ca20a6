//! Reconciliation passes.
//!
//! A pass reads everything it needs, computes a [`DesiredState`] from
//! commands, requirements and the labeler, and applies the difference to the
//! observed state. Passes are safe to repeat: a pass over unchanged inputs
//! owes nothing.
//!
//! # Pass Kinds
//!
//! - [`Steward::reconcile_pr`]: one pull request
//! - [`Steward::reconcile_commit`]: commands in the comments of one commit
//! - [`Steward::sweep_issues`]: finds pull requests whose issues changed
//!
//! Sweeps list work for the scheduler and change nothing themselves.
//!
//! [`DesiredState`]: crate::desired::DesiredState

pub mod apply;
pub mod commit;
pub mod pr;
pub mod sweep;

use std::sync::Arc;

use thiserror::Error;

use crate::census::{self, CensusCache, CensusError, CensusSnapshot};
use crate::config::BotConfig;
use crate::effects::{EffectError, ForgeInterpreter, TrackerInterpreter, VcsInterpreter};
use crate::handlers::Services;
use crate::records::PrRecords;

pub use apply::apply_effects;
pub use pr::PassSummary;

/// Failure of one work item. The item is retried on a later pass.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Effect(#[from] EffectError),

    #[error(transparent)]
    Census(#[from] CensusError),

    #[error("pass cancelled")]
    Cancelled,
}

impl ReconcileError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ReconcileError::Cancelled)
    }
}

/// The bot for one repository: configuration plus its collaborators.
#[derive(Debug)]
pub struct Steward<F, T, V> {
    pub config: Arc<BotConfig>,
    pub forge: F,
    pub tracker: T,
    pub vcs: V,
    pub census: CensusCache,
    pub records: PrRecords,
}

impl<F, T, V> Steward<F, T, V>
where
    F: ForgeInterpreter,
    T: TrackerInterpreter,
    V: VcsInterpreter,
{
    pub fn new(config: Arc<BotConfig>, forge: F, tracker: T, vcs: V, records: PrRecords) -> Self {
        let census = CensusCache::new(&config.census.cache_dir, config.census.ttl());
        Steward {
            config,
            forge,
            tracker,
            vcs,
            census,
            records,
        }
    }

    pub fn services(&self) -> Services<'_, F, T, V> {
        Services {
            forge: &self.forge,
            tracker: &self.tracker,
            vcs: &self.vcs,
        }
    }

    async fn census_snapshot(&self) -> Result<Arc<CensusSnapshot>, ReconcileError> {
        Ok(census::load(&self.census, &self.config.census.source, &self.forge).await?)
    }
}
