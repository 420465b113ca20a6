//! Effects-as-data for the forge, the issue tracker and the VCS.
//!
//! Core logic describes external operations as values. A reconciliation pass
//! computes the list of mutations it owes, then hands them to interpreters in
//! order. This keeps the pass replayable from scratch and makes every external
//! call visible to tests.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod calls;
pub mod forge;
pub mod interpreter;
pub mod tracker;
pub mod vcs;

pub use forge::{BranchData, CommitComment, CommitData, ForgeEffect, ForgeResponse, PrStateChange};
pub use interpreter::{ForgeInterpreter, TrackerInterpreter, VcsInterpreter};
pub use tracker::{TrackerEffect, TrackerResponse};
pub use vcs::{CherryPickOutcome, VcsEffect, VcsResponse};

/// A unified effect type covering all three collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect_type", rename_all = "snake_case")]
pub enum Effect {
    Forge(ForgeEffect),
    Tracker(TrackerEffect),
    Vcs(VcsEffect),
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure of a collaborator call.
///
/// These are transient from the point of view of a reconciliation pass: the
/// whole work item is abandoned and retried later.
#[derive(Debug, Error)]
pub enum EffectError {
    #[error("forge call failed: {0}")]
    Forge(#[source] BoxError),

    #[error("issue tracker call failed: {0}")]
    Tracker(#[source] BoxError),

    #[error("VCS call failed: {0}")]
    Vcs(#[source] BoxError),

    /// The interpreter answered with a response of the wrong shape.
    #[error("unexpected response to {effect}: {response}")]
    UnexpectedResponse { effect: String, response: String },
}

impl EffectError {
    pub(crate) fn forge(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        EffectError::Forge(Box::new(e))
    }

    pub(crate) fn tracker(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        EffectError::Tracker(Box::new(e))
    }

    pub(crate) fn vcs(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        EffectError::Vcs(Box::new(e))
    }

    pub(crate) fn unexpected(effect: &impl std::fmt::Debug, response: &impl std::fmt::Debug) -> Self {
        EffectError::UnexpectedResponse {
            effect: format!("{:?}", effect),
            response: format!("{:?}", response),
        }
    }
}
