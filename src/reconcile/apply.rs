//! Applying a pass's effects in order.
//!
//! Effects are applied one at a time. Cancellation is checked before each
//! one and raced against forge calls; an effect that completed stays
//! applied, and the next pass recomputes whatever is still owed.

use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use super::ReconcileError;
use crate::effects::calls;
use crate::effects::{
    Effect, EffectError, ForgeInterpreter, TrackerInterpreter, VcsEffect, VcsInterpreter,
};

/// Applies `effects` in order, stopping at the first failure.
///
/// Returns how many effects were applied.
#[instrument(skip_all, fields(count = effects.len()))]
pub async fn apply_effects<F, T, V>(
    forge: &F,
    tracker: &T,
    vcs: &V,
    effects: Vec<Effect>,
    cancel: &CancellationToken,
) -> Result<usize, ReconcileError>
where
    F: ForgeInterpreter,
    T: TrackerInterpreter,
    V: VcsInterpreter,
{
    let mut applied = 0;
    for effect in effects {
        if cancel.is_cancelled() {
            debug!(applied, "cancellation detected before effect");
            return Err(ReconcileError::Cancelled);
        }
        match effect {
            Effect::Forge(effect) => {
                tokio::select! {
                    biased;

                    _ = cancel.cancelled() => return Err(ReconcileError::Cancelled),
                    result = calls::apply_forge(forge, effect) => result?,
                }
            }
            Effect::Tracker(effect) => calls::apply_tracker(tracker, effect).await?,
            Effect::Vcs(VcsEffect::Push {
                repo,
                commit,
                branch,
                ..
            }) => calls::push(vcs, repo, commit, branch).await?,
            Effect::Vcs(other) => {
                return Err(ReconcileError::Effect(EffectError::UnexpectedResponse {
                    effect: format!("{:?}", other),
                    response: "not a mutation".into(),
                }));
            }
        }
        applied += 1;
    }
    Ok(applied)
}
