//! Effect interpreter traits.
//!
//! Production interpreters live in [`crate::github`], [`crate::tracker`] and
//! [`crate::git`]; tests use the in-memory fakes from `test_utils`.

use std::future::Future;

use super::forge::{ForgeEffect, ForgeResponse};
use super::tracker::{TrackerEffect, TrackerResponse};
use super::vcs::{VcsEffect, VcsResponse};

/// Interprets forge effects against a forge API.
///
/// Implementations are constructed with a `RepoId`; effects that do not name
/// a repository are executed against that one.
pub trait ForgeInterpreter: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn interpret(
        &self,
        effect: ForgeEffect,
    ) -> impl Future<Output = Result<ForgeResponse, Self::Error>> + Send;
}

/// Interprets issue-tracker effects.
pub trait TrackerInterpreter: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn interpret(
        &self,
        effect: TrackerEffect,
    ) -> impl Future<Output = Result<TrackerResponse, Self::Error>> + Send;
}

/// Interprets VCS effects against a scratch repository.
pub trait VcsInterpreter: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn interpret(
        &self,
        effect: VcsEffect,
    ) -> impl Future<Output = Result<VcsResponse, Self::Error>> + Send;
}
