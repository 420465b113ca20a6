//! GitHub forge adapter.
//!
//! [`GitHubForge`] implements [`ForgeInterpreter`] with octocrab:
//! - Exponential backoff retry for transient failures
//! - Distinguishes transient vs permanent errors
//! - Pull request merges are reported as integrations
//!
//! [`ForgeInterpreter`]: crate::effects::ForgeInterpreter

mod client;
mod error;
mod interpreter;
mod retry;

pub use client::GitHubForge;
pub use error::{GitHubApiError, GitHubErrorKind};
pub use retry::{RetryConfig, RetryPolicy, retry_with_backoff};
