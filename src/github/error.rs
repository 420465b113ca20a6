//! GitHub API error types.
//!
//! Errors are split into two kinds for retry decisions:
//!
//! - **Transient** errors are retriable (5xx, rate limits, network failures)
//! - **Permanent** errors are not (most 4xx, malformed responses)
//!
//! A permanent error still only fails the current work item; the next pass
//! starts over from fresh state.

use std::fmt;
use thiserror::Error;

/// The kind of GitHub API error, categorized for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitHubErrorKind {
    /// Safe to retry with backoff.
    Transient,

    /// Retrying the same request will fail the same way.
    Permanent,
}

impl GitHubErrorKind {
    pub fn is_retriable(&self) -> bool {
        matches!(self, GitHubErrorKind::Transient)
    }
}

/// A GitHub API error with categorization for retry decisions.
#[derive(Debug, Error)]
pub struct GitHubApiError {
    pub kind: GitHubErrorKind,

    /// The HTTP status code, if available.
    pub status_code: Option<u16>,

    pub message: String,

    #[source]
    pub source: Option<octocrab::Error>,
}

impl fmt::Display for GitHubApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "GitHub API error (HTTP {}): {}", code, self.message),
            None => write!(f, "GitHub API error: {}", self.message),
        }
    }
}

impl GitHubApiError {
    /// A permanent error without an octocrab source, e.g. a malformed payload.
    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind: GitHubErrorKind::Permanent,
            status_code: None,
            message: message.into(),
            source: None,
        }
    }

    /// A transient error without an octocrab source.
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: GitHubErrorKind::Transient,
            status_code: None,
            message: message.into(),
            source: None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code == Some(404)
    }

    /// Categorizes an octocrab error.
    pub fn from_octocrab(err: octocrab::Error) -> Self {
        let status_code = status_code(&err);
        let message = match &err {
            octocrab::Error::GitHub { source, .. } => source.message.clone(),
            other => other.to_string(),
        };
        let kind = classify(status_code, &message);
        Self {
            kind,
            status_code,
            message,
            source: Some(err),
        }
    }
}

impl From<octocrab::Error> for GitHubApiError {
    fn from(err: octocrab::Error) -> Self {
        GitHubApiError::from_octocrab(err)
    }
}

fn status_code(err: &octocrab::Error) -> Option<u16> {
    match err {
        octocrab::Error::GitHub { source, .. } => Some(source.status_code.as_u16()),
        _ => None,
    }
}

/// Decides retriability from the status code, falling back to the message
/// when the request never got a response.
fn classify(status_code: Option<u16>, message: &str) -> GitHubErrorKind {
    match status_code {
        Some(429) => GitHubErrorKind::Transient,
        Some(403) if is_rate_limit_error(message) => GitHubErrorKind::Transient,
        Some(code) if (500..600).contains(&code) => GitHubErrorKind::Transient,
        Some(_) => GitHubErrorKind::Permanent,
        None if is_network_error(message) => GitHubErrorKind::Transient,
        None => GitHubErrorKind::Permanent,
    }
}

fn is_rate_limit_error(message: &str) -> bool {
    let message_lower = message.to_lowercase();
    message_lower.contains("rate limit")
        || message_lower.contains("secondary rate")
        || message_lower.contains("abuse detection")
}

fn is_network_error(message: &str) -> bool {
    let message_lower = message.to_lowercase();
    message_lower.contains("timeout")
        || message_lower.contains("timed out")
        || message_lower.contains("connection")
        || message_lower.contains("network")
        || message_lower.contains("dns")
}
