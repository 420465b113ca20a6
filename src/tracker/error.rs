//! Issue-tracker errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    /// The request did not complete (connection, TLS, timeout, body decoding).
    #[error("tracker request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The tracker answered with an error status.
    #[error("tracker returned HTTP {status} for {url}: {body}")]
    Status { status: u16, url: String, body: String },

    /// A property value the tracker cannot store.
    #[error("invalid value for property {key}: {reason}")]
    InvalidProperty { key: String, reason: String },
}

impl TrackerError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, TrackerError::Status { status: 404, .. })
    }
}
