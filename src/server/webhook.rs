//! Webhook endpoint.
//!
//! Each accepted delivery becomes a [`WorkKey`] handed to the scheduler; the
//! pass itself re-reads everything from the forge, so only the PR number or
//! commit is taken from the payload.
//!
//! | Event                 | Work                          |
//! |-----------------------|-------------------------------|
//! | `issue_comment`       | the PR, if the issue is a PR  |
//! | `pull_request`        | the PR                        |
//! | `pull_request_review` | the PR                        |
//! | `commit_comment`      | the commented commit          |
//!
//! Other events, and events for other repositories, are acknowledged and
//! ignored.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::AppState;
use super::signature::verify_signature;
use crate::types::{DeliveryId, PrNumber, RepoId, Sha};
use crate::worker::{SchedulerClosed, WorkKey};

const HEADER_EVENT: &str = "x-github-event";
const HEADER_DELIVERY: &str = "x-github-delivery";
const HEADER_SIGNATURE: &str = "x-hub-signature-256";

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("{event} payload without {field}")]
    MissingField {
        event: &'static str,
        field: &'static str,
    },

    #[error(transparent)]
    Closed(#[from] SchedulerClosed),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::MissingHeader(_)
            | WebhookError::InvalidJson(_)
            | WebhookError::MissingField { .. } => StatusCode::BAD_REQUEST,
            WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,
            WebhookError::Closed(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, self.to_string()).into_response()
    }
}

/// What a delivery asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    Work(WorkKey),
    Ignored(&'static str),
}

/// `POST /webhook`
///
/// - 202 Accepted: work scheduled
/// - 200 OK: delivery ignored
/// - 400 Bad Request: missing header or malformed payload
/// - 401 Unauthorized: bad signature
pub async fn webhook_handler(
    State(app): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, &'static str), WebhookError> {
    let event = header(&headers, HEADER_EVENT)?;
    let signature = header(&headers, HEADER_SIGNATURE)?;
    let delivery = DeliveryId::new(header(&headers, HEADER_DELIVERY).unwrap_or_default());

    if !verify_signature(&body, &signature, app.webhook_secret()) {
        warn!(%delivery, %event, "invalid webhook signature");
        return Err(WebhookError::InvalidSignature);
    }

    let payload: Value = serde_json::from_slice(&body)?;
    match route(&event, &payload, app.repo())? {
        Routed::Work(key) => {
            let started = app.scheduler().submit(key.clone())?;
            info!(%delivery, %event, %key, started, "webhook scheduled");
            Ok((StatusCode::ACCEPTED, "Accepted"))
        }
        Routed::Ignored(reason) => {
            debug!(%delivery, %event, reason, "webhook ignored");
            Ok((StatusCode::OK, "Ignored"))
        }
    }
}

fn header(headers: &HeaderMap, name: &'static str) -> Result<String, WebhookError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or(WebhookError::MissingHeader(name))
}

fn repository(payload: &Value) -> Option<RepoId> {
    payload
        .pointer("/repository/full_name")
        .and_then(Value::as_str)
        .and_then(|name| name.parse().ok())
}

fn number_at(payload: &Value, pointer: &str) -> Option<PrNumber> {
    payload.pointer(pointer).and_then(Value::as_u64).map(PrNumber)
}

/// Maps a delivery to the work it triggers.
pub fn route(event: &str, payload: &Value, repo: &RepoId) -> Result<Routed, WebhookError> {
    let event: &'static str = match event {
        "issue_comment" => "issue_comment",
        "pull_request" => "pull_request",
        "pull_request_review" => "pull_request_review",
        "commit_comment" => "commit_comment",
        _ => return Ok(Routed::Ignored("event not handled")),
    };
    if repository(payload).as_ref() != Some(repo) {
        return Ok(Routed::Ignored("other repository"));
    }
    let missing = |field| WebhookError::MissingField { event, field };

    let key = match event {
        "issue_comment" => {
            if payload.pointer("/issue/pull_request").is_none() {
                return Ok(Routed::Ignored("comment on an issue"));
            }
            WorkKey::Pr(number_at(payload, "/issue/number").ok_or_else(|| missing("issue.number"))?)
        }
        "commit_comment" => {
            let commit = payload
                .pointer("/comment/commit_id")
                .and_then(Value::as_str)
                .and_then(|s| Sha::parse(s).ok())
                .ok_or_else(|| missing("comment.commit_id"))?;
            WorkKey::Commit(commit)
        }
        _ => WorkKey::Pr(
            number_at(payload, "/pull_request/number").ok_or_else(|| missing("pull_request.number"))?,
        ),
    };
    Ok(Routed::Work(key))
}
