//! HTTP server.
//!
//! # Endpoints
//!
//! - `POST /webhook` - GitHub deliveries, see [`webhook`]
//! - `GET /health` - returns 200 while the server is running

use std::sync::Arc;

use tower_http::trace::TraceLayer;

pub mod health;
pub mod signature;
pub mod webhook;

pub use health::health_handler;
pub use webhook::webhook_handler;

use crate::types::RepoId;
use crate::worker::Scheduler;

/// Shared application state, passed to handlers via axum's `State`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    repo: RepoId,
    scheduler: Scheduler,
    webhook_secret: Vec<u8>,
}

impl AppState {
    pub fn new(repo: RepoId, scheduler: Scheduler, webhook_secret: impl Into<Vec<u8>>) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                repo,
                scheduler,
                webhook_secret: webhook_secret.into(),
            }),
        }
    }

    /// The repository deliveries must be for.
    pub fn repo(&self) -> &RepoId {
        &self.inner.repo
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.inner.scheduler
    }

    pub fn webhook_secret(&self) -> &[u8] {
        &self.inner.webhook_secret
    }
}

pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/webhook", post(webhook_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::types::PrNumber;
    use crate::worker::{WorkKey, WorkQueue};

    const SECRET: &[u8] = b"test-secret";

    fn app() -> (axum::Router, Scheduler, WorkQueue) {
        let (scheduler, queue) = Scheduler::new(1);
        let state = AppState::new(RepoId::new("openjdk", "jdk"), scheduler.clone(), SECRET);
        (build_router(state), scheduler, queue)
    }

    fn delivery(secret: &[u8], event: &str, body: &serde_json::Value) -> Request<Body> {
        let bytes = serde_json::to_vec(body).unwrap();
        Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json")
            .header("x-github-event", event)
            .header("x-github-delivery", "72d3162e-cc78-11e3-81ab-4c9367dc0958")
            .header("x-hub-signature-256", signature::sign(&bytes, secret))
            .body(Body::from(bytes))
            .unwrap()
    }

    fn review_payload() -> serde_json::Value {
        serde_json::json!({
            "action": "submitted",
            "repository": {"full_name": "openjdk/jdk"},
            "pull_request": {"number": 12}
        })
    }

    // ─── Health ───

    #[tokio::test]
    async fn health_returns_ok() {
        let (app, _scheduler, _queue) = app();
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"OK");
    }

    // ─── Webhook ───

    #[tokio::test]
    async fn signed_delivery_schedules_work() {
        let (app, scheduler, _queue) = app();
        let response = app
            .oneshot(delivery(SECRET, "pull_request_review", &review_payload()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(scheduler.in_flight(), 1);
        // Already queued: a second trigger folds into it.
        assert!(!scheduler.submit(WorkKey::Pr(PrNumber(12))).unwrap());
    }

    #[tokio::test]
    async fn bad_signature_is_rejected() {
        let (app, scheduler, _queue) = app();
        let response = app
            .oneshot(delivery(b"wrong-secret", "pull_request_review", &review_payload()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(scheduler.in_flight(), 0);
    }

    #[tokio::test]
    async fn unhandled_events_are_acknowledged() {
        let (app, scheduler, _queue) = app();
        let response = app
            .oneshot(delivery(SECRET, "ping", &serde_json::json!({"zen": "Keep it simple."})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(scheduler.in_flight(), 0);
    }

    #[tokio::test]
    async fn missing_event_header_is_a_bad_request() {
        let (app, _scheduler, _queue) = app();
        let mut request = delivery(SECRET, "pull_request", &review_payload());
        request.headers_mut().remove("x-github-event");

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn stopped_scheduler_is_unavailable() {
        let (app, _scheduler, queue) = app();
        drop(queue);
        let response = app
            .oneshot(delivery(SECRET, "pull_request", &review_payload()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
