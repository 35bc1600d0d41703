//! Axum router and HTTP handlers.
//!
//! `build_router` is the single entry point; `serve` attaches the tracing
//! layer after this call so tests can drive the bare router.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use bytes::Bytes;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

use macrosync_core::{ChangeSet, CoreError, WebhookEvent, compare};

use crate::state::AppState;

// ── Router ──────────────────────────────────────────────────────────

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(macros_webhook))
        .route("/webhook/macros", post(macros_webhook))
        .route("/webhook/changes", post(changes_webhook))
        .route("/health", get(health))
        .with_state(state)
}

// ── Error responses ─────────────────────────────────────────────────

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

fn core_error_response(err: &CoreError) -> Response {
    if err.is_validation() {
        error_response(StatusCode::BAD_REQUEST, err.to_string())
    } else {
        error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

/// Decode a JSON event body, insisting on a JSON content type.
fn parse_event(headers: &HeaderMap, body: &[u8]) -> Result<WebhookEvent, Response> {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));
    if !is_json {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Request must be JSON",
        ));
    }
    WebhookEvent::from_slice(body).map_err(|e| core_error_response(&e))
}

// ── GET /health ─────────────────────────────────────────────────────

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
    version: &'static str,
}

async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        ok: true,
        service: st.build.service,
        version: st.build.version,
    })
}

// ── POST / and /webhook/macros ──────────────────────────────────────

async fn macros_webhook(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let event = match parse_event(&headers, &body) {
        Ok(ev) => ev,
        Err(resp) => return resp,
    };

    // Invalid ids fall through to the driver, which rejects them.
    let _guard = match event.device_id() {
        Ok(id) => Some(st.locks.acquire(id).await),
        Err(_) => None,
    };

    match st.driver.process(&event).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => core_error_response(&e),
    }
}

// ── POST /webhook/changes ───────────────────────────────────────────

#[derive(Serialize)]
struct ChangesResponse {
    changes: ChangeSet,
    requires_retag: bool,
    synced: bool,
}

async fn changes_webhook(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let event = match parse_event(&headers, &body) {
        Ok(ev) => ev,
        Err(resp) => return resp,
    };
    let device_id = match event.device_id() {
        Ok(id) => id,
        Err(e) => {
            warn!(error = %e, "change event without device id");
            return core_error_response(&e);
        }
    };

    let changes = compare(&event.prechange(), &event.postchange());
    let requires_retag = changes.requires_retag();
    if changes.is_empty() {
        info!(device_id, "no changes detected");
    }
    for change in changes.iter() {
        info!(
            device_id,
            field = %change.field,
            prechange = %change.prechange_value,
            postchange = %change.postchange_value,
            requires_retag,
            "changed field"
        );
    }

    let synced = if let Some(ref sync) = st.sync {
        let _guard = st.locks.acquire(device_id).await;
        if let Err(e) = sync.run(device_id, requires_retag).await {
            error!(device_id, error = %e, "sync command failed");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to execute sync command: {e}"),
            );
        }
        true
    } else {
        false
    };

    (
        StatusCode::OK,
        Json(ChangesResponse {
            changes,
            requires_retag,
            synced,
        }),
    )
        .into_response()
}
