//! HTTP use-case API over the Note Store.
//!
//! # Responsibility
//! - Expose `GET /api/notes` (read all) and `POST /api/notes` (replace all).
//! - Convert store failures into status responses at the boundary.
//!
//! # Invariants
//! - Handlers never panic and never take the process down.
//! - A failed read answers 500 with an empty array; the error text travels
//!   out of band in the `x-error-detail` header.
//! - Store calls run on the blocking pool, never on async worker threads.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use log::{error, info, warn};
use notekeep_core::{Note, NoteStore, StoreResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Response header carrying the failure detail of a degraded read.
pub const ERROR_DETAIL_HEADER: &str = "x-error-detail";
pub const SAVE_CONFIRMATION: &str = "Notes saved";
pub const SAVE_FAILURE: &str = "Failed to save notes";
const MAX_ERROR_DETAIL_CHARS: usize = 200;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<NoteStore>,
}

impl AppState {
    pub fn new(store: Arc<NoteStore>) -> Self {
        Self { store }
    }
}

/// Body of a successful `POST /api/notes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveConfirmation {
    pub message: String,
}

/// Body of a failed `POST /api/notes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveFailure {
    pub error: String,
    pub details: String,
}

impl SaveFailure {
    fn new(details: impl Into<String>) -> Self {
        Self {
            error: SAVE_FAILURE.to_string(),
            details: details.into(),
        }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/notes", get(get_notes).post(post_notes))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn get_notes(State(state): State<AppState>) -> Response {
    let started_at = Instant::now();
    let store = Arc::clone(&state.store);
    match run_blocking(move || store.read_all()).await {
        Ok(notes) => {
            info!(
                "event=api_request module=api route=get_notes status=ok count={} duration_ms={}",
                notes.len(),
                started_at.elapsed().as_millis()
            );
            (StatusCode::OK, Json(notes)).into_response()
        }
        Err(detail) => {
            error!(
                "event=api_request module=api route=get_notes status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                detail
            );
            let mut response =
                (StatusCode::INTERNAL_SERVER_ERROR, Json(Vec::<Note>::new())).into_response();
            if let Ok(value) = HeaderValue::from_str(&header_safe(&detail)) {
                response.headers_mut().insert(ERROR_DETAIL_HEADER, value);
            }
            response
        }
    }
}

async fn post_notes(
    State(state): State<AppState>,
    payload: Result<Json<Vec<Note>>, JsonRejection>,
) -> Response {
    let started_at = Instant::now();
    let notes = match payload {
        Ok(Json(notes)) => notes,
        Err(rejection) => {
            warn!(
                "event=api_request module=api route=post_notes status=rejected error={}",
                rejection.body_text()
            );
            return (
                StatusCode::BAD_REQUEST,
                Json(SaveFailure::new(rejection.body_text())),
            )
                .into_response();
        }
    };

    let count = notes.len();
    let store = Arc::clone(&state.store);
    match run_blocking(move || store.replace_all(&notes)).await {
        Ok(()) => {
            info!(
                "event=api_request module=api route=post_notes status=ok count={} duration_ms={}",
                count,
                started_at.elapsed().as_millis()
            );
            (
                StatusCode::OK,
                Json(SaveConfirmation {
                    message: SAVE_CONFIRMATION.to_string(),
                }),
            )
                .into_response()
        }
        Err(detail) => {
            error!(
                "event=api_request module=api route=post_notes status=error count={} duration_ms={} error={}",
                count,
                started_at.elapsed().as_millis(),
                detail
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SaveFailure::new(detail)),
            )
                .into_response()
        }
    }
}

async fn run_blocking<T, F>(op: F) -> Result<T, String>
where
    T: Send + 'static,
    F: FnOnce() -> StoreResult<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(op).await {
        Ok(result) => result.map_err(|err| err.to_string()),
        Err(err) => Err(format!("store task failed: {err}")),
    }
}

/// Flattens text into a single visible-ASCII line usable as a header value.
fn header_safe(detail: &str) -> String {
    detail
        .chars()
        .map(|c| if c.is_ascii_graphic() || c == ' ' { c } else { '?' })
        .take(MAX_ERROR_DETAIL_CHARS)
        .collect()
}
