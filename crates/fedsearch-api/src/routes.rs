//! HTTP handlers.

use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::{Request, State};
use axum::response::IntoResponse;
use fedsearch_core::{Error as CoreError, FormattedRecord, RecordStore, next_offset};
use fedsearch_fts::Dispatcher;
use http::{Method, StatusCode};
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::format::format_results;
use crate::params::{merge_body, normalize, query_params};
use crate::Result;

/// Largest request body accepted, in bytes.
pub const MAX_BODY_BYTES: usize = 1_048_576;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    dispatcher: Arc<Dispatcher>,
    store: Arc<dyn RecordStore>,
}

impl AppState {
    /// Create handler state.
    pub fn new(dispatcher: Arc<Dispatcher>, store: Arc<dyn RecordStore>) -> Self {
        Self { dispatcher, store }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

/// Search endpoint response body.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    /// Offset of the next page, or -1 when this is the last.
    pub next_offset: i64,
    /// Total matches across all pages.
    pub total: u64,
    /// Engine time in milliseconds.
    pub query_time: f64,
    /// Formatted records of this page.
    pub records: Vec<FormattedRecord>,
}

/// `GET`/`POST` search handler.
///
/// Runs behind the auth layer, which has already bound the acting identity
/// to the request.
pub async fn search(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<SearchResponse>> {
    let started = Instant::now();
    let (parts, body) = request.into_parts();

    let ctx = fedsearch_auth::context_from_parts(&parts).ok_or(CoreError::Unauthorized)?;

    let mut params = query_params(&parts.uri);
    if parts.method == Method::POST {
        let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|e| {
                log::warn!("[{}] Unreadable request body: {e}", ctx.request_id());
                CoreError::SearchRuntime
            })?;
        if let Some(body_params) = body_object(&bytes) {
            merge_body(&mut params, body_params);
        }
    }

    let query = normalize(&params)?;
    let results = state.dispatcher.dispatch(&ctx, &query).await?;
    let records = format_results(state.store.as_ref(), &ctx, &results).await?;

    let response = SearchResponse {
        next_offset: next_offset(results.total_hits(), query.limit, query.offset),
        total: results.total_hits(),
        query_time: results.query_time_ms(),
        records,
    };

    tracing::info!(
        request_id = %ctx.request_id(),
        modules = ?query.modules,
        total = response.total,
        returned = response.records.len(),
        elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
        "search completed"
    );

    Ok(Json(response))
}

/// Parse a POST body as a JSON object. Empty or non-object bodies
/// contribute nothing.
fn body_object(bytes: &[u8]) -> Option<Map<String, Value>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => {
            log::debug!("Ignoring non-object request body");
            None
        }
        Err(e) => {
            log::debug!("Ignoring unparseable request body: {e}");
            None
        }
    }
}

/// `OPTIONS` on the search route: success, empty body.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Liveness check.
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
