//! REST API handlers for the front door

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::FrontDoorState;
use crate::http::files;

// ============================================================================
// API Response Types
// ============================================================================

/// Aggregated dictionary descriptors
#[derive(Debug, Serialize)]
pub struct InfoResponse<'a> {
    pub data: &'a [serde_json::Value],
}

/// Autocomplete suggestions
#[derive(Debug, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<String>,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Autocomplete query string
#[derive(Debug, Default)]
pub struct WordQuery {
    pub q: Option<String>,
}

impl WordQuery {
    /// Name of the term parameter
    pub const PARAM: &'static str = "q";

    /// Take the first `q` when the parameter is repeated
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self {
            q: pairs
                .into_iter()
                .find_map(|(key, value)| (key == Self::PARAM).then_some(value)),
        }
    }
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the front door router
pub fn create_router(state: FrontDoorState) -> Router {
    Router::new()
        .route("/api/info", post(info))
        .route("/api/wq", get(word_query))
        .route("/", get(static_root))
        .route("/{*path}", get(static_path))
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// Every fleet member's descriptor, in registry order
async fn info(State(state): State<FrontDoorState>) -> Response {
    Json(InfoResponse {
        data: &state.descriptors,
    })
    .into_response()
}

/// Word autocomplete
async fn word_query(
    State(state): State<FrontDoorState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<SuggestionsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let params = WordQuery::from_pairs(pairs);
    let term = match params.q.as_deref() {
        Some(q) if !q.is_empty() => q.to_lowercase(),
        _ => return Ok(Json(SuggestionsResponse { suggestions: vec![] })),
    };
    tracing::debug!(query = %term, "Autocomplete query");

    match state.autocomplete.query(&term).await {
        Ok(suggestions) => Ok(Json(SuggestionsResponse { suggestions })),
        Err(e) => {
            tracing::error!(error = %e, query = %term, "Database error");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Database error".to_string(),
                }),
            ))
        }
    }
}

/// Root: the UI's index page, or a service banner without a static directory
async fn static_root(State(state): State<FrontDoorState>) -> Response {
    match state.static_dir.as_deref() {
        Some(dir) => files::serve_file(dir, "index.html").await,
        None => Json(serde_json::json!({
            "service": "dictfleet",
            "version": env!("CARGO_PKG_VERSION"),
            "dictionaries": state.descriptors.len(),
            "uptime_secs": state.start_time.elapsed().as_secs(),
            "endpoints": {
                "info": "POST /api/info",
                "autocomplete": "GET /api/wq?q=<term>"
            }
        }))
        .into_response(),
    }
}

/// Static UI assets
async fn static_path(State(state): State<FrontDoorState>, Path(path): Path<String>) -> Response {
    match state.static_dir.as_deref() {
        Some(dir) => files::serve_file(dir, &path).await,
        None => files::not_found(),
    }
}
