// src/api/handlers.rs
// =============================================================================
// axum handlers for the link API.
//
// GET /api/health also reports whether the background checker is running.
//
// Errors from the store become JSON responses:
//   NotFound      -> 404
//   AlreadyExists -> 409
//   anything else -> 500
// Bodies that aren't valid JSON links are rejected by the Json extractor
// before a handler runs.
// =============================================================================

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::categories::build_category_tree;
use crate::models::{Category, Link};
use crate::store::{LinkStore, StoreError};
use crate::sweep::HealthChecker;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<LinkStore>,
    pub checker: Arc<HealthChecker>,
}

/// Builds the router with tracing and permissive CORS
pub fn create_router(state: AppState) -> Router {
    // Each route maps HTTP methods to handler functions.
    // axum works out from each handler's arguments what to extract from
    // the request (path segment, JSON body, shared state).
    Router::new()
        .route("/api/health", get(health))
        .route("/api/links", get(list_links).post(add_link))
        .route(
            "/api/links/{id}",
            get(get_link).put(update_link).delete(delete_link),
        )
        .route("/api/categories", get(categories))
        .with_state(state)
        // Layers wrap every route; the last one added runs first
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// A store error on its way out as an HTTP response
struct ApiError(StoreError);

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Client mistakes map to 4xx quietly; anything else is our problem
        // and gets logged before it becomes a 500
        let status = match &self.0 {
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::AlreadyExists(_) => StatusCode::CONFLICT,
            other => {
                error!(error = %other, "link store error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = ErrorBody {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let checker = if state.checker.is_running() {
        "running"
    } else {
        "stopped"
    };
    Json(serde_json::json!({ "status": "ok", "healthChecker": checker }))
}

async fn list_links(State(state): State<AppState>) -> Json<Vec<Link>> {
    // list() returns a copy, so serializing happens without the store lock
    Json(state.store.list().await)
}

async fn get_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Link>, ApiError> {
    // get() gives an Option; turn None into the same NotFound error the
    // store returns for updates, so the 404 body looks the same
    let link = state
        .store
        .get(&id)
        .await
        .ok_or(StoreError::NotFound(id))?;
    Ok(Json(link))
}

async fn add_link(
    State(state): State<AppState>,
    Json(link): Json<Link>,
) -> Result<(StatusCode, Json<Link>), ApiError> {
    // The `?` converts a StoreError into ApiError via the From impl above
    let stored = state.store.add(link).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

async fn update_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(link): Json<Link>,
) -> Result<Json<Link>, ApiError> {
    // The id comes from the URL; any id in the body is ignored
    let stored = state.store.update(&id, link).await?;
    Ok(Json(stored))
}

async fn delete_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    // Deleting an id that isn't there still answers 200
    state.store.delete(&id).await?;
    Ok(StatusCode::OK)
}

async fn categories(State(state): State<AppState>) -> Json<Category> {
    // The tree is rebuilt from a snapshot on every request
    let links = state.store.list().await;
    Json(build_category_tree(&links))
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. What are State, Path and Json?
//    - Extractors: each pulls one thing out of the request before the
//      handler body runs
//    - If extraction fails (bad JSON, wrong content type) axum answers with
//      a 4xx on its own
//
// 2. Why wrap StoreError in ApiError?
//    - IntoResponse can't be implemented for a type from another module's
//      error enum without tying the store to axum; the wrapper keeps the
//      HTTP mapping here
// -----------------------------------------------------------------------------
