//! HTTP surface: the two published-content feeds and a liveness probe.
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument};

use crate::content::{ContentSource, FilterError, Publishable};

pub const NO_CACHE: &str = "no-store, no-cache, must-revalidate, proxy-revalidate";

pub struct AppState {
    pub content: ContentSource,
}

pub type SharedState = Arc<AppState>;

/// Which public feed a response belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    Resources,
    Testimonials,
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feed::Resources => f.write_str("resources"),
            Feed::Testimonials => f.write_str("testimonials"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to filter {feed}: {source}")]
    Filter {
        feed: Feed,
        #[source]
        source: FilterError,
    },
}

impl ApiError {
    fn feed(&self) -> Feed {
        match self {
            ApiError::Filter { feed, .. } => *feed,
        }
    }
}

/// Opaque 500; the cause is only logged.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(err = %self, "failed to build response");
        let body = json!({ "error": format!("Failed to fetch {}", self.feed()) });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/resources", get(published_resources))
        .route("/api/testimonials", get(published_testimonials))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /api/resources
#[instrument(skip_all)]
pub async fn published_resources(State(state): State<SharedState>) -> Result<Response, ApiError> {
    let doc = state.content.resources().await;
    Ok(no_cache_json(publish(Feed::Resources, doc)?))
}

/// GET /api/testimonials
#[instrument(skip_all)]
pub async fn published_testimonials(
    State(state): State<SharedState>,
) -> Result<Response, ApiError> {
    let doc = state.content.testimonials().await;
    Ok(no_cache_json(publish(Feed::Testimonials, doc)?))
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    "OK"
}

fn publish<D: Publishable>(feed: Feed, doc: D) -> Result<Vec<Value>, ApiError> {
    let items = doc
        .into_published()
        .map_err(|source| ApiError::Filter { feed, source })?;
    info!(%feed, count = items.len(), "serving published items");
    Ok(items)
}

/// 200 JSON array with headers that forbid any caching.
pub fn no_cache_json(items: Vec<Value>) -> Response {
    (
        [
            (header::CACHE_CONTROL, NO_CACHE),
            (header::PRAGMA, "no-cache"),
            (header::EXPIRES, "0"),
        ],
        Json(items),
    )
        .into_response()
}
