//! HTTP search server.
//!
//! Exposes the catalog as a small JSON API. The catalog is built once
//! before the listener binds and then shared read-only by every handler.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/search?query=..&type=compound\|category` | Files containing a compound or any compound of a category |
//! | `GET`  | `/api/search` | Same handler, path used by the bundled frontend |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! An unknown, missing, or repeated `type` returns `400`:
//!
//! ```json
//! { "error": "Invalid search type" }
//! ```
//!
//! An unknown compound or category is not an error; it returns `200` with
//! an empty `files` list.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so browser frontends
//! on other origins can call the API.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use compound_finder_core::{Catalog, QueryError, SearchResponse};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::catalog::load_catalog;
use crate::config::Config;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    /// Immutable catalog, built once at startup.
    catalog: Arc<Catalog>,
}

/// Builds the catalog from `config`, then serves it on `[server].bind`.
///
/// The listener is only bound after the build completes, so no request
/// can observe a partially built catalog.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let catalog = load_catalog(config);
    serve_catalog(&config.server.bind, Arc::new(catalog)).await
}

/// Serves an already-built catalog on `bind_addr`. Runs until the process
/// is terminated.
pub async fn serve_catalog(bind_addr: &str, catalog: Arc<Catalog>) -> anyhow::Result<()> {
    let app = router(catalog);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("search server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

/// The full route table with CORS applied.
pub fn router(catalog: Arc<Catalog>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/search", get(handle_search))
        .route("/api/search", get(handle_search))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(AppState { catalog })
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::InvalidQueryKind(_) => AppError {
                status: StatusCode::BAD_REQUEST,
                message: "Invalid search type".to_string(),
            },
        }
    }
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    /// Always `"ok"` when the server is running.
    status: String,
    /// The crate version from `Cargo.toml`.
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /search ============

/// Query string for `GET /search`. Both fields are optional at the HTTP
/// level: a missing `query` searches for the empty key, a missing `type`
/// is rejected by the query engine.
#[derive(Debug, Default, PartialEq, Eq)]
struct SearchParams {
    query: Option<String>,
    kind: Option<String>,
}

impl SearchParams {
    /// Collects the recognised keys from raw query pairs.
    ///
    /// A repeated `query` keeps its first value. A repeated `type` names no
    /// single kind and is left unset, so it is rejected like a missing one.
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = None;
        let mut kinds = Vec::new();
        for (key, value) in pairs {
            match key.as_str() {
                "query" => {
                    query.get_or_insert(value);
                }
                "type" => kinds.push(value),
                _ => {}
            }
        }
        let kind = if kinds.len() == 1 { kinds.pop() } else { None };
        SearchParams { query, kind }
    }
}

async fn handle_search(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<SearchResponse>, AppError> {
    let params = SearchParams::from_pairs(pairs);
    let resp = state.catalog.query(
        params.query.as_deref().unwrap_or_default(),
        params.kind.as_deref().unwrap_or_default(),
    )?;
    Ok(Json(resp))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_params_single_values() {
        let params = SearchParams::from_pairs(pairs(&[("query", "HCl"), ("type", "compound")]));
        assert_eq!(params.query.as_deref(), Some("HCl"));
        assert_eq!(params.kind.as_deref(), Some("compound"));
    }

    #[test]
    fn test_params_repeated_keys() {
        let params = SearchParams::from_pairs(pairs(&[
            ("query", "a"),
            ("query", "b"),
            ("type", "compound"),
            ("type", "category"),
            ("other", "x"),
        ]));
        assert_eq!(params.query.as_deref(), Some("a"));
        assert_eq!(params.kind, None);
    }

    #[test]
    fn test_params_empty() {
        assert_eq!(SearchParams::from_pairs(Vec::new()), SearchParams::default());
    }
}
