//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (storage ping)
//!
//! # Expenses
//! GET    /expenses             - List (search, from, to, storeId)
//! POST   /expenses             - Create
//! PUT    /expenses?id=         - Full replace
//! DELETE /expenses?id=         - Delete (and its attachment folder)
//!
//! # Canonical entities
//! GET  /stores?name=           - Store autocomplete
//! POST /stores                 - Find or create a store
//! GET  /products?name=&storeId= - Store-scoped product autocomplete
//! GET  /catalog-products?name= - Catalog autocomplete
//! GET  /catalog-products/{id}  - Catalog product detail
//! GET  /customers?name=        - Customer list
//! POST /customers              - Create customer
//! GET  /addresses?customerId=  - A customer's addresses
//! POST /addresses              - Create address
//!
//! # Orders
//! GET  /orders?search=         - List
//! POST /orders                 - Create
//! GET  /orders/{id}            - Detail
//!
//! # Abbreviations
//! GET  /abbreviations          - List
//! POST /abbreviations          - Register
//! POST /abbreviations/refresh  - Reload the cache
//!
//! # Attachments
//! POST   /uploads              - Multipart upload
//! DELETE /uploads?expenseId=&imagePath= - Remove one attachment
//! GET    /uploads/expenses/... - Stored attachment files
//! ```

pub mod abbreviations;
pub mod addresses;
pub mod catalog_products;
pub mod customers;
pub mod expenses;
pub mod health;
pub mod orders;
pub mod products;
pub mod stores;
pub mod uploads;

use std::str::FromStr;

use axum::{
    Json, Router,
    extract::{FromRequest, FromRequestParts},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::services::attachments::EXPENSES_PUBLIC_PREFIX;
use crate::state::AppState;

/// JSON extractor and response whose rejections use the API error body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl<T: Serialize> IntoResponse for ApiJson<T> {
    fn into_response(self) -> Response {
        Json(self.0).into_response()
    }
}

/// Query-string extractor whose rejections use the API error body.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Body of simple acknowledgement responses.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Parse a required ID query parameter.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if the parameter is missing, blank or not
/// a valid ID.
pub fn required_id<T: FromStr>(raw: Option<&str>, param: &str) -> Result<T, AppError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("{param} is required")))?;
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid {param}")))
}

/// Parse an optional ID query parameter. Blank values count as absent.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if a non-blank value is not a valid ID.
pub fn optional_id<T: FromStr>(raw: Option<&str>, param: &str) -> Result<Option<T>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(_) => required_id(raw, param).map(Some),
    }
}

/// Require a non-blank text query parameter.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if the parameter is missing or blank.
pub fn required_text<'a>(raw: Option<&'a str>, param: &str) -> Result<&'a str, AppError> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("{param} is required")))
}

/// Create all API routes.
pub fn routes(config: &ServerConfig) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(expenses::router())
        .merge(stores::router())
        .merge(products::router())
        .merge(catalog_products::router())
        .merge(customers::router())
        .merge(addresses::router())
        .merge(orders::router())
        .merge(abbreviations::router())
        .merge(uploads::router(config.uploads.body_limit()))
}

/// Build the complete application: API routes, the uploaded-file directory
/// and request tracing.
pub fn app(state: AppState) -> Router {
    let uploads_dir = ServeDir::new(state.attachments().expenses_dir());

    Router::new()
        .merge(routes(state.config()))
        .nest_service(EXPENSES_PUBLIC_PREFIX, uploads_dir)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::config::UploadConfig;
    use crate::db::MemoryRepository;
    use tokoledger_core::StoreId;

    fn test_app(dir: &tempfile::TempDir) -> Router {
        let uploads = UploadConfig {
            root: dir.path().to_path_buf(),
            ..UploadConfig::default()
        };
        let state = AppState::new(
            ServerConfig::for_uploads(uploads),
            Arc::new(MemoryRepository::new()),
        );
        app(state)
    }

    #[tokio::test]
    async fn test_app_serves_health() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_app(&dir)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_id_is_json_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_app(&dir)
            .oneshot(
                Request::delete("/expenses")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "id is required");
    }

    #[test]
    fn test_required_id() {
        let id = StoreId::generate();
        let raw = id.to_string();
        assert_eq!(required_id::<StoreId>(Some(&raw), "id").unwrap(), id);

        let missing = required_id::<StoreId>(None, "id").unwrap_err();
        assert_eq!(missing.to_string(), "Bad request: id is required");

        let malformed = required_id::<StoreId>(Some("Toko ABC"), "id").unwrap_err();
        assert_eq!(malformed.to_string(), "Bad request: Invalid id");
    }

    #[test]
    fn test_optional_id_treats_blank_as_absent() {
        assert_eq!(optional_id::<StoreId>(Some("  "), "storeId").unwrap(), None);
        assert!(optional_id::<StoreId>(Some("nope"), "storeId").is_err());
    }

    #[test]
    fn test_required_text_trims() {
        assert_eq!(required_text(Some(" abc "), "name").unwrap(), "abc");
        assert!(required_text(Some(""), "name").is_err());
    }
}
