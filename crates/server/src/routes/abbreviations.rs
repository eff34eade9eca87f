//! Abbreviation registry route handlers.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::ApiJson;
use crate::error::AppError;
use crate::state::AppState;

/// Build the abbreviations router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/abbreviations",
            get(list_abbreviations).post(add_abbreviation),
        )
        .route("/abbreviations/refresh", post(refresh_abbreviations))
}

/// Request body for registering an abbreviation.
#[derive(Debug, Deserialize)]
pub struct AbbreviationRequest {
    #[serde(default)]
    pub name: String,
}

/// A stored abbreviation.
#[derive(Debug, Serialize)]
pub struct AbbreviationResponse {
    pub name: String,
}

/// List abbreviations straight from storage, bypassing the cache.
#[instrument(skip(state))]
async fn list_abbreviations(
    State(state): State<AppState>,
) -> Result<ApiJson<Vec<String>>, AppError> {
    Ok(ApiJson(state.repo().list_abbreviations().await?))
}

/// Register an abbreviation (upper-cased). 201 when new, 200 when known.
#[instrument(skip(state))]
async fn add_abbreviation(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AbbreviationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (name, created) = state.registry().add(&request.name).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, ApiJson(AbbreviationResponse { name })))
}

/// Reload the cached set used by the formatter.
#[instrument(skip(state))]
async fn refresh_abbreviations(
    State(state): State<AppState>,
) -> Result<ApiJson<Vec<String>>, AppError> {
    let set = state.registry().refresh().await?;
    Ok(ApiJson(set.iter().map(str::to_owned).collect()))
}
