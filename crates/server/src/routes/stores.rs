//! Store route handlers.

use axum::{Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use serde::Deserialize;
use tracing::instrument;

use super::{ApiJson, ApiQuery, required_text};
use crate::error::AppError;
use crate::models::{CreateStoreInput, Store};
use crate::services::Resolution;
use crate::state::AppState;

/// Build the stores router.
pub fn router() -> Router<AppState> {
    Router::new().route("/stores", get(search_stores).post(create_store))
}

/// Autocomplete query.
#[derive(Debug, Default, Deserialize)]
pub struct StoreSearchQuery {
    pub name: Option<String>,
}

/// Search stores by name fragment.
#[instrument(skip(state))]
async fn search_stores(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StoreSearchQuery>,
) -> Result<ApiJson<Vec<Store>>, AppError> {
    let fragment = required_text(query.name.as_deref(), "name")?;
    let stores = state
        .repo()
        .search_stores(fragment, state.config().search_limit)
        .await?;
    Ok(ApiJson(stores))
}

/// Find or create a store. 201 when created, 200 when it already existed.
#[instrument(skip(state, input))]
async fn create_store(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateStoreInput>,
) -> Result<impl IntoResponse, AppError> {
    let response = match state.resolver().register_store(input).await? {
        Resolution::Created(store) => (StatusCode::CREATED, ApiJson(store)),
        Resolution::Existing(store) => (StatusCode::OK, ApiJson(store)),
    };
    Ok(response)
}
