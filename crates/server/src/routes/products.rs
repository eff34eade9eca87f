//! Store product autocomplete.

use axum::{Router, extract::State, routing::get};
use serde::Deserialize;
use tracing::instrument;

use tokoledger_core::StoreId;

use super::{ApiJson, ApiQuery, required_id, required_text};
use crate::error::AppError;
use crate::models::ExpenseProduct;
use crate::state::AppState;

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new().route("/products", get(search_products))
}

/// Autocomplete query; products are always scoped to one store.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSearchQuery {
    pub name: Option<String>,
    pub store_id: Option<String>,
}

#[instrument(skip(state))]
async fn search_products(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProductSearchQuery>,
) -> Result<ApiJson<Vec<ExpenseProduct>>, AppError> {
    let fragment = required_text(query.name.as_deref(), "name")?;
    let store_id: StoreId = required_id(query.store_id.as_deref(), "storeId")?;
    let products = state
        .repo()
        .search_products(store_id, fragment, state.config().search_limit)
        .await?;
    Ok(ApiJson(products))
}
