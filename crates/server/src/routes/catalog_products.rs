//! Sales catalog route handlers.

use axum::{
    Router,
    extract::{Path, State},
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;

use tokoledger_core::CatalogProductId;

use super::{ApiJson, ApiQuery, required_id};
use crate::error::AppError;
use crate::models::CatalogProduct;
use crate::state::AppState;

/// Build the catalog router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/catalog-products", get(search_catalog))
        .route("/catalog-products/{id}", get(get_catalog_product))
}

/// Autocomplete query. A missing name lists from the start of the catalog.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogSearchQuery {
    pub name: Option<String>,
}

#[instrument(skip(state))]
async fn search_catalog(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CatalogSearchQuery>,
) -> Result<ApiJson<Vec<CatalogProduct>>, AppError> {
    let fragment = query.name.as_deref().map_or("", str::trim);
    let products = state
        .repo()
        .search_catalog_products(fragment, state.config().search_limit)
        .await?;
    Ok(ApiJson(products))
}

#[instrument(skip(state))]
async fn get_catalog_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiJson<CatalogProduct>, AppError> {
    let id: CatalogProductId = required_id(Some(&id), "id")?;
    state
        .repo()
        .catalog_product_by_id(id)
        .await?
        .map(ApiJson)
        .ok_or_else(|| AppError::NotFound("Catalog product not found".to_owned()))
}
