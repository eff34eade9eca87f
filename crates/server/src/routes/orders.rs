//! Order route handlers.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;

use tokoledger_core::OrderId;

use super::{ApiJson, ApiQuery, required_id};
use crate::error::AppError;
use crate::models::{OrderFilter, OrderInput, OrderView};
use crate::state::AppState;

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/{id}", get(get_order))
}

/// Query parameters for listing orders.
#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    pub search: Option<String>,
}

#[instrument(skip(state))]
async fn list_orders(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<OrderListQuery>,
) -> Result<ApiJson<Vec<OrderView>>, AppError> {
    let filter = OrderFilter {
        search: query.search.filter(|s| !s.trim().is_empty()),
        ..OrderFilter::default()
    };
    Ok(ApiJson(state.views().list_orders(&filter).await?))
}

#[instrument(skip(state))]
async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiJson<OrderView>, AppError> {
    let id: OrderId = required_id(Some(&id), "id")?;
    Ok(ApiJson(state.views().get_order(id).await?))
}

/// Create an order. Customer, address and at least one item are required.
#[instrument(skip(state, input))]
async fn create_order(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<OrderInput>,
) -> Result<impl IntoResponse, AppError> {
    if input.customer.trim().is_empty() {
        return Err(AppError::BadRequest("Customer is required".to_owned()));
    }
    if input.address_id.is_none() {
        return Err(AppError::BadRequest("Address is required".to_owned()));
    }
    if input.order_items.is_empty() {
        return Err(AppError::BadRequest(
            "At least one order item is required".to_owned(),
        ));
    }

    let order = state.orders().create(input).await?;
    Ok((StatusCode::CREATED, ApiJson(order)))
}
