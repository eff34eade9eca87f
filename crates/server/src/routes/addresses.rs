//! Delivery address route handlers.

use axum::{Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use serde::Deserialize;
use tracing::{info, instrument};

use tokoledger_core::CustomerId;

use super::{ApiJson, ApiQuery, required_id};
use crate::error::AppError;
use crate::models::{Address, NewAddress};
use crate::state::AppState;

/// Build the addresses router.
pub fn router() -> Router<AppState> {
    Router::new().route("/addresses", get(list_addresses).post(create_address))
}

/// Addresses are always listed per customer.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressListQuery {
    pub customer_id: Option<String>,
}

#[instrument(skip(state))]
async fn list_addresses(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AddressListQuery>,
) -> Result<ApiJson<Vec<Address>>, AppError> {
    let customer_id: CustomerId = required_id(query.customer_id.as_deref(), "customerId")?;
    let addresses = state.repo().addresses_for_customer(customer_id).await?;
    Ok(ApiJson(addresses))
}

/// Create an address for an existing customer.
#[instrument(skip(state, input))]
async fn create_address(
    State(state): State<AppState>,
    ApiJson(mut input): ApiJson<NewAddress>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(field) = input.normalize() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    if state.repo().customer_by_id(input.customer_id).await?.is_none() {
        return Err(AppError::NotFound("Customer not found".to_owned()));
    }

    let address = state.repo().insert_address(input).await?;
    info!(address_id = %address.id, "Created address");
    Ok((StatusCode::CREATED, ApiJson(address)))
}
