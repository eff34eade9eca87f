//! Customer route handlers.

use axum::{Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use serde::Deserialize;
use tracing::{info, instrument};

use super::{ApiJson, ApiQuery};
use crate::error::AppError;
use crate::models::{Customer, NewCustomer};
use crate::state::AppState;

/// Build the customers router.
pub fn router() -> Router<AppState> {
    Router::new().route("/customers", get(list_customers).post(create_customer))
}

/// Optional name filter.
#[derive(Debug, Default, Deserialize)]
pub struct CustomerListQuery {
    pub name: Option<String>,
}

#[instrument(skip(state))]
async fn list_customers(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CustomerListQuery>,
) -> Result<ApiJson<Vec<Customer>>, AppError> {
    let name = query.name.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let customers = state.repo().list_customers(name).await?;
    Ok(ApiJson(customers))
}

/// Create a customer. Name and phone are both required.
#[instrument(skip(state, input))]
async fn create_customer(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewCustomer>,
) -> Result<impl IntoResponse, AppError> {
    let name = input.name.trim();
    let phone = input.phone.trim();
    if name.is_empty() || phone.is_empty() {
        return Err(AppError::BadRequest(
            "Name and phone are required".to_owned(),
        ));
    }

    let customer = state
        .repo()
        .insert_customer(NewCustomer {
            name: name.to_owned(),
            phone: phone.to_owned(),
        })
        .await?;
    info!(customer_id = %customer.id, "Created customer");
    Ok((StatusCode::CREATED, ApiJson(customer)))
}
