//! Expense route handlers.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;

use tokoledger_core::{ExpenseId, parse_calendar_date};

use super::{ApiJson, ApiQuery, MessageResponse, optional_id, required_id};
use crate::error::AppError;
use crate::models::{Expense, ExpenseFilter, ExpenseInput, ExpenseView};
use crate::state::AppState;

/// Build the expenses router.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/expenses",
        get(list_expenses)
            .post(create_expense)
            .put(update_expense)
            .delete(delete_expense),
    )
}

/// Query parameters for listing expenses.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseListQuery {
    pub search: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub store_id: Option<String>,
}

impl ExpenseListQuery {
    fn into_filter(self) -> Result<ExpenseFilter, AppError> {
        let date = |raw: Option<String>, param: &str| {
            raw.filter(|s| !s.trim().is_empty())
                .map(|s| {
                    parse_calendar_date(&s)
                        .map_err(|e| AppError::BadRequest(format!("Invalid {param}: {e}")))
                })
                .transpose()
        };

        Ok(ExpenseFilter {
            store_id: optional_id(self.store_id.as_deref(), "storeId")?,
            from: date(self.from, "from")?,
            to: date(self.to, "to")?,
            search: self.search.filter(|s| !s.trim().is_empty()),
        })
    }
}

/// `?id=` selector for update and delete.
#[derive(Debug, Default, Deserialize)]
pub struct ExpenseIdQuery {
    pub id: Option<String>,
}

/// List expenses, newest first, with live store and product details.
#[instrument(skip(state))]
async fn list_expenses(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ExpenseListQuery>,
) -> Result<ApiJson<Vec<ExpenseView>>, AppError> {
    let filter = query.into_filter()?;
    let views = state.views().list_expenses(&filter).await?;
    Ok(ApiJson(views))
}

/// Record an expense.
#[instrument(skip(state, input))]
async fn create_expense(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ExpenseInput>,
) -> Result<impl IntoResponse, AppError> {
    let expense = state.expenses().create(input).await?;
    Ok((StatusCode::CREATED, ApiJson(expense)))
}

/// Replace an expense.
#[instrument(skip(state, input))]
async fn update_expense(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ExpenseIdQuery>,
    ApiJson(input): ApiJson<ExpenseInput>,
) -> Result<ApiJson<Expense>, AppError> {
    let id: ExpenseId = required_id(query.id.as_deref(), "id")?;
    let expense = state.expenses().update(id, input).await?;
    Ok(ApiJson(expense))
}

/// Delete an expense and its attachment folder.
#[instrument(skip(state))]
async fn delete_expense(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ExpenseIdQuery>,
) -> Result<ApiJson<MessageResponse>, AppError> {
    let id: ExpenseId = required_id(query.id.as_deref(), "id")?;
    state.expenses().delete(id).await?;
    Ok(ApiJson(MessageResponse::new("Expense deleted successfully")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn test_list_query_into_filter() {
        let filter = ExpenseListQuery {
            search: Some("  ".to_owned()),
            from: Some("2024-01-01".to_owned()),
            to: Some("2024-01-31T23:00:00Z".to_owned()),
            store_id: None,
        }
        .into_filter()
        .unwrap();

        assert_eq!(filter.search, None);
        assert_eq!(filter.from, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(filter.to, NaiveDate::from_ymd_opt(2024, 1, 31));
    }

    #[test]
    fn test_list_query_rejects_bad_date() {
        let err = ExpenseListQuery {
            from: Some("yesterday".to_owned()),
            ..ExpenseListQuery::default()
        }
        .into_filter()
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
