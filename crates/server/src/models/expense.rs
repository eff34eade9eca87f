//! Expense domain models: persisted records, API inputs and display views.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tokoledger_core::{ExpenseId, ProductId, StoreId, deserialize_calendar_date};

/// A line item embedded in an expense.
///
/// `name` is a snapshot of what was typed when the purchase was recorded and
/// may drift from the canonical product name; `product` links back to the
/// live product for display and future edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseItem {
    /// Canonical product.
    pub product: ProductId,
    /// Name as submitted.
    pub name: String,
    /// Quantity bought.
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    /// Unit price paid.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// A recorded purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    /// Unique expense ID.
    pub id: ExpenseId,
    /// Store the purchase was made at.
    #[serde(rename = "store")]
    pub store_id: StoreId,
    /// Line items.
    pub items: Vec<ExpenseItem>,
    /// Purchase date.
    pub date: NaiveDate,
    /// Total as submitted by the client (not recomputed).
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    /// Public paths of receipt photos.
    pub attachments: Vec<String>,
    /// Optional thumbnail path.
    pub thumbnail_path: Option<String>,
    /// When the expense was created.
    pub created_at: DateTime<Utc>,
    /// When the expense was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Resolved fields written on create and on full replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseDraft {
    /// Resolved store.
    pub store_id: StoreId,
    /// Resolved line items.
    pub items: Vec<ExpenseItem>,
    /// Purchase date.
    pub date: NaiveDate,
    /// Submitted total.
    pub total: Decimal,
    /// Attachment paths.
    pub attachments: Vec<String>,
    /// Optional thumbnail path.
    pub thumbnail_path: Option<String>,
}

/// A line item as submitted by the client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseItemInput {
    /// Existing product ID, or empty / a name for a new product.
    #[serde(default)]
    pub product: String,
    /// Product name as typed.
    pub name: String,
    /// Quantity bought.
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    /// Unit price paid.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// Request body for `POST /expenses` and `PUT /expenses`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseInput {
    /// Existing store ID or a store name.
    pub store: String,
    /// Line items.
    #[serde(default)]
    pub items: Vec<ExpenseItemInput>,
    /// Purchase date.
    #[serde(deserialize_with = "deserialize_calendar_date")]
    pub date: NaiveDate,
    /// Client-computed total.
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    /// Attachment paths already uploaded.
    #[serde(default)]
    pub attachments: Option<Vec<String>>,
    /// Optional thumbnail path.
    #[serde(default)]
    pub thumbnail_path: Option<String>,
}

/// Filter criteria for listing expenses.
#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    /// Case-insensitive substring over the store name or any item name.
    pub search: Option<String>,
    /// Earliest purchase date (inclusive).
    pub from: Option<NaiveDate>,
    /// Latest purchase date (inclusive).
    pub to: Option<NaiveDate>,
    /// Only expenses at this store.
    pub store_id: Option<StoreId>,
}

/// Store details joined into an expense view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreInfo {
    /// Store ID.
    pub id: StoreId,
    /// Formatted display name.
    pub name: String,
    /// Optional street address.
    pub address: Option<String>,
    /// Optional phone number.
    pub phone: Option<String>,
    /// Optional map link.
    pub maps_link: Option<String>,
}

/// Canonical product details joined into an item view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInfo {
    /// Product ID.
    pub id: ProductId,
    /// Formatted display name.
    pub name: String,
    /// Current canonical price.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// A line item prepared for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseItemView {
    /// Canonical product ID.
    pub product: ProductId,
    /// Display name: live product name if available, else the snapshot.
    pub name: String,
    /// Name as stored on the expense.
    pub snapshot_name: String,
    /// Quantity bought.
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    /// Unit price paid.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Live product, if it still exists.
    pub product_info: Option<ProductInfo>,
}

/// An expense joined with its store and products for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseView {
    /// Expense ID.
    pub id: ExpenseId,
    /// Store details.
    pub store_info: StoreInfo,
    /// Line items.
    pub items: Vec<ExpenseItemView>,
    /// Purchase date.
    pub date: NaiveDate,
    /// Submitted total.
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    /// Public paths of receipt photos.
    pub attachments: Vec<String>,
    /// Optional thumbnail path.
    pub thumbnail_path: Option<String>,
    /// When the expense was created.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_expense_input_accepts_numbers_and_defaults() {
        let json = serde_json::json!({
            "store": "Toko ABC",
            "items": [{"product": "", "name": "Minyak Goreng", "quantity": 2, "price": 15000.5}],
            "date": "2024-01-01T08:00:00.000Z",
            "total": 30001
        });
        let input: ExpenseInput = serde_json::from_value(json).unwrap();
        assert_eq!(input.items.len(), 1);
        assert_eq!(input.items[0].quantity, Decimal::from(2));
        assert_eq!(input.items[0].price, Decimal::new(150_005, 1));
        assert_eq!(input.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert!(input.attachments.is_none());
        assert!(input.thumbnail_path.is_none());
    }

    #[test]
    fn test_expense_serializes_store_reference() {
        let expense = Expense {
            id: ExpenseId::generate(),
            store_id: StoreId::generate(),
            items: vec![],
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            total: Decimal::from(30_000),
            attachments: vec![],
            thumbnail_path: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let value = serde_json::to_value(&expense).unwrap();
        assert_eq!(value["store"], serde_json::json!(expense.store_id));
        assert_eq!(value["total"], serde_json::json!(30000.0));
        assert!(value.get("thumbnailPath").is_some());
    }
}
