//! Order domain models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tokoledger_core::{
    AddressId, CatalogProductId, CustomerId, OrderId, deserialize_calendar_date,
    deserialize_optional_calendar_date,
};

use super::customer::{Address, Customer};

/// A line item embedded in an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Catalog product ordered.
    pub product: CatalogProductId,
    /// Product name as submitted.
    pub name: String,
    /// Quantity ordered (at least 1).
    pub qty: i32,
    /// Optional color choice.
    pub color: Option<String>,
    /// Optional free-form note.
    pub note: Option<String>,
    /// Discount applied to the line.
    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,
    /// Files attached to this line.
    pub files: Vec<String>,
}

/// A customer order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// Ordering customer.
    pub customer_id: CustomerId,
    /// Delivery address.
    pub address_id: AddressId,
    /// Date the order was placed.
    pub order_date: NaiveDate,
    /// Delivery deadline.
    pub deadline: NaiveDate,
    /// Line items.
    pub order_items: Vec<OrderItem>,
    /// When the order was created.
    pub created_at: DateTime<Utc>,
    /// When the order was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Resolved fields written when an order is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    /// Resolved customer.
    pub customer_id: CustomerId,
    /// Pre-existing address.
    pub address_id: AddressId,
    /// Order date.
    pub order_date: NaiveDate,
    /// Delivery deadline.
    pub deadline: NaiveDate,
    /// Resolved line items.
    pub order_items: Vec<OrderItem>,
}

/// A line item as submitted by the client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    /// Existing catalog product ID, or empty / a name for a new product.
    #[serde(default)]
    pub product: String,
    /// Product name as typed.
    pub name: String,
    /// Quantity ordered.
    pub qty: i32,
    /// Optional color choice.
    #[serde(default)]
    pub color: Option<String>,
    /// Optional note.
    #[serde(default)]
    pub note: Option<String>,
    /// Optional discount.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub discount: Option<Decimal>,
}

/// Request body for `POST /orders`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInput {
    /// Existing customer ID or a customer name.
    #[serde(default)]
    pub customer: String,
    /// Pre-existing delivery address.
    pub address_id: Option<AddressId>,
    /// Order date (defaults to today).
    #[serde(default, deserialize_with = "deserialize_optional_calendar_date")]
    pub order_date: Option<NaiveDate>,
    /// Delivery deadline.
    #[serde(deserialize_with = "deserialize_calendar_date")]
    pub deadline: NaiveDate,
    /// Line items.
    #[serde(default)]
    pub order_items: Vec<OrderItemInput>,
}

/// Filter criteria for listing orders.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    /// Case-insensitive substring over the customer name or any item name.
    pub search: Option<String>,
    /// Only orders for this customer.
    pub customer_id: Option<CustomerId>,
}

/// A line item prepared for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
    /// Catalog product ID.
    pub product: CatalogProductId,
    /// Display name: live catalog name if available, else the snapshot.
    pub name: String,
    /// Name as stored on the order.
    pub snapshot_name: String,
    /// Quantity ordered.
    pub qty: i32,
    /// Optional color choice.
    pub color: Option<String>,
    /// Optional note.
    pub note: Option<String>,
    /// Discount applied to the line.
    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,
    /// Files attached to this line.
    pub files: Vec<String>,
}

/// An order joined with its customer, address and products for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    /// Order ID.
    pub id: OrderId,
    /// Customer with formatted name (absent if the customer was removed).
    pub customer: Option<Customer>,
    /// Delivery address (absent if the address was removed).
    pub address: Option<Address>,
    /// Order date.
    pub order_date: NaiveDate,
    /// Delivery deadline.
    pub deadline: NaiveDate,
    /// Line items.
    pub order_items: Vec<OrderItemView>,
    /// When the order was created.
    pub created_at: DateTime<Utc>,
}
