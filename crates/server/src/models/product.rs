//! Product domain models.
//!
//! Two product families exist:
//! - [`ExpenseProduct`] - something bought at a particular store, scoped by store
//! - [`CatalogProduct`] - something the business sells, referenced by orders

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tokoledger_core::{CatalogProductId, ProductId, StoreId};

/// A product purchased at a store.
///
/// `(store_id, name_lowercase)` is unique: the same product name may exist
/// independently under different stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseProduct {
    /// Unique product ID.
    pub id: ProductId,
    /// Store this product belongs to.
    pub store_id: StoreId,
    /// Display name.
    pub name: String,
    /// Normalized name, unique per store.
    pub name_lowercase: String,
    /// Last price paid.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Optional description.
    pub description: Option<String>,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Fields for inserting an expense product.
#[derive(Debug, Clone)]
pub struct NewExpenseProduct {
    /// Owning store.
    pub store_id: StoreId,
    /// Display name (already formatted).
    pub name: String,
    /// Normalized lookup key.
    pub name_lowercase: String,
    /// Initial price.
    pub price: Decimal,
}

/// A product in the sales catalog, referenced by order line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogProduct {
    /// Unique catalog product ID.
    pub id: CatalogProductId,
    /// Display name.
    pub name: String,
    /// Normalized name, unique across the catalog.
    pub name_lowercase: String,
    /// Free-form description (empty for lazily created entries).
    pub description: String,
    /// Optional list price.
    #[serde(with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    /// Gallery photo paths.
    pub photos: Vec<String>,
    /// Gallery video paths.
    pub videos: Vec<String>,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Fields for inserting a catalog product.
#[derive(Debug, Clone, Default)]
pub struct NewCatalogProduct {
    /// Display name (already formatted).
    pub name: String,
    /// Normalized lookup key.
    pub name_lowercase: String,
    /// Description.
    pub description: String,
    /// Optional list price.
    pub price: Option<Decimal>,
}
