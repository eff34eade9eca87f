//! Store domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tokoledger_core::StoreId;

/// A store that purchases are made at.
///
/// Created lazily the first time an expense names it. `name` holds the
/// formatted display form, `name_lowercase` the unique lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    /// Unique store ID.
    pub id: StoreId,
    /// Display name.
    pub name: String,
    /// Normalized name, unique across stores.
    pub name_lowercase: String,
    /// Optional street address.
    pub address: Option<String>,
    /// Optional phone number.
    pub phone: Option<String>,
    /// Optional map link.
    pub maps_link: Option<String>,
    /// When the store was created.
    pub created_at: DateTime<Utc>,
    /// When the store was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Fields for inserting a store.
#[derive(Debug, Clone, Default)]
pub struct NewStore {
    /// Display name (already formatted).
    pub name: String,
    /// Normalized lookup key.
    pub name_lowercase: String,
    /// Optional street address.
    pub address: Option<String>,
    /// Optional phone number.
    pub phone: Option<String>,
    /// Optional map link.
    pub maps_link: Option<String>,
}

/// Request body for `POST /stores`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStoreInput {
    /// Raw store name as typed.
    pub name: String,
    /// Optional street address.
    #[serde(default)]
    pub address: Option<String>,
    /// Optional phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// Optional map link.
    #[serde(default)]
    pub maps_link: Option<String>,
}
