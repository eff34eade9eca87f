//! Storage layer for tokoledger.
//!
//! # Tables
//!
//! - `abbreviations` - Known abbreviations, unique on exact `name`
//! - `stores` - Stores, unique on `name_lowercase`
//! - `expense_products` - Store-scoped products, unique on `(store_id, name_lowercase)`
//! - `catalog_products` - Sales catalog, unique on `name_lowercase`
//! - `customers` - Customers (not unique by name)
//! - `addresses` - Delivery addresses owned by customers
//! - `expenses` - Purchases, line items embedded as JSONB
//! - `orders` - Customer orders, line items embedded as JSONB
//!
//! # Implementations
//!
//! Services depend on the [`Repository`] trait object. [`PgRepository`] is
//! the production implementation; [`memory::MemoryRepository`] keeps
//! everything in process and honors the same unique keys.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p tokoledger-cli -- migrate
//! ```

mod abbreviations;
mod catalog;
mod customers;
mod expenses;
pub mod memory;
mod orders;
mod products;
mod stores;

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use tokoledger_core::{
    AddressId, CatalogProductId, CustomerId, ExpenseId, OrderId, ProductId, StoreId,
};

use crate::models::{
    Address, CatalogProduct, Customer, Expense, ExpenseDraft, ExpenseFilter, ExpenseProduct,
    NewAddress, NewCatalogProduct, NewCustomer, NewExpenseProduct, NewStore, Order, OrderDraft,
    OrderFilter, Store,
};

pub use memory::MemoryRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint violation (e.g., store name already taken).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique-index violation to [`RepositoryError::Conflict`].
fn conflict_or(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

/// Trim and replace every run of whitespace with a single space.
fn collapse_whitespace(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Build an `ILIKE` pattern matching `fragment` anywhere, with wildcards escaped.
fn contains_pattern(fragment: &str) -> String {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Abbreviation storage.
#[async_trait]
pub trait AbbreviationRepository: Send + Sync {
    /// All stored abbreviations in insertion order.
    async fn list_abbreviations(&self) -> Result<Vec<String>, RepositoryError>;

    /// Insert an abbreviation. Returns `false` when it already exists.
    async fn insert_abbreviation(&self, name: &str) -> Result<bool, RepositoryError>;
}

/// Store storage.
#[async_trait]
pub trait StoreRepository: Send + Sync {
    /// Get a store by ID.
    async fn store_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError>;

    /// Get a store by its normalized name.
    async fn store_by_name(&self, name_lowercase: &str) -> Result<Option<Store>, RepositoryError>;

    /// Insert a store. Fails with `Conflict` when the normalized name is taken.
    async fn insert_store(&self, store: NewStore) -> Result<Store, RepositoryError>;

    /// Stores whose name contains `fragment` (case-insensitive), sorted by name.
    async fn search_stores(&self, fragment: &str, limit: i64)
    -> Result<Vec<Store>, RepositoryError>;

    /// Stores with any of the given IDs.
    async fn stores_by_ids(&self, ids: &[StoreId]) -> Result<Vec<Store>, RepositoryError>;
}

/// Store-scoped expense product storage.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Get a product by ID.
    async fn product_by_id(&self, id: ProductId)
    -> Result<Option<ExpenseProduct>, RepositoryError>;

    /// Get a product by store and normalized name.
    async fn product_by_name(
        &self,
        store_id: StoreId,
        name_lowercase: &str,
    ) -> Result<Option<ExpenseProduct>, RepositoryError>;

    /// Insert a product. Fails with `Conflict` when the name is taken in that store.
    async fn insert_product(
        &self,
        product: NewExpenseProduct,
    ) -> Result<ExpenseProduct, RepositoryError>;

    /// Overwrite a product's canonical price.
    async fn update_product_price(
        &self,
        id: ProductId,
        price: Decimal,
    ) -> Result<ExpenseProduct, RepositoryError>;

    /// Products in a store whose name contains `fragment` (case-insensitive).
    async fn search_products(
        &self,
        store_id: StoreId,
        fragment: &str,
        limit: i64,
    ) -> Result<Vec<ExpenseProduct>, RepositoryError>;

    /// Products with any of the given IDs.
    async fn products_by_ids(
        &self,
        ids: &[ProductId],
    ) -> Result<Vec<ExpenseProduct>, RepositoryError>;
}

/// Sales catalog storage.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Get a catalog product by ID.
    async fn catalog_product_by_id(
        &self,
        id: CatalogProductId,
    ) -> Result<Option<CatalogProduct>, RepositoryError>;

    /// Get a catalog product by normalized name.
    async fn catalog_product_by_name(
        &self,
        name_lowercase: &str,
    ) -> Result<Option<CatalogProduct>, RepositoryError>;

    /// Insert a catalog product. Fails with `Conflict` when the name is taken.
    async fn insert_catalog_product(
        &self,
        product: NewCatalogProduct,
    ) -> Result<CatalogProduct, RepositoryError>;

    /// Catalog products whose name contains `fragment` (case-insensitive).
    async fn search_catalog_products(
        &self,
        fragment: &str,
        limit: i64,
    ) -> Result<Vec<CatalogProduct>, RepositoryError>;

    /// Catalog products with any of the given IDs.
    async fn catalog_products_by_ids(
        &self,
        ids: &[CatalogProductId],
    ) -> Result<Vec<CatalogProduct>, RepositoryError>;
}

/// Customer storage.
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Get a customer by ID.
    async fn customer_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError>;

    /// Oldest customer whose name matches `name_lowercase`, ignoring case and
    /// treating any run of whitespace as a single space.
    async fn customer_by_name(
        &self,
        name_lowercase: &str,
    ) -> Result<Option<Customer>, RepositoryError>;

    /// Insert a customer.
    async fn insert_customer(&self, customer: NewCustomer) -> Result<Customer, RepositoryError>;

    /// Customers sorted by name, optionally filtered by a name substring.
    async fn list_customers(
        &self,
        fragment: Option<&str>,
    ) -> Result<Vec<Customer>, RepositoryError>;

    /// Customers with any of the given IDs.
    async fn customers_by_ids(&self, ids: &[CustomerId])
    -> Result<Vec<Customer>, RepositoryError>;
}

/// Delivery address storage.
#[async_trait]
pub trait AddressRepository: Send + Sync {
    /// Get an address by ID.
    async fn address_by_id(&self, id: AddressId) -> Result<Option<Address>, RepositoryError>;

    /// Insert an address.
    async fn insert_address(&self, address: NewAddress) -> Result<Address, RepositoryError>;

    /// Addresses belonging to a customer, oldest first.
    async fn addresses_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Address>, RepositoryError>;

    /// Addresses with any of the given IDs.
    async fn addresses_by_ids(&self, ids: &[AddressId]) -> Result<Vec<Address>, RepositoryError>;
}

/// Expense storage.
#[async_trait]
pub trait ExpenseRepository: Send + Sync {
    /// Get an expense by ID.
    async fn expense_by_id(&self, id: ExpenseId) -> Result<Option<Expense>, RepositoryError>;

    /// Insert an expense.
    async fn insert_expense(&self, draft: ExpenseDraft) -> Result<Expense, RepositoryError>;

    /// Replace every resolvable field of an expense. `None` if it is gone.
    async fn replace_expense(
        &self,
        id: ExpenseId,
        draft: ExpenseDraft,
    ) -> Result<Option<Expense>, RepositoryError>;

    /// Delete an expense. Returns `false` if it did not exist.
    async fn delete_expense(&self, id: ExpenseId) -> Result<bool, RepositoryError>;

    /// Remove one attachment path from an expense. `None` if the expense is gone.
    async fn pull_expense_attachment(
        &self,
        id: ExpenseId,
        path: &str,
    ) -> Result<Option<Expense>, RepositoryError>;

    /// Expenses matching the filter, newest purchase date first, then newest created.
    async fn list_expenses(&self, filter: &ExpenseFilter)
    -> Result<Vec<Expense>, RepositoryError>;
}

/// Order storage.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Get an order by ID.
    async fn order_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// Insert an order.
    async fn insert_order(&self, draft: OrderDraft) -> Result<Order, RepositoryError>;

    /// Orders matching the filter, newest order date first, then newest created.
    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError>;
}

/// Everything the services need from storage.
#[async_trait]
pub trait Repository:
    AbbreviationRepository
    + StoreRepository
    + ProductRepository
    + CatalogRepository
    + CustomerRepository
    + AddressRepository
    + ExpenseRepository
    + OrderRepository
{
    /// Check that storage is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// `PostgreSQL` implementation of [`Repository`].
#[derive(Debug, Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("abc"), "%abc%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern(""), "%%");
    }

    #[test]
    fn test_money_columns_keep_submitted_scale() {
        let schema = include_str!("../../migrations/20240101000000_initial_schema.sql");
        assert!(schema.contains("total NUMERIC NOT NULL"));
        assert!(!schema.contains("NUMERIC("));
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  budi \t santoso "), "budi santoso");
        assert_eq!(collapse_whitespace("   "), "");
    }
}
