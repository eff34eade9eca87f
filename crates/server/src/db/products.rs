//! `PostgreSQL` storage for store-scoped expense products.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::instrument;
use uuid::Uuid;

use tokoledger_core::{ProductId, StoreId};

use super::{PgRepository, ProductRepository, RepositoryError, conflict_or, contains_pattern};
use crate::models::{ExpenseProduct, NewExpenseProduct};

const PRODUCT_COLUMNS: &str =
    "id, store_id, name, name_lowercase, price, description, created_at, updated_at";

/// Internal row type for expense product queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    store_id: Uuid,
    name: String,
    name_lowercase: String,
    price: Decimal,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for ExpenseProduct {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            store_id: StoreId::new(row.store_id),
            name: row.name,
            name_lowercase: row.name_lowercase,
            price: row.price,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl ProductRepository for PgRepository {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn product_by_id(
        &self,
        id: ProductId,
    ) -> Result<Option<ExpenseProduct>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM expense_products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Into::into))
    }

    #[instrument(skip(self), fields(store_id = %store_id))]
    async fn product_by_name(
        &self,
        store_id: StoreId,
        name_lowercase: &str,
    ) -> Result<Option<ExpenseProduct>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM expense_products WHERE store_id = $1 AND name_lowercase = $2"
        ))
        .bind(store_id)
        .bind(name_lowercase)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Into::into))
    }

    #[instrument(skip(self, product), fields(store_id = %product.store_id, name = %product.name))]
    async fn insert_product(
        &self,
        product: NewExpenseProduct,
    ) -> Result<ExpenseProduct, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO expense_products (id, store_id, name, name_lowercase, price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(ProductId::generate())
        .bind(product.store_id)
        .bind(&product.name)
        .bind(&product.name_lowercase)
        .bind(product.price)
        .fetch_one(self.pool())
        .await
        .map_err(|e| conflict_or(e, "product"))?;
        Ok(row.into())
    }

    #[instrument(skip(self), fields(product_id = %id, price = %price))]
    async fn update_product_price(
        &self,
        id: ProductId,
        price: Decimal,
    ) -> Result<ExpenseProduct, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE expense_products SET price = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(price)
        .fetch_optional(self.pool())
        .await?;
        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    #[instrument(skip(self), fields(store_id = %store_id))]
    async fn search_products(
        &self,
        store_id: StoreId,
        fragment: &str,
        limit: i64,
    ) -> Result<Vec<ExpenseProduct>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS} FROM expense_products
            WHERE store_id = $1 AND name ILIKE $2
            ORDER BY name_lowercase
            LIMIT $3
            "
        ))
        .bind(store_id)
        .bind(contains_pattern(fragment))
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn products_by_ids(
        &self,
        ids: &[ProductId],
    ) -> Result<Vec<ExpenseProduct>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM expense_products WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
