//! `PostgreSQL` storage for the sales catalog.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::instrument;
use uuid::Uuid;

use tokoledger_core::CatalogProductId;

use super::{CatalogRepository, PgRepository, RepositoryError, conflict_or, contains_pattern};
use crate::models::{CatalogProduct, NewCatalogProduct};

const CATALOG_COLUMNS: &str =
    "id, name, name_lowercase, description, price, photos, videos, created_at, updated_at";

/// Internal row type for catalog product queries.
#[derive(Debug, sqlx::FromRow)]
struct CatalogProductRow {
    id: Uuid,
    name: String,
    name_lowercase: String,
    description: String,
    price: Option<Decimal>,
    photos: Vec<String>,
    videos: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CatalogProductRow> for CatalogProduct {
    fn from(row: CatalogProductRow) -> Self {
        Self {
            id: CatalogProductId::new(row.id),
            name: row.name,
            name_lowercase: row.name_lowercase,
            description: row.description,
            price: row.price,
            photos: row.photos,
            videos: row.videos,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl CatalogRepository for PgRepository {
    #[instrument(skip(self), fields(catalog_product_id = %id))]
    async fn catalog_product_by_id(
        &self,
        id: CatalogProductId,
    ) -> Result<Option<CatalogProduct>, RepositoryError> {
        let row = sqlx::query_as::<_, CatalogProductRow>(&format!(
            "SELECT {CATALOG_COLUMNS} FROM catalog_products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn catalog_product_by_name(
        &self,
        name_lowercase: &str,
    ) -> Result<Option<CatalogProduct>, RepositoryError> {
        let row = sqlx::query_as::<_, CatalogProductRow>(&format!(
            "SELECT {CATALOG_COLUMNS} FROM catalog_products WHERE name_lowercase = $1"
        ))
        .bind(name_lowercase)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Into::into))
    }

    #[instrument(skip(self, product), fields(name = %product.name))]
    async fn insert_catalog_product(
        &self,
        product: NewCatalogProduct,
    ) -> Result<CatalogProduct, RepositoryError> {
        let row = sqlx::query_as::<_, CatalogProductRow>(&format!(
            r"
            INSERT INTO catalog_products (id, name, name_lowercase, description, price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {CATALOG_COLUMNS}
            "
        ))
        .bind(CatalogProductId::generate())
        .bind(&product.name)
        .bind(&product.name_lowercase)
        .bind(&product.description)
        .bind(product.price)
        .fetch_one(self.pool())
        .await
        .map_err(|e| conflict_or(e, "catalog product"))?;
        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn search_catalog_products(
        &self,
        fragment: &str,
        limit: i64,
    ) -> Result<Vec<CatalogProduct>, RepositoryError> {
        let rows = sqlx::query_as::<_, CatalogProductRow>(&format!(
            r"
            SELECT {CATALOG_COLUMNS} FROM catalog_products
            WHERE name ILIKE $1
            ORDER BY name_lowercase
            LIMIT $2
            "
        ))
        .bind(contains_pattern(fragment))
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn catalog_products_by_ids(
        &self,
        ids: &[CatalogProductId],
    ) -> Result<Vec<CatalogProduct>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, CatalogProductRow>(&format!(
            "SELECT {CATALOG_COLUMNS} FROM catalog_products WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
