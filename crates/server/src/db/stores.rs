//! `PostgreSQL` store storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::instrument;
use uuid::Uuid;

use tokoledger_core::StoreId;

use super::{PgRepository, RepositoryError, StoreRepository, conflict_or, contains_pattern};
use crate::models::{NewStore, Store};

const STORE_COLUMNS: &str =
    "id, name, name_lowercase, address, phone, maps_link, created_at, updated_at";

/// Internal row type for store queries.
#[derive(Debug, sqlx::FromRow)]
struct StoreRow {
    id: Uuid,
    name: String,
    name_lowercase: String,
    address: Option<String>,
    phone: Option<String>,
    maps_link: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<StoreRow> for Store {
    fn from(row: StoreRow) -> Self {
        Self {
            id: StoreId::new(row.id),
            name: row.name,
            name_lowercase: row.name_lowercase,
            address: row.address,
            phone: row.phone,
            maps_link: row.maps_link,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl StoreRepository for PgRepository {
    #[instrument(skip(self), fields(store_id = %id))]
    async fn store_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn store_by_name(&self, name_lowercase: &str) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE name_lowercase = $1"
        ))
        .bind(name_lowercase)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Into::into))
    }

    #[instrument(skip(self, store), fields(name = %store.name))]
    async fn insert_store(&self, store: NewStore) -> Result<Store, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            r"
            INSERT INTO stores (id, name, name_lowercase, address, phone, maps_link)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {STORE_COLUMNS}
            "
        ))
        .bind(StoreId::generate())
        .bind(&store.name)
        .bind(&store.name_lowercase)
        .bind(&store.address)
        .bind(&store.phone)
        .bind(&store.maps_link)
        .fetch_one(self.pool())
        .await
        .map_err(|e| conflict_or(e, "store"))?;
        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn search_stores(
        &self,
        fragment: &str,
        limit: i64,
    ) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(&format!(
            r"
            SELECT {STORE_COLUMNS} FROM stores
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
    async fn stores_by_ids(&self, ids: &[StoreId]) -> Result<Vec<Store>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
