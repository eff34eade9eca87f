//! `PostgreSQL` order storage.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use tracing::instrument;
use uuid::Uuid;

use tokoledger_core::{AddressId, CustomerId, OrderId};

use super::{OrderRepository, PgRepository, RepositoryError, contains_pattern};
use crate::models::{Order, OrderDraft, OrderFilter, OrderItem};

const ORDER_COLUMNS: &str =
    "id, customer_id, address_id, order_date, deadline, order_items, created_at, updated_at";

/// Internal row type for order queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    customer_id: Uuid,
    address_id: Uuid,
    order_date: NaiveDate,
    deadline: NaiveDate,
    order_items: Json<Vec<OrderItem>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: OrderId::new(row.id),
            customer_id: CustomerId::new(row.customer_id),
            address_id: AddressId::new(row.address_id),
            order_date: row.order_date,
            deadline: row.deadline,
            order_items: row.order_items.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl OrderRepository for PgRepository {
    #[instrument(skip(self), fields(order_id = %id))]
    async fn order_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Into::into))
    }

    #[instrument(skip(self, draft), fields(customer_id = %draft.customer_id, items = draft.order_items.len()))]
    async fn insert_order(&self, draft: OrderDraft) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO orders (id, customer_id, address_id, order_date, deadline, order_items)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(OrderId::generate())
        .bind(draft.customer_id)
        .bind(draft.address_id)
        .bind(draft.order_date)
        .bind(draft.deadline)
        .bind(Json(&draft.order_items))
        .fetch_one(self.pool())
        .await?;
        Ok(row.into())
    }

    #[instrument(skip(self, filter))]
    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT o.id, o.customer_id, o.address_id, o.order_date, o.deadline,
                   o.order_items, o.created_at, o.updated_at
            FROM orders o
            LEFT JOIN customers c ON c.id = o.customer_id
            WHERE ($1::text IS NULL
                   OR c.name ILIKE $1
                   OR EXISTS (
                       SELECT 1 FROM jsonb_array_elements(o.order_items) AS item
                       WHERE item->>'name' ILIKE $1
                   ))
              AND ($2::uuid IS NULL OR o.customer_id = $2)
            ORDER BY o.order_date DESC, o.created_at DESC
            ",
        )
        .bind(filter.search.as_deref().map(contains_pattern))
        .bind(filter.customer_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
