//! `PostgreSQL` expense storage.
//!
//! Line items are embedded as a JSONB array, mirroring how they are
//! presented: a snapshot of what was bought, linked back to live products.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use tracing::instrument;
use uuid::Uuid;

use tokoledger_core::{ExpenseId, StoreId};

use super::{ExpenseRepository, PgRepository, RepositoryError, contains_pattern};
use crate::models::{Expense, ExpenseDraft, ExpenseFilter, ExpenseItem};

const EXPENSE_COLUMNS: &str = "id, store_id, items, date, total, attachments, thumbnail_path, \
                               created_at, updated_at";

/// Internal row type for expense queries.
#[derive(Debug, sqlx::FromRow)]
struct ExpenseRow {
    id: Uuid,
    store_id: Uuid,
    items: Json<Vec<ExpenseItem>>,
    date: NaiveDate,
    total: Decimal,
    attachments: Vec<String>,
    thumbnail_path: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ExpenseRow> for Expense {
    fn from(row: ExpenseRow) -> Self {
        Self {
            id: ExpenseId::new(row.id),
            store_id: StoreId::new(row.store_id),
            items: row.items.0,
            date: row.date,
            total: row.total,
            attachments: row.attachments,
            thumbnail_path: row.thumbnail_path,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl ExpenseRepository for PgRepository {
    #[instrument(skip(self), fields(expense_id = %id))]
    async fn expense_by_id(&self, id: ExpenseId) -> Result<Option<Expense>, RepositoryError> {
        let row = sqlx::query_as::<_, ExpenseRow>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Into::into))
    }

    #[instrument(skip(self, draft), fields(store_id = %draft.store_id, items = draft.items.len()))]
    async fn insert_expense(&self, draft: ExpenseDraft) -> Result<Expense, RepositoryError> {
        let row = sqlx::query_as::<_, ExpenseRow>(&format!(
            r"
            INSERT INTO expenses (id, store_id, items, date, total, attachments, thumbnail_path)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {EXPENSE_COLUMNS}
            "
        ))
        .bind(ExpenseId::generate())
        .bind(draft.store_id)
        .bind(Json(&draft.items))
        .bind(draft.date)
        .bind(draft.total)
        .bind(&draft.attachments)
        .bind(&draft.thumbnail_path)
        .fetch_one(self.pool())
        .await?;
        Ok(row.into())
    }

    #[instrument(skip(self, draft), fields(expense_id = %id, store_id = %draft.store_id))]
    async fn replace_expense(
        &self,
        id: ExpenseId,
        draft: ExpenseDraft,
    ) -> Result<Option<Expense>, RepositoryError> {
        let row = sqlx::query_as::<_, ExpenseRow>(&format!(
            r"
            UPDATE expenses
            SET store_id = $2, items = $3, date = $4, total = $5,
                attachments = $6, thumbnail_path = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING {EXPENSE_COLUMNS}
            "
        ))
        .bind(id)
        .bind(draft.store_id)
        .bind(Json(&draft.items))
        .bind(draft.date)
        .bind(draft.total)
        .bind(&draft.attachments)
        .bind(&draft.thumbnail_path)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Into::into))
    }

    #[instrument(skip(self), fields(expense_id = %id))]
    async fn delete_expense(&self, id: ExpenseId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(expense_id = %id))]
    async fn pull_expense_attachment(
        &self,
        id: ExpenseId,
        path: &str,
    ) -> Result<Option<Expense>, RepositoryError> {
        let row = sqlx::query_as::<_, ExpenseRow>(&format!(
            r"
            UPDATE expenses
            SET attachments = array_remove(attachments, $2), updated_at = NOW()
            WHERE id = $1
            RETURNING {EXPENSE_COLUMNS}
            "
        ))
        .bind(id)
        .bind(path)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Into::into))
    }

    #[instrument(skip(self, filter))]
    async fn list_expenses(
        &self,
        filter: &ExpenseFilter,
    ) -> Result<Vec<Expense>, RepositoryError> {
        let rows = sqlx::query_as::<_, ExpenseRow>(
            r"
            SELECT e.id, e.store_id, e.items, e.date, e.total, e.attachments,
                   e.thumbnail_path, e.created_at, e.updated_at
            FROM expenses e
            LEFT JOIN stores s ON s.id = e.store_id
            WHERE ($1::text IS NULL
                   OR s.name ILIKE $1
                   OR EXISTS (
                       SELECT 1 FROM jsonb_array_elements(e.items) AS item
                       WHERE item->>'name' ILIKE $1
                   ))
              AND ($2::date IS NULL OR e.date >= $2)
              AND ($3::date IS NULL OR e.date <= $3)
              AND ($4::uuid IS NULL OR e.store_id = $4)
            ORDER BY e.date DESC, e.created_at DESC
            ",
        )
        .bind(filter.search.as_deref().map(contains_pattern))
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.store_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
