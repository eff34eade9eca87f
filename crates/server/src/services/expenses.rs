//! Expense transaction builder.
//!
//! Resolves the store and every line item's product, keeps each item's
//! submitted name verbatim as a snapshot, and persists the result. The
//! submitted total is stored as given.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use tokoledger_core::ExpenseId;

use super::ServiceError;
use super::attachments::{AttachmentStore, Removal};
use super::resolver::EntityResolver;
use crate::db::Repository;
use crate::models::{Expense, ExpenseDraft, ExpenseInput, ExpenseItem};

const EXPENSE_NOT_FOUND: &str = "Expense not found";

/// Creates, replaces and deletes expenses.
#[derive(Clone)]
pub struct ExpenseService {
    repo: Arc<dyn Repository>,
    resolver: EntityResolver,
    attachments: AttachmentStore,
}

impl ExpenseService {
    /// Create the service.
    #[must_use]
    pub fn new(
        repo: Arc<dyn Repository>,
        resolver: EntityResolver,
        attachments: AttachmentStore,
    ) -> Self {
        Self {
            repo,
            resolver,
            attachments,
        }
    }

    /// Record a new expense, creating its store and products as needed.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if a store or item name is blank,
    /// and `ServiceError::Repository` on storage failure.
    #[instrument(skip(self, input), fields(store = %input.store, items = input.items.len()))]
    pub async fn create(&self, input: ExpenseInput) -> Result<Expense, ServiceError> {
        let draft = self.build_draft(input).await?;
        let expense = self.repo.insert_expense(draft).await?;
        info!(expense_id = %expense.id, "Created expense");
        Ok(expense)
    }

    /// Fully replace an expense's store, items, date, total and attachments.
    ///
    /// Existence is checked before anything is resolved, so updating a
    /// missing expense creates no stores or products.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the expense does not exist, plus
    /// the errors of [`Self::create`].
    #[instrument(skip(self, input), fields(expense_id = %id))]
    pub async fn update(
        &self,
        id: ExpenseId,
        input: ExpenseInput,
    ) -> Result<Expense, ServiceError> {
        if self.repo.expense_by_id(id).await?.is_none() {
            return Err(ServiceError::NotFound(EXPENSE_NOT_FOUND.to_owned()));
        }
        let draft = self.build_draft(input).await?;
        let expense = self
            .repo
            .replace_expense(id, draft)
            .await?
            .ok_or_else(|| ServiceError::NotFound(EXPENSE_NOT_FOUND.to_owned()))?;
        info!("Updated expense");
        Ok(expense)
    }

    /// Delete an expense, then remove its attachment folder.
    ///
    /// Folder removal is best-effort: failures are logged and the delete
    /// still succeeds.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the expense does not exist.
    #[instrument(skip(self), fields(expense_id = %id))]
    pub async fn delete(&self, id: ExpenseId) -> Result<(), ServiceError> {
        if !self.repo.delete_expense(id).await? {
            return Err(ServiceError::NotFound(EXPENSE_NOT_FOUND.to_owned()));
        }
        if let Err(e) = self.attachments.remove_folder(&id.to_string()).await {
            warn!(error = %e, "Failed to remove attachment folder");
        }
        info!("Deleted expense");
        Ok(())
    }

    /// Delete one attachment file and drop its path from the expense.
    ///
    /// A file that is already gone is only logged.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Attachment` for a path outside expense uploads
    /// or a filesystem failure, and `ServiceError::NotFound` if the expense
    /// does not exist.
    #[instrument(skip(self), fields(expense_id = %id))]
    pub async fn remove_attachment(
        &self,
        id: ExpenseId,
        public_path: &str,
    ) -> Result<Expense, ServiceError> {
        if self.attachments.remove(public_path).await? == Removal::Missing {
            warn!(path = public_path, "Attachment missing on disk, updating expense anyway");
        }
        self.repo
            .pull_expense_attachment(id, public_path)
            .await?
            .ok_or_else(|| ServiceError::NotFound(EXPENSE_NOT_FOUND.to_owned()))
    }

    async fn build_draft(&self, input: ExpenseInput) -> Result<ExpenseDraft, ServiceError> {
        let store = self
            .resolver
            .resolve_store(&input.store, &input.store)
            .await?
            .into_inner();

        let mut items = Vec::with_capacity(input.items.len());
        for item in input.items {
            let label = if item.name.trim().is_empty() {
                item.product.as_str()
            } else {
                item.name.as_str()
            };
            let product = self
                .resolver
                .resolve_product(store.id, &item.product, label, item.price)
                .await?
                .into_inner();
            items.push(ExpenseItem {
                product: product.id,
                name: label.to_owned(),
                quantity: item.quantity,
                price: item.price,
            });
        }

        Ok(ExpenseDraft {
            store_id: store.id,
            items,
            date: input.date,
            total: input.total,
            attachments: input.attachments.unwrap_or_default(),
            thumbnail_path: input.thumbnail_path.filter(|p| !p.trim().is_empty()),
        })
    }
}
