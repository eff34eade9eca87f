//! Business logic services.
//!
//! # Services
//!
//! - `abbreviations` - Cached abbreviation registry with learn-on-write
//! - `attachments` - Receipt photo storage on the local filesystem
//! - `expenses` - Expense create, replace, delete and attachment removal
//! - `orders` - Order creation
//! - `resolver` - Find-or-create for stores, products, customers and catalog products
//! - `views` - Joined, display-formatted read models

pub mod abbreviations;
pub mod attachments;
pub mod expenses;
pub mod orders;
pub mod resolver;
pub mod views;

use std::sync::Arc;

use thiserror::Error;

use crate::db::RepositoryError;

pub use abbreviations::AbbreviationRegistry;
pub use attachments::{AttachmentError, AttachmentStore, Removal, UploadedFile};
pub use expenses::ExpenseService;
pub use orders::OrderService;
pub use resolver::{EntityResolver, Lookup, Resolution, find_existing, find_or_create};
pub use views::ViewService;

/// Errors raised by the services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// A referenced record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Storage failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The abbreviation set could not be loaded.
    #[error("abbreviations unavailable: {0}")]
    Abbreviations(Arc<RepositoryError>),

    /// Attachment storage failed or rejected the request.
    #[error(transparent)]
    Attachment(#[from] AttachmentError),
}
