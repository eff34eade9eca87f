//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::db::Repository;
use crate::services::{
    AbbreviationRegistry, AttachmentStore, EntityResolver, ExpenseService, OrderService,
    ViewService,
};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// repository, the abbreviation registry and the services built on them.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    repo: Arc<dyn Repository>,
    registry: AbbreviationRegistry,
    attachments: AttachmentStore,
    resolver: EntityResolver,
    expenses: ExpenseService,
    orders: OrderService,
    views: ViewService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    /// * `repo` - Storage backend (`PostgreSQL` or in-memory)
    #[must_use]
    pub fn new(config: ServerConfig, repo: Arc<dyn Repository>) -> Self {
        let registry = AbbreviationRegistry::new(repo.clone());
        let attachments = AttachmentStore::new(&config.uploads);
        let resolver = EntityResolver::new(repo.clone(), registry.clone());
        let expenses = ExpenseService::new(repo.clone(), resolver.clone(), attachments.clone());
        let orders = OrderService::new(repo.clone(), resolver.clone());
        let views = ViewService::new(repo.clone(), registry.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                repo,
                registry,
                attachments,
                resolver,
                expenses,
                orders,
                views,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the storage backend.
    #[must_use]
    pub fn repo(&self) -> &dyn Repository {
        self.inner.repo.as_ref()
    }

    /// Get a reference to the abbreviation registry.
    #[must_use]
    pub fn registry(&self) -> &AbbreviationRegistry {
        &self.inner.registry
    }

    /// Get a reference to the attachment file store.
    #[must_use]
    pub fn attachments(&self) -> &AttachmentStore {
        &self.inner.attachments
    }

    /// Get a reference to the entity resolver.
    #[must_use]
    pub fn resolver(&self) -> &EntityResolver {
        &self.inner.resolver
    }

    /// Get a reference to the expense service.
    #[must_use]
    pub fn expenses(&self) -> &ExpenseService {
        &self.inner.expenses
    }

    /// Get a reference to the order service.
    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }

    /// Get a reference to the read-side view service.
    #[must_use]
    pub fn views(&self) -> &ViewService {
        &self.inner.views
    }
}
