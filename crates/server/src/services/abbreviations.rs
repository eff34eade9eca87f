//! Abbreviation registry.
//!
//! The set of known abbreviations is loaded once per process and cached.
//! Registrations made after the first load are persisted immediately but
//! only become visible to [`AbbreviationRegistry::get_all`] after
//! [`AbbreviationRegistry::refresh`] or a restart.

use std::sync::Arc;

use moka::future::Cache;
use tracing::{debug, info, instrument, warn};

use tokoledger_core::{Abbreviations, abbreviation_candidates};

use super::ServiceError;
use crate::db::{Repository, RepositoryError};

/// Process-wide read-through cache over stored abbreviations.
#[derive(Clone)]
pub struct AbbreviationRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    repo: Arc<dyn Repository>,
    cache: Cache<(), Arc<Abbreviations>>,
}

impl AbbreviationRegistry {
    /// Create a registry over `repo`. Nothing is loaded until first use.
    #[must_use]
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                repo,
                cache: Cache::builder().max_capacity(1).build(),
            }),
        }
    }

    /// The cached abbreviation set, loading it on first call.
    ///
    /// Concurrent first calls share a single load.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Abbreviations` if the initial load fails.
    pub async fn get_all(&self) -> Result<Arc<Abbreviations>, ServiceError> {
        let repo = Arc::clone(&self.inner.repo);
        self.inner
            .cache
            .try_get_with((), async move {
                let names = repo.list_abbreviations().await?;
                debug!(count = names.len(), "Loaded abbreviations");
                Ok::<_, RepositoryError>(Arc::new(names.into_iter().collect()))
            })
            .await
            .map_err(ServiceError::Abbreviations)
    }

    /// Reload the set from storage and replace the cached copy.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if loading fails; the previous
    /// cached set is kept in that case.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Arc<Abbreviations>, ServiceError> {
        let names = self.inner.repo.list_abbreviations().await?;
        let set: Arc<Abbreviations> = Arc::new(names.into_iter().collect());
        self.inner.cache.insert((), Arc::clone(&set)).await;
        info!(count = set.len(), "Refreshed abbreviations");
        Ok(set)
    }

    /// Persist `candidate` as-is. Returns whether it was newly created;
    /// duplicates are not an error.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if storage fails.
    pub async fn register(&self, candidate: &str) -> Result<bool, ServiceError> {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            return Ok(false);
        }
        let created = self.inner.repo.insert_abbreviation(candidate).await?;
        if created {
            info!(abbreviation = candidate, "Registered abbreviation");
        }
        Ok(created)
    }

    /// Register an abbreviation typed by a user: upper-cased, must not be blank.
    ///
    /// Returns the stored form and whether it was newly created.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for a blank name and
    /// `ServiceError::Repository` if storage fails.
    pub async fn add(&self, raw: &str) -> Result<(String, bool), ServiceError> {
        let name = raw.trim().to_uppercase();
        if name.is_empty() {
            return Err(ServiceError::Validation("Abbreviation name is required".to_owned()));
        }
        let created = self.register(&name).await?;
        Ok((name, created))
    }

    /// Register every 2-5 letter all-caps token of a store name.
    ///
    /// Failures are logged and swallowed so saving the store never fails
    /// because of this.
    #[instrument(skip(self))]
    pub async fn learn_from_store_name(&self, name: &str) {
        for candidate in abbreviation_candidates(name) {
            if let Err(e) = self.register(&candidate).await {
                warn!(abbreviation = %candidate, error = %e, "Failed to register abbreviation");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::{AbbreviationRepository, MemoryRepository};

    fn registry() -> (Arc<MemoryRepository>, AbbreviationRegistry) {
        let repo = Arc::new(MemoryRepository::new());
        let registry = AbbreviationRegistry::new(repo.clone());
        (repo, registry)
    }

    #[tokio::test]
    async fn test_register_is_idempotent() {
        let (repo, registry) = registry();
        assert!(registry.register("TKI").await.unwrap());
        assert!(!registry.register("TKI").await.unwrap());
        assert_eq!(repo.list_abbreviations().await.unwrap(), vec!["TKI"]);
    }

    #[tokio::test]
    async fn test_cache_is_stale_until_refresh() {
        let (_repo, registry) = registry();
        registry.register("TKI").await.unwrap();
        assert!(registry.get_all().await.unwrap().contains("tki"));

        registry.register("BDG").await.unwrap();
        assert!(!registry.get_all().await.unwrap().contains("BDG"));

        let refreshed = registry.refresh().await.unwrap();
        assert!(refreshed.contains("BDG"));
        assert!(registry.get_all().await.unwrap().contains("BDG"));
    }

    #[tokio::test]
    async fn test_learn_from_store_name_registers_caps_tokens() {
        let (repo, registry) = registry();
        registry.learn_from_store_name("Toko ABC Cabang BDG PT").await;
        registry.learn_from_store_name("Toko ABC Jaya").await;
        assert_eq!(
            repo.list_abbreviations().await.unwrap(),
            vec!["ABC", "BDG", "PT"]
        );
    }

    #[tokio::test]
    async fn test_add_upper_cases_and_rejects_blank() {
        let (_repo, registry) = registry();
        assert_eq!(registry.add(" cv ").await.unwrap(), ("CV".to_owned(), true));
        assert_eq!(registry.add("CV").await.unwrap(), ("CV".to_owned(), false));
        assert!(matches!(
            registry.add("  ").await.unwrap_err(),
            ServiceError::Validation(_)
        ));
    }
}
