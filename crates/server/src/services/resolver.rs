//! Entity resolution: map a free-text-or-ID reference to a stored record,
//! creating it when nothing matches.
//!
//! Resolution order, each step short-circuiting:
//! 1. the reference parses as an ID and names a record in scope
//! 2. a record in scope has the same normalized name
//! 3. a new record is created with the formatted display name
//!
//! Two requests racing to create the same name both pass step 2; the unique
//! index rejects the loser, which then repeats step 2 and finds the winner.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use tokoledger_core::{
    Abbreviations, CatalogProductId, CustomerId, ProductId, StoreId, format_display_name,
    normalize_name,
};

use super::ServiceError;
use super::abbreviations::AbbreviationRegistry;
use crate::db::{Repository, RepositoryError};
use crate::models::{
    CatalogProduct, CreateStoreInput, Customer, ExpenseProduct, NewCatalogProduct, NewCustomer, NewExpenseProduct,
    NewStore, Store,
};

/// Outcome of a find-or-create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
    /// An existing record matched.
    Existing(T),
    /// A new record was created.
    Created(T),
}

impl<T> Resolution<T> {
    /// The resolved record.
    pub fn into_inner(self) -> T {
        match self {
            Self::Existing(v) | Self::Created(v) => v,
        }
    }

    /// Borrow the resolved record.
    pub const fn get(&self) -> &T {
        match self {
            Self::Existing(v) | Self::Created(v) => v,
        }
    }

    /// Whether a new record was created.
    pub const fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolution<U> {
        match self {
            Self::Existing(v) => Resolution::Existing(f(v)),
            Self::Created(v) => Resolution::Created(f(v)),
        }
    }
}

/// Storage access for one kind of resolvable entity, already scoped.
#[async_trait]
pub trait Lookup: Send + Sync {
    /// Entity produced by the lookup.
    type Entity: Send;

    /// Find by ID. Records outside the lookup's scope must not be returned.
    async fn by_id(&self, id: Uuid) -> Result<Option<Self::Entity>, RepositoryError>;

    /// Find by normalized name.
    async fn by_name(&self, key: &str) -> Result<Option<Self::Entity>, RepositoryError>;

    /// Create with a formatted display name and normalized key.
    async fn create(&self, name: String, key: String) -> Result<Self::Entity, RepositoryError>;
}

/// The lookup half of [`find_or_create`]: match by ID, then by normalized
/// name. Never writes.
///
/// # Errors
///
/// Returns `ServiceError::Validation` when nothing matches by ID and `label`
/// is blank, and `ServiceError::Repository` on storage failure.
pub async fn find_existing<L: Lookup>(
    lookup: &L,
    input_ref: &str,
    label: &str,
) -> Result<Option<L::Entity>, ServiceError> {
    if let Ok(id) = Uuid::parse_str(input_ref.trim())
        && let Some(found) = lookup.by_id(id).await?
    {
        return Ok(Some(found));
    }

    let key = normalize_name(label);
    if key.is_empty() {
        return Err(ServiceError::Validation("Name is required".to_owned()));
    }

    Ok(lookup.by_name(&key).await?)
}

/// Run the find-or-create algorithm over `lookup`.
///
/// # Errors
///
/// Returns `ServiceError::Validation` when nothing matches by ID and `label`
/// is blank, and `ServiceError::Repository` on storage failure (including a
/// create conflict whose winner cannot be found).
pub async fn find_or_create<L: Lookup>(
    lookup: &L,
    input_ref: &str,
    label: &str,
    abbreviations: &Abbreviations,
) -> Result<Resolution<L::Entity>, ServiceError> {
    if let Some(found) = find_existing(lookup, input_ref, label).await? {
        return Ok(Resolution::Existing(found));
    }

    let key = normalize_name(label);
    match lookup
        .create(format_display_name(label, abbreviations), key.clone())
        .await
    {
        Ok(created) => Ok(Resolution::Created(created)),
        Err(RepositoryError::Conflict(reason)) => {
            debug!(key = %key, "Create lost a race, retrying lookup");
            lookup
                .by_name(&key)
                .await?
                .map(Resolution::Existing)
                .ok_or_else(|| {
                    ServiceError::Repository(RepositoryError::DataCorruption(format!(
                        "'{key}' conflicted on create but is not stored: {reason}"
                    )))
                })
        }
        Err(e) => Err(e.into()),
    }
}

struct StoreLookup<'a> {
    repo: &'a dyn Repository,
    address: Option<String>,
    phone: Option<String>,
    maps_link: Option<String>,
}

#[async_trait]
impl Lookup for StoreLookup<'_> {
    type Entity = Store;

    async fn by_id(&self, id: Uuid) -> Result<Option<Store>, RepositoryError> {
        self.repo.store_by_id(StoreId::new(id)).await
    }

    async fn by_name(&self, key: &str) -> Result<Option<Store>, RepositoryError> {
        self.repo.store_by_name(key).await
    }

    async fn create(&self, name: String, key: String) -> Result<Store, RepositoryError> {
        self.repo
            .insert_store(NewStore {
                name,
                name_lowercase: key,
                address: self.address.clone(),
                phone: self.phone.clone(),
                maps_link: self.maps_link.clone(),
            })
            .await
    }
}

struct ProductLookup<'a> {
    repo: &'a dyn Repository,
    store_id: StoreId,
    price: Decimal,
}

#[async_trait]
impl Lookup for ProductLookup<'_> {
    type Entity = ExpenseProduct;

    async fn by_id(&self, id: Uuid) -> Result<Option<ExpenseProduct>, RepositoryError> {
        Ok(self
            .repo
            .product_by_id(ProductId::new(id))
            .await?
            .filter(|p| p.store_id == self.store_id))
    }

    async fn by_name(&self, key: &str) -> Result<Option<ExpenseProduct>, RepositoryError> {
        self.repo.product_by_name(self.store_id, key).await
    }

    async fn create(&self, name: String, key: String) -> Result<ExpenseProduct, RepositoryError> {
        self.repo
            .insert_product(NewExpenseProduct {
                store_id: self.store_id,
                name,
                name_lowercase: key,
                price: self.price,
            })
            .await
    }
}

struct CustomerLookup<'a> {
    repo: &'a dyn Repository,
}

#[async_trait]
impl Lookup for CustomerLookup<'_> {
    type Entity = Customer;

    async fn by_id(&self, id: Uuid) -> Result<Option<Customer>, RepositoryError> {
        self.repo.customer_by_id(CustomerId::new(id)).await
    }

    async fn by_name(&self, key: &str) -> Result<Option<Customer>, RepositoryError> {
        self.repo.customer_by_name(key).await
    }

    async fn create(&self, name: String, _key: String) -> Result<Customer, RepositoryError> {
        self.repo
            .insert_customer(NewCustomer {
                name,
                phone: String::new(),
            })
            .await
    }
}

struct CatalogLookup<'a> {
    repo: &'a dyn Repository,
}

#[async_trait]
impl Lookup for CatalogLookup<'_> {
    type Entity = CatalogProduct;

    async fn by_id(&self, id: Uuid) -> Result<Option<CatalogProduct>, RepositoryError> {
        self.repo
            .catalog_product_by_id(CatalogProductId::new(id))
            .await
    }

    async fn by_name(&self, key: &str) -> Result<Option<CatalogProduct>, RepositoryError> {
        self.repo.catalog_product_by_name(key).await
    }

    async fn create(&self, name: String, key: String) -> Result<CatalogProduct, RepositoryError> {
        self.repo
            .insert_catalog_product(NewCatalogProduct {
                name,
                name_lowercase: key,
                ..NewCatalogProduct::default()
            })
            .await
    }
}

/// Resolves stores, products, customers and catalog products.
#[derive(Clone)]
pub struct EntityResolver {
    repo: Arc<dyn Repository>,
    registry: AbbreviationRegistry,
}

impl EntityResolver {
    /// Create a resolver.
    #[must_use]
    pub fn new(repo: Arc<dyn Repository>, registry: AbbreviationRegistry) -> Self {
        Self { repo, registry }
    }

    /// Resolve a store. A newly created store teaches the registry its
    /// all-caps tokens.
    ///
    /// # Errors
    ///
    /// See [`find_or_create`].
    #[instrument(skip(self))]
    pub async fn resolve_store(
        &self,
        input_ref: &str,
        label: &str,
    ) -> Result<Resolution<Store>, ServiceError> {
        let lookup = StoreLookup {
            repo: self.repo.as_ref(),
            address: None,
            phone: None,
            maps_link: None,
        };
        self.resolve_store_with(lookup, input_ref, label).await
    }

    /// Resolve a store by name, recording contact details if it is created.
    /// Details are not applied to an existing store.
    ///
    /// # Errors
    ///
    /// See [`find_or_create`].
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn register_store(
        &self,
        input: CreateStoreInput,
    ) -> Result<Resolution<Store>, ServiceError> {
        let blank_to_none = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        let lookup = StoreLookup {
            repo: self.repo.as_ref(),
            address: blank_to_none(input.address),
            phone: blank_to_none(input.phone),
            maps_link: blank_to_none(input.maps_link),
        };
        self.resolve_store_with(lookup, &input.name, &input.name)
            .await
    }

    async fn resolve_store_with(
        &self,
        lookup: StoreLookup<'_>,
        input_ref: &str,
        label: &str,
    ) -> Result<Resolution<Store>, ServiceError> {
        let abbreviations = self.registry.get_all().await?;
        let resolution = find_or_create(&lookup, input_ref, label, &abbreviations).await?;
        if let Resolution::Created(store) = &resolution {
            info!(store_id = %store.id, name = %store.name, "Created store");
            self.registry.learn_from_store_name(label).await;
        }
        Ok(resolution)
    }

    /// Resolve a product within `store_id`.
    ///
    /// An ID belonging to another store is ignored. When an existing product
    /// is matched with a different `price`, its stored price is overwritten.
    ///
    /// # Errors
    ///
    /// See [`find_or_create`].
    #[instrument(skip(self), fields(store_id = %store_id, price = %price))]
    pub async fn resolve_product(
        &self,
        store_id: StoreId,
        input_ref: &str,
        label: &str,
        price: Decimal,
    ) -> Result<Resolution<ExpenseProduct>, ServiceError> {
        let abbreviations = self.registry.get_all().await?;
        let lookup = ProductLookup {
            repo: self.repo.as_ref(),
            store_id,
            price,
        };
        match find_or_create(&lookup, input_ref, label, &abbreviations).await? {
            Resolution::Existing(product) if product.price != price => {
                debug!(product_id = %product.id, old = %product.price, "Updating product price");
                let updated = self.repo.update_product_price(product.id, price).await?;
                Ok(Resolution::Existing(updated))
            }
            Resolution::Created(product) => {
                info!(product_id = %product.id, name = %product.name, "Created product");
                Ok(Resolution::Created(product))
            }
            existing => Ok(existing),
        }
    }

    /// Resolve a customer by ID or case-insensitive exact name.
    ///
    /// # Errors
    ///
    /// See [`find_or_create`].
    #[instrument(skip(self))]
    pub async fn resolve_customer(
        &self,
        input_ref: &str,
        label: &str,
    ) -> Result<Resolution<Customer>, ServiceError> {
        let abbreviations = self.registry.get_all().await?;
        let lookup = CustomerLookup {
            repo: self.repo.as_ref(),
        };
        let resolution = find_or_create(&lookup, input_ref, label, &abbreviations).await?;
        if let Resolution::Created(customer) = &resolution {
            info!(customer_id = %customer.id, name = %customer.name, "Created customer");
        }
        Ok(resolution)
    }

    /// Find a customer by ID or case-insensitive name without creating one.
    ///
    /// # Errors
    ///
    /// See [`find_existing`].
    #[instrument(skip(self))]
    pub async fn find_customer(
        &self,
        input_ref: &str,
        label: &str,
    ) -> Result<Option<Customer>, ServiceError> {
        let lookup = CustomerLookup {
            repo: self.repo.as_ref(),
        };
        find_existing(&lookup, input_ref, label).await
    }

    /// Resolve a catalog product for an order line.
    ///
    /// # Errors
    ///
    /// See [`find_or_create`].
    #[instrument(skip(self))]
    pub async fn resolve_catalog_product(
        &self,
        input_ref: &str,
        label: &str,
    ) -> Result<Resolution<CatalogProductId>, ServiceError> {
        let abbreviations = self.registry.get_all().await?;
        let lookup = CatalogLookup {
            repo: self.repo.as_ref(),
        };
        let resolution = find_or_create(&lookup, input_ref, label, &abbreviations).await?;
        if let Resolution::Created(product) = &resolution {
            info!(catalog_product_id = %product.id, name = %product.name, "Created catalog product");
        }
        Ok(resolution.map(|p| p.id))
    }
}
