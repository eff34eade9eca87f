//! In-process [`Repository`] implementation.
//!
//! Honors the same unique keys as the `PostgreSQL` schema, so the resolver's
//! conflict handling behaves identically. Used by the test suites and for
//! running the server without a database.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use tokoledger_core::{
    AddressId, CatalogProductId, CustomerId, ExpenseId, OrderId, ProductId, StoreId,
};

use super::{
    AbbreviationRepository, AddressRepository, CatalogRepository, CustomerRepository,
    ExpenseRepository, OrderRepository, ProductRepository, Repository, RepositoryError,
    StoreRepository, collapse_whitespace,
};
use crate::models::{
    Address, CatalogProduct, Customer, Expense, ExpenseDraft, ExpenseFilter, ExpenseProduct,
    NewAddress, NewCatalogProduct, NewCustomer, NewExpenseProduct, NewStore, Order, OrderDraft,
    OrderFilter, Store,
};

#[derive(Debug, Default)]
struct Tables {
    abbreviations: Vec<String>,
    stores: Vec<Store>,
    products: Vec<ExpenseProduct>,
    catalog: Vec<CatalogProduct>,
    customers: Vec<Customer>,
    addresses: Vec<Address>,
    expenses: Vec<Expense>,
    orders: Vec<Order>,
}

/// Repository backed by in-memory vectors behind an async lock.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

impl MemoryRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stores currently stored.
    pub async fn store_count(&self) -> usize {
        self.tables.read().await.stores.len()
    }

    /// Number of expense products currently stored.
    pub async fn product_count(&self) -> usize {
        self.tables.read().await.products.len()
    }

    /// Number of catalog products currently stored.
    pub async fn catalog_product_count(&self) -> usize {
        self.tables.read().await.catalog.len()
    }

    /// Number of customers currently stored.
    pub async fn customer_count(&self) -> usize {
        self.tables.read().await.customers.len()
    }
}

fn contains_ignore_case(haystack: &str, needle_lowercase: &str) -> bool {
    haystack.to_lowercase().contains(needle_lowercase)
}

/// Newest first by `key`, then by creation; ties keep the most recent insert first.
fn sort_newest_first<T, K: Ord>(rows: &mut [T], key: impl Fn(&T) -> K) {
    rows.reverse();
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl AbbreviationRepository for MemoryRepository {
    async fn list_abbreviations(&self) -> Result<Vec<String>, RepositoryError> {
        Ok(self.tables.read().await.abbreviations.clone())
    }

    async fn insert_abbreviation(&self, name: &str) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.abbreviations.iter().any(|a| a == name) {
            return Ok(false);
        }
        tables.abbreviations.push(name.to_owned());
        Ok(true)
    }
}

#[async_trait]
impl StoreRepository for MemoryRepository {
    async fn store_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.stores.iter().find(|s| s.id == id).cloned())
    }

    async fn store_by_name(&self, name_lowercase: &str) -> Result<Option<Store>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .stores
            .iter()
            .find(|s| s.name_lowercase == name_lowercase)
            .cloned())
    }

    async fn insert_store(&self, store: NewStore) -> Result<Store, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables
            .stores
            .iter()
            .any(|s| s.name_lowercase == store.name_lowercase)
        {
            return Err(RepositoryError::Conflict("store already exists".to_owned()));
        }
        let now = Utc::now();
        let created = Store {
            id: StoreId::generate(),
            name: store.name,
            name_lowercase: store.name_lowercase,
            address: store.address,
            phone: store.phone,
            maps_link: store.maps_link,
            created_at: now,
            updated_at: now,
        };
        tables.stores.push(created.clone());
        Ok(created)
    }

    async fn search_stores(
        &self,
        fragment: &str,
        limit: i64,
    ) -> Result<Vec<Store>, RepositoryError> {
        let needle = fragment.to_lowercase();
        let tables = self.tables.read().await;
        let mut found: Vec<Store> = tables
            .stores
            .iter()
            .filter(|s| contains_ignore_case(&s.name, &needle))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name_lowercase.cmp(&b.name_lowercase));
        found.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(found)
    }

    async fn stores_by_ids(&self, ids: &[StoreId]) -> Result<Vec<Store>, RepositoryError> {
        let wanted: HashSet<_> = ids.iter().collect();
        let tables = self.tables.read().await;
        Ok(tables
            .stores
            .iter()
            .filter(|s| wanted.contains(&s.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ProductRepository for MemoryRepository {
    async fn product_by_id(
        &self,
        id: ProductId,
    ) -> Result<Option<ExpenseProduct>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.products.iter().find(|p| p.id == id).cloned())
    }

    async fn product_by_name(
        &self,
        store_id: StoreId,
        name_lowercase: &str,
    ) -> Result<Option<ExpenseProduct>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .products
            .iter()
            .find(|p| p.store_id == store_id && p.name_lowercase == name_lowercase)
            .cloned())
    }

    async fn insert_product(
        &self,
        product: NewExpenseProduct,
    ) -> Result<ExpenseProduct, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables
            .products
            .iter()
            .any(|p| p.store_id == product.store_id && p.name_lowercase == product.name_lowercase)
        {
            return Err(RepositoryError::Conflict("product already exists".to_owned()));
        }
        let now = Utc::now();
        let created = ExpenseProduct {
            id: ProductId::generate(),
            store_id: product.store_id,
            name: product.name,
            name_lowercase: product.name_lowercase,
            price: product.price,
            description: None,
            created_at: now,
            updated_at: now,
        };
        tables.products.push(created.clone());
        Ok(created)
    }

    async fn update_product_price(
        &self,
        id: ProductId,
        price: Decimal,
    ) -> Result<ExpenseProduct, RepositoryError> {
        let mut tables = self.tables.write().await;
        let product = tables
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepositoryError::NotFound)?;
        product.price = price;
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn search_products(
        &self,
        store_id: StoreId,
        fragment: &str,
        limit: i64,
    ) -> Result<Vec<ExpenseProduct>, RepositoryError> {
        let needle = fragment.to_lowercase();
        let tables = self.tables.read().await;
        let mut found: Vec<ExpenseProduct> = tables
            .products
            .iter()
            .filter(|p| p.store_id == store_id && contains_ignore_case(&p.name, &needle))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name_lowercase.cmp(&b.name_lowercase));
        found.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(found)
    }

    async fn products_by_ids(
        &self,
        ids: &[ProductId],
    ) -> Result<Vec<ExpenseProduct>, RepositoryError> {
        let wanted: HashSet<_> = ids.iter().collect();
        let tables = self.tables.read().await;
        Ok(tables
            .products
            .iter()
            .filter(|p| wanted.contains(&p.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CatalogRepository for MemoryRepository {
    async fn catalog_product_by_id(
        &self,
        id: CatalogProductId,
    ) -> Result<Option<CatalogProduct>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.catalog.iter().find(|p| p.id == id).cloned())
    }

    async fn catalog_product_by_name(
        &self,
        name_lowercase: &str,
    ) -> Result<Option<CatalogProduct>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .catalog
            .iter()
            .find(|p| p.name_lowercase == name_lowercase)
            .cloned())
    }

    async fn insert_catalog_product(
        &self,
        product: NewCatalogProduct,
    ) -> Result<CatalogProduct, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables
            .catalog
            .iter()
            .any(|p| p.name_lowercase == product.name_lowercase)
        {
            return Err(RepositoryError::Conflict(
                "catalog product already exists".to_owned(),
            ));
        }
        let now = Utc::now();
        let created = CatalogProduct {
            id: CatalogProductId::generate(),
            name: product.name,
            name_lowercase: product.name_lowercase,
            description: product.description,
            price: product.price,
            photos: Vec::new(),
            videos: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        tables.catalog.push(created.clone());
        Ok(created)
    }

    async fn search_catalog_products(
        &self,
        fragment: &str,
        limit: i64,
    ) -> Result<Vec<CatalogProduct>, RepositoryError> {
        let needle = fragment.to_lowercase();
        let tables = self.tables.read().await;
        let mut found: Vec<CatalogProduct> = tables
            .catalog
            .iter()
            .filter(|p| contains_ignore_case(&p.name, &needle))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name_lowercase.cmp(&b.name_lowercase));
        found.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(found)
    }

    async fn catalog_products_by_ids(
        &self,
        ids: &[CatalogProductId],
    ) -> Result<Vec<CatalogProduct>, RepositoryError> {
        let wanted: HashSet<_> = ids.iter().collect();
        let tables = self.tables.read().await;
        Ok(tables
            .catalog
            .iter()
            .filter(|p| wanted.contains(&p.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CustomerRepository for MemoryRepository {
    async fn customer_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.customers.iter().find(|c| c.id == id).cloned())
    }

    async fn customer_by_name(
        &self,
        name_lowercase: &str,
    ) -> Result<Option<Customer>, RepositoryError> {
        // Insertion order is creation order, so the first match is the oldest.
        let key = collapse_whitespace(name_lowercase);
        let tables = self.tables.read().await;
        Ok(tables
            .customers
            .iter()
            .find(|c| collapse_whitespace(&c.name.to_lowercase()) == key)
            .cloned())
    }

    async fn insert_customer(&self, customer: NewCustomer) -> Result<Customer, RepositoryError> {
        let now = Utc::now();
        let created = Customer {
            id: CustomerId::generate(),
            name: customer.name,
            phone: customer.phone,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.customers.push(created.clone());
        Ok(created)
    }

    async fn list_customers(
        &self,
        fragment: Option<&str>,
    ) -> Result<Vec<Customer>, RepositoryError> {
        let needle = fragment.map(str::to_lowercase);
        let tables = self.tables.read().await;
        let mut found: Vec<Customer> = tables
            .customers
            .iter()
            .filter(|c| {
                needle
                    .as_deref()
                    .is_none_or(|n| contains_ignore_case(&c.name, n))
            })
            .cloned()
            .collect();
        found.sort_by_key(|c| c.name.to_lowercase());
        Ok(found)
    }

    async fn customers_by_ids(
        &self,
        ids: &[CustomerId],
    ) -> Result<Vec<Customer>, RepositoryError> {
        let wanted: HashSet<_> = ids.iter().collect();
        let tables = self.tables.read().await;
        Ok(tables
            .customers
            .iter()
            .filter(|c| wanted.contains(&c.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AddressRepository for MemoryRepository {
    async fn address_by_id(&self, id: AddressId) -> Result<Option<Address>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.addresses.iter().find(|a| a.id == id).cloned())
    }

    async fn insert_address(&self, address: NewAddress) -> Result<Address, RepositoryError> {
        let now = Utc::now();
        let created = Address {
            id: AddressId::generate(),
            customer_id: address.customer_id,
            receiver_name: address.receiver_name,
            phone: address.phone,
            street: address.street,
            landmark: address.landmark,
            city: address.city,
            state: address.state,
            country: address.country,
            postal_code: address.postal_code,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.addresses.push(created.clone());
        Ok(created)
    }

    async fn addresses_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Address>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .addresses
            .iter()
            .filter(|a| a.customer_id == customer_id)
            .cloned()
            .collect())
    }

    async fn addresses_by_ids(&self, ids: &[AddressId]) -> Result<Vec<Address>, RepositoryError> {
        let wanted: HashSet<_> = ids.iter().collect();
        let tables = self.tables.read().await;
        Ok(tables
            .addresses
            .iter()
            .filter(|a| wanted.contains(&a.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ExpenseRepository for MemoryRepository {
    async fn expense_by_id(&self, id: ExpenseId) -> Result<Option<Expense>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.expenses.iter().find(|e| e.id == id).cloned())
    }

    async fn insert_expense(&self, draft: ExpenseDraft) -> Result<Expense, RepositoryError> {
        let now = Utc::now();
        let created = Expense {
            id: ExpenseId::generate(),
            store_id: draft.store_id,
            items: draft.items,
            date: draft.date,
            total: draft.total,
            attachments: draft.attachments,
            thumbnail_path: draft.thumbnail_path,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.expenses.push(created.clone());
        Ok(created)
    }

    async fn replace_expense(
        &self,
        id: ExpenseId,
        draft: ExpenseDraft,
    ) -> Result<Option<Expense>, RepositoryError> {
        let mut tables = self.tables.write().await;
        let Some(expense) = tables.expenses.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };
        expense.store_id = draft.store_id;
        expense.items = draft.items;
        expense.date = draft.date;
        expense.total = draft.total;
        expense.attachments = draft.attachments;
        expense.thumbnail_path = draft.thumbnail_path;
        expense.updated_at = Utc::now();
        Ok(Some(expense.clone()))
    }

    async fn delete_expense(&self, id: ExpenseId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        let before = tables.expenses.len();
        tables.expenses.retain(|e| e.id != id);
        Ok(tables.expenses.len() != before)
    }

    async fn pull_expense_attachment(
        &self,
        id: ExpenseId,
        path: &str,
    ) -> Result<Option<Expense>, RepositoryError> {
        let mut tables = self.tables.write().await;
        let Some(expense) = tables.expenses.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };
        expense.attachments.retain(|a| a != path);
        expense.updated_at = Utc::now();
        Ok(Some(expense.clone()))
    }

    async fn list_expenses(
        &self,
        filter: &ExpenseFilter,
    ) -> Result<Vec<Expense>, RepositoryError> {
        let needle = filter.search.as_deref().map(str::to_lowercase);
        let tables = self.tables.read().await;
        let mut found: Vec<Expense> = tables
            .expenses
            .iter()
            .filter(|e| filter.store_id.is_none_or(|id| e.store_id == id))
            .filter(|e| filter.from.is_none_or(|from| e.date >= from))
            .filter(|e| filter.to.is_none_or(|to| e.date <= to))
            .filter(|e| {
                needle.as_deref().is_none_or(|n| {
                    let store_hit = tables
                        .stores
                        .iter()
                        .find(|s| s.id == e.store_id)
                        .is_some_and(|s| contains_ignore_case(&s.name, n));
                    store_hit || e.items.iter().any(|i| contains_ignore_case(&i.name, n))
                })
            })
            .cloned()
            .collect();
        sort_newest_first(&mut found, |e| (e.date, e.created_at));
        Ok(found)
    }
}

#[async_trait]
impl OrderRepository for MemoryRepository {
    async fn order_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn insert_order(&self, draft: OrderDraft) -> Result<Order, RepositoryError> {
        let now = Utc::now();
        let created = Order {
            id: OrderId::generate(),
            customer_id: draft.customer_id,
            address_id: draft.address_id,
            order_date: draft.order_date,
            deadline: draft.deadline,
            order_items: draft.order_items,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.orders.push(created.clone());
        Ok(created)
    }

    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError> {
        let needle = filter.search.as_deref().map(str::to_lowercase);
        let tables = self.tables.read().await;
        let mut found: Vec<Order> = tables
            .orders
            .iter()
            .filter(|o| filter.customer_id.is_none_or(|id| o.customer_id == id))
            .filter(|o| {
                needle.as_deref().is_none_or(|n| {
                    let customer_hit = tables
                        .customers
                        .iter()
                        .find(|c| c.id == o.customer_id)
                        .is_some_and(|c| contains_ignore_case(&c.name, n));
                    customer_hit || o.order_items.iter().any(|i| contains_ignore_case(&i.name, n))
                })
            })
            .cloned()
            .collect();
        sort_newest_first(&mut found, |o| (o.order_date, o.created_at));
        Ok(found)
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn new_store(name: &str) -> NewStore {
        NewStore {
            name: name.to_owned(),
            name_lowercase: name.to_lowercase(),
            ..NewStore::default()
        }
    }

    fn draft(store_id: StoreId, day: u32) -> ExpenseDraft {
        ExpenseDraft {
            store_id,
            items: Vec::new(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            total: Decimal::ZERO,
            attachments: Vec::new(),
            thumbnail_path: None,
        }
    }

    #[tokio::test]
    async fn test_store_name_is_unique() {
        let repo = MemoryRepository::new();
        repo.insert_store(new_store("Toko ABC")).await.unwrap();
        let err = repo.insert_store(new_store("Toko ABC")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert_eq!(repo.store_count().await, 1);
    }

    #[tokio::test]
    async fn test_product_name_unique_per_store_only() {
        let repo = MemoryRepository::new();
        let a = repo.insert_store(new_store("A")).await.unwrap();
        let b = repo.insert_store(new_store("B")).await.unwrap();
        for store_id in [a.id, b.id] {
            repo.insert_product(NewExpenseProduct {
                store_id,
                name: "Gula".to_owned(),
                name_lowercase: "gula".to_owned(),
                price: Decimal::ONE,
            })
            .await
            .unwrap();
        }
        assert_eq!(repo.product_count().await, 2);
    }

    #[tokio::test]
    async fn test_list_expenses_orders_by_date_then_insertion() {
        let repo = MemoryRepository::new();
        let store = repo.insert_store(new_store("A")).await.unwrap();
        let first = repo.insert_expense(draft(store.id, 1)).await.unwrap();
        let second = repo.insert_expense(draft(store.id, 1)).await.unwrap();
        let later = repo.insert_expense(draft(store.id, 5)).await.unwrap();

        let ids: Vec<_> = repo
            .list_expenses(&ExpenseFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![later.id, second.id, first.id]);
    }

    #[tokio::test]
    async fn test_abbreviation_insert_reports_duplicates() {
        let repo = MemoryRepository::new();
        assert!(repo.insert_abbreviation("TKI").await.unwrap());
        assert!(!repo.insert_abbreviation("TKI").await.unwrap());
        assert_eq!(repo.list_abbreviations().await.unwrap(), vec!["TKI"]);
    }
}
