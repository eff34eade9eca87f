//! Read-side aggregation.
//!
//! Joins stored transactions back to their live stores, customers and
//! products, and formats names for display. Persisted records are never
//! modified here: an item's stored snapshot name stays as recorded and is
//! only used when its product no longer exists.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;

use tracing::{instrument, warn};

use tokoledger_core::{Abbreviations, OrderId, ProductId, format_display_name};

use super::ServiceError;
use super::abbreviations::AbbreviationRegistry;
use crate::db::Repository;
use crate::models::{
    Customer, Expense, ExpenseFilter, ExpenseItemView, ExpenseProduct, ExpenseView, Order,
    OrderFilter, OrderItemView, OrderView, ProductInfo, StoreInfo,
};

/// Builds display views over expenses and orders.
#[derive(Clone)]
pub struct ViewService {
    repo: Arc<dyn Repository>,
    registry: AbbreviationRegistry,
}

fn unique_ids<T: Copy + Eq + Hash>(ids: impl Iterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(*id)).collect()
}

impl ViewService {
    /// Create the service.
    #[must_use]
    pub fn new(repo: Arc<dyn Repository>, registry: AbbreviationRegistry) -> Self {
        Self { repo, registry }
    }

    /// List expenses newest first, joined and display-formatted.
    ///
    /// Expenses whose store has disappeared are skipped.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` on storage failure.
    #[instrument(skip(self, filter), fields(search = ?filter.search))]
    pub async fn list_expenses(
        &self,
        filter: &ExpenseFilter,
    ) -> Result<Vec<ExpenseView>, ServiceError> {
        let expenses = self.repo.list_expenses(filter).await?;
        if expenses.is_empty() {
            return Ok(Vec::new());
        }
        let abbreviations = self.registry.get_all().await?;

        let store_ids = unique_ids(expenses.iter().map(|e| e.store_id));
        let stores: HashMap<_, _> = self
            .repo
            .stores_by_ids(&store_ids)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        let product_ids = unique_ids(
            expenses
                .iter()
                .flat_map(|e| e.items.iter().map(|i| i.product)),
        );
        let products: HashMap<_, _> = self
            .repo
            .products_by_ids(&product_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut views = Vec::with_capacity(expenses.len());
        for expense in expenses {
            let Some(store) = stores.get(&expense.store_id) else {
                warn!(
                    expense_id = %expense.id,
                    store_id = %expense.store_id,
                    "Expense references a missing store"
                );
                continue;
            };
            let store_info = StoreInfo {
                id: store.id,
                name: format_display_name(&store.name, &abbreviations),
                address: store.address.clone(),
                phone: store.phone.clone(),
                maps_link: store.maps_link.clone(),
            };
            views.push(expense_view(expense, store_info, &products, &abbreviations));
        }
        Ok(views)
    }

    /// List orders newest first, joined and display-formatted.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` on storage failure.
    #[instrument(skip(self, filter), fields(search = ?filter.search))]
    pub async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<OrderView>, ServiceError> {
        let orders = self.repo.list_orders(filter).await?;
        self.order_views(orders).await
    }

    /// A single order, joined and display-formatted.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the order does not exist.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get_order(&self, id: OrderId) -> Result<OrderView, ServiceError> {
        let order = self
            .repo
            .order_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_owned()))?;
        self.order_views(vec![order])
            .await?
            .pop()
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_owned()))
    }

    async fn order_views(&self, orders: Vec<Order>) -> Result<Vec<OrderView>, ServiceError> {
        if orders.is_empty() {
            return Ok(Vec::new());
        }
        let abbreviations = self.registry.get_all().await?;

        let customer_ids = unique_ids(orders.iter().map(|o| o.customer_id));
        let customers: HashMap<_, _> = self
            .repo
            .customers_by_ids(&customer_ids)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let address_ids = unique_ids(orders.iter().map(|o| o.address_id));
        let addresses: HashMap<_, _> = self
            .repo
            .addresses_by_ids(&address_ids)
            .await?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();

        let product_ids = unique_ids(
            orders
                .iter()
                .flat_map(|o| o.order_items.iter().map(|i| i.product)),
        );
        let products: HashMap<_, _> = self
            .repo
            .catalog_products_by_ids(&product_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        Ok(orders
            .into_iter()
            .map(|order| {
                let customer = customers.get(&order.customer_id).map(|c| Customer {
                    name: format_display_name(&c.name, &abbreviations),
                    ..c.clone()
                });
                let order_items = order
                    .order_items
                    .into_iter()
                    .map(|item| OrderItemView {
                        name: products.get(&item.product).map_or_else(
                            || item.name.clone(),
                            |p| format_display_name(&p.name, &abbreviations),
                        ),
                        product: item.product,
                        snapshot_name: item.name,
                        qty: item.qty,
                        color: item.color,
                        note: item.note,
                        discount: item.discount,
                        files: item.files,
                    })
                    .collect();
                OrderView {
                    id: order.id,
                    customer,
                    address: addresses.get(&order.address_id).cloned(),
                    order_date: order.order_date,
                    deadline: order.deadline,
                    order_items,
                    created_at: order.created_at,
                }
            })
            .collect())
    }
}

fn expense_view(
    expense: Expense,
    store_info: StoreInfo,
    products: &HashMap<ProductId, ExpenseProduct>,
    abbreviations: &Abbreviations,
) -> ExpenseView {
    let items = expense
        .items
        .into_iter()
        .map(|item| {
            let product_info = products.get(&item.product).map(|p| ProductInfo {
                id: p.id,
                name: format_display_name(&p.name, abbreviations),
                price: p.price,
            });
            ExpenseItemView {
                product: item.product,
                name: product_info
                    .as_ref()
                    .map_or_else(|| item.name.clone(), |p| p.name.clone()),
                snapshot_name: item.name,
                quantity: item.quantity,
                price: item.price,
                product_info,
            }
        })
        .collect();

    ExpenseView {
        id: expense.id,
        store_info,
        items,
        date: expense.date,
        total: expense.total,
        attachments: expense.attachments,
        thumbnail_path: expense.thumbnail_path,
        created_at: expense.created_at,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use tokoledger_core::StoreId;

    use super::*;
    use crate::config::UploadConfig;
    use crate::db::{AbbreviationRepository, ExpenseRepository, MemoryRepository};
    use crate::models::{ExpenseDraft, ExpenseInput, ExpenseItem, ExpenseItemInput};
    use crate::services::{AttachmentStore, EntityResolver, ExpenseService};

    struct Fixture {
        repo: Arc<MemoryRepository>,
        registry: AbbreviationRegistry,
        expenses: ExpenseService,
        views: ViewService,
    }

    fn fixture() -> Fixture {
        let repo = Arc::new(MemoryRepository::new());
        let registry = AbbreviationRegistry::new(repo.clone());
        let resolver = EntityResolver::new(repo.clone(), registry.clone());
        let attachments = AttachmentStore::new(&UploadConfig::default());
        Fixture {
            expenses: ExpenseService::new(repo.clone(), resolver, attachments),
            views: ViewService::new(repo.clone(), registry.clone()),
            registry,
            repo,
        }
    }

    fn input(store: &str, item_name: &str, day: u32) -> ExpenseInput {
        ExpenseInput {
            store: store.to_owned(),
            items: vec![ExpenseItemInput {
                product: String::new(),
                name: item_name.to_owned(),
                quantity: Decimal::ONE,
                price: Decimal::ONE,
            }],
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            total: Decimal::ONE,
            attachments: None,
            thumbnail_path: None,
        }
    }

    fn search(term: &str) -> ExpenseFilter {
        ExpenseFilter {
            search: Some(term.to_owned()),
            ..ExpenseFilter::default()
        }
    }

    #[tokio::test]
    async fn test_search_matches_store_or_item_name() {
        let f = fixture();
        let by_store = f.expenses.create(input("Toko ABC", "Beras", 1)).await.unwrap();
        let by_item = f.expenses.create(input("Warung", "Sabun abc", 2)).await.unwrap();
        f.expenses.create(input("Pasar", "Gula", 3)).await.unwrap();

        let ids: Vec<_> = f
            .views
            .list_expenses(&search("abc"))
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(ids, vec![by_item.id, by_store.id]);
    }

    #[tokio::test]
    async fn test_date_range_is_inclusive() {
        let f = fixture();
        f.expenses.create(input("A", "x", 1)).await.unwrap();
        let second = f.expenses.create(input("A", "x", 2)).await.unwrap();
        let third = f.expenses.create(input("A", "x", 3)).await.unwrap();
        f.expenses.create(input("A", "x", 4)).await.unwrap();

        let filter = ExpenseFilter {
            from: NaiveDate::from_ymd_opt(2024, 1, 2),
            to: NaiveDate::from_ymd_opt(2024, 1, 3),
            ..ExpenseFilter::default()
        };
        let ids: Vec<_> = f
            .views
            .list_expenses(&filter)
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(ids, vec![third.id, second.id]);
    }

    #[tokio::test]
    async fn test_view_formats_live_names_and_keeps_snapshot() {
        let f = fixture();
        let expense = f
            .expenses
            .create(input("cemerlang tki", "minyak goreng", 1))
            .await
            .unwrap();

        // Registered after the stores were created; visible after refresh.
        f.repo.insert_abbreviation("TKI").await.unwrap();
        f.registry.refresh().await.unwrap();

        let view = f.views.list_expenses(&ExpenseFilter::default()).await.unwrap();
        let view = &view[0];
        assert_eq!(view.id, expense.id);
        assert_eq!(view.store_info.name, "Cemerlang TKI");
        assert_eq!(view.items[0].name, "Minyak Goreng");
        assert_eq!(view.items[0].snapshot_name, "minyak goreng");
        assert!(view.items[0].product_info.is_some());

        let stored = f.repo.expense_by_id(expense.id).await.unwrap().unwrap();
        assert_eq!(stored.items[0].name, "minyak goreng");
    }

    #[tokio::test]
    async fn test_missing_product_falls_back_to_snapshot() {
        let f = fixture();
        let store = f.expenses.create(input("A", "x", 1)).await.unwrap().store_id;
        f.repo
            .insert_expense(ExpenseDraft {
                store_id: store,
                items: vec![ExpenseItem {
                    product: ProductId::generate(),
                    name: "barang hilang".to_owned(),
                    quantity: Decimal::ONE,
                    price: Decimal::ONE,
                }],
                date: NaiveDate::from_ymd_opt(2024, 1, 9).unwrap(),
                total: Decimal::ONE,
                attachments: Vec::new(),
                thumbnail_path: None,
            })
            .await
            .unwrap();

        let views = f.views.list_expenses(&ExpenseFilter::default()).await.unwrap();
        assert_eq!(views[0].items[0].name, "barang hilang");
        assert!(views[0].items[0].product_info.is_none());
    }

    #[tokio::test]
    async fn test_expense_with_missing_store_is_skipped() {
        let f = fixture();
        f.repo
            .insert_expense(ExpenseDraft {
                store_id: StoreId::generate(),
                items: Vec::new(),
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                total: Decimal::ZERO,
                attachments: Vec::new(),
                thumbnail_path: None,
            })
            .await
            .unwrap();
        let views = f.views.list_expenses(&ExpenseFilter::default()).await.unwrap();
        assert!(views.is_empty());
    }

    #[tokio::test]
    async fn test_get_order_missing_is_not_found() {
        let f = fixture();
        let err = f.views.get_order(OrderId::generate()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
