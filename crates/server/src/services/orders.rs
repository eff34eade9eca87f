//! Order transaction builder.
//!
//! Same shape as expenses with a customer in place of the store and the
//! sales catalog in place of store products. Neither the customer nor the
//! delivery address is created here: the address must already exist and
//! belong to the referenced customer.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, instrument};

use tokoledger_core::AddressId;

use super::ServiceError;
use super::resolver::EntityResolver;
use crate::db::Repository;
use crate::models::{Order, OrderDraft, OrderInput, OrderItem};

/// Creates orders.
#[derive(Clone)]
pub struct OrderService {
    repo: Arc<dyn Repository>,
    resolver: EntityResolver,
}

impl OrderService {
    /// Create the service.
    #[must_use]
    pub fn new(repo: Arc<dyn Repository>, resolver: EntityResolver) -> Self {
        Self { repo, resolver }
    }

    /// Record a new order, creating catalog products as needed.
    ///
    /// The customer must already exist and own the address; nothing is
    /// written when either check fails.
    ///
    /// `order_date` defaults to today (UTC).
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for a missing address reference,
    /// a blank name, a quantity below one, or an address owned by another
    /// customer; `ServiceError::NotFound` if the address does not exist.
    #[instrument(skip(self, input), fields(customer = %input.customer, items = input.order_items.len()))]
    pub async fn create(&self, input: OrderInput) -> Result<Order, ServiceError> {
        let address_id: AddressId = input
            .address_id
            .ok_or_else(|| ServiceError::Validation("Address is required".to_owned()))?;
        if let Some(bad) = input.order_items.iter().find(|i| i.qty < 1) {
            return Err(ServiceError::Validation(format!(
                "Quantity must be at least 1 for {}",
                bad.name
            )));
        }

        let address = self
            .repo
            .address_by_id(address_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Address not found".to_owned()))?;

        // A customer created here could never own an existing address, so only
        // stored customers are considered.
        let customer = self
            .resolver
            .find_customer(&input.customer, &input.customer)
            .await?
            .filter(|c| c.id == address.customer_id)
            .ok_or_else(|| {
                ServiceError::Validation("Address does not belong to this customer".to_owned())
            })?;

        let mut order_items = Vec::with_capacity(input.order_items.len());
        for item in input.order_items {
            let label = if item.name.trim().is_empty() {
                item.product.clone()
            } else {
                item.name
            };
            let product = self
                .resolver
                .resolve_catalog_product(&item.product, &label)
                .await?
                .into_inner();
            order_items.push(OrderItem {
                product,
                name: label,
                qty: item.qty,
                color: item.color.filter(|c| !c.trim().is_empty()),
                note: item.note.filter(|n| !n.trim().is_empty()),
                discount: item.discount.unwrap_or(Decimal::ZERO),
                files: Vec::new(),
            });
        }

        let order = self
            .repo
            .insert_order(OrderDraft {
                customer_id: customer.id,
                address_id: address.id,
                order_date: input
                    .order_date
                    .unwrap_or_else(|| Utc::now().date_naive()),
                deadline: input.deadline,
                order_items,
            })
            .await?;
        info!(order_id = %order.id, "Created order");
        Ok(order)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::db::{AddressRepository, CustomerRepository, MemoryRepository};
    use crate::models::{NewAddress, NewCustomer, OrderItemInput};
    use crate::services::AbbreviationRegistry;

    struct Fixture {
        repo: Arc<MemoryRepository>,
        service: OrderService,
    }

    fn fixture() -> Fixture {
        let repo = Arc::new(MemoryRepository::new());
        let registry = AbbreviationRegistry::new(repo.clone());
        let resolver = EntityResolver::new(repo.clone(), registry);
        Fixture {
            service: OrderService::new(repo.clone(), resolver),
            repo,
        }
    }

    async fn customer_with_address(repo: &MemoryRepository, name: &str) -> (String, AddressId) {
        let customer = repo
            .insert_customer(NewCustomer {
                name: name.to_owned(),
                phone: "0812".to_owned(),
            })
            .await
            .unwrap();
        let address = repo
            .insert_address(NewAddress {
                customer_id: customer.id,
                receiver_name: name.to_owned(),
                phone: "0812".to_owned(),
                street: "Jl. Merdeka 1".to_owned(),
                landmark: None,
                city: "Bandung".to_owned(),
                state: "Jawa Barat".to_owned(),
                country: "Indonesia".to_owned(),
                postal_code: "40111".to_owned(),
            })
            .await
            .unwrap();
        (customer.id.to_string(), address.id)
    }

    fn item(name: &str, qty: i32) -> OrderItemInput {
        OrderItemInput {
            product: String::new(),
            name: name.to_owned(),
            qty,
            color: None,
            note: Some("  ".to_owned()),
            discount: None,
        }
    }

    fn input(customer: &str, address_id: AddressId, items: Vec<OrderItemInput>) -> OrderInput {
        OrderInput {
            customer: customer.to_owned(),
            address_id: Some(address_id),
            order_date: None,
            deadline: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            order_items: items,
        }
    }

    #[tokio::test]
    async fn test_create_resolves_customer_and_catalog_products() {
        let f = fixture();
        let (customer_ref, address_id) = customer_with_address(&f.repo, "Siti").await;
        let order = f
            .service
            .create(input(
                &customer_ref,
                address_id,
                vec![item("kaos POLOS", 2), item("Kaos Polos", 1)],
            ))
            .await
            .unwrap();

        assert_eq!(order.address_id, address_id);
        assert_eq!(order.order_items.len(), 2);
        assert_eq!(order.order_items[0].name, "kaos POLOS");
        assert_eq!(order.order_items[0].product, order.order_items[1].product);
        assert_eq!(order.order_items[0].discount, Decimal::ZERO);
        assert_eq!(order.order_items[0].note, None);
        assert_eq!(order.order_date, Utc::now().date_naive());
        assert_eq!(f.repo.catalog_product_count().await, 1);
    }

    #[tokio::test]
    async fn test_create_matches_customer_by_name() {
        let f = fixture();
        let (_, address_id) = customer_with_address(&f.repo, "Siti Aminah").await;
        let order = f
            .service
            .create(input("siti aminah", address_id, vec![item("Topi", 1)]))
            .await
            .unwrap();
        assert_eq!(f.repo.customer_count().await, 1);
        let customer = f.repo.customer_by_id(order.customer_id).await.unwrap();
        assert_eq!(customer.unwrap().name, "Siti Aminah");
    }

    #[tokio::test]
    async fn test_address_must_exist() {
        let f = fixture();
        let err = f
            .service
            .create(input("orang baru", AddressId::generate(), vec![item("Topi", 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert_eq!(f.repo.customer_count().await, 0);
        assert_eq!(f.repo.catalog_product_count().await, 0);
    }

    #[tokio::test]
    async fn test_address_must_belong_to_customer() {
        let f = fixture();
        let (_, address_id) = customer_with_address(&f.repo, "Siti").await;
        let err = f
            .service
            .create(input("Budi", address_id, vec![item("Topi", 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(f.repo.customer_count().await, 1);
        assert_eq!(f.repo.catalog_product_count().await, 0);
    }

    #[tokio::test]
    async fn test_address_of_another_stored_customer_is_rejected() {
        let f = fixture();
        let (_, siti_address) = customer_with_address(&f.repo, "Siti").await;
        let (budi_ref, _) = customer_with_address(&f.repo, "Budi").await;
        let err = f
            .service
            .create(input(&budi_ref, siti_address, vec![item("Topi", 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(f.repo.customer_count().await, 2);
    }

    #[tokio::test]
    async fn test_quantity_below_one_is_rejected_before_resolution() {
        let f = fixture();
        let (customer_ref, address_id) = customer_with_address(&f.repo, "Siti").await;
        let err = f
            .service
            .create(input(&customer_ref, address_id, vec![item("Topi", 0)]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(f.repo.catalog_product_count().await, 0);
    }
}
