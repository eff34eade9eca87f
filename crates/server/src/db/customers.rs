//! `PostgreSQL` storage for customers and their delivery addresses.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::instrument;
use uuid::Uuid;

use tokoledger_core::{AddressId, CustomerId};

use super::{
    AddressRepository, CustomerRepository, PgRepository, RepositoryError, collapse_whitespace,
    contains_pattern,
};
use crate::models::{Address, Customer, NewAddress, NewCustomer};

const CUSTOMER_COLUMNS: &str = "id, name, phone, created_at, updated_at";

const ADDRESS_COLUMNS: &str = "id, customer_id, receiver_name, phone, street, landmark, city, \
                               state, country, postal_code, created_at, updated_at";

/// Internal row type for customer queries.
#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: Uuid,
    name: String,
    phone: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: CustomerId::new(row.id),
            name: row.name,
            phone: row.phone,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Internal row type for address queries.
#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    id: Uuid,
    customer_id: Uuid,
    receiver_name: String,
    phone: String,
    street: String,
    landmark: Option<String>,
    city: String,
    state: String,
    country: String,
    postal_code: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: AddressId::new(row.id),
            customer_id: CustomerId::new(row.customer_id),
            receiver_name: row.receiver_name,
            phone: row.phone,
            street: row.street,
            landmark: row.landmark,
            city: row.city,
            state: row.state,
            country: row.country,
            postal_code: row.postal_code,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl CustomerRepository for PgRepository {
    #[instrument(skip(self), fields(customer_id = %id))]
    async fn customer_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn customer_by_name(
        &self,
        name_lowercase: &str,
    ) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            r"
            SELECT {CUSTOMER_COLUMNS} FROM customers
            WHERE regexp_replace(LOWER(BTRIM(name)), '\s+', ' ', 'g') = $1
            ORDER BY created_at
            LIMIT 1
            "
        ))
        .bind(collapse_whitespace(name_lowercase))
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Into::into))
    }

    #[instrument(skip(self, customer), fields(name = %customer.name))]
    async fn insert_customer(&self, customer: NewCustomer) -> Result<Customer, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            r"
            INSERT INTO customers (id, name, phone)
            VALUES ($1, $2, $3)
            RETURNING {CUSTOMER_COLUMNS}
            "
        ))
        .bind(CustomerId::generate())
        .bind(&customer.name)
        .bind(&customer.phone)
        .fetch_one(self.pool())
        .await?;
        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn list_customers(
        &self,
        fragment: Option<&str>,
    ) -> Result<Vec<Customer>, RepositoryError> {
        let rows = sqlx::query_as::<_, CustomerRow>(&format!(
            r"
            SELECT {CUSTOMER_COLUMNS} FROM customers
            WHERE $1::text IS NULL OR name ILIKE $1
            ORDER BY LOWER(name), created_at
            "
        ))
        .bind(fragment.map(contains_pattern))
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn customers_by_ids(
        &self,
        ids: &[CustomerId],
    ) -> Result<Vec<Customer>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl AddressRepository for PgRepository {
    #[instrument(skip(self), fields(address_id = %id))]
    async fn address_by_id(&self, id: AddressId) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Into::into))
    }

    #[instrument(skip(self, address), fields(customer_id = %address.customer_id))]
    async fn insert_address(&self, address: NewAddress) -> Result<Address, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(&format!(
            r"
            INSERT INTO addresses (id, customer_id, receiver_name, phone, street, landmark,
                                   city, state, country, postal_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {ADDRESS_COLUMNS}
            "
        ))
        .bind(AddressId::generate())
        .bind(address.customer_id)
        .bind(&address.receiver_name)
        .bind(&address.phone)
        .bind(&address.street)
        .bind(&address.landmark)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.country)
        .bind(&address.postal_code)
        .fetch_one(self.pool())
        .await?;
        Ok(row.into())
    }

    #[instrument(skip(self), fields(customer_id = %customer_id))]
    async fn addresses_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Address>, RepositoryError> {
        let rows = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE customer_id = $1 ORDER BY created_at"
        ))
        .bind(customer_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn addresses_by_ids(&self, ids: &[AddressId]) -> Result<Vec<Address>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
