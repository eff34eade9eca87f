//! Customer and delivery address models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tokoledger_core::{AddressId, CustomerId};

/// A customer who places orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// Unique customer ID.
    pub id: CustomerId,
    /// Customer name.
    pub name: String,
    /// Phone number (empty for customers created from an order form).
    pub phone: String,
    /// When the customer was created.
    pub created_at: DateTime<Utc>,
    /// When the customer was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Request body for `POST /customers`; also used for resolver-created customers.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCustomer {
    /// Customer name.
    pub name: String,
    /// Phone number.
    #[serde(default)]
    pub phone: String,
}

/// A delivery address belonging to a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Unique address ID.
    pub id: AddressId,
    /// Customer that owns the address.
    pub customer_id: CustomerId,
    /// Name of the person receiving the delivery.
    pub receiver_name: String,
    /// Receiver phone number.
    pub phone: String,
    /// Street line.
    pub street: String,
    /// Optional landmark hint for couriers.
    pub landmark: Option<String>,
    /// City.
    pub city: String,
    /// State or province.
    pub state: String,
    /// Country.
    pub country: String,
    /// Postal code.
    pub postal_code: String,
    /// When the address was created.
    pub created_at: DateTime<Utc>,
    /// When the address was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Request body for `POST /addresses`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAddress {
    /// Customer that owns the address.
    pub customer_id: CustomerId,
    /// Name of the person receiving the delivery.
    pub receiver_name: String,
    /// Receiver phone number.
    pub phone: String,
    /// Street line.
    pub street: String,
    /// Optional landmark hint.
    #[serde(default)]
    pub landmark: Option<String>,
    /// City.
    pub city: String,
    /// State or province.
    pub state: String,
    /// Country.
    pub country: String,
    /// Postal code.
    pub postal_code: String,
}

impl NewAddress {
    /// Trim every field and return the name of the first required field that
    /// is blank, if any.
    pub fn normalize(&mut self) -> Option<&'static str> {
        for (field, value) in [
            ("receiverName", &mut self.receiver_name),
            ("phone", &mut self.phone),
            ("street", &mut self.street),
            ("city", &mut self.city),
            ("state", &mut self.state),
            ("country", &mut self.country),
            ("postalCode", &mut self.postal_code),
        ] {
            *value = value.trim().to_owned();
            if value.is_empty() {
                return Some(field);
            }
        }
        self.landmark = self
            .landmark
            .take()
            .map(|l| l.trim().to_owned())
            .filter(|l| !l.is_empty());
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn address() -> NewAddress {
        NewAddress {
            customer_id: CustomerId::generate(),
            receiver_name: " Siti ".to_owned(),
            phone: "0812".to_owned(),
            street: "Jl. Merdeka 1".to_owned(),
            landmark: Some("  ".to_owned()),
            city: "Bandung".to_owned(),
            state: "Jawa Barat".to_owned(),
            country: "Indonesia".to_owned(),
            postal_code: "40111".to_owned(),
        }
    }

    #[test]
    fn test_normalize_trims_and_drops_blank_landmark() {
        let mut input = address();
        assert_eq!(input.normalize(), None);
        assert_eq!(input.receiver_name, "Siti");
        assert_eq!(input.landmark, None);
    }

    #[test]
    fn test_normalize_reports_missing_field() {
        let mut input = address();
        input.city = "   ".to_owned();
        assert_eq!(input.normalize(), Some("city"));
    }

    #[test]
    fn test_new_address_deserializes_camel_case() {
        let json = serde_json::json!({
            "customerId": CustomerId::generate(),
            "receiverName": "Siti",
            "phone": "0812",
            "street": "Jl. Merdeka 1",
            "city": "Bandung",
            "state": "Jawa Barat",
            "country": "Indonesia",
            "postalCode": "40111"
        });
        let input: NewAddress = serde_json::from_value(json).unwrap();
        assert_eq!(input.postal_code, "40111");
        assert!(input.landmark.is_none());
    }
}
