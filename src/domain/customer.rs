//! Customers and the fields they expose to message templates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::template::{FieldValue, TemplateData};

/// A stored customer. Optional attributes are absent rather than empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub location: Option<String>,
    pub preferred_product: Option<String>,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

/// Placeholders: `ID`, `FirstName`, `LastName`, `Location`, `PreferredProduct`,
/// `Phone`, `CreatedAt`.
impl TemplateData for Customer {
    fn field(&self, name: &str) -> Option<FieldValue> {
        let value: FieldValue = match name {
            "ID" => self.id.into(),
            "FirstName" => self.first_name.clone().into(),
            "LastName" => self.last_name.clone().into(),
            "Location" => self.location.clone().into(),
            "PreferredProduct" => self.preferred_product.clone().into(),
            "Phone" => self.phone.clone().into(),
            "CreatedAt" => FieldValue::timestamp(self.created_at),
            _ => return None,
        };
        Some(value)
    }
}

/// Fields for a customer about to be stored
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCustomer {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub location: Option<String>,
    pub preferred_product: Option<String>,
    pub phone: String,
}

/// The only customer data a preview reveals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinimalCustomer {
    pub id: i64,
    pub first_name: String,
}

impl From<&Customer> for MinimalCustomer {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id,
            first_name: customer.first_name.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::template::render;

    fn customer() -> Customer {
        Customer {
            id: 7,
            first_name: Some("Mohammed".to_string()),
            last_name: Some("Mwijaa".to_string()),
            location: Some("Mombasa".to_string()),
            preferred_product: Some("White Sneakers".to_string()),
            phone: "+254712832088".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 12, 4, 15, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_customer_template() {
        let template = "Hi {FirstName}, thank you for choosing us. We have {PreferredProduct} in stock at our {Location} store. Call us at {Phone} or visit {NonExistent}.";
        let expected = "Hi Mohammed, thank you for choosing us. We have White Sneakers in stock at our Mombasa store. Call us at +254712832088 or visit {NonExistent}.";
        assert_eq!(render(template, Some(&customer())), expected);
    }

    #[test]
    fn test_customer_missing_optional_field() {
        let mut customer = customer();
        customer.last_name = None;
        assert_eq!(
            render("{FirstName} {LastName}!", Some(&customer)),
            "Mohammed !"
        );
    }

    #[test]
    fn test_customer_id_and_created_at() {
        assert_eq!(
            render("#{ID} since {CreatedAt}", Some(&customer())),
            "#7 since 2024-12-04T15:30:00Z"
        );
    }

    #[test]
    fn test_field_names_are_case_sensitive() {
        assert_eq!(render("{firstname}", Some(&customer())), "{firstname}");
    }

    #[test]
    fn test_minimal_customer() {
        let mut customer = customer();
        assert_eq!(
            MinimalCustomer::from(&customer),
            MinimalCustomer {
                id: 7,
                first_name: "Mohammed".to_string()
            }
        );

        customer.first_name = None;
        assert_eq!(MinimalCustomer::from(&customer).first_name, "");
    }
}
