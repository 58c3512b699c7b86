use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use shopbooks_core::{CustomerId, DomainResult, FieldErrors, impl_entity};

const NAME_MAX: usize = 200;

/// A customer of the business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub father_name: Option<String>,
    /// National identity card number.
    pub cnic: Option<String>,
    pub mobile: Option<String>,
    pub resident: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl_entity!(Customer, CustomerId);

/// Input for registering a customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub name: String,
    #[serde(default)]
    pub father_name: Option<String>,
    #[serde(default)]
    pub cnic: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub resident: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    /// Defaults to the creation day.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl CustomerDetails {
    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = FieldErrors::new();
        errors.require("name", &self.name);
        errors.max_len("name", &self.name, NAME_MAX);
        for (field, value) in self.optional_fields() {
            if let Some(v) = value {
                errors.max_len(field, v, NAME_MAX);
            }
        }
        errors.into_result()
    }

    /// Validate and build the stored record.
    pub fn into_customer(self, id: CustomerId, now: DateTime<Utc>) -> DomainResult<Customer> {
        self.validate()?;
        Ok(Customer {
            id,
            name: self.name.trim().to_string(),
            father_name: blank_to_none(self.father_name),
            cnic: blank_to_none(self.cnic),
            mobile: blank_to_none(self.mobile),
            resident: blank_to_none(self.resident),
            address: blank_to_none(self.address),
            city: blank_to_none(self.city),
            date: self.date.unwrap_or_else(|| now.date_naive()),
            created_at: now,
        })
    }

    fn optional_fields(&self) -> [(&'static str, Option<&String>); 6] {
        [
            ("father_name", self.father_name.as_ref()),
            ("cnic", self.cnic.as_ref()),
            ("mobile", self.mobile.as_ref()),
            ("resident", self.resident.as_ref()),
            ("address", self.address.as_ref()),
            ("city", self.city.as_ref()),
        ]
    }
}

/// Partial update; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub father_name: Option<String>,
    #[serde(default)]
    pub cnic: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub resident: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

impl Customer {
    /// Apply a partial update, validating the result as a whole.
    pub fn apply_update(&mut self, update: CustomerUpdate) -> DomainResult<()> {
        let details = CustomerDetails {
            name: update.name.unwrap_or_else(|| self.name.clone()),
            father_name: update.father_name.or_else(|| self.father_name.clone()),
            cnic: update.cnic.or_else(|| self.cnic.clone()),
            mobile: update.mobile.or_else(|| self.mobile.clone()),
            resident: update.resident.or_else(|| self.resident.clone()),
            address: update.address.or_else(|| self.address.clone()),
            city: update.city.or_else(|| self.city.clone()),
            date: Some(self.date),
        };
        let updated = details.into_customer(self.id, self.created_at)?;
        *self = updated;
        Ok(())
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
