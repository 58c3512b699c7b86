use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopbooks_core::money::check_non_negative;
use shopbooks_core::{CategoryId, DomainError, DomainResult, FieldErrors, ProductId, impl_entity};

const CATEGORY_NAME_MAX: usize = 100;
const PRODUCT_NAME_MAX: usize = 200;

/// Product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub date: NaiveDate,
}

impl_entity!(Category, CategoryId);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDetails {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl CategoryDetails {
    pub fn into_category(self, id: CategoryId, today: NaiveDate) -> DomainResult<Category> {
        let mut errors = FieldErrors::new();
        errors.require("name", &self.name);
        errors.max_len("name", &self.name, CATEGORY_NAME_MAX);
        errors.into_result()?;

        Ok(Category {
            id,
            name: self.name.trim().to_string(),
            description: self.description,
            date: self.date.unwrap_or(today),
        })
    }
}

/// A product in the catalog.
///
/// `stock` is a cached counter maintained by stock movements. The authoritative
/// quantity is always derived from movement history; see
/// `shopbooks_inventory::StockLevel`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub name: String,
    pub stock: i64,
    pub buying_price: Decimal,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl_entity!(Product, ProductId);

/// Input for creating a product. New products start with zero stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDetails {
    pub category_id: CategoryId,
    pub name: String,
    pub buying_price: Decimal,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl ProductDetails {
    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = FieldErrors::new();
        errors.require("name", &self.name);
        errors.max_len("name", &self.name, PRODUCT_NAME_MAX);
        check_non_negative(&mut errors, "buying_price", self.buying_price);
        errors.into_result()
    }

    pub fn into_product(self, id: ProductId, now: DateTime<Utc>) -> DomainResult<Product> {
        self.validate()?;
        Ok(Product {
            id,
            category_id: self.category_id,
            name: self.name.trim().to_string(),
            stock: 0,
            buying_price: self.buying_price,
            date: self.date.unwrap_or_else(|| now.date_naive()),
            created_at: now,
        })
    }
}

/// Partial update. The stock counter is deliberately absent: it only moves
/// through stock movements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUpdate {
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub buying_price: Option<Decimal>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl Product {
    pub fn apply_update(&mut self, update: ProductUpdate) -> DomainResult<()> {
        let details = ProductDetails {
            category_id: update.category_id.unwrap_or(self.category_id),
            name: update.name.unwrap_or_else(|| self.name.clone()),
            buying_price: update.buying_price.unwrap_or(self.buying_price),
            date: Some(update.date.unwrap_or(self.date)),
        };
        details.validate()?;

        self.category_id = details.category_id;
        self.name = details.name.trim().to_string();
        self.buying_price = details.buying_price;
        self.date = details.date.unwrap_or(self.date);
        Ok(())
    }

    /// Cached counter after moving it by `delta`, floored at zero.
    ///
    /// The floor hides overselling from the counter; the movement history still
    /// records the full quantity.
    pub fn stock_after(&self, delta: i64) -> DomainResult<i64> {
        self.stock
            .checked_add(delta)
            .map(|s| s.max(0))
            .ok_or_else(|| {
                DomainError::invariant(format!("stock of product {} is out of range", self.id))
            })
    }
}
