use chrono::Utc;
use tracing::{info, instrument};

use shopbooks_core::{CategoryId, DomainError, ProductId};
use shopbooks_products::{Category, CategoryDetails, Product, ProductDetails, ProductUpdate};

use super::{BackOffice, require_product};
use crate::error::{StoreError, StoreResult};
use crate::repository::{CatalogRepository, Transaction};

async fn require_category(tx: &mut dyn Transaction, id: CategoryId) -> StoreResult<Category> {
    tx.category(id)
        .await?
        .ok_or_else(|| StoreError::not_found(format!("category {id}")))
}

impl BackOffice {
    pub async fn create_category(&self, details: CategoryDetails) -> StoreResult<Category> {
        let category = details.into_category(CategoryId::new(), Utc::now().date_naive())?;

        let mut tx = self.begin().await?;
        tx.insert_category(&category).await?;
        tx.commit().await?;
        Ok(category)
    }

    pub async fn categories(&self) -> StoreResult<Vec<Category>> {
        let mut tx = self.begin().await?;
        tx.categories().await
    }

    /// New products start with a cached stock of zero; stock arrives through
    /// stock-ins.
    pub async fn create_product(&self, details: ProductDetails) -> StoreResult<Product> {
        details.validate()?;

        let mut tx = self.begin().await?;
        require_category(tx.as_mut(), details.category_id).await?;
        let product = details.into_product(ProductId::new(), Utc::now())?;
        tx.insert_product(&product).await?;
        tx.commit().await?;

        info!(product_id = %product.id, name = %product.name, "product created");
        Ok(product)
    }

    /// Edit descriptive fields. The cached stock counter is left alone.
    pub async fn update_product(&self, id: ProductId, update: ProductUpdate) -> StoreResult<Product> {
        let mut tx = self.begin().await?;
        let mut product = require_product(tx.as_mut(), id).await?;
        if let Some(category) = update.category_id {
            require_category(tx.as_mut(), category).await?;
        }
        product.apply_update(update)?;
        tx.update_product(&product).await?;
        tx.commit().await?;
        Ok(product)
    }

    pub async fn product(&self, id: ProductId) -> StoreResult<Product> {
        let mut tx = self.begin().await?;
        require_product(tx.as_mut(), id).await
    }

    pub async fn products(&self) -> StoreResult<Vec<Product>> {
        let mut tx = self.begin().await?;
        tx.products().await
    }

    /// Delete a product and its stock movements. Products that appear on an
    /// invoice cannot be deleted.
    #[instrument(skip(self), err)]
    pub async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        let mut tx = self.begin().await?;
        require_product(tx.as_mut(), id).await?;
        if tx.product_is_invoiced(id).await? {
            return Err(DomainError::conflict(format!(
                "product {id} is referenced by invoice items"
            ))
            .into());
        }
        tx.delete_product(id).await?;
        tx.commit().await?;
        info!(product_id = %id, "product deleted");
        Ok(())
    }
}
