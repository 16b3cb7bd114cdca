use std::sync::Arc;

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, SqlErr,
};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::entities::{
    manufacturer::Entity as ManufacturerEntity, product, product::Entity as ProductEntity,
    product_category, product_category::Entity as ProductCategoryEntity,
};
use crate::errors::ServiceError;

/// Optional field updates for an existing product.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub category_id: Option<i64>,
    pub default_batch_size: Option<i32>,
}

/// Product and category management.
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Returns the category with this name, creating it when absent.
    /// A concurrent duplicate insert is recovered by re-reading the row the
    /// other writer created.
    #[instrument(skip(self))]
    pub async fn get_or_create_category(
        &self,
        name: &str,
    ) -> Result<product_category::Model, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::Validation(
                "Category name cannot be empty".to_string(),
            ));
        }

        if let Some(existing) = ProductCategoryEntity::find()
            .filter(product_category::Column::Name.eq(name))
            .one(&*self.db)
            .await?
        {
            return Ok(existing);
        }

        let inserted = product_category::ActiveModel {
            name: Set(name.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await;

        match inserted {
            Ok(created) => {
                info!(category_id = created.category_id, "Product category created");
                Ok(created)
            }
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                ProductCategoryEntity::find()
                    .filter(product_category::Column::Name.eq(name))
                    .one(&*self.db)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::Duplicate(format!("Category '{}' vanished after insert race", name))
                    })
            }
            Err(e) => Err(ServiceError::Storage(e)),
        }
    }

    #[instrument(skip(self))]
    pub async fn create_product(
        &self,
        manufacturer_id: i64,
        category_id: i64,
        name: &str,
        default_batch_size: i32,
    ) -> Result<product::Model, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::Validation(
                "Product name cannot be empty".to_string(),
            ));
        }
        if default_batch_size <= 0 {
            return Err(ServiceError::Validation(format!(
                "Default batch size must be positive, got {}",
                default_batch_size
            )));
        }

        ManufacturerEntity::find_by_id(manufacturer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Manufacturer {} not found", manufacturer_id))
            })?;
        ProductCategoryEntity::find_by_id(category_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", category_id)))?;

        let now = Utc::now();
        let created = product::ActiveModel {
            manufacturer_id: Set(manufacturer_id),
            category_id: Set(category_id),
            name: Set(name.to_string()),
            default_batch_size: Set(default_batch_size),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(product_id = created.product_id, "Product created");
        Ok(created)
    }

    /// Updates a product the manufacturer owns; `NotFound` when it exists
    /// but belongs to someone else.
    #[instrument(skip(self))]
    pub async fn update_product(
        &self,
        product_id: i64,
        manufacturer_id: i64,
        update: UpdateProductInput,
    ) -> Result<product::Model, ServiceError> {
        let existing = ProductEntity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .filter(|p| p.manufacturer_id == manufacturer_id)
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Product {} not found for manufacturer {}",
                    product_id, manufacturer_id
                ))
            })?;

        if let Some(batch_size) = update.default_batch_size {
            if batch_size <= 0 {
                return Err(ServiceError::Validation(format!(
                    "Default batch size must be positive, got {}",
                    batch_size
                )));
            }
        }
        if let Some(category_id) = update.category_id {
            ProductCategoryEntity::find_by_id(category_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Category {} not found", category_id))
                })?;
        }

        let mut active = existing.into_active_model();
        if let Some(name) = update.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(ServiceError::Validation(
                    "Product name cannot be empty".to_string(),
                ));
            }
            active.name = Set(name);
        }
        if let Some(category_id) = update.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(batch_size) = update.default_batch_size {
            active.default_batch_size = Set(batch_size);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        manufacturer_id: i64,
    ) -> Result<Vec<product::Model>, ServiceError> {
        Ok(ProductEntity::find()
            .filter(product::Column::ManufacturerId.eq(manufacturer_id))
            .order_by_asc(product::Column::Name)
            .all(&*self.db)
            .await?)
    }
}
