use crate::{
    db::DbPool,
    entities::customer::{self, CustomerType, Entity as CustomerEntity},
    entities::product::{self, Entity as ProductEntity},
    errors::ServiceError,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, message = "Customer name is required"))]
    pub name: String,
    pub customer_type: CustomerType,
    #[serde(default)]
    pub is_hidden: bool,
    pub credit_limit: Option<Decimal>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, message = "Product name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "SKU is required"))]
    pub sku: String,
    #[validate(length(min = 1, message = "Unit of measure is required"))]
    pub unit_of_measure: String,
    pub shelf_life_days: Option<i32>,
    pub retail_price: Option<Decimal>,
    pub wholesale_price: Option<Decimal>,
}

/// Minimal customer/product catalog. Both entity kinds are soft-deleted so
/// ledger history stays intact.
#[derive(Clone)]
pub struct CatalogService {
    db_pool: Arc<DbPool>,
}

impl CatalogService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<customer::Model, ServiceError> {
        request.validate()?;

        if let Some(limit) = request.credit_limit {
            if limit < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "credit_limit must not be negative".into(),
                ));
            }
        }

        let db = &*self.db_pool;
        let model = customer::ActiveModel {
            name: Set(request.name),
            customer_type: Set(request.customer_type),
            is_hidden: Set(request.is_hidden),
            credit_limit: Set(request.credit_limit),
            phone: Set(request.phone),
            email: Set(request.email),
            address: Set(request.address),
            deleted: Set(false),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to create customer");
            ServiceError::DatabaseError(e)
        })?;

        info!(customer_id = model.id, "Customer created");
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn get_customer(&self, customer_id: i64) -> Result<customer::Model, ServiceError> {
        let db = &*self.db_pool;
        CustomerEntity::find_by_id(customer_id)
            .filter(customer::Column::Deleted.eq(false))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("customer {}", customer_id)))
    }

    /// Lists visible (non-hidden, non-deleted) customers.
    #[instrument(skip(self))]
    pub async fn list_customers(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<customer::Model>, u64), ServiceError> {
        let db = &*self.db_pool;
        let paginator = CustomerEntity::find()
            .filter(customer::Column::Deleted.eq(false))
            .filter(customer::Column::IsHidden.eq(false))
            .order_by_asc(customer::Column::Name)
            .paginate(db, per_page);

        let total = paginator.num_items().await?;
        let customers = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((customers, total))
    }

    #[instrument(skip(self))]
    pub async fn delete_customer(&self, customer_id: i64) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let existing = self.get_customer(customer_id).await?;

        let mut active: customer::ActiveModel = existing.into();
        active.deleted = Set(true);
        active.update(db).await?;

        info!(customer_id, "Customer soft-deleted");
        Ok(())
    }

    #[instrument(skip(self, request), fields(sku = %request.sku))]
    pub async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        request.validate()?;

        for (field, price) in [
            ("retail_price", request.retail_price),
            ("wholesale_price", request.wholesale_price),
        ] {
            if matches!(price, Some(p) if p < Decimal::ZERO) {
                return Err(ServiceError::ValidationError(format!(
                    "{} must not be negative",
                    field
                )));
            }
        }

        let db = &*self.db_pool;

        let duplicate = ProductEntity::find()
            .filter(product::Column::Sku.eq(request.sku.clone()))
            .one(db)
            .await?;
        if duplicate.is_some() {
            return Err(ServiceError::Conflict(format!(
                "product with SKU {} already exists",
                request.sku
            )));
        }

        let model = product::ActiveModel {
            name: Set(request.name),
            sku: Set(request.sku),
            unit_of_measure: Set(request.unit_of_measure),
            shelf_life_days: Set(request.shelf_life_days),
            retail_price: Set(request.retail_price),
            wholesale_price: Set(request.wholesale_price),
            deleted: Set(false),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to create product");
            ServiceError::DatabaseError(e)
        })?;

        info!(product_id = model.id, sku = %model.sku, "Product created");
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: i64) -> Result<product::Model, ServiceError> {
        let db = &*self.db_pool;
        ProductEntity::find_by_id(product_id)
            .filter(product::Column::Deleted.eq(false))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("product {}", product_id)))
    }

    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        let db = &*self.db_pool;
        let paginator = ProductEntity::find()
            .filter(product::Column::Deleted.eq(false))
            .order_by_asc(product::Column::Name)
            .paginate(db, per_page);

        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((products, total))
    }
}
