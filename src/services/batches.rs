use crate::{
    db::DbPool,
    entities::harvest_batch::{self, Entity as BatchEntity},
    entities::inventory_unit::{self, Entity as UnitEntity, UnitStatus},
    entities::product::{self, Entity as ProductEntity},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{Duration, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateBatchRequest {
    pub product_id: i64,
    #[validate(range(min = 1, max = 10000, message = "Quantity must be between 1 and 10000"))]
    pub quantity: i32,
    pub batch_date: NaiveDate,
    /// Overrides the product's default shelf life when present.
    pub shelf_life_days: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchResponse {
    #[serde(flatten)]
    pub batch: harvest_batch::Model,
    pub available_units: u64,
}

/// Creates harvest batches and their burst of serialized inventory units.
#[derive(Clone)]
pub struct BatchService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl BatchService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a batch and `quantity` Available units. The batch code is
    /// derived from the row id after insert, never from a row count.
    #[instrument(skip(self, request), fields(product_id = request.product_id, quantity = request.quantity))]
    pub async fn create_batch(
        &self,
        request: CreateBatchRequest,
    ) -> Result<harvest_batch::Model, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for batch creation");
            ServiceError::DatabaseError(e)
        })?;

        let product = ProductEntity::find_by_id(request.product_id)
            .filter(product::Column::Deleted.eq(false))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("product {}", request.product_id)))?;

        let shelf_life = request.shelf_life_days.or(product.shelf_life_days);
        if matches!(shelf_life, Some(days) if days < 0) {
            return Err(ServiceError::ValidationError(
                "shelf_life_days must not be negative".into(),
            ));
        }
        let expiry_date = shelf_life.map(|days| request.batch_date + Duration::days(days as i64));

        // Placeholder code first; the durable id decides the real one.
        let inserted = harvest_batch::ActiveModel {
            batch_code: Set(format!("B-PENDING-{}", Uuid::new_v4())),
            product_id: Set(product.id),
            batch_date: Set(request.batch_date),
            shelf_life_days: Set(shelf_life),
            expiry_date: Set(expiry_date),
            total_units: Set(request.quantity),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let batch_code = format!(
            "B-{}-{}",
            request.batch_date.format("%Y%m%d"),
            inserted.id
        );
        let mut active: harvest_batch::ActiveModel = inserted.into();
        active.batch_code = Set(batch_code.clone());
        let batch = active.update(&txn).await?;

        let now = Utc::now();
        let units: Vec<inventory_unit::ActiveModel> = (1..=request.quantity)
            .map(|seq| inventory_unit::ActiveModel {
                serial_code: Set(format!("{}-{}", batch_code, seq)),
                batch_id: Set(batch.id),
                status: Set(UnitStatus::Available),
                sales_order_id: Set(None),
                sold_price: Set(None),
                created_at: Set(now),
                ..Default::default()
            })
            .collect();

        UnitEntity::insert_many(units).exec(&txn).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit batch creation transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            batch_id = batch.id,
            batch_code = %batch.batch_code,
            unit_count = request.quantity,
            "Batch created"
        );

        if let Err(e) = self
            .event_sender
            .send(Event::BatchCreated {
                batch_id: batch.id,
                batch_code: batch.batch_code.clone(),
                unit_count: request.quantity,
            })
            .await
        {
            warn!(error = %e, batch_id = batch.id, "Failed to send batch created event");
        }

        Ok(batch)
    }

    /// Moves the batch date and recomputes the expiry from the stored shelf
    /// life.
    #[instrument(skip(self))]
    pub async fn update_batch_date(
        &self,
        batch_id: i64,
        batch_date: NaiveDate,
    ) -> Result<harvest_batch::Model, ServiceError> {
        let db = &*self.db_pool;
        let batch = BatchEntity::find_by_id(batch_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("batch {}", batch_id)))?;

        let expiry = batch
            .shelf_life_days
            .map(|days| batch_date + Duration::days(days as i64));

        let mut active: harvest_batch::ActiveModel = batch.into();
        active.batch_date = Set(batch_date);
        active.expiry_date = Set(expiry);
        let updated = active.update(db).await?;

        info!(batch_id, %batch_date, "Batch date updated");
        Ok(updated)
    }

    /// Deletes a batch and its units. Refused once any unit has left the
    /// Available state, because sold/returned units carry ledger history.
    #[instrument(skip(self))]
    pub async fn delete_batch(&self, batch_id: i64) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let batch = BatchEntity::find_by_id(batch_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("batch {}", batch_id)))?;

        let moved = UnitEntity::find()
            .filter(inventory_unit::Column::BatchId.eq(batch_id))
            .filter(inventory_unit::Column::Status.ne(UnitStatus::Available))
            .count(&txn)
            .await?;
        if moved > 0 {
            return Err(ServiceError::InvalidState(format!(
                "batch {} has {} unit(s) no longer available",
                batch.batch_code, moved
            )));
        }

        UnitEntity::delete_many()
            .filter(inventory_unit::Column::BatchId.eq(batch_id))
            .exec(&txn)
            .await?;
        batch.delete(&txn).await?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(batch_id, "Batch deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_batch(&self, batch_id: i64) -> Result<BatchResponse, ServiceError> {
        let db = &*self.db_pool;
        let batch = BatchEntity::find_by_id(batch_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("batch {}", batch_id)))?;

        let available_units = UnitEntity::find()
            .filter(inventory_unit::Column::BatchId.eq(batch_id))
            .filter(inventory_unit::Column::Status.eq(UnitStatus::Available))
            .count(db)
            .await?;

        Ok(BatchResponse {
            batch,
            available_units,
        })
    }

    #[instrument(skip(self))]
    pub async fn list_batches(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<harvest_batch::Model>, u64), ServiceError> {
        let db = &*self.db_pool;
        let paginator = BatchEntity::find()
            .order_by_desc(harvest_batch::Column::BatchDate)
            .paginate(db, per_page);

        let total = paginator.num_items().await?;
        let batches = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((batches, total))
    }
}
