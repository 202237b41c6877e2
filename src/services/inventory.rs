use crate::{
    db::DbPool,
    entities::harvest_batch::Entity as BatchEntity,
    entities::inventory_unit::{self, Entity as UnitEntity, UnitStatus},
    entities::product::Entity as ProductEntity,
    entities::sales_order::{Entity as OrderEntity, OrderType},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Claims and releases individual inventory units against sales orders.
///
/// Allocation is the one genuinely contended path in the system: two pickers
/// can scan the same barcode at the same time, so the unit row is read under
/// an exclusive lock for the duration of the check-and-set.
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl InventoryService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Allocates the unit identified by `unit_code` to the order. Re-scanning
    /// a unit already allocated to the same order is a no-op success.
    #[instrument(skip(self), fields(order_id, unit_code = %unit_code))]
    pub async fn allocate(
        &self,
        order_id: i64,
        unit_code: &str,
    ) -> Result<inventory_unit::Model, ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for unit allocation");
            ServiceError::DatabaseError(e)
        })?;

        let order = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order {}", order_id)))?;
        if order.is_closed() {
            return Err(ServiceError::InvalidState(format!(
                "order {} is {}",
                order.order_number, order.status
            )));
        }

        // Exclusive lock on the single unit row so a concurrent scan of the
        // same barcode serializes behind this check-and-set.
        let unit = UnitEntity::find()
            .filter(inventory_unit::Column::SerialCode.eq(unit_code))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("unit {}", unit_code)))?;

        if unit.status == UnitStatus::Allocated && unit.sales_order_id == Some(order_id) {
            // Idempotent re-scan of one's own item.
            txn.commit().await.map_err(ServiceError::DatabaseError)?;
            return Ok(unit);
        }

        if unit.status != UnitStatus::Available {
            return Err(ServiceError::BusinessRule(format!(
                "unit {} is not available ({})",
                unit.serial_code, unit.status
            )));
        }

        let batch = BatchEntity::find_by_id(unit.batch_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("batch {}", unit.batch_id)))?;
        if batch.is_expired(Utc::now().date_naive()) {
            return Err(ServiceError::BusinessRule(format!(
                "unit {} belongs to expired batch {}",
                unit.serial_code, batch.batch_code
            )));
        }

        let product = ProductEntity::find_by_id(batch.product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("product {}", batch.product_id)))?;

        // Missing catalog price allocates at zero; a draft-order price edit
        // can correct it before finalize.
        let sold_price = match order.order_type {
            OrderType::Retail => product.retail_price,
            OrderType::Wholesale => product.wholesale_price,
        }
        .unwrap_or(Decimal::ZERO);

        let mut active: inventory_unit::ActiveModel = unit.into();
        active.status = Set(UnitStatus::Allocated);
        active.sales_order_id = Set(Some(order_id));
        active.sold_price = Set(Some(sold_price));
        let updated = active.update(&txn).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit unit allocation transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            unit_id = updated.id,
            order_id,
            %sold_price,
            "Unit allocated"
        );

        if let Err(e) = self
            .event_sender
            .send(Event::UnitAllocated {
                order_id,
                unit_id: updated.id,
            })
            .await
        {
            warn!(error = %e, unit_id = updated.id, "Failed to send unit allocated event");
        }

        Ok(updated)
    }

    /// Releases an allocated unit back to Available. A no-op unless the unit
    /// is currently Allocated; refused when the owning order is closed.
    #[instrument(skip(self))]
    pub async fn release(&self, unit_id: i64) -> Result<inventory_unit::Model, ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let unit = UnitEntity::find_by_id(unit_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("unit {}", unit_id)))?;

        if unit.status != UnitStatus::Allocated {
            txn.commit().await.map_err(ServiceError::DatabaseError)?;
            return Ok(unit);
        }

        if let Some(order_id) = unit.sales_order_id {
            let order = OrderEntity::find_by_id(order_id)
                .one(&txn)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("order {}", order_id)))?;
            if order.is_closed() {
                return Err(ServiceError::InvalidState(format!(
                    "order {} is {}",
                    order.order_number, order.status
                )));
            }
        }

        let order_id = unit.sales_order_id;
        let mut active: inventory_unit::ActiveModel = unit.into();
        active.status = Set(UnitStatus::Available);
        active.sales_order_id = Set(None);
        active.sold_price = Set(None);
        let updated = active.update(&txn).await?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(unit_id, "Unit released");

        if let Some(order_id) = order_id {
            if let Err(e) = self
                .event_sender
                .send(Event::UnitReleased { order_id, unit_id })
                .await
            {
                warn!(error = %e, unit_id, "Failed to send unit released event");
            }
        }

        Ok(updated)
    }

    /// Puts a Returned unit back on the shelf.
    #[instrument(skip(self))]
    pub async fn restock_unit(&self, unit_id: i64) -> Result<inventory_unit::Model, ServiceError> {
        self.transition_returned_unit(unit_id, UnitStatus::Available)
            .await
    }

    /// Writes off a Returned unit.
    #[instrument(skip(self))]
    pub async fn spoil_unit(&self, unit_id: i64) -> Result<inventory_unit::Model, ServiceError> {
        self.transition_returned_unit(unit_id, UnitStatus::Spoiled)
            .await
    }

    async fn transition_returned_unit(
        &self,
        unit_id: i64,
        target: UnitStatus,
    ) -> Result<inventory_unit::Model, ServiceError> {
        let db = &*self.db_pool;

        let unit = UnitEntity::find_by_id(unit_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("unit {}", unit_id)))?;

        if unit.status != UnitStatus::Returned {
            return Err(ServiceError::InvalidState(format!(
                "unit {} is {}, only returned units may be restocked or spoiled",
                unit.serial_code, unit.status
            )));
        }

        let mut active: inventory_unit::ActiveModel = unit.into();
        active.status = Set(target);
        active.sales_order_id = Set(None);
        active.sold_price = Set(None);
        let updated = active.update(db).await?;

        info!(unit_id, status = %target, "Returned unit transitioned");

        let event = match target {
            UnitStatus::Available => Event::UnitRestocked(unit_id),
            _ => Event::UnitSpoiled(unit_id),
        };
        if let Err(e) = self.event_sender.send(event).await {
            warn!(error = %e, unit_id, "Failed to send unit transition event");
        }

        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn get_unit_by_code(
        &self,
        unit_code: &str,
    ) -> Result<inventory_unit::Model, ServiceError> {
        let db = &*self.db_pool;
        UnitEntity::find()
            .filter(inventory_unit::Column::SerialCode.eq(unit_code))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("unit {}", unit_code)))
    }
}
