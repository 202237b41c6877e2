use crate::{
    db::DbPool,
    entities::credit_note,
    entities::customer::Entity as CustomerEntity,
    entities::inventory_unit::{self, Entity as UnitEntity, UnitStatus},
    entities::invoice::{self, Entity as InvoiceEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{payments, round2},
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ProcessReturnRequest {
    #[validate(length(min = 1, message = "Unit code is required"))]
    pub unit_code: String,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReturnOutcome {
    pub unit: inventory_unit::Model,
    pub credit_note: credit_note::Model,
}

/// Handles goods coming back after sale. A return credits the unit's sale
/// price with its proportional share of the invoice tax; what the customer
/// can do with that credit depends on who they are.
#[derive(Clone)]
pub struct ReturnsService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl ReturnsService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Accepts a sold unit back and issues the credit note. The unit moves to
    /// Returned and keeps its sold price for the restock/spoil decision; the
    /// note records the unit's price and its proportional tax share.
    ///
    /// Retail customers get their refund in cash at the counter, so their
    /// note is recorded already spent.
    #[instrument(skip(self, request), fields(unit_code = %request.unit_code))]
    pub async fn process_return(
        &self,
        request: ProcessReturnRequest,
    ) -> Result<ReturnOutcome, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for return");
            ServiceError::DatabaseError(e)
        })?;

        let unit = UnitEntity::find()
            .filter(inventory_unit::Column::SerialCode.eq(request.unit_code.as_str()))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("unit {}", request.unit_code)))?;

        if unit.status != UnitStatus::Sold {
            return Err(ServiceError::InvalidState(format!(
                "unit {} is {}, only sold units can be returned",
                unit.serial_code, unit.status
            )));
        }
        let order_id = unit.sales_order_id.ok_or_else(|| {
            ServiceError::InvalidState(format!(
                "unit {} is sold but not linked to an order",
                unit.serial_code
            ))
        })?;

        let inv = InvoiceEntity::find()
            .filter(invoice::Column::SalesOrderId.eq(order_id))
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidState(format!("order {} has no invoice", order_id))
            })?;

        let customer = CustomerEntity::find_by_id(inv.customer_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("customer {}", inv.customer_id)))?;

        let price = match unit.sold_price {
            Some(p) => p,
            None => {
                // Unit sold before per-unit prices were kept; fall back to
                // an even split of the invoice total.
                let unit_count = UnitEntity::find()
                    .filter(inventory_unit::Column::SalesOrderId.eq(order_id))
                    .count(&txn)
                    .await?
                    .max(1);
                round2(inv.total_amount / Decimal::from(unit_count))
            }
        };

        let tax_share = if inv.total_amount > Decimal::ZERO {
            round2(inv.tax_amount * price / inv.total_amount)
        } else {
            Decimal::ZERO
        };

        let remaining = if customer.is_retail() {
            Decimal::ZERO
        } else {
            price
        };
        let reason = request
            .reason
            .unwrap_or_else(|| format!("Return of unit {}", unit.serial_code));

        let note = payments::issue_credit_note(
            &txn,
            customer.id,
            price,
            tax_share,
            remaining,
            Some(inv.id),
            None,
            Some(reason),
        )
        .await?;

        let serial_code = unit.serial_code.clone();
        let mut active: inventory_unit::ActiveModel = unit.into();
        active.status = Set(UnitStatus::Returned);
        active.sales_order_id = Set(None);
        let unit = active.update(&txn).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit return transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            unit_code = %serial_code,
            credit_note_id = note.id,
            refund = %note.amount,
            "Return processed"
        );

        if let Err(e) = self
            .event_sender
            .send(Event::ReturnProcessed {
                invoice_id: inv.id,
                credit_note_id: note.id,
                refund_amount: note.amount,
            })
            .await
        {
            warn!(error = %e, credit_note_id = note.id, "Failed to send return processed event");
        }

        Ok(ReturnOutcome {
            unit,
            credit_note: note,
        })
    }
}
