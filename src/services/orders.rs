use crate::{
    db::DbPool,
    entities::credit_note::{self, Entity as CreditNoteEntity},
    entities::customer::Entity as CustomerEntity,
    entities::harvest_batch::{self, Entity as BatchEntity},
    entities::inventory_unit::{self, Entity as UnitEntity, UnitStatus},
    entities::invoice::{self, Entity as InvoiceEntity, InvoiceStatus},
    entities::payment::{self, PaymentMethod},
    entities::payment_allocation,
    entities::sales_order::{self, Entity as OrderEntity, OrderStatus, OrderType},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{derive_invoice_status, payments, round2},
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub customer_id: i64,
    pub order_type: OrderType,
    /// Whole-order discount in percent. Editable while the order is a draft.
    #[serde(default)]
    pub discount_percent: Option<Decimal>,
    pub payment_method_hint: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FinalizeOrderRequest {
    pub is_paid: bool,
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: sales_order::Model,
    pub units: Vec<inventory_unit::Model>,
}

/// Owns the sales-order state machine: draft picking, pricing edits,
/// finalize (invoice generation) and cancellation.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
    /// Tax rate applied to tax-inclusive order totals at finalize.
    tax_rate: Decimal,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender, tax_rate: Decimal) -> Self {
        Self {
            db_pool,
            event_sender,
            tax_rate,
        }
    }

    #[instrument(skip(self, request), fields(customer_id = request.customer_id))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<sales_order::Model, ServiceError> {
        request.validate()?;

        let discount = request.discount_percent.unwrap_or(Decimal::ZERO);
        validate_discount(discount)?;

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for order creation");
            ServiceError::DatabaseError(e)
        })?;

        let customer = CustomerEntity::find_by_id(request.customer_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("customer {}", request.customer_id)))?;
        if customer.deleted {
            return Err(ServiceError::InvalidState(format!(
                "customer {} is deleted",
                customer.id
            )));
        }

        let inserted = sales_order::ActiveModel {
            order_number: Set(format!("SO-PENDING-{}", Uuid::new_v4())),
            customer_id: Set(customer.id),
            order_type: Set(request.order_type),
            status: Set(OrderStatus::Draft),
            discount_percent: Set(discount),
            payment_method_hint: Set(request.payment_method_hint),
            order_date: Set(Utc::now().date_naive()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let order_id = inserted.id;
        let mut active: sales_order::ActiveModel = inserted.into();
        active.order_number = Set(format!("SO-{:05}", order_id));
        let order = active.update(&txn).await?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(order_id = order.id, order_number = %order.order_number, "Order created");

        if let Err(e) = self.event_sender.send(Event::OrderCreated(order.id)).await {
            warn!(error = %e, order_id = order.id, "Failed to send order created event");
        }

        Ok(order)
    }

    /// Sets the whole-order discount. Draft orders only.
    #[instrument(skip(self))]
    pub async fn update_order_discount(
        &self,
        order_id: i64,
        discount_percent: Decimal,
    ) -> Result<sales_order::Model, ServiceError> {
        validate_discount(discount_percent)?;

        let db = &*self.db_pool;
        let order = self.load_draft(db, order_id).await?;

        let mut active: sales_order::ActiveModel = order.into();
        active.discount_percent = Set(discount_percent);
        let updated = active.update(db).await?;

        info!(order_id, %discount_percent, "Order discount updated");

        if let Err(e) = self.event_sender.send(Event::OrderUpdated(order_id)).await {
            warn!(error = %e, order_id, "Failed to send order updated event");
        }

        Ok(updated)
    }

    /// Overrides the sale price of every allocated unit of `product_id` on a
    /// draft order. Used to correct units that allocated at a missing or
    /// stale catalog price.
    #[instrument(skip(self))]
    pub async fn update_product_price(
        &self,
        order_id: i64,
        product_id: i64,
        price: Decimal,
    ) -> Result<u64, ServiceError> {
        if price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "price must not be negative".into(),
            ));
        }

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        self.load_draft(&txn, order_id).await?;

        let batch_ids: Vec<i64> = BatchEntity::find()
            .filter(harvest_batch::Column::ProductId.eq(product_id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|b| b.id)
            .collect();

        let result = UnitEntity::update_many()
            .col_expr(
                inventory_unit::Column::SoldPrice,
                sea_orm::sea_query::Expr::value(round2(price)),
            )
            .filter(inventory_unit::Column::SalesOrderId.eq(order_id))
            .filter(inventory_unit::Column::Status.eq(UnitStatus::Allocated))
            .filter(inventory_unit::Column::BatchId.is_in(batch_ids))
            .exec(&txn)
            .await?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(
            order_id,
            product_id,
            %price,
            updated = result.rows_affected,
            "Order product price updated"
        );

        if let Err(e) = self.event_sender.send(Event::OrderUpdated(order_id)).await {
            warn!(error = %e, order_id, "Failed to send order updated event");
        }

        Ok(result.rows_affected)
    }

    /// Turns a draft order into an invoice, optionally recording the
    /// customer's payment in the same transaction.
    ///
    /// The customer row is locked exclusively while the credit limit is
    /// checked so two concurrent finalizes cannot both pass against a stale
    /// outstanding balance.
    #[instrument(skip(self, request), fields(order_id, is_paid = request.is_paid))]
    pub async fn finalize_order(
        &self,
        order_id: i64,
        request: FinalizeOrderRequest,
    ) -> Result<invoice::Model, ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for order finalize");
            ServiceError::DatabaseError(e)
        })?;

        let order = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order {}", order_id)))?;
        if order.status != OrderStatus::Draft {
            return Err(ServiceError::InvalidState(format!(
                "order {} is {}",
                order.order_number, order.status
            )));
        }

        let customer = CustomerEntity::find_by_id(order.customer_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("customer {}", order.customer_id)))?;

        let units = UnitEntity::find()
            .filter(inventory_unit::Column::SalesOrderId.eq(order_id))
            .filter(inventory_unit::Column::Status.eq(UnitStatus::Allocated))
            .all(&txn)
            .await?;
        if units.is_empty() {
            return Err(ServiceError::ValidationError(format!(
                "order {} has no allocated units",
                order.order_number
            )));
        }

        let mut subtotal = Decimal::ZERO;
        for unit in &units {
            match unit.sold_price {
                Some(price) if price > Decimal::ZERO => subtotal += price,
                _ => {
                    return Err(ServiceError::ValidationError(format!(
                        "unit {} has no sale price",
                        unit.serial_code
                    )))
                }
            }
        }

        let discount_factor =
            (Decimal::ONE_HUNDRED - order.discount_percent) / Decimal::ONE_HUNDRED;
        let total = round2(subtotal * discount_factor).max(Decimal::ZERO);

        if customer.is_retail() && !request.is_paid {
            return Err(ServiceError::BusinessRule(format!(
                "customer {} must prepay in full",
                customer.name
            )));
        }

        if !request.is_paid {
            if let Some(limit) = customer.credit_limit {
                let outstanding = self.outstanding_balance(&txn, customer.id).await?;
                if outstanding + total > limit {
                    return Err(ServiceError::BusinessRule(format!(
                        "credit limit exceeded: outstanding {} + order {} > limit {}",
                        outstanding, total, limit
                    )));
                }
            }
        }

        // Totals are tax-inclusive; the tax share is carved out for
        // reporting and proportional return credits.
        let tax_amount = if self.tax_rate > Decimal::ZERO {
            round2(total * self.tax_rate / (Decimal::ONE + self.tax_rate))
        } else {
            Decimal::ZERO
        };
        let net_amount = total - tax_amount;

        let today = Utc::now().date_naive();
        let inserted = invoice::ActiveModel {
            invoice_number: Set(format!("INV-PENDING-{}", Uuid::new_v4())),
            sales_order_id: Set(order_id),
            customer_id: Set(customer.id),
            invoice_date: Set(today),
            total_amount: Set(total),
            tax_amount: Set(tax_amount),
            net_amount: Set(net_amount),
            amount_paid: Set(Decimal::ZERO),
            balance_due: Set(total),
            status: Set(derive_invoice_status(total, total)),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let invoice_id = inserted.id;
        let mut active: invoice::ActiveModel = inserted.into();
        active.invoice_number = Set(format!("INV-{:05}", invoice_id));
        let mut inv = active.update(&txn).await?;

        let mut auto_payment_id = None;
        if request.is_paid && total > Decimal::ZERO {
            let method = request.payment_method.unwrap_or(PaymentMethod::Cash);
            let pay = payment::ActiveModel {
                customer_id: Set(customer.id),
                amount: Set(total),
                payment_date: Set(today),
                method: Set(method),
                reference: Set(Some(format!("auto payment for {}", inv.invoice_number))),
                reversed: Set(false),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;

            // Allocated directly to the new invoice rather than through the
            // waterfall: prepayment belongs to this sale, not to older debt.
            payment_allocation::ActiveModel {
                payment_id: Set(pay.id),
                invoice_id: Set(inv.id),
                amount: Set(total),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;

            let mut inv_active: invoice::ActiveModel = inv.into();
            inv_active.amount_paid = Set(total);
            inv_active.balance_due = Set(Decimal::ZERO);
            inv_active.status = Set(InvoiceStatus::Paid);
            inv = inv_active.update(&txn).await?;
            auto_payment_id = Some(pay.id);
        }

        UnitEntity::update_many()
            .col_expr(
                inventory_unit::Column::Status,
                sea_orm::sea_query::Expr::value(UnitStatus::Sold),
            )
            .filter(inventory_unit::Column::SalesOrderId.eq(order_id))
            .filter(inventory_unit::Column::Status.eq(UnitStatus::Allocated))
            .exec(&txn)
            .await?;

        let mut order_active: sales_order::ActiveModel = order.into();
        order_active.status = Set(OrderStatus::Invoiced);
        order_active.update(&txn).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id, "Failed to commit order finalize transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            order_id,
            invoice_id = inv.id,
            invoice_number = %inv.invoice_number,
            total = %inv.total_amount,
            "Order finalized"
        );

        if let Err(e) = self
            .event_sender
            .send(Event::OrderFinalized {
                order_id,
                invoice_id: inv.id,
                total_amount: inv.total_amount,
            })
            .await
        {
            warn!(error = %e, order_id, "Failed to send order finalized event");
        }
        if let Some(payment_id) = auto_payment_id {
            if let Err(e) = self
                .event_sender
                .send(Event::PaymentRecorded {
                    payment_id,
                    customer_id: inv.customer_id,
                    amount: inv.total_amount,
                })
                .await
            {
                warn!(error = %e, payment_id, "Failed to send payment recorded event");
            }
        }

        Ok(inv)
    }

    /// Cancels an order. Draft cancellation just releases stock; invoiced
    /// cancellation additionally refunds what was actually paid, net of
    /// credit already issued against the invoice.
    #[instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: i64) -> Result<sales_order::Model, ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for order cancellation");
            ServiceError::DatabaseError(e)
        })?;

        let order = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order {}", order_id)))?;
        if order.status == OrderStatus::Cancelled {
            return Err(ServiceError::InvalidState(format!(
                "order {} is already cancelled",
                order.order_number
            )));
        }

        let mut credit_note_id = None;
        if order.status == OrderStatus::Invoiced {
            let inv = InvoiceEntity::find()
                .filter(invoice::Column::SalesOrderId.eq(order_id))
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("invoice for order {}", order_id))
                })?;

            let customer = CustomerEntity::find_by_id(order.customer_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("customer {}", order.customer_id))
                })?;

            // Clamp against credit already issued for this invoice so a
            // partial return followed by cancellation never double-refunds.
            let already_credited = CreditNoteEntity::find()
                .filter(credit_note::Column::OriginalInvoiceId.eq(inv.id))
                .all(&txn)
                .await?
                .iter()
                .map(|n| n.amount)
                .sum::<Decimal>();
            let refundable = (inv.amount_paid - already_credited).max(Decimal::ZERO);

            if refundable > Decimal::ZERO {
                let tax_share = if inv.total_amount > Decimal::ZERO {
                    round2(inv.tax_amount * refundable / inv.total_amount)
                } else {
                    Decimal::ZERO
                };
                // Retail refunds are paid out in cash on the spot, so the
                // note is born spent.
                let remaining = if customer.is_retail() {
                    Decimal::ZERO
                } else {
                    refundable
                };
                let note = payments::issue_credit_note(
                    &txn,
                    customer.id,
                    refundable,
                    tax_share,
                    remaining,
                    Some(inv.id),
                    None,
                    Some(format!("Cancellation of order {}", order.order_number)),
                )
                .await?;
                credit_note_id = Some(note.id);
            }

            let mut inv_active: invoice::ActiveModel = inv.into();
            inv_active.status = Set(InvoiceStatus::Cancelled);
            inv_active.balance_due = Set(Decimal::ZERO);
            inv_active.update(&txn).await?;
        }

        // Returned/Spoiled units keep their terminal status and are merely
        // unlinked; everything else goes back on the shelf.
        let units = UnitEntity::find()
            .filter(inventory_unit::Column::SalesOrderId.eq(order_id))
            .all(&txn)
            .await?;
        for unit in units {
            let terminal = matches!(unit.status, UnitStatus::Returned | UnitStatus::Spoiled);
            let mut active: inventory_unit::ActiveModel = unit.into();
            active.sales_order_id = Set(None);
            if !terminal {
                active.status = Set(UnitStatus::Available);
                active.sold_price = Set(None);
            }
            active.update(&txn).await?;
        }

        let mut order_active: sales_order::ActiveModel = order.into();
        order_active.status = Set(OrderStatus::Cancelled);
        let cancelled = order_active.update(&txn).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id, "Failed to commit order cancellation transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id, ?credit_note_id, "Order cancelled");

        if let Err(e) = self
            .event_sender
            .send(Event::OrderCancelled {
                order_id,
                credit_note_id,
            })
            .await
        {
            warn!(error = %e, order_id, "Failed to send order cancelled event");
        }

        Ok(cancelled)
    }

    /// Cancels draft orders that have sat idle past the cutoff. Failures are
    /// logged and skipped so one bad order cannot wedge the sweep.
    #[instrument(skip(self))]
    pub async fn sweep_stale_drafts(&self, max_age_days: u32) -> Result<u64, ServiceError> {
        let db = &*self.db_pool;
        let cutoff = Utc::now() - Duration::days(max_age_days as i64);

        let stale = OrderEntity::find()
            .filter(sales_order::Column::Status.eq(OrderStatus::Draft))
            .filter(sales_order::Column::CreatedAt.lt(cutoff))
            .all(db)
            .await?;

        let mut cancelled = 0u64;
        for order in stale {
            match self.cancel_order(order.id).await {
                Ok(_) => cancelled += 1,
                Err(e) => {
                    warn!(order_id = order.id, error = %e, "Stale draft sweep skipped order")
                }
            }
        }

        if cancelled > 0 {
            info!(cancelled, "Stale draft sweep completed");
        }
        Ok(cancelled)
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: i64) -> Result<OrderDetails, ServiceError> {
        let db = &*self.db_pool;
        let order = OrderEntity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order {}", order_id)))?;

        let units = UnitEntity::find()
            .filter(inventory_unit::Column::SalesOrderId.eq(order_id))
            .order_by_asc(inventory_unit::Column::SerialCode)
            .all(db)
            .await?;

        Ok(OrderDetails { order, units })
    }

    #[instrument(skip(self))]
    pub async fn get_invoice(&self, invoice_id: i64) -> Result<invoice::Model, ServiceError> {
        let db = &*self.db_pool;
        InvoiceEntity::find_by_id(invoice_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("invoice {}", invoice_id)))
    }

    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<sales_order::Model>, u64), ServiceError> {
        let db = &*self.db_pool;
        let paginator = OrderEntity::find()
            .order_by_desc(sales_order::Column::CreatedAt)
            .paginate(db, per_page);

        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((orders, total))
    }

    async fn load_draft<C: sea_orm::ConnectionTrait>(
        &self,
        conn: &C,
        order_id: i64,
    ) -> Result<sales_order::Model, ServiceError> {
        let order = OrderEntity::find_by_id(order_id)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order {}", order_id)))?;
        if order.status != OrderStatus::Draft {
            return Err(ServiceError::InvalidState(format!(
                "order {} is {}",
                order.order_number, order.status
            )));
        }
        Ok(order)
    }

    async fn outstanding_balance<C: sea_orm::ConnectionTrait>(
        &self,
        conn: &C,
        customer_id: i64,
    ) -> Result<Decimal, ServiceError> {
        let open = InvoiceEntity::find()
            .filter(invoice::Column::CustomerId.eq(customer_id))
            .filter(
                invoice::Column::Status
                    .is_in([InvoiceStatus::Unpaid, InvoiceStatus::PartiallyPaid]),
            )
            .all(conn)
            .await?;
        Ok(open.iter().map(|i| i.balance_due).sum())
    }
}

fn validate_discount(discount_percent: Decimal) -> Result<(), ServiceError> {
    if discount_percent < Decimal::ZERO || discount_percent > Decimal::ONE_HUNDRED {
        return Err(ServiceError::ValidationError(
            "discount_percent must be between 0 and 100".into(),
        ));
    }
    Ok(())
}
