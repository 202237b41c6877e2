use crate::{
    db::DbPool,
    entities::credit_note::{self, Entity as CreditNoteEntity},
    entities::customer::Entity as CustomerEntity,
    entities::invoice::{self, Entity as InvoiceEntity, InvoiceStatus},
    entities::payment::{self, Entity as PaymentEntity, PaymentMethod},
    entities::payment_allocation::{self, Entity as AllocationEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{derive_invoice_status, round2},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RecordPaymentRequest {
    pub customer_id: i64,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub reference: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SettleAccountRequest {
    pub cash_amount: Decimal,
    pub method: Option<PaymentMethod>,
}

#[derive(Debug, Serialize)]
pub struct SettlementSummary {
    pub customer_id: i64,
    pub cash_applied: Decimal,
    pub credit_applied: Decimal,
    pub notes_consumed: Vec<String>,
    pub remaining_debt: Decimal,
}

#[derive(Debug, Serialize)]
pub struct VoidPaymentResponse {
    pub payment: payment::Model,
    pub reissued_note: Option<credit_note::Model>,
}

#[derive(Debug, Serialize)]
pub struct AccountStatement {
    pub customer_id: i64,
    pub invoices: Vec<invoice::Model>,
    pub payments: Vec<payment::Model>,
    pub credit_notes: Vec<credit_note::Model>,
    pub total_outstanding: Decimal,
    pub credit_balance: Decimal,
}

/// Issues a numbered credit note inside the caller's transaction. The note
/// number is derived from the row id after insert, like invoices and orders.
pub(crate) async fn issue_credit_note<C: ConnectionTrait>(
    conn: &C,
    customer_id: i64,
    amount: Decimal,
    tax_amount: Decimal,
    remaining_amount: Decimal,
    original_invoice_id: Option<i64>,
    source_payment_id: Option<i64>,
    reason: Option<String>,
) -> Result<credit_note::Model, ServiceError> {
    let inserted = credit_note::ActiveModel {
        note_number: Set(format!("CN-PENDING-{}", Uuid::new_v4())),
        customer_id: Set(customer_id),
        original_invoice_id: Set(original_invoice_id),
        source_payment_id: Set(source_payment_id),
        amount: Set(round2(amount)),
        tax_amount: Set(round2(tax_amount)),
        remaining_amount: Set(round2(remaining_amount)),
        is_used: Set(remaining_amount <= Decimal::ZERO),
        reason: Set(reason),
        note_date: Set(Utc::now().date_naive()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    let note_id = inserted.id;
    let mut active: credit_note::ActiveModel = inserted.into();
    active.note_number = Set(format!("CN-{:05}", note_id));
    let note = active.update(conn).await?;

    info!(
        credit_note_id = note.id,
        note_number = %note.note_number,
        amount = %note.amount,
        "Credit note issued"
    );
    Ok(note)
}

/// Distributes a payment's amount over the customer's open invoices,
/// oldest invoice date first, id as tiebreak. Each slice is recorded as a
/// PaymentAllocation row. Any surplus left after the last open invoice is
/// captured as a store-credit note tied back to the payment.
///
/// Returns the allocated total and the overpayment note, if one was issued.
pub(crate) async fn distribute_funds<C: ConnectionTrait>(
    conn: &C,
    pay: &payment::Model,
) -> Result<(Decimal, Option<credit_note::Model>), ServiceError> {
    let open_invoices = InvoiceEntity::find()
        .filter(invoice::Column::CustomerId.eq(pay.customer_id))
        .filter(invoice::Column::Status.is_in([InvoiceStatus::Unpaid, InvoiceStatus::PartiallyPaid]))
        .order_by_asc(invoice::Column::InvoiceDate)
        .order_by_asc(invoice::Column::Id)
        .lock_exclusive()
        .all(conn)
        .await?;

    let mut remaining = pay.amount;
    let mut allocated = Decimal::ZERO;

    for inv in open_invoices {
        if remaining <= Decimal::ZERO {
            break;
        }
        let slice = remaining.min(inv.balance_due);
        if slice <= Decimal::ZERO {
            continue;
        }

        payment_allocation::ActiveModel {
            payment_id: Set(pay.id),
            invoice_id: Set(inv.id),
            amount: Set(slice),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(conn)
        .await?;

        let new_paid = inv.amount_paid + slice;
        let new_balance = inv.balance_due - slice;
        let total = inv.total_amount;
        let mut active: invoice::ActiveModel = inv.into();
        active.amount_paid = Set(new_paid);
        active.balance_due = Set(new_balance);
        active.status = Set(derive_invoice_status(total, new_balance));
        active.update(conn).await?;

        remaining -= slice;
        allocated += slice;
    }

    let note = if remaining > Decimal::ZERO {
        Some(
            issue_credit_note(
                conn,
                pay.customer_id,
                remaining,
                Decimal::ZERO,
                remaining,
                None,
                Some(pay.id),
                Some("Overpayment".to_string()),
            )
            .await?,
        )
    } else {
        None
    };

    Ok((allocated, note))
}

/// Records customer payments, spends store credit, and reverses mistakes.
#[derive(Clone)]
pub struct PaymentService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl PaymentService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Takes a payment against the customer's account and waterfalls it over
    /// open invoices. Surplus becomes a store-credit note.
    #[instrument(skip(self, request), fields(customer_id = request.customer_id, amount = %request.amount))]
    pub async fn record_payment(
        &self,
        request: RecordPaymentRequest,
    ) -> Result<payment::Model, ServiceError> {
        request.validate()?;
        if request.amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "amount must be positive".into(),
            ));
        }
        if request.method == PaymentMethod::CreditNote {
            return Err(ServiceError::ValidationError(
                "credit-note payments are generated by settlement and cannot be recorded directly"
                    .into(),
            ));
        }

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for payment");
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

        let pay = payment::ActiveModel {
            customer_id: Set(customer.id),
            amount: Set(round2(request.amount)),
            payment_date: Set(Utc::now().date_naive()),
            method: Set(request.method),
            reference: Set(request.reference),
            reversed: Set(false),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let (allocated, overpayment_note) = distribute_funds(&txn, &pay).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit payment transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            payment_id = pay.id,
            customer_id = pay.customer_id,
            amount = %pay.amount,
            %allocated,
            "Payment recorded"
        );

        if let Err(e) = self
            .event_sender
            .send(Event::PaymentRecorded {
                payment_id: pay.id,
                customer_id: pay.customer_id,
                amount: pay.amount,
            })
            .await
        {
            warn!(error = %e, payment_id = pay.id, "Failed to send payment recorded event");
        }
        if let Some(note) = overpayment_note {
            if let Err(e) = self
                .event_sender
                .send(Event::CreditNoteIssued {
                    credit_note_id: note.id,
                    customer_id: note.customer_id,
                    amount: note.amount,
                })
                .await
            {
                warn!(error = %e, credit_note_id = note.id, "Failed to send credit note event");
            }
        }

        Ok(pay)
    }

    /// Clears the customer's account by blending store credit with cash.
    ///
    /// Credit is always spent before cash, oldest notes first, and never more
    /// than the debt not covered by the cash brought in. Cash the customer
    /// hands over beyond the residual debt is captured as a fresh note by the
    /// waterfall's own overpayment path.
    #[instrument(skip(self, request), fields(customer_id, cash = %request.cash_amount))]
    pub async fn settle_account(
        &self,
        customer_id: i64,
        request: SettleAccountRequest,
    ) -> Result<SettlementSummary, ServiceError> {
        if request.cash_amount < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "cash_amount must not be negative".into(),
            ));
        }
        if request.method == Some(PaymentMethod::CreditNote) {
            return Err(ServiceError::ValidationError(
                "credit-note payments are generated by settlement and cannot be recorded directly"
                    .into(),
            ));
        }
        let cash_amount = round2(request.cash_amount);

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for settlement");
            ServiceError::DatabaseError(e)
        })?;

        let customer = CustomerEntity::find_by_id(customer_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("customer {}", customer_id)))?;

        self.normalize_overpaid_invoices(&txn, customer.id).await?;

        let open_invoices = InvoiceEntity::find()
            .filter(invoice::Column::CustomerId.eq(customer.id))
            .filter(
                invoice::Column::Status
                    .is_in([InvoiceStatus::Unpaid, InvoiceStatus::PartiallyPaid]),
            )
            .all(&txn)
            .await?;
        let total_debt: Decimal = open_invoices.iter().map(|i| i.balance_due).sum();

        // Credit covers only the gap cash leaves, so a customer settling in
        // cash keeps their notes intact.
        let credit_needed = (total_debt - cash_amount).max(Decimal::ZERO);

        let mut credit_applied = Decimal::ZERO;
        let mut notes_consumed = Vec::new();
        if credit_needed > Decimal::ZERO {
            let notes = CreditNoteEntity::find()
                .filter(credit_note::Column::CustomerId.eq(customer.id))
                .filter(credit_note::Column::IsUsed.eq(false))
                .filter(credit_note::Column::RemainingAmount.gt(Decimal::ZERO))
                .order_by_asc(credit_note::Column::NoteDate)
                .order_by_asc(credit_note::Column::Id)
                .lock_exclusive()
                .all(&txn)
                .await?;

            for note in notes {
                if credit_applied >= credit_needed {
                    break;
                }
                let slice = note.remaining_amount.min(credit_needed - credit_applied);
                let new_remaining = note.remaining_amount - slice;
                let number = note.note_number.clone();

                let mut active: credit_note::ActiveModel = note.into();
                active.remaining_amount = Set(new_remaining);
                if new_remaining <= Decimal::ZERO {
                    active.is_used = Set(true);
                }
                active.update(&txn).await?;

                credit_applied += slice;
                notes_consumed.push(number);
            }
        }

        if credit_applied > Decimal::ZERO {
            let credit_pay = payment::ActiveModel {
                customer_id: Set(customer.id),
                amount: Set(credit_applied),
                payment_date: Set(Utc::now().date_naive()),
                method: Set(PaymentMethod::CreditNote),
                reference: Set(Some(notes_consumed.join(","))),
                reversed: Set(false),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            distribute_funds(&txn, &credit_pay).await?;
        }

        if cash_amount > Decimal::ZERO {
            let cash_pay = payment::ActiveModel {
                customer_id: Set(customer.id),
                amount: Set(cash_amount),
                payment_date: Set(Utc::now().date_naive()),
                method: Set(request.method.unwrap_or(PaymentMethod::Cash)),
                reference: Set(Some("Account settlement".to_string())),
                reversed: Set(false),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            distribute_funds(&txn, &cash_pay).await?;
        }

        let remaining_debt: Decimal = InvoiceEntity::find()
            .filter(invoice::Column::CustomerId.eq(customer.id))
            .filter(
                invoice::Column::Status
                    .is_in([InvoiceStatus::Unpaid, InvoiceStatus::PartiallyPaid]),
            )
            .all(&txn)
            .await?
            .iter()
            .map(|i| i.balance_due)
            .sum();

        txn.commit().await.map_err(|e| {
            error!(error = %e, customer_id, "Failed to commit settlement transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            customer_id,
            %cash_amount,
            %credit_applied,
            %remaining_debt,
            "Account settled"
        );

        if let Err(e) = self
            .event_sender
            .send(Event::AccountSettled {
                customer_id,
                cash_amount,
                credit_amount: credit_applied,
            })
            .await
        {
            warn!(error = %e, customer_id, "Failed to send account settled event");
        }

        Ok(SettlementSummary {
            customer_id,
            cash_applied: cash_amount,
            credit_applied,
            notes_consumed,
            remaining_debt,
        })
    }

    /// Reverses a payment, undoing its effect on the invoices it funded.
    ///
    /// A payment whose overpayment surplus was already spent cannot be
    /// reversed cleanly and is refused with a conflict. Reversing a
    /// CreditNote-method payment reissues the credit as a fresh note, so the
    /// customer's store credit is not silently destroyed.
    #[instrument(skip(self))]
    pub async fn void_payment(&self, payment_id: i64) -> Result<VoidPaymentResponse, ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for payment void");
            ServiceError::DatabaseError(e)
        })?;

        let pay = PaymentEntity::find_by_id(payment_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("payment {}", payment_id)))?;

        if pay.reversed {
            txn.commit().await.map_err(ServiceError::DatabaseError)?;
            return Ok(VoidPaymentResponse {
                payment: pay,
                reissued_note: None,
            });
        }

        // Surplus notes spawned by this payment must still be whole.
        let surplus_notes = CreditNoteEntity::find()
            .filter(credit_note::Column::SourcePaymentId.eq(pay.id))
            .lock_exclusive()
            .all(&txn)
            .await?;
        for note in &surplus_notes {
            if note.remaining_amount < note.amount {
                return Err(ServiceError::IntegrityBlock(format!(
                    "credit note {} issued from payment {} has been partially spent",
                    note.note_number, pay.id
                )));
            }
        }
        for note in surplus_notes {
            let number = note.note_number.clone();
            let mut active: credit_note::ActiveModel = note.into();
            active.remaining_amount = Set(Decimal::ZERO);
            active.is_used = Set(true);
            active.reason = Set(Some(format!(
                "Voided with payment {} reversal",
                pay.id
            )));
            active.update(&txn).await?;
            info!(note_number = %number, "Surplus note voided with payment");
        }

        let allocations = AllocationEntity::find()
            .filter(payment_allocation::Column::PaymentId.eq(pay.id))
            .all(&txn)
            .await?;

        if allocations.is_empty() {
            // Ledgers imported from the books-on-paper era predate
            // allocation rows; fall back to unwinding newest invoices first.
            self.legacy_restore(&txn, &pay).await?;
        } else {
            for alloc in &allocations {
                let inv = InvoiceEntity::find_by_id(alloc.invoice_id)
                    .one(&txn)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("invoice {}", alloc.invoice_id))
                    })?;

                let new_paid = (inv.amount_paid - alloc.amount).max(Decimal::ZERO);
                let new_balance = inv.balance_due + alloc.amount;
                let total = inv.total_amount;
                let cancelled = inv.status == InvoiceStatus::Cancelled;

                let mut active: invoice::ActiveModel = inv.into();
                active.amount_paid = Set(new_paid);
                if !cancelled {
                    active.balance_due = Set(new_balance.min(total));
                    active.status = Set(derive_invoice_status(total, new_balance.min(total)));
                }
                active.update(&txn).await?;
            }
        }

        let reissued_note = if pay.method == PaymentMethod::CreditNote {
            Some(
                issue_credit_note(
                    &txn,
                    pay.customer_id,
                    pay.amount,
                    Decimal::ZERO,
                    pay.amount,
                    None,
                    None,
                    Some(format!("Reissued by reversal of payment {}", pay.id)),
                )
                .await?,
            )
        } else {
            None
        };

        let customer_id = pay.customer_id;
        let mut active: payment::ActiveModel = pay.into();
        active.reversed = Set(true);
        let reversed = active.update(&txn).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, payment_id, "Failed to commit payment void transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            payment_id,
            customer_id,
            reissued = reissued_note.is_some(),
            "Payment voided"
        );

        if let Err(e) = self
            .event_sender
            .send(Event::PaymentVoided {
                payment_id,
                reissued_note_id: reissued_note.as_ref().map(|n| n.id),
            })
            .await
        {
            warn!(error = %e, payment_id, "Failed to send payment voided event");
        }

        Ok(VoidPaymentResponse {
            payment: reversed,
            reissued_note,
        })
    }

    #[instrument(skip(self))]
    pub async fn list_payments(
        &self,
        customer_id: i64,
    ) -> Result<Vec<payment::Model>, ServiceError> {
        let db = &*self.db_pool;
        Ok(PaymentEntity::find()
            .filter(payment::Column::CustomerId.eq(customer_id))
            .order_by_desc(payment::Column::PaymentDate)
            .order_by_desc(payment::Column::Id)
            .all(db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn list_credit_notes(
        &self,
        customer_id: i64,
    ) -> Result<Vec<credit_note::Model>, ServiceError> {
        let db = &*self.db_pool;
        Ok(CreditNoteEntity::find()
            .filter(credit_note::Column::CustomerId.eq(customer_id))
            .order_by_asc(credit_note::Column::NoteDate)
            .order_by_asc(credit_note::Column::Id)
            .all(db)
            .await?)
    }

    /// Full account picture: invoices, payments, notes, and the two running
    /// balances the counter staff actually quote to customers.
    #[instrument(skip(self))]
    pub async fn statement(&self, customer_id: i64) -> Result<AccountStatement, ServiceError> {
        let db = &*self.db_pool;

        CustomerEntity::find_by_id(customer_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("customer {}", customer_id)))?;

        let invoices = InvoiceEntity::find()
            .filter(invoice::Column::CustomerId.eq(customer_id))
            .order_by_asc(invoice::Column::InvoiceDate)
            .order_by_asc(invoice::Column::Id)
            .all(db)
            .await?;
        let payments = self.list_payments(customer_id).await?;
        let credit_notes = self.list_credit_notes(customer_id).await?;

        let total_outstanding = invoices
            .iter()
            .filter(|i| i.is_open())
            .map(|i| i.balance_due)
            .sum();
        let credit_balance = credit_notes
            .iter()
            .filter(|n| !n.is_used)
            .map(|n| n.remaining_amount)
            .sum();

        Ok(AccountStatement {
            customer_id,
            invoices,
            payments,
            credit_notes,
            total_outstanding,
            credit_balance,
        })
    }

    /// Imported or legacy rows may carry a negative balance (typically a
    /// Paid invoice whose amount_paid exceeds its total). Settlement first
    /// converts any such overage into a note so the waterfall below starts
    /// clean.
    async fn normalize_overpaid_invoices<C: ConnectionTrait>(
        &self,
        conn: &C,
        customer_id: i64,
    ) -> Result<(), ServiceError> {
        let overpaid = InvoiceEntity::find()
            .filter(invoice::Column::CustomerId.eq(customer_id))
            .filter(invoice::Column::Status.ne(InvoiceStatus::Cancelled))
            .filter(invoice::Column::BalanceDue.lt(Decimal::ZERO))
            .all(conn)
            .await?;

        for inv in overpaid {
            let overage = -inv.balance_due;
            let invoice_id = inv.id;
            let total = inv.total_amount;

            issue_credit_note(
                conn,
                customer_id,
                overage,
                Decimal::ZERO,
                overage,
                Some(invoice_id),
                None,
                Some("Balance normalization".to_string()),
            )
            .await?;

            let mut active: invoice::ActiveModel = inv.into();
            active.amount_paid = Set(total);
            active.balance_due = Set(Decimal::ZERO);
            active.status = Set(InvoiceStatus::Paid);
            active.update(conn).await?;

            warn!(invoice_id, %overage, "Overpaid invoice normalized into credit note");
        }
        Ok(())
    }

    /// Restores invoice balances for a payment recorded before allocation
    /// rows existed. Newest invoices give the money back first.
    async fn legacy_restore<C: ConnectionTrait>(
        &self,
        conn: &C,
        pay: &payment::Model,
    ) -> Result<(), ServiceError> {
        let invoices = InvoiceEntity::find()
            .filter(invoice::Column::CustomerId.eq(pay.customer_id))
            .filter(invoice::Column::AmountPaid.gt(Decimal::ZERO))
            .filter(invoice::Column::Status.ne(InvoiceStatus::Cancelled))
            .order_by_desc(invoice::Column::InvoiceDate)
            .order_by_desc(invoice::Column::Id)
            .all(conn)
            .await?;

        let mut remaining = pay.amount;
        for inv in invoices {
            if remaining <= Decimal::ZERO {
                break;
            }
            let restore = remaining.min(inv.amount_paid).min(inv.total_amount - inv.balance_due);
            if restore <= Decimal::ZERO {
                continue;
            }

            let new_paid = inv.amount_paid - restore;
            let new_balance = (inv.balance_due + restore).min(inv.total_amount);
            let total = inv.total_amount;
            let mut active: invoice::ActiveModel = inv.into();
            active.amount_paid = Set(new_paid);
            active.balance_due = Set(new_balance);
            active.status = Set(derive_invoice_status(total, new_balance));
            active.update(conn).await?;

            remaining -= restore;
        }

        if remaining > Decimal::ZERO {
            warn!(
                payment_id = pay.id,
                unrestored = %remaining,
                "Legacy payment reversal could not restore the full amount"
            );
        }
        Ok(())
    }
}
