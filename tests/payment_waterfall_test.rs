mod common;

use chrono::Utc;
use common::TestApp;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

use farmstock_api::{
    entities::credit_note::{self, Entity as CreditNoteEntity},
    entities::customer::{self, CustomerType},
    entities::invoice::{self, InvoiceStatus},
    entities::payment::{self, PaymentMethod},
    entities::payment_allocation::{self, Entity as AllocationEntity},
    entities::product,
    entities::sales_order::OrderType,
    errors::ServiceError,
    services::orders::{CreateOrderRequest, FinalizeOrderRequest},
    services::payments::{RecordPaymentRequest, SettleAccountRequest},
};

/// Finalizes a one-unit unpaid order at the given price and returns its
/// invoice.
async fn invoice_for(
    app: &TestApp,
    customer: &customer::Model,
    product: &product::Model,
    unit_code: &str,
    amount: Decimal,
) -> invoice::Model {
    let order = app
        .services
        .orders
        .create_order(CreateOrderRequest {
            customer_id: customer.id,
            order_type: OrderType::Wholesale,
            discount_percent: None,
            payment_method_hint: None,
        })
        .await
        .unwrap();
    app.services
        .inventory
        .allocate(order.id, unit_code)
        .await
        .unwrap();
    app.services
        .orders
        .update_product_price(order.id, product.id, amount)
        .await
        .unwrap();
    app.services
        .orders
        .finalize_order(
            order.id,
            FinalizeOrderRequest {
                is_paid: false,
                payment_method: None,
            },
        )
        .await
        .unwrap()
}

async fn seed_note(app: &TestApp, customer_id: i64, amount: Decimal) -> credit_note::Model {
    credit_note::ActiveModel {
        note_number: Set(format!("CN-SEED-{}", amount)),
        customer_id: Set(customer_id),
        original_invoice_id: Set(None),
        source_payment_id: Set(None),
        amount: Set(amount),
        tax_amount: Set(dec!(0)),
        remaining_amount: Set(amount),
        is_used: Set(false),
        reason: Set(Some("Seeded".to_string())),
        note_date: Set(TestApp::today()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&*app.db)
    .await
    .unwrap()
}

fn payment_request(customer_id: i64, amount: Decimal) -> RecordPaymentRequest {
    RecordPaymentRequest {
        customer_id,
        amount,
        method: PaymentMethod::Cash,
        reference: None,
    }
}

#[tokio::test]
async fn payment_waterfalls_over_oldest_invoices_first() {
    let app = TestApp::new().await;
    let customer = app
        .seed_customer("Accounts", CustomerType::Wholesale, None)
        .await;
    let product = app.seed_product("WAT-01", dec!(10), dec!(10)).await;
    let batch = app.seed_batch(product.id, 2, TestApp::today()).await;
    let codes = app.unit_codes(batch.id).await;

    let older = invoice_for(&app, &customer, &product, &codes[0], dec!(100)).await;
    let newer = invoice_for(&app, &customer, &product, &codes[1], dec!(50)).await;

    let pay = app
        .services
        .payments
        .record_payment(payment_request(customer.id, dec!(120)))
        .await
        .unwrap();

    let older = app.services.orders.get_invoice(older.id).await.unwrap();
    assert_eq!(older.status, InvoiceStatus::Paid);
    assert_eq!(older.balance_due, dec!(0));

    let newer = app.services.orders.get_invoice(newer.id).await.unwrap();
    assert_eq!(newer.status, InvoiceStatus::PartiallyPaid);
    assert_eq!(newer.amount_paid, dec!(20));
    assert_eq!(newer.balance_due, dec!(30));
    assert_eq!(newer.amount_paid + newer.balance_due, newer.total_amount);

    let allocations = AllocationEntity::find()
        .filter(payment_allocation::Column::PaymentId.eq(pay.id))
        .all(&*app.db)
        .await
        .unwrap();
    let allocated: Decimal = allocations.iter().map(|a| a.amount).sum();
    assert_eq!(allocated, pay.amount);
}

#[tokio::test]
async fn overpayment_surplus_becomes_credit_note() {
    let app = TestApp::new().await;
    let customer = app
        .seed_customer("Generous", CustomerType::Wholesale, None)
        .await;
    let product = app.seed_product("OVR-01", dec!(10), dec!(10)).await;
    let batch = app.seed_batch(product.id, 1, TestApp::today()).await;
    let codes = app.unit_codes(batch.id).await;

    let inv = invoice_for(&app, &customer, &product, &codes[0], dec!(60)).await;

    let pay = app
        .services
        .payments
        .record_payment(payment_request(customer.id, dec!(100)))
        .await
        .unwrap();

    let inv = app.services.orders.get_invoice(inv.id).await.unwrap();
    assert_eq!(inv.status, InvoiceStatus::Paid);

    let allocations = AllocationEntity::find()
        .filter(payment_allocation::Column::PaymentId.eq(pay.id))
        .all(&*app.db)
        .await
        .unwrap();
    let allocated: Decimal = allocations.iter().map(|a| a.amount).sum();
    assert_eq!(allocated, dec!(60));
    assert!(allocated <= pay.amount);

    let notes = app
        .services
        .payments
        .list_credit_notes(customer.id)
        .await
        .unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].amount, dec!(40));
    assert_eq!(notes[0].remaining_amount, dec!(40));
    assert_eq!(notes[0].source_payment_id, Some(pay.id));
    assert!(!notes[0].is_used);
}

#[tokio::test]
async fn void_restores_invoice_balances_and_keeps_allocations() {
    let app = TestApp::new().await;
    let customer = app
        .seed_customer("Oops", CustomerType::Wholesale, None)
        .await;
    let product = app.seed_product("VOD-01", dec!(10), dec!(10)).await;
    let batch = app.seed_batch(product.id, 1, TestApp::today()).await;
    let codes = app.unit_codes(batch.id).await;

    let inv = invoice_for(&app, &customer, &product, &codes[0], dec!(100)).await;
    let pay = app
        .services
        .payments
        .record_payment(payment_request(customer.id, dec!(100)))
        .await
        .unwrap();

    let outcome = app.services.payments.void_payment(pay.id).await.unwrap();
    assert!(outcome.payment.reversed);
    assert!(outcome.reissued_note.is_none());

    let inv = app.services.orders.get_invoice(inv.id).await.unwrap();
    assert_eq!(inv.status, InvoiceStatus::Unpaid);
    assert_eq!(inv.amount_paid, dec!(0));
    assert_eq!(inv.balance_due, dec!(100));

    // Allocation rows stay for the audit trail
    let allocations = AllocationEntity::find()
        .filter(payment_allocation::Column::PaymentId.eq(pay.id))
        .all(&*app.db)
        .await
        .unwrap();
    assert_eq!(allocations.len(), 1);

    // Voiding again is a no-op
    let again = app.services.payments.void_payment(pay.id).await.unwrap();
    assert!(again.payment.reversed);
    let inv = app.services.orders.get_invoice(inv.id).await.unwrap();
    assert_eq!(inv.balance_due, dec!(100));
}

#[tokio::test]
async fn void_is_blocked_once_surplus_credit_is_spent() {
    let app = TestApp::new().await;
    let customer = app
        .seed_customer("Tangled", CustomerType::Wholesale, None)
        .await;
    let product = app.seed_product("BLK-01", dec!(10), dec!(10)).await;
    let batch = app.seed_batch(product.id, 2, TestApp::today()).await;
    let codes = app.unit_codes(batch.id).await;

    invoice_for(&app, &customer, &product, &codes[0], dec!(60)).await;
    let pay = app
        .services
        .payments
        .record_payment(payment_request(customer.id, dec!(100)))
        .await
        .unwrap();

    // A later invoice settled from the surplus note spends part of it
    invoice_for(&app, &customer, &product, &codes[1], dec!(20)).await;
    app.services
        .payments
        .settle_account(
            customer.id,
            SettleAccountRequest {
                cash_amount: dec!(0),
                method: None,
            },
        )
        .await
        .unwrap();

    let err = app
        .services
        .payments
        .void_payment(pay.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::IntegrityBlock(_)));

    let pay = farmstock_api::entities::payment::Entity::find_by_id(pay.id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    assert!(!pay.reversed);
}

#[tokio::test]
async fn settlement_spends_credit_before_cash_and_clears_debt() {
    let app = TestApp::new().await;
    let customer = app
        .seed_customer("Settler", CustomerType::Wholesale, None)
        .await;
    let product = app.seed_product("SET-01", dec!(10), dec!(10)).await;
    let batch = app.seed_batch(product.id, 2, TestApp::today()).await;
    let codes = app.unit_codes(batch.id).await;

    invoice_for(&app, &customer, &product, &codes[0], dec!(100)).await;
    invoice_for(&app, &customer, &product, &codes[1], dec!(50)).await;
    let note = seed_note(&app, customer.id, dec!(50)).await;

    let summary = app
        .services
        .payments
        .settle_account(
            customer.id,
            SettleAccountRequest {
                cash_amount: dec!(100),
                method: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(summary.cash_applied, dec!(100));
    assert_eq!(summary.credit_applied, dec!(50));
    assert_eq!(summary.remaining_debt, dec!(0));
    assert_eq!(summary.notes_consumed, vec![note.note_number.clone()]);

    let note = CreditNoteEntity::find_by_id(note.id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    assert!(note.is_used);
    assert_eq!(note.remaining_amount, dec!(0));

    // Exact settlement leaves no surplus, so no new note appears
    let notes = app
        .services
        .payments
        .list_credit_notes(customer.id)
        .await
        .unwrap();
    assert_eq!(notes.len(), 1);

    // Credit payment carries the consumed note numbers as its reference
    let payments = app.services.payments.list_payments(customer.id).await.unwrap();
    let credit_pay = payments
        .iter()
        .find(|p| p.method == PaymentMethod::CreditNote)
        .unwrap();
    assert_eq!(credit_pay.amount, dec!(50));
    assert_eq!(credit_pay.reference.as_deref(), Some(note.note_number.as_str()));

    let stmt = app.services.payments.statement(customer.id).await.unwrap();
    assert_eq!(stmt.total_outstanding, dec!(0));
    assert_eq!(stmt.credit_balance, dec!(0));
}

#[tokio::test]
async fn cash_settlement_leaves_credit_untouched() {
    let app = TestApp::new().await;
    let customer = app
        .seed_customer("Cash Only", CustomerType::Wholesale, None)
        .await;
    let product = app.seed_product("CSH-01", dec!(10), dec!(10)).await;
    let batch = app.seed_batch(product.id, 1, TestApp::today()).await;
    let codes = app.unit_codes(batch.id).await;

    invoice_for(&app, &customer, &product, &codes[0], dec!(50)).await;
    let note = seed_note(&app, customer.id, dec!(40)).await;

    let summary = app
        .services
        .payments
        .settle_account(
            customer.id,
            SettleAccountRequest {
                cash_amount: dec!(50),
                method: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(summary.credit_applied, dec!(0));
    assert!(summary.notes_consumed.is_empty());
    assert_eq!(summary.remaining_debt, dec!(0));

    let note = CreditNoteEntity::find_by_id(note.id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    assert!(!note.is_used);
    assert_eq!(note.remaining_amount, dec!(40));
}

#[tokio::test]
async fn voiding_credit_payment_reissues_the_credit() {
    let app = TestApp::new().await;
    let customer = app
        .seed_customer("Second Thoughts", CustomerType::Wholesale, None)
        .await;
    let product = app.seed_product("RIS-01", dec!(10), dec!(10)).await;
    let batch = app.seed_batch(product.id, 1, TestApp::today()).await;
    let codes = app.unit_codes(batch.id).await;

    let inv = invoice_for(&app, &customer, &product, &codes[0], dec!(30)).await;
    seed_note(&app, customer.id, dec!(30)).await;

    app.services
        .payments
        .settle_account(
            customer.id,
            SettleAccountRequest {
                cash_amount: dec!(0),
                method: None,
            },
        )
        .await
        .unwrap();

    let payments = app.services.payments.list_payments(customer.id).await.unwrap();
    let credit_pay = payments
        .iter()
        .find(|p| p.method == PaymentMethod::CreditNote)
        .unwrap();

    let outcome = app
        .services
        .payments
        .void_payment(credit_pay.id)
        .await
        .unwrap();
    let reissued = outcome.reissued_note.unwrap();
    assert_eq!(reissued.amount, dec!(30));
    assert_eq!(reissued.remaining_amount, dec!(30));
    assert!(!reissued.is_used);

    let inv = app.services.orders.get_invoice(inv.id).await.unwrap();
    assert_eq!(inv.status, InvoiceStatus::Unpaid);
    assert_eq!(inv.balance_due, dec!(30));
}

#[tokio::test]
async fn void_without_allocations_falls_back_to_newest_invoices() {
    let app = TestApp::new().await;
    let customer = app
        .seed_customer("Old Books", CustomerType::Wholesale, None)
        .await;
    let product = app.seed_product("LEG-01", dec!(10), dec!(10)).await;
    let batch = app.seed_batch(product.id, 1, TestApp::today()).await;
    let codes = app.unit_codes(batch.id).await;

    let inv = invoice_for(&app, &customer, &product, &codes[0], dec!(100)).await;

    // Simulate a ledger imported without allocation rows
    let mut active: invoice::ActiveModel = inv.clone().into();
    active.amount_paid = Set(dec!(100));
    active.balance_due = Set(dec!(0));
    active.status = Set(InvoiceStatus::Paid);
    active.update(&*app.db).await.unwrap();

    let legacy_pay = payment::ActiveModel {
        customer_id: Set(customer.id),
        amount: Set(dec!(100)),
        payment_date: Set(TestApp::today()),
        method: Set(PaymentMethod::Cash),
        reference: Set(None),
        reversed: Set(false),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&*app.db)
    .await
    .unwrap();

    app.services
        .payments
        .void_payment(legacy_pay.id)
        .await
        .unwrap();

    let inv = app.services.orders.get_invoice(inv.id).await.unwrap();
    assert_eq!(inv.status, InvoiceStatus::Unpaid);
    assert_eq!(inv.amount_paid, dec!(0));
    assert_eq!(inv.balance_due, dec!(100));
}

#[tokio::test]
async fn settlement_normalizes_imported_overpaid_invoice() {
    let app = TestApp::new().await;
    let customer = app
        .seed_customer("Imported", CustomerType::Wholesale, None)
        .await;
    let product = app.seed_product("NRM-01", dec!(10), dec!(10)).await;
    let batch = app.seed_batch(product.id, 1, TestApp::today()).await;
    let codes = app.unit_codes(batch.id).await;

    let inv = invoice_for(&app, &customer, &product, &codes[0], dec!(100)).await;

    // Simulate an imported ledger row: paid past its total
    let mut active: invoice::ActiveModel = inv.clone().into();
    active.amount_paid = Set(dec!(120));
    active.balance_due = Set(dec!(-20));
    active.status = Set(InvoiceStatus::Paid);
    active.update(&*app.db).await.unwrap();

    let summary = app
        .services
        .payments
        .settle_account(
            customer.id,
            SettleAccountRequest {
                cash_amount: dec!(0),
                method: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(summary.remaining_debt, dec!(0));

    let inv = app.services.orders.get_invoice(inv.id).await.unwrap();
    assert_eq!(inv.status, InvoiceStatus::Paid);
    assert_eq!(inv.amount_paid, dec!(100));
    assert_eq!(inv.balance_due, dec!(0));
    assert_eq!(inv.amount_paid + inv.balance_due, inv.total_amount);

    let notes = app
        .services
        .payments
        .list_credit_notes(customer.id)
        .await
        .unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].amount, dec!(20));
    assert_eq!(notes[0].remaining_amount, dec!(20));
    assert_eq!(notes[0].original_invoice_id, Some(inv.id));
    assert!(!notes[0].is_used);
}

#[tokio::test]
async fn credit_note_method_is_reserved_for_settlement() {
    let app = TestApp::new().await;
    let customer = app
        .seed_customer("Direct", CustomerType::Wholesale, None)
        .await;

    let err = app
        .services
        .payments
        .record_payment(RecordPaymentRequest {
            customer_id: customer.id,
            amount: dec!(25),
            method: PaymentMethod::CreditNote,
            reference: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let err = app
        .services
        .payments
        .settle_account(
            customer.id,
            SettleAccountRequest {
                cash_amount: dec!(25),
                method: Some(PaymentMethod::CreditNote),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let payments = app.services.payments.list_payments(customer.id).await.unwrap();
    assert!(payments.is_empty());
}

#[tokio::test]
async fn zero_or_negative_payment_is_rejected() {
    let app = TestApp::new().await;
    let customer = app
        .seed_customer("Nothing", CustomerType::Wholesale, None)
        .await;

    let err = app
        .services
        .payments
        .record_payment(payment_request(customer.id, dec!(0)))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let err = app
        .services
        .payments
        .record_payment(payment_request(customer.id, dec!(-5)))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}
