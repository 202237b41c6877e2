mod common;

use common::TestApp;
use rust_decimal_macros::dec;

use farmstock_api::{
    entities::customer::CustomerType,
    entities::inventory_unit::UnitStatus,
    entities::sales_order::OrderType,
    errors::ServiceError,
    services::orders::{CreateOrderRequest, FinalizeOrderRequest},
    services::returns::ProcessReturnRequest,
};

async fn sell_units(
    app: &TestApp,
    customer_id: i64,
    order_type: OrderType,
    codes: &[String],
    is_paid: bool,
) -> farmstock_api::entities::invoice::Model {
    let order = app
        .services
        .orders
        .create_order(CreateOrderRequest {
            customer_id,
            order_type,
            discount_percent: None,
            payment_method_hint: None,
        })
        .await
        .unwrap();
    for code in codes {
        app.services.inventory.allocate(order.id, code).await.unwrap();
    }
    app.services
        .orders
        .finalize_order(
            order.id,
            FinalizeOrderRequest {
                is_paid,
                payment_method: None,
            },
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn full_return_credits_price_and_tax() {
    let app = TestApp::new().await;
    let customer = app
        .seed_customer("Counter Sale", CustomerType::Retail, None)
        .await;
    let product = app.seed_product("RET-01", dec!(110), dec!(100)).await;
    let batch = app.seed_batch(product.id, 1, TestApp::today()).await;
    let codes = app.unit_codes(batch.id).await;

    let invoice = sell_units(&app, customer.id, OrderType::Retail, &codes, true).await;
    assert_eq!(invoice.total_amount, dec!(110));
    assert_eq!(invoice.tax_amount, dec!(10));

    let outcome = app
        .services
        .returns
        .process_return(ProcessReturnRequest {
            unit_code: codes[0].clone(),
            reason: Some("Bruised".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(outcome.credit_note.amount, dec!(110));
    assert_eq!(outcome.credit_note.tax_amount, dec!(10));
    assert_eq!(outcome.credit_note.original_invoice_id, Some(invoice.id));
    // Retail refunds go out in cash, the note is born spent
    assert!(outcome.credit_note.is_used);
    assert_eq!(outcome.credit_note.remaining_amount, dec!(0));

    assert_eq!(outcome.unit.status, UnitStatus::Returned);
    assert_eq!(outcome.unit.sales_order_id, None);
    // Sold price survives for the restock/spoil decision
    assert_eq!(outcome.unit.sold_price, Some(dec!(110)));
}

#[tokio::test]
async fn partial_return_takes_proportional_tax_share() {
    let app = TestApp::new().await;
    let customer = app
        .seed_customer("Half Back", CustomerType::Wholesale, None)
        .await;
    let product = app.seed_product("RET-02", dec!(60), dec!(55)).await;
    let batch = app.seed_batch(product.id, 2, TestApp::today()).await;
    let codes = app.unit_codes(batch.id).await;

    // Two units at 55 each: total 110, tax 10
    let invoice = sell_units(&app, customer.id, OrderType::Wholesale, &codes, true).await;
    assert_eq!(invoice.total_amount, dec!(110));
    assert_eq!(invoice.tax_amount, dec!(10));

    let outcome = app
        .services
        .returns
        .process_return(ProcessReturnRequest {
            unit_code: codes[0].clone(),
            reason: None,
        })
        .await
        .unwrap();

    assert_eq!(outcome.credit_note.amount, dec!(55));
    assert_eq!(outcome.credit_note.tax_amount, dec!(5));
    // Wholesale notes stay open as store credit
    assert!(!outcome.credit_note.is_used);
    assert_eq!(outcome.credit_note.remaining_amount, dec!(55));
}

#[tokio::test]
async fn only_sold_units_can_be_returned() {
    let app = TestApp::new().await;
    let customer = app
        .seed_customer("Eager", CustomerType::Wholesale, None)
        .await;
    let product = app.seed_product("RET-03", dec!(20), dec!(15)).await;
    let batch = app.seed_batch(product.id, 1, TestApp::today()).await;
    let codes = app.unit_codes(batch.id).await;

    // Still Available
    let err = app
        .services
        .returns
        .process_return(ProcessReturnRequest {
            unit_code: codes[0].clone(),
            reason: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));

    // Allocated but not sold
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
        .allocate(order.id, &codes[0])
        .await
        .unwrap();
    let err = app
        .services
        .returns
        .process_return(ProcessReturnRequest {
            unit_code: codes[0].clone(),
            reason: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));
}

#[tokio::test]
async fn returned_unit_can_be_restocked_or_spoiled() {
    let app = TestApp::new().await;
    let customer = app
        .seed_customer("Cycle", CustomerType::Wholesale, None)
        .await;
    let product = app.seed_product("RET-04", dec!(20), dec!(15)).await;
    let batch = app.seed_batch(product.id, 2, TestApp::today()).await;
    let codes = app.unit_codes(batch.id).await;

    sell_units(&app, customer.id, OrderType::Wholesale, &codes, true).await;

    for code in &codes {
        app.services
            .returns
            .process_return(ProcessReturnRequest {
                unit_code: code.clone(),
                reason: None,
            })
            .await
            .unwrap();
    }

    let first = app
        .services
        .inventory
        .get_unit_by_code(&codes[0])
        .await
        .unwrap();
    let restocked = app
        .services
        .inventory
        .restock_unit(first.id)
        .await
        .unwrap();
    assert_eq!(restocked.status, UnitStatus::Available);
    assert_eq!(restocked.sold_price, None);

    let second = app
        .services
        .inventory
        .get_unit_by_code(&codes[1])
        .await
        .unwrap();
    let spoiled = app.services.inventory.spoil_unit(second.id).await.unwrap();
    assert_eq!(spoiled.status, UnitStatus::Spoiled);

    // Neither transition applies twice
    let err = app
        .services
        .inventory
        .restock_unit(restocked.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));
    let err = app
        .services
        .inventory
        .spoil_unit(spoiled.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));
}
