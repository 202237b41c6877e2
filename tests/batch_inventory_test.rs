mod common;

use chrono::Duration;
use common::TestApp;
use rust_decimal_macros::dec;

use farmstock_api::{
    entities::customer::CustomerType,
    entities::inventory_unit::UnitStatus,
    entities::sales_order::OrderType,
    errors::ServiceError,
    services::orders::CreateOrderRequest,
};

async fn draft_order(app: &TestApp, customer_id: i64, order_type: OrderType) -> i64 {
    app.services
        .orders
        .create_order(CreateOrderRequest {
            customer_id,
            order_type,
            discount_percent: None,
            payment_method_hint: None,
        })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn batch_creation_mints_serialized_units() {
    let app = TestApp::new().await;
    let product = app.seed_product("BAT-01", dec!(10), dec!(8)).await;
    let batch = app.seed_batch(product.id, 5, TestApp::today()).await;

    assert!(batch.batch_code.starts_with("B-"));
    assert_eq!(batch.total_units, 5);
    // Product default shelf life of 30 days sets the expiry
    assert_eq!(
        batch.expiry_date,
        Some(TestApp::today() + Duration::days(30))
    );

    let codes = app.unit_codes(batch.id).await;
    assert_eq!(codes.len(), 5);
    for code in &codes {
        assert!(code.starts_with(&batch.batch_code));
    }

    let details = app.services.batches.get_batch(batch.id).await.unwrap();
    assert_eq!(details.available_units, 5);
}

#[tokio::test]
async fn moving_batch_date_recomputes_expiry() {
    let app = TestApp::new().await;
    let product = app.seed_product("BAT-02", dec!(10), dec!(8)).await;
    let batch = app.seed_batch(product.id, 1, TestApp::today()).await;

    let new_date = TestApp::today() - Duration::days(10);
    let updated = app
        .services
        .batches
        .update_batch_date(batch.id, new_date)
        .await
        .unwrap();
    assert_eq!(updated.batch_date, new_date);
    assert_eq!(updated.expiry_date, Some(new_date + Duration::days(30)));
}

#[tokio::test]
async fn expired_batch_units_cannot_be_allocated() {
    let app = TestApp::new().await;
    let customer = app
        .seed_customer("Late", CustomerType::Wholesale, None)
        .await;
    let product = app.seed_product("BAT-03", dec!(10), dec!(8)).await;
    // Harvested 40 days ago with a 30 day shelf life
    let batch = app
        .seed_batch(product.id, 1, TestApp::today() - Duration::days(40))
        .await;
    let codes = app.unit_codes(batch.id).await;

    let order_id = draft_order(&app, customer.id, OrderType::Wholesale).await;
    let err = app
        .services
        .inventory
        .allocate(order_id, &codes[0])
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::BusinessRule(_)));
}

#[tokio::test]
async fn allocation_is_idempotent_per_order_and_exclusive_across_orders() {
    let app = TestApp::new().await;
    let customer = app
        .seed_customer("Scanner", CustomerType::Wholesale, None)
        .await;
    let product = app.seed_product("BAT-04", dec!(12), dec!(9)).await;
    let batch = app.seed_batch(product.id, 1, TestApp::today()).await;
    let codes = app.unit_codes(batch.id).await;

    let first_order = draft_order(&app, customer.id, OrderType::Wholesale).await;
    let unit = app
        .services
        .inventory
        .allocate(first_order, &codes[0])
        .await
        .unwrap();
    assert_eq!(unit.status, UnitStatus::Allocated);
    assert_eq!(unit.sales_order_id, Some(first_order));
    // Wholesale order picks up the wholesale price
    assert_eq!(unit.sold_price, Some(dec!(9)));

    // Re-scan on the same order is a no-op
    let again = app
        .services
        .inventory
        .allocate(first_order, &codes[0])
        .await
        .unwrap();
    assert_eq!(again.id, unit.id);
    assert_eq!(again.status, UnitStatus::Allocated);

    // A different order cannot take it
    let second_order = draft_order(&app, customer.id, OrderType::Wholesale).await;
    let err = app
        .services
        .inventory
        .allocate(second_order, &codes[0])
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::BusinessRule(_)));
}

#[tokio::test]
async fn retail_allocation_uses_retail_price() {
    let app = TestApp::new().await;
    let customer = app
        .seed_customer("Shopper", CustomerType::Retail, None)
        .await;
    let product = app.seed_product("BAT-05", dec!(12), dec!(9)).await;
    let batch = app.seed_batch(product.id, 1, TestApp::today()).await;
    let codes = app.unit_codes(batch.id).await;

    let order_id = draft_order(&app, customer.id, OrderType::Retail).await;
    let unit = app
        .services
        .inventory
        .allocate(order_id, &codes[0])
        .await
        .unwrap();
    assert_eq!(unit.sold_price, Some(dec!(12)));
}

#[tokio::test]
async fn release_returns_unit_to_shelf() {
    let app = TestApp::new().await;
    let customer = app
        .seed_customer("Undo", CustomerType::Wholesale, None)
        .await;
    let product = app.seed_product("BAT-06", dec!(12), dec!(9)).await;
    let batch = app.seed_batch(product.id, 1, TestApp::today()).await;
    let codes = app.unit_codes(batch.id).await;

    let order_id = draft_order(&app, customer.id, OrderType::Wholesale).await;
    let unit = app
        .services
        .inventory
        .allocate(order_id, &codes[0])
        .await
        .unwrap();

    let released = app.services.inventory.release(unit.id).await.unwrap();
    assert_eq!(released.status, UnitStatus::Available);
    assert_eq!(released.sales_order_id, None);
    assert_eq!(released.sold_price, None);

    // Releasing an available unit is a no-op
    let again = app.services.inventory.release(unit.id).await.unwrap();
    assert_eq!(again.status, UnitStatus::Available);
}

#[tokio::test]
async fn batch_delete_refused_once_units_moved() {
    let app = TestApp::new().await;
    let customer = app
        .seed_customer("Keeper", CustomerType::Wholesale, None)
        .await;
    let product = app.seed_product("BAT-07", dec!(12), dec!(9)).await;
    let batch = app.seed_batch(product.id, 2, TestApp::today()).await;
    let codes = app.unit_codes(batch.id).await;

    let order_id = draft_order(&app, customer.id, OrderType::Wholesale).await;
    app.services
        .inventory
        .allocate(order_id, &codes[0])
        .await
        .unwrap();

    let err = app
        .services
        .batches
        .delete_batch(batch.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));

    // Release the unit and the batch can go
    let unit = app
        .services
        .inventory
        .get_unit_by_code(&codes[0])
        .await
        .unwrap();
    app.services.inventory.release(unit.id).await.unwrap();
    app.services.batches.delete_batch(batch.id).await.unwrap();

    let err = app
        .services
        .batches
        .get_batch(batch.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}
