mod common;

use common::TestApp;
use rust_decimal_macros::dec;

use farmstock_api::{
    entities::customer::CustomerType,
    errors::ServiceError,
    services::catalog::{CreateCustomerRequest, CreateProductRequest},
};

fn customer_request(name: &str) -> CreateCustomerRequest {
    CreateCustomerRequest {
        name: name.to_string(),
        customer_type: CustomerType::Wholesale,
        is_hidden: false,
        credit_limit: None,
        phone: None,
        email: None,
        address: None,
    }
}

fn product_request(sku: &str) -> CreateProductRequest {
    CreateProductRequest {
        name: format!("Product {}", sku),
        sku: sku.to_string(),
        unit_of_measure: "kg".to_string(),
        shelf_life_days: Some(14),
        retail_price: Some(dec!(12.50)),
        wholesale_price: Some(dec!(10)),
    }
}

#[tokio::test]
async fn soft_deleted_customer_disappears_from_reads() {
    let app = TestApp::new().await;
    let created = app
        .services
        .catalog
        .create_customer(customer_request("Dairy Co"))
        .await
        .unwrap();

    app.services
        .catalog
        .delete_customer(created.id)
        .await
        .unwrap();

    let err = app
        .services
        .catalog
        .get_customer(created.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let (customers, total) = app.services.catalog.list_customers(1, 20).await.unwrap();
    assert_eq!(total, 0);
    assert!(customers.is_empty());
}

#[tokio::test]
async fn negative_credit_limit_is_rejected() {
    let app = TestApp::new().await;
    let mut request = customer_request("Debtor");
    request.credit_limit = Some(dec!(-100));

    let err = app
        .services
        .catalog
        .create_customer(request)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn duplicate_sku_is_a_conflict() {
    let app = TestApp::new().await;
    app.services
        .catalog
        .create_product(product_request("SKU-1"))
        .await
        .unwrap();

    let err = app
        .services
        .catalog
        .create_product(product_request("SKU-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn negative_prices_are_rejected() {
    let app = TestApp::new().await;
    let mut request = product_request("SKU-2");
    request.retail_price = Some(dec!(-1));

    let err = app
        .services
        .catalog
        .create_product(request)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}
