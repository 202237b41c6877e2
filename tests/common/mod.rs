use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use tokio::sync::mpsc;

use farmstock_api::{
    db::{self, DbConfig, DbPool},
    entities::customer::{self, CustomerType},
    entities::harvest_batch,
    entities::inventory_unit::{self, Entity as UnitEntity},
    entities::product,
    events::{self, EventSender},
    handlers::AppServices,
    services::batches::CreateBatchRequest,
};

/// Test harness over an in-memory SQLite database. A single pooled
/// connection keeps every query on the same in-memory database.
pub struct TestApp {
    pub db: Arc<DbPool>,
    pub services: AppServices,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let cfg = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(5),
        };
        let pool = db::establish_connection_with_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations");

        let db = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let services = AppServices::new(db.clone(), event_sender, dec!(0.10));

        Self {
            db,
            services,
            _event_task: event_task,
        }
    }

    pub async fn seed_customer(
        &self,
        name: &str,
        customer_type: CustomerType,
        credit_limit: Option<Decimal>,
    ) -> customer::Model {
        customer::ActiveModel {
            name: Set(name.to_string()),
            customer_type: Set(customer_type),
            is_hidden: Set(false),
            credit_limit: Set(credit_limit),
            phone: Set(None),
            email: Set(None),
            address: Set(None),
            deleted: Set(false),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .expect("failed to seed customer")
    }

    pub async fn seed_product(
        &self,
        sku: &str,
        retail_price: Decimal,
        wholesale_price: Decimal,
    ) -> product::Model {
        product::ActiveModel {
            name: Set(format!("Product {}", sku)),
            sku: Set(sku.to_string()),
            unit_of_measure: Set("crate".to_string()),
            shelf_life_days: Set(Some(30)),
            retail_price: Set(Some(retail_price)),
            wholesale_price: Set(Some(wholesale_price)),
            deleted: Set(false),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .expect("failed to seed product")
    }

    /// Creates a batch through the service so units and serials exist.
    pub async fn seed_batch(
        &self,
        product_id: i64,
        quantity: i32,
        batch_date: NaiveDate,
    ) -> harvest_batch::Model {
        self.services
            .batches
            .create_batch(CreateBatchRequest {
                product_id,
                quantity,
                batch_date,
                shelf_life_days: None,
            })
            .await
            .expect("failed to seed batch")
    }

    pub async fn unit_codes(&self, batch_id: i64) -> Vec<String> {
        UnitEntity::find()
            .filter(inventory_unit::Column::BatchId.eq(batch_id))
            .order_by_asc(inventory_unit::Column::SerialCode)
            .all(&*self.db)
            .await
            .expect("failed to list units")
            .into_iter()
            .map(|u| u.serial_code)
            .collect()
    }

    pub fn today() -> NaiveDate {
        Utc::now().date_naive()
    }
}
