pub mod batches;
pub mod catalog;
pub mod inventory;
pub mod orders;
pub mod payments;
pub mod returns;

use crate::db::DbPool;
use crate::events::EventSender;
use rust_decimal::Decimal;
use std::sync::Arc;

pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<crate::services::CatalogService>,
    pub batches: Arc<crate::services::BatchService>,
    pub inventory: Arc<crate::services::InventoryService>,
    pub orders: Arc<crate::services::OrderService>,
    pub payments: Arc<crate::services::PaymentService>,
    pub returns: Arc<crate::services::ReturnsService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender, tax_rate: Decimal) -> Self {
        Self {
            catalog: Arc::new(crate::services::CatalogService::new(db_pool.clone())),
            batches: Arc::new(crate::services::BatchService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            inventory: Arc::new(crate::services::InventoryService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            orders: Arc::new(crate::services::OrderService::new(
                db_pool.clone(),
                event_sender.clone(),
                tax_rate,
            )),
            payments: Arc::new(crate::services::PaymentService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            returns: Arc::new(crate::services::ReturnsService::new(db_pool, event_sender)),
        }
    }
}
