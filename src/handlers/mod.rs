pub mod adjustments;
pub mod common;
pub mod imports;
pub mod orders;
pub mod refunds;
pub mod registers;
pub mod stock;
pub mod transfers;

use std::sync::Arc;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::import::ObjectStore;

pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub adjustments: Arc<crate::services::adjustments::InventoryAdjustmentService>,
    pub transfers: Arc<crate::services::transfers::InventoryTransferService>,
    pub orders: Arc<crate::services::orders::OrderService>,
    pub refunds: Arc<crate::services::refunds::RefundService>,
    pub registers: Arc<crate::services::registers::RegisterService>,
    pub import: Arc<crate::services::import::ImportService>,
    pub object_store: Arc<dyn ObjectStore>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        object_store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            adjustments: Arc::new(
                crate::services::adjustments::InventoryAdjustmentService::new(
                    db_pool.clone(),
                    event_sender.clone(),
                ),
            ),
            transfers: Arc::new(crate::services::transfers::InventoryTransferService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            orders: Arc::new(crate::services::orders::OrderService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            refunds: Arc::new(crate::services::refunds::RefundService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            registers: Arc::new(crate::services::registers::RegisterService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            import: Arc::new(crate::services::import::ImportService::new(
                db_pool,
                event_sender,
            )),
            object_store,
        }
    }
}
