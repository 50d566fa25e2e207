// Not every test binary uses every helper.
#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use tokio::sync::mpsc;
use uuid::Uuid;

use storeops_api::{
    config::AppConfig,
    db::{self, DbPool},
    entities::{
        inventory_adjustment_reason, inventory_transfer_reason, point_of_sale, product,
        product_variant, shift, stock_entry, warehouse,
    },
    events::{self, EventSender},
    handlers::AppServices,
    services::import::InMemoryObjectStore,
    services::ledger::StockLedger,
};

/// Application state backed by a fresh in-memory SQLite database. One pool
/// connection keeps the in-memory database alive for the test's duration.
pub struct TestApp {
    pub db: Arc<DbPool>,
    pub services: AppServices,
    config: AppConfig,
    event_sender: EventSender,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            0,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let db = Arc::new(pool);

        let (tx, rx) = mpsc::channel(256);
        let event_sender = EventSender::new(tx);
        let event_task = tokio::spawn(events::process_events(rx));

        let services = AppServices::new(
            db.clone(),
            Arc::new(event_sender.clone()),
            Arc::new(InMemoryObjectStore::new()),
        );

        Self {
            db,
            services,
            config: cfg,
            event_sender,
            _event_task: event_task,
        }
    }

    /// Router wired exactly like the binary's, minus the HTTP middleware.
    pub fn router(&self) -> axum::Router {
        let state = Arc::new(storeops_api::AppState {
            db: self.db.clone(),
            config: self.config.clone(),
            event_sender: self.event_sender.clone(),
            services: self.services.clone(),
        });
        axum::Router::new()
            .nest("/api/v1", storeops_api::api_routes())
            .nest(
                "/api/v1/imports",
                storeops_api::handlers::imports::import_routes(),
            )
            .merge(storeops_api::health_routes())
            .with_state(state)
    }

    pub async fn seed_product(&self, name: &str, sku: &str) -> product::Model {
        let now = Utc::now();
        product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            sku: Set(sku.to_string()),
            total_received_quantity: Set(0),
            total_warehouse_quantity: Set(0),
            is_archived: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db.as_ref())
        .await
        .expect("failed to seed product")
    }

    pub async fn seed_variant(
        &self,
        product_id: Uuid,
        name: &str,
        barcode: &str,
        price: Decimal,
        sale_price: Option<Decimal>,
    ) -> product_variant::Model {
        let now = Utc::now();
        product_variant::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            name: Set(name.to_string()),
            sku: Set(format!("{}-SKU", name)),
            barcode: Set(barcode.to_string()),
            price: Set(price),
            sale_price: Set(sale_price),
            total_received_quantity: Set(0),
            total_warehouse_quantity: Set(0),
            is_archived: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db.as_ref())
        .await
        .expect("failed to seed variant")
    }

    pub async fn seed_warehouse(&self, name: &str) -> warehouse::Model {
        let now = Utc::now();
        warehouse::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            is_archived: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db.as_ref())
        .await
        .expect("failed to seed warehouse")
    }

    /// Creates the stock entry for (variant, warehouse) and stocks it at
    /// `quantity` through the ledger so aggregates stay consistent.
    pub async fn seed_stock(
        &self,
        variant_id: Uuid,
        warehouse_id: Uuid,
        quantity: i64,
    ) -> stock_entry::Model {
        StockLedger::apply_delta(self.db.as_ref(), variant_id, warehouse_id, quantity)
            .await
            .expect("failed to seed stock entry")
    }

    pub async fn seed_adjustment_reason(&self, name: &str) -> inventory_adjustment_reason::Model {
        inventory_adjustment_reason::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            created_at: Set(Utc::now()),
        }
        .insert(self.db.as_ref())
        .await
        .expect("failed to seed adjustment reason")
    }

    pub async fn seed_transfer_reason(&self, name: &str) -> inventory_transfer_reason::Model {
        inventory_transfer_reason::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            created_at: Set(Utc::now()),
        }
        .insert(self.db.as_ref())
        .await
        .expect("failed to seed transfer reason")
    }

    pub async fn seed_point_of_sale(
        &self,
        warehouse_id: Uuid,
        balance: Decimal,
    ) -> point_of_sale::Model {
        let now = Utc::now();
        point_of_sale::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set("Front desk".to_string()),
            warehouse_id: Set(warehouse_id),
            balance: Set(balance),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db.as_ref())
        .await
        .expect("failed to seed point of sale")
    }

    pub async fn open_shift(&self, point_of_sale_id: Uuid) -> shift::Model {
        self.services
            .registers
            .open_shift(point_of_sale_id)
            .await
            .expect("failed to open shift")
    }

    pub async fn stock_quantity(&self, entry_id: Uuid) -> i64 {
        StockLedger::get_entry_by_id(self.db.as_ref(), entry_id)
            .await
            .expect("stock entry missing")
            .warehouse_quantity
    }

    pub async fn variant_total(&self, variant_id: Uuid) -> i64 {
        product_variant::Entity::find_by_id(variant_id)
            .one(self.db.as_ref())
            .await
            .expect("query failed")
            .expect("variant missing")
            .total_warehouse_quantity
    }

    pub async fn product_total(&self, product_id: Uuid) -> i64 {
        product::Entity::find_by_id(product_id)
            .one(self.db.as_ref())
            .await
            .expect("query failed")
            .expect("product missing")
            .total_warehouse_quantity
    }

    pub async fn register_balance(&self, point_of_sale_id: Uuid) -> Decimal {
        point_of_sale::Entity::find_by_id(point_of_sale_id)
            .one(self.db.as_ref())
            .await
            .expect("query failed")
            .expect("point of sale missing")
            .balance
    }
}
