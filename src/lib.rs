//! StoreOps API Library
//!
//! Back-office inventory ledger: stock entries per (variant, warehouse) with
//! denormalized product/variant totals, moved by adjustments, transfers,
//! orders, refunds, and bulk imports.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod services;

use axum::{routing::get, Router};
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<db::DbPool>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

/// API router for the regular endpoints. Nested under `/api/v1` by the
/// binary; the import router is mounted separately because it runs under the
/// longer import timeout.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/adjustments", handlers::adjustments::adjustment_routes())
        .nest("/transfers", handlers::transfers::transfer_routes())
        .nest("/orders", handlers::orders::order_routes())
        .nest("/refunds", handlers::refunds::refund_routes())
        .nest("/shifts", handlers::registers::register_routes())
        .nest("/stock-entries", handlers::stock::stock_routes())
}

/// Liveness plus a database ping.
pub fn health_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/health",
        get(|axum::extract::State(state): axum::extract::State<Arc<AppState>>| async move {
            match state.db.ping().await {
                Ok(()) => (
                    axum::http::StatusCode::OK,
                    axum::Json(serde_json::json!({"status": "ok"})),
                ),
                Err(_) => (
                    axum::http::StatusCode::SERVICE_UNAVAILABLE,
                    axum::Json(serde_json::json!({"status": "degraded"})),
                ),
            }
        }),
    )
}
