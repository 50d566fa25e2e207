use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    errors::ApiError,
    handlers::common::{map_service_error, success_response},
    services::ledger::StockLedger,
    AppState,
};

async fn get_stock_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = StockLedger::get_entry_by_id(state.db.as_ref(), id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(entry))
}

async fn list_variant_entries(
    State(state): State<Arc<AppState>>,
    Path(variant_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = StockLedger::find_entries_for_variant(state.db.as_ref(), variant_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(entries))
}

pub fn stock_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:id", get(get_stock_entry))
        .route("/variants/:variant_id", get(list_variant_entries))
}
