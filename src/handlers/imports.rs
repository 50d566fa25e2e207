use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    errors::ApiError,
    handlers::common::{created_response, map_service_error, validate_input},
    AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct ImportRequest {
    #[validate(length(min = 1))]
    pub key: String,
    pub warehouse_id: Uuid,
}

#[derive(Debug, Serialize)]
struct ImportResponse {
    products_created: usize,
    variants_created: usize,
    variants_updated: usize,
}

async fn import_products(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ImportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let summary = state
        .services
        .import
        .import_products(
            state.services.object_store.as_ref(),
            &payload.key,
            payload.warehouse_id,
        )
        .await
        .map_err(map_service_error)?;
    Ok(created_response(ImportResponse {
        products_created: summary.products_created,
        variants_created: summary.variants_created,
        variants_updated: summary.variants_updated,
    }))
}

pub fn import_routes() -> Router<Arc<AppState>> {
    Router::new().route("/", post(import_products))
}
