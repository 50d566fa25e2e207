use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::post,
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    errors::ApiError,
    handlers::common::{created_response, map_service_error, success_response, validate_input},
    AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct OpenShiftRequest {
    pub point_of_sale_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct WithdrawRequest {
    pub amount: Decimal,
}

async fn open_shift(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<OpenShiftRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let shift = state
        .services
        .registers
        .open_shift(payload.point_of_sale_id)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(shift))
}

async fn close_shift(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let shift = state
        .services
        .registers
        .close_shift(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(shift))
}

async fn withdraw(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<WithdrawRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let row = state
        .services
        .registers
        .withdraw(id, payload.amount)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(row))
}

pub fn register_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(open_shift))
        .route("/:id/close", post(close_shift))
        .route("/:id/withdraw", post(withdraw))
}
