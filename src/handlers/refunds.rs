use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    errors::ApiError,
    handlers::common::{created_response, map_service_error, success_response, validate_input},
    services::refunds::{CreateRefundInput, RefundItemInput},
    AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct RefundItemRequest {
    pub order_item_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRefundRequest {
    pub order_id: Uuid,
    pub shift_id: Uuid,
    pub items: Vec<RefundItemRequest>,
}

async fn create_refund(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateRefundRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let created = state
        .services
        .refunds
        .create(CreateRefundInput {
            order_id: payload.order_id,
            shift_id: payload.shift_id,
            items: payload
                .items
                .into_iter()
                .map(|i| RefundItemInput {
                    order_item_id: i.order_item_id,
                    quantity: i.quantity,
                })
                .collect(),
        })
        .await
        .map_err(map_service_error)?;
    Ok(created_response(serde_json::json!({
        "refund": created.refund,
        "items": created.items,
    })))
}

async fn get_refund(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let found = state
        .services
        .refunds
        .find_one(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(serde_json::json!({
        "refund": found.refund,
        "items": found.items,
    })))
}

async fn list_refunds(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let refunds = state
        .services
        .refunds
        .find_all()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(refunds))
}

pub fn refund_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_refund).get(list_refunds))
        .route("/:id", get(get_refund))
}
