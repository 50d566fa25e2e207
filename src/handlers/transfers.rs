use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    errors::ApiError,
    handlers::common::{
        created_response, map_service_error, no_content_response, success_response, validate_input,
    },
    services::transfers::{CreateTransferInput, TransferItemInput, UpdateTransferInput},
    AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct TransferItemRequest {
    pub variant_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTransferRequest {
    pub date: DateTime<Utc>,
    pub reason_id: Uuid,
    pub source_warehouse_id: Uuid,
    pub destination_warehouse_id: Uuid,
    #[serde(default)]
    pub items: Vec<TransferItemRequest>,
}

/// Absent fields keep their current values; absent `items` keeps the item set.
#[derive(Debug, Deserialize, Validate, Default)]
pub struct UpdateTransferRequest {
    pub date: Option<DateTime<Utc>>,
    pub reason_id: Option<Uuid>,
    pub source_warehouse_id: Option<Uuid>,
    pub destination_warehouse_id: Option<Uuid>,
    pub items: Option<Vec<TransferItemRequest>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReasonRequest {
    #[validate(length(min = 1))]
    pub name: String,
}

fn to_item_inputs(items: Vec<TransferItemRequest>) -> Vec<TransferItemInput> {
    items
        .into_iter()
        .map(|i| TransferItemInput {
            variant_id: i.variant_id,
            quantity: i.quantity,
        })
        .collect()
}

async fn create_transfer(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateTransferRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let created = state
        .services
        .transfers
        .create(CreateTransferInput {
            date: payload.date,
            reason_id: payload.reason_id,
            source_warehouse_id: payload.source_warehouse_id,
            destination_warehouse_id: payload.destination_warehouse_id,
            items: to_item_inputs(payload.items),
        })
        .await
        .map_err(map_service_error)?;
    Ok(created_response(created.transfer))
}

async fn update_transfer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTransferRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let updated = state
        .services
        .transfers
        .update(
            id,
            UpdateTransferInput {
                date: payload.date,
                reason_id: payload.reason_id,
                source_warehouse_id: payload.source_warehouse_id,
                destination_warehouse_id: payload.destination_warehouse_id,
                items: payload.items.map(to_item_inputs),
            },
        )
        .await
        .map_err(map_service_error)?;
    Ok(success_response(updated.transfer))
}

async fn get_transfer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let found = state
        .services
        .transfers
        .get(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(serde_json::json!({
        "transfer": found.transfer,
        "items": found.items,
    })))
}

async fn list_transfers(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let transfers = state
        .services
        .transfers
        .list()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(transfers))
}

async fn archive_transfer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let archived = state
        .services
        .transfers
        .archive(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(archived))
}

async fn restore_transfer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let restored = state
        .services
        .transfers
        .restore(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(restored))
}

async fn create_reason(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateReasonRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let reason = state
        .services
        .transfers
        .create_reason(payload.name)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(reason))
}

async fn list_reasons(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let reasons = state
        .services
        .transfers
        .list_reasons()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(reasons))
}

async fn remove_reason(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .transfers
        .remove_reason(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

pub fn transfer_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_transfer).get(list_transfers))
        .route("/:id", get(get_transfer).put(update_transfer))
        .route("/:id/archive", post(archive_transfer))
        .route("/:id/restore", post(restore_transfer))
        .route("/reasons", post(create_reason).get(list_reasons))
        .route("/reasons/:id", delete(remove_reason))
}
