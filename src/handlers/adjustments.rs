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
    services::adjustments::{AdjustmentLineInput, CreateAdjustmentInput},
    AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct AdjustmentLineRequest {
    pub stock_entry_id: Uuid,
    pub quantity_change: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAdjustmentRequest {
    pub date: DateTime<Utc>,
    pub reason_id: Uuid,
    pub warehouse_id: Uuid,
    #[serde(default)]
    pub lines: Vec<AdjustmentLineRequest>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAdjustmentRequest {
    pub lines: Vec<AdjustmentLineRequest>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReasonRequest {
    #[validate(length(min = 1))]
    pub name: String,
}

fn to_line_inputs(lines: Vec<AdjustmentLineRequest>) -> Vec<AdjustmentLineInput> {
    lines
        .into_iter()
        .map(|l| AdjustmentLineInput {
            stock_entry_id: l.stock_entry_id,
            quantity_change: l.quantity_change,
        })
        .collect()
}

async fn create_adjustment(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateAdjustmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let created = state
        .services
        .adjustments
        .create(CreateAdjustmentInput {
            date: payload.date,
            reason_id: payload.reason_id,
            warehouse_id: payload.warehouse_id,
            lines: to_line_inputs(payload.lines),
        })
        .await
        .map_err(map_service_error)?;
    Ok(created_response(created.adjustment))
}

async fn update_adjustment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAdjustmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let updated = state
        .services
        .adjustments
        .update(id, to_line_inputs(payload.lines))
        .await
        .map_err(map_service_error)?;
    Ok(success_response(updated.adjustment))
}

async fn get_adjustment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let found = state
        .services
        .adjustments
        .get(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(serde_json::json!({
        "adjustment": found.adjustment,
        "lines": found.lines,
    })))
}

async fn list_adjustments(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let adjustments = state
        .services
        .adjustments
        .list()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(adjustments))
}

async fn archive_adjustment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let archived = state
        .services
        .adjustments
        .archive(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(archived))
}

async fn restore_adjustment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let restored = state
        .services
        .adjustments
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
        .adjustments
        .create_reason(payload.name)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(reason))
}

async fn list_reasons(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let reasons = state
        .services
        .adjustments
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
        .adjustments
        .remove_reason(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

pub fn adjustment_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_adjustment).get(list_adjustments))
        .route("/:id", get(get_adjustment).put(update_adjustment))
        .route("/:id/archive", post(archive_adjustment))
        .route("/:id/restore", post(restore_adjustment))
        .route("/reasons", post(create_reason).get(list_reasons))
        .route("/reasons/:id", delete(remove_reason))
}
