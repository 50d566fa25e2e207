use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::order::{DiscountKind, PaymentMethod},
    errors::ApiError,
    handlers::common::{created_response, map_service_error, success_response, validate_input},
    services::orders::{CreateOrderInput, Discount, OrderItemInput},
    AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct DiscountRequest {
    pub kind: DiscountKind,
    pub value: Decimal,
}

impl From<DiscountRequest> for Discount {
    fn from(r: DiscountRequest) -> Self {
        Discount {
            kind: r.kind,
            value: r.value,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct OrderItemRequest {
    pub stock_entry_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i64,
    pub custom_discount: Option<DiscountRequest>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub shift_id: Uuid,
    pub payment_method: PaymentMethod,
    pub items: Vec<OrderItemRequest>,
    pub bulk_discount: Option<DiscountRequest>,
    pub cash_amount: Option<Decimal>,
    pub card_amount: Option<Decimal>,
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let created = state
        .services
        .orders
        .create(CreateOrderInput {
            shift_id: payload.shift_id,
            payment_method: payload.payment_method,
            items: payload
                .items
                .into_iter()
                .map(|i| OrderItemInput {
                    stock_entry_id: i.stock_entry_id,
                    quantity: i.quantity,
                    custom_discount: i.custom_discount.map(Into::into),
                })
                .collect(),
            bulk_discount: payload.bulk_discount.map(Into::into),
            cash_amount: payload.cash_amount,
            card_amount: payload.card_amount,
        })
        .await
        .map_err(map_service_error)?;
    Ok(created_response(serde_json::json!({
        "order": created.order,
        "items": created.items,
    })))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let found = state
        .services
        .orders
        .find_one(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(serde_json::json!({
        "order": found.order,
        "items": found.items,
    })))
}

async fn list_orders(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let orders = state
        .services
        .orders
        .find_all()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(orders))
}

pub fn order_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route("/:id", get(get_order))
}
