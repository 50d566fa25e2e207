use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        order::{self, DiscountKind, Entity as Order, PaymentMethod},
        order_item::{self, Entity as OrderItem},
        product_variant::Entity as ProductVariant,
        register_transaction::RegisterTransactionKind,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{ledger::StockLedger, registers::Register},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Discount {
    pub kind: DiscountKind,
    pub value: Decimal,
}

#[derive(Debug, Clone)]
pub struct OrderItemInput {
    pub stock_entry_id: Uuid,
    pub quantity: i64,
    pub custom_discount: Option<Discount>,
}

#[derive(Debug, Clone)]
pub struct CreateOrderInput {
    pub shift_id: Uuid,
    pub payment_method: PaymentMethod,
    pub items: Vec<OrderItemInput>,
    pub bulk_discount: Option<Discount>,
    /// Caller-supplied split for MIXED payment; ignored otherwise
    pub cash_amount: Option<Decimal>,
    pub card_amount: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct OrderWithItems {
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

/// Applies a discount to an amount, clamping at zero.
pub fn apply_discount(amount: Decimal, discount: Option<&Discount>) -> Decimal {
    let discounted = match discount {
        None => amount,
        Some(d) => match d.kind {
            DiscountKind::Fixed => amount - d.value,
            DiscountKind::Percentage => amount - amount * d.value / dec!(100),
        },
    };
    discounted.max(Decimal::ZERO)
}

/// Splits an order total into cash and card components.
///
/// For MIXED payment the caller-supplied amounts are used only when they sum
/// to the computed total; otherwise both splits are recorded as zero (the
/// behavior the register reconciliation downstream expects — see DESIGN.md).
pub fn split_payment(
    total: Decimal,
    method: PaymentMethod,
    cash: Option<Decimal>,
    card: Option<Decimal>,
) -> (Decimal, Decimal) {
    match method {
        PaymentMethod::Cash => (total, Decimal::ZERO),
        PaymentMethod::Card => (Decimal::ZERO, total),
        PaymentMethod::Mixed => {
            let cash = cash.unwrap_or(Decimal::ZERO);
            let card = card.unwrap_or(Decimal::ZERO);
            if cash + card == total {
                (cash, card)
            } else {
                (Decimal::ZERO, Decimal::ZERO)
            }
        }
    }
}

/// Point-of-sale order fulfillment.
///
/// Pricing order is fixed: base price → catalog sale price → custom item
/// discount → sum across items → bulk discount → cash/card split. Each item
/// decrements its stock entry through the ledger in the same transaction.
/// Orders are immutable once created; corrections happen via refunds.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, input), fields(items = input.items.len()))]
    pub async fn create(&self, input: CreateOrderInput) -> Result<OrderWithItems, ServiceError> {
        let db = self.db_pool.as_ref();

        Register::require_open_shift(db, input.shift_id).await?;
        if input.items.is_empty() {
            return Err(ServiceError::InvalidInput(
                "Order must contain at least one item".into(),
            ));
        }
        for item in &input.items {
            if item.quantity <= 0 {
                return Err(ServiceError::InvalidInput(format!(
                    "Order quantity for stock entry {} must be positive",
                    item.stock_entry_id
                )));
            }
        }

        let result = db
            .transaction::<_, OrderWithItems, ServiceError>(move |txn| {
                Box::pin(async move {
                    let shift = Register::require_open_shift(txn, input.shift_id).await?;
                    // Counted inside the transaction so concurrent creates
                    // cannot mint the same "#N" name.
                    let sequence = Order::find()
                        .count(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        + 1;

                    // Price every line before writing anything.
                    let mut priced = Vec::with_capacity(input.items.len());
                    let mut subtotal = Decimal::ZERO;
                    for item in &input.items {
                        let entry = StockLedger::get_entry_by_id(txn, item.stock_entry_id).await?;
                        let variant = ProductVariant::find_by_id(entry.variant_id)
                            .one(txn)
                            .await
                            .map_err(ServiceError::db_error)?
                            .ok_or_else(|| {
                                ServiceError::NotFound(format!(
                                    "Product variant {} not found",
                                    entry.variant_id
                                ))
                            })?;

                        let unit_price = variant.price;
                        let base = variant.sale_price.unwrap_or(variant.price);
                        let discounted = apply_discount(base, item.custom_discount.as_ref());
                        subtotal += discounted * Decimal::from(item.quantity);
                        priced.push((item, entry, unit_price, discounted));
                    }

                    let total = apply_discount(subtotal, input.bulk_discount.as_ref());
                    let (total_cash, total_card) = split_payment(
                        total,
                        input.payment_method,
                        input.cash_amount,
                        input.card_amount,
                    );

                    let now = Utc::now();
                    let order = order::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        name: Set(format!("Order #{}", sequence)),
                        shift_id: Set(input.shift_id),
                        date: Set(now),
                        payment_method: Set(input.payment_method.to_string()),
                        total_amount: Set(total),
                        total_cash_amount: Set(total_cash),
                        total_card_amount: Set(total_card),
                        bulk_discount_kind: Set(input
                            .bulk_discount
                            .map(|d| d.kind.to_string())),
                        bulk_discount_value: Set(input.bulk_discount.map(|d| d.value)),
                        created_at: Set(now),
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    let mut items = Vec::with_capacity(priced.len());
                    for (item, entry, unit_price, discounted) in priced {
                        StockLedger::apply_delta(
                            txn,
                            entry.variant_id,
                            entry.warehouse_id,
                            -item.quantity,
                        )
                        .await?;

                        let persisted = order_item::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            order_id: Set(order.id),
                            stock_entry_id: Set(item.stock_entry_id),
                            quantity: Set(item.quantity),
                            unit_price: Set(unit_price),
                            discounted_price: Set(discounted),
                            custom_discount_kind: Set(item
                                .custom_discount
                                .map(|d| d.kind.to_string())),
                            custom_discount_value: Set(item.custom_discount.map(|d| d.value)),
                            created_at: Set(now),
                        }
                        .insert(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                        items.push(persisted);
                    }

                    Register::record(txn, &shift, RegisterTransactionKind::Credit, total).await?;

                    Ok(OrderWithItems { order, items })
                })
            })
            .await?;

        info!(order_id = %result.order.id, total = %result.order.total_amount, "order created");
        self.emit(Event::OrderCreated(result.order.id)).await;
        Ok(result)
    }

    pub async fn find_one(&self, id: Uuid) -> Result<OrderWithItems, ServiceError> {
        let db = self.db_pool.as_ref();
        let order = Order::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;
        let items = OrderItem::find()
            .filter(order_item::Column::OrderId.eq(id))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(OrderWithItems { order, items })
    }

    pub async fn find_all(&self) -> Result<Vec<order::Model>, ServiceError> {
        Order::find()
            .order_by_desc(order::Column::CreatedAt)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    async fn emit(&self, event: Event) {
        if let Err(e) = self.event_sender.send(event).await {
            error!("Failed to send event: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_discount_subtracts() {
        let d = Discount {
            kind: DiscountKind::Fixed,
            value: dec!(15),
        };
        assert_eq!(apply_discount(dec!(100), Some(&d)), dec!(85));
    }

    #[test]
    fn percentage_discount_scales() {
        let d = Discount {
            kind: DiscountKind::Percentage,
            value: dec!(20),
        };
        assert_eq!(apply_discount(dec!(250), Some(&d)), dec!(200));
    }

    #[test]
    fn discount_clamps_at_zero() {
        let d = Discount {
            kind: DiscountKind::Fixed,
            value: dec!(75),
        };
        assert_eq!(apply_discount(dec!(50), Some(&d)), dec!(0));
    }

    #[test]
    fn no_discount_is_identity() {
        assert_eq!(apply_discount(dec!(99.99), None), dec!(99.99));
    }

    #[test]
    fn cash_payment_goes_entirely_to_cash() {
        let (cash, card) = split_payment(dec!(100), PaymentMethod::Cash, None, None);
        assert_eq!((cash, card), (dec!(100), dec!(0)));
    }

    #[test]
    fn card_payment_goes_entirely_to_card() {
        let (cash, card) = split_payment(dec!(100), PaymentMethod::Card, None, None);
        assert_eq!((cash, card), (dec!(0), dec!(100)));
    }

    #[test]
    fn mixed_payment_uses_matching_split() {
        let (cash, card) =
            split_payment(dec!(100), PaymentMethod::Mixed, Some(dec!(60)), Some(dec!(40)));
        assert_eq!((cash, card), (dec!(60), dec!(40)));
    }

    #[test]
    fn mixed_payment_mismatch_zeroes_both() {
        let (cash, card) =
            split_payment(dec!(100), PaymentMethod::Mixed, Some(dec!(60)), Some(dec!(50)));
        assert_eq!((cash, card), (dec!(0), dec!(0)));
    }
}
