use chrono::Utc;
use rust_decimal::Decimal;
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
        order::{self, Entity as Order},
        order_item::{self, Entity as OrderItem},
        refund::{self, Entity as Refund},
        refund_item,
        register_transaction::RegisterTransactionKind,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{ledger::StockLedger, registers::Register},
};

#[derive(Debug, Clone)]
pub struct RefundItemInput {
    pub order_item_id: Uuid,
    pub quantity: i64,
}

#[derive(Debug, Clone)]
pub struct CreateRefundInput {
    pub order_id: Uuid,
    pub shift_id: Uuid,
    pub items: Vec<RefundItemInput>,
}

#[derive(Debug, Clone)]
pub struct RefundWithItems {
    pub refund: refund::Model,
    pub items: Vec<refund_item::Model>,
}

/// Pro-rates one refunded line's amount.
///
/// `discounted_price` already reflects the catalog sale and the item's custom
/// discount; the order-level bulk discount is shared out by the ratio of the
/// order's final total to the sum of discounted line totals.
pub fn prorate_amount(
    discounted_price: Decimal,
    quantity: i64,
    order_total: Decimal,
    order_subtotal: Decimal,
) -> Decimal {
    let line = discounted_price * Decimal::from(quantity);
    if order_subtotal.is_zero() {
        return Decimal::ZERO;
    }
    line * order_total / order_subtotal
}

/// Refund processing: credits quantities back to the order items' stock
/// entries and debits the register. Refunds are immutable; a mistake is
/// corrected by a further refund on the remaining quantities.
///
/// The engine does not cap refunded quantities against the original order;
/// that contract is the caller's (matching the ledger's archival flows, which
/// may legitimately re-credit already-refunded entries).
#[derive(Clone)]
pub struct RefundService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl RefundService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, input), fields(items = input.items.len()))]
    pub async fn create(&self, input: CreateRefundInput) -> Result<RefundWithItems, ServiceError> {
        let db = self.db_pool.as_ref();

        Register::require_open_shift(db, input.shift_id).await?;
        if input.items.is_empty() {
            return Err(ServiceError::InvalidInput(
                "Refund must contain at least one item".into(),
            ));
        }
        for item in &input.items {
            if item.quantity <= 0 {
                return Err(ServiceError::InvalidInput(format!(
                    "Refund quantity for order item {} must be positive",
                    item.order_item_id
                )));
            }
        }

        let result = db
            .transaction::<_, RefundWithItems, ServiceError>(move |txn| {
                Box::pin(async move {
                    let shift = Register::require_open_shift(txn, input.shift_id).await?;
                    // Counted inside the transaction so concurrent creates
                    // cannot mint the same "#N" name.
                    let sequence = Refund::find()
                        .count(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        + 1;
                    let order = Order::find_by_id(input.order_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Order {} not found", input.order_id))
                        })?;

                    let order_items = OrderItem::find()
                        .filter(order_item::Column::OrderId.eq(order.id))
                        .all(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                    let order_subtotal: Decimal = order_items
                        .iter()
                        .map(|i| i.discounted_price * Decimal::from(i.quantity))
                        .sum();

                    let now = Utc::now();
                    let refund = refund::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        name: Set(format!("Refund #{}", sequence)),
                        order_id: Set(order.id),
                        shift_id: Set(input.shift_id),
                        total_amount: Set(Decimal::ZERO),
                        date: Set(now),
                        created_at: Set(now),
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    let mut total = Decimal::ZERO;
                    let mut items = Vec::with_capacity(input.items.len());
                    for item in &input.items {
                        let order_item = order_items
                            .iter()
                            .find(|oi| oi.id == item.order_item_id)
                            .ok_or_else(|| {
                                ServiceError::NotFound(format!(
                                    "Order item {} not found on order {}",
                                    item.order_item_id, order.id
                                ))
                            })?;

                        let amount = prorate_amount(
                            order_item.discounted_price,
                            item.quantity,
                            order.total_amount,
                            order_subtotal,
                        );
                        total += amount;

                        let entry =
                            StockLedger::get_entry_by_id(txn, order_item.stock_entry_id).await?;
                        StockLedger::apply_delta(
                            txn,
                            entry.variant_id,
                            entry.warehouse_id,
                            item.quantity,
                        )
                        .await?;

                        let persisted = refund_item::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            refund_id: Set(refund.id),
                            order_item_id: Set(item.order_item_id),
                            quantity: Set(item.quantity),
                            amount: Set(amount),
                            created_at: Set(now),
                        }
                        .insert(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                        items.push(persisted);
                    }

                    let mut active: refund::ActiveModel = refund.into();
                    active.total_amount = Set(total);
                    let refund = active.update(txn).await.map_err(ServiceError::db_error)?;

                    Register::record(txn, &shift, RegisterTransactionKind::Debit, -total).await?;

                    Ok(RefundWithItems { refund, items })
                })
            })
            .await?;

        info!(refund_id = %result.refund.id, total = %result.refund.total_amount, "refund created");
        self.emit(Event::RefundCreated(result.refund.id)).await;
        Ok(result)
    }

    pub async fn find_one(&self, id: Uuid) -> Result<RefundWithItems, ServiceError> {
        let db = self.db_pool.as_ref();
        let refund = Refund::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Refund {} not found", id)))?;
        let items = refund_item::Entity::find()
            .filter(refund_item::Column::RefundId.eq(id))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(RefundWithItems { refund, items })
    }

    pub async fn find_all(&self) -> Result<Vec<refund::Model>, ServiceError> {
        Refund::find()
            .order_by_desc(refund::Column::CreatedAt)
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
