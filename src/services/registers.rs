use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{error, instrument};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        point_of_sale::{self, Entity as PointOfSale},
        register_transaction::{self, RegisterTransactionKind},
        shift::{self, Entity as Shift},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Register-side bookkeeping shared by orders, refunds, and withdrawals.
///
/// Associated functions take a connection so document services can record
/// register rows inside their own transactions.
pub struct Register;

impl Register {
    /// Records a register transaction for the shift and applies the signed
    /// amount to the owning point-of-sale balance. CREDIT rows carry positive
    /// amounts, DEBIT rows negative ones.
    pub async fn record<C: ConnectionTrait>(
        db: &C,
        shift: &shift::Model,
        kind: RegisterTransactionKind,
        amount: Decimal,
    ) -> Result<register_transaction::Model, ServiceError> {
        let row = register_transaction::ActiveModel {
            id: Set(Uuid::new_v4()),
            shift_id: Set(shift.id),
            kind: Set(kind.to_string()),
            amount: Set(amount),
            date: Set(Utc::now()),
        }
        .insert(db)
        .await
        .map_err(ServiceError::db_error)?;

        PointOfSale::update_many()
            .col_expr(
                point_of_sale::Column::Balance,
                Expr::col(point_of_sale::Column::Balance).add(amount),
            )
            .col_expr(point_of_sale::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(point_of_sale::Column::Id.eq(shift.point_of_sale_id))
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(row)
    }

    /// Loads a shift and requires it to be open. Orders, refunds, and
    /// register movements are all gated on this.
    pub async fn require_open_shift<C: ConnectionTrait>(
        db: &C,
        shift_id: Uuid,
    ) -> Result<shift::Model, ServiceError> {
        let shift = Shift::find_by_id(shift_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Shift {} not found", shift_id)))?;
        if !shift.is_opened {
            return Err(ServiceError::Conflict(format!(
                "Shift {} is closed",
                shift_id
            )));
        }
        Ok(shift)
    }
}

/// Shift lifecycle and cash withdrawals at a point of sale.
#[derive(Clone)]
pub struct RegisterService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl RegisterService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn open_shift(&self, point_of_sale_id: Uuid) -> Result<shift::Model, ServiceError> {
        let db = self.db_pool.as_ref();
        PointOfSale::find_by_id(point_of_sale_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Point of sale {} not found", point_of_sale_id))
            })?;

        let open = Shift::find()
            .filter(shift::Column::PointOfSaleId.eq(point_of_sale_id))
            .filter(shift::Column::IsOpened.eq(true))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if open.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Point of sale {} already has an open shift",
                point_of_sale_id
            )));
        }

        let shift = shift::ActiveModel {
            id: Set(Uuid::new_v4()),
            point_of_sale_id: Set(point_of_sale_id),
            is_opened: Set(true),
            opened_at: Set(Utc::now()),
            closed_at: Set(None),
        }
        .insert(db)
        .await
        .map_err(ServiceError::db_error)?;

        self.emit(Event::ShiftOpened(shift.id)).await;
        Ok(shift)
    }

    #[instrument(skip(self))]
    pub async fn close_shift(&self, shift_id: Uuid) -> Result<shift::Model, ServiceError> {
        let db = self.db_pool.as_ref();
        let shift = Register::require_open_shift(db, shift_id).await?;

        let mut active: shift::ActiveModel = shift.into();
        active.is_opened = Set(false);
        active.closed_at = Set(Some(Utc::now()));
        let shift = active.update(db).await.map_err(ServiceError::db_error)?;

        self.emit(Event::ShiftClosed(shift_id)).await;
        Ok(shift)
    }

    /// Takes cash out of the register. Fails with BadRequest when the amount
    /// exceeds the point-of-sale balance.
    #[instrument(skip(self))]
    pub async fn withdraw(
        &self,
        shift_id: Uuid,
        amount: Decimal,
    ) -> Result<register_transaction::Model, ServiceError> {
        if amount <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "Withdrawal amount must be positive".into(),
            ));
        }

        let db = self.db_pool.as_ref();
        Register::require_open_shift(db, shift_id).await?;

        // The balance guard runs inside the transaction over the POS row so
        // two concurrent withdrawals cannot both pass it and overdraw.
        let row = db
            .transaction::<_, register_transaction::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let shift = Register::require_open_shift(txn, shift_id).await?;
                    let pos = PointOfSale::find_by_id(shift.point_of_sale_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "Point of sale {} not found",
                                shift.point_of_sale_id
                            ))
                        })?;
                    if amount > pos.balance {
                        return Err(ServiceError::BadRequest(format!(
                            "Withdrawal of {} exceeds register balance {}",
                            amount, pos.balance
                        )));
                    }
                    Register::record(txn, &shift, RegisterTransactionKind::Debit, -amount).await
                })
            })
            .await?;
        Ok(row)
    }

    async fn emit(&self, event: Event) {
        if let Err(e) = self.event_sender.send(event).await {
            error!("Failed to send event: {}", e);
        }
    }
}
