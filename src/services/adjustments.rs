use chrono::{DateTime, Utc};
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
        inventory_adjustment::{self, Entity as InventoryAdjustment},
        inventory_adjustment_line::{self, Entity as InventoryAdjustmentLine},
        inventory_adjustment_reason::{self, Entity as InventoryAdjustmentReason},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::ledger::StockLedger,
};

/// Input for one adjustment line. `quantity_change` is signed: the document
/// itself encodes increase vs decrease, so creation always increments the
/// ledger by this value as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustmentLineInput {
    pub stock_entry_id: Uuid,
    pub quantity_change: i64,
}

#[derive(Debug, Clone)]
pub struct CreateAdjustmentInput {
    pub date: DateTime<Utc>,
    pub reason_id: Uuid,
    pub warehouse_id: Uuid,
    pub lines: Vec<AdjustmentLineInput>,
}

/// An adjustment document together with its lines.
#[derive(Debug, Clone)]
pub struct AdjustmentWithLines {
    pub adjustment: inventory_adjustment::Model,
    pub lines: Vec<inventory_adjustment_line::Model>,
}

/// Result of comparing old and new line sets by stock-entry identity.
#[derive(Debug, Default, PartialEq)]
pub struct LineDiff {
    pub added: Vec<AdjustmentLineInput>,
    /// (existing line, new quantity_change)
    pub updated: Vec<(inventory_adjustment_line::Model, i64)>,
    pub removed: Vec<inventory_adjustment_line::Model>,
}

impl LineDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// Pure diff of adjustment lines, keyed by stock entry. Lines present in both
/// sets with an unchanged quantity are not reported.
pub fn diff_lines(
    old: &[inventory_adjustment_line::Model],
    new: &[AdjustmentLineInput],
) -> LineDiff {
    let mut diff = LineDiff::default();

    for line in old {
        match new.iter().find(|n| n.stock_entry_id == line.stock_entry_id) {
            None => diff.removed.push(line.clone()),
            Some(n) if n.quantity_change != line.quantity_change => {
                diff.updated.push((line.clone(), n.quantity_change));
            }
            Some(_) => {}
        }
    }

    for input in new {
        if !old.iter().any(|l| l.stock_entry_id == input.stock_entry_id) {
            diff.added.push(input.clone());
        }
    }

    diff
}

/// Service owning the inventory-adjustment document lifecycle.
///
/// Every stock effect goes through [`StockLedger::apply_delta`] inside one
/// transaction per operation; a failure anywhere rolls the whole document
/// back.
#[derive(Clone)]
pub struct InventoryAdjustmentService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl InventoryAdjustmentService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates an adjustment document and applies each line's signed delta to
    /// its stock entry. A document with zero lines is valid paperwork with no
    /// stock effect.
    #[instrument(skip(self, input), fields(lines = input.lines.len()))]
    pub async fn create(
        &self,
        input: CreateAdjustmentInput,
    ) -> Result<AdjustmentWithLines, ServiceError> {
        let db = self.db_pool.as_ref();

        // Validation is front-loaded so the document is never partially
        // created before a missing reference is detected.
        InventoryAdjustmentReason::find_by_id(input.reason_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Adjustment reason {} not found", input.reason_id))
            })?;
        StockLedger::require_warehouse(db, input.warehouse_id, "Adjustment").await?;

        let result = db
            .transaction::<_, AdjustmentWithLines, ServiceError>(move |txn| {
                Box::pin(async move {
                    // Counted inside the transaction so concurrent creates
                    // cannot mint the same "#N" name.
                    let sequence = InventoryAdjustment::find()
                        .count(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        + 1;
                    let now = Utc::now();
                    let adjustment = inventory_adjustment::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        name: Set(format!("Adjustment #{}", sequence)),
                        date: Set(input.date),
                        reason_id: Set(input.reason_id),
                        warehouse_id: Set(input.warehouse_id),
                        is_archived: Set(false),
                        created_at: Set(now),
                        updated_at: Set(now),
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    let mut lines = Vec::with_capacity(input.lines.len());
                    for line in &input.lines {
                        let entry = StockLedger::get_entry_by_id(txn, line.stock_entry_id).await?;
                        StockLedger::apply_delta(
                            txn,
                            entry.variant_id,
                            entry.warehouse_id,
                            line.quantity_change,
                        )
                        .await?;

                        let persisted = inventory_adjustment_line::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            adjustment_id: Set(adjustment.id),
                            stock_entry_id: Set(line.stock_entry_id),
                            quantity_change: Set(line.quantity_change),
                            created_at: Set(now),
                        }
                        .insert(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                        lines.push(persisted);
                    }

                    Ok(AdjustmentWithLines { adjustment, lines })
                })
            })
            .await?;

        info!(adjustment_id = %result.adjustment.id, "inventory adjustment created");
        self.emit(Event::AdjustmentCreated(result.adjustment.id)).await;
        Ok(result)
    }

    /// Replaces the document's line set.
    ///
    /// The stock effect is two-phase: every current delta is reversed, the new
    /// line set is persisted, and every new delta is applied. This makes the
    /// end state identical to archiving and recreating the document with the
    /// new lines, for any mix of added, changed, and removed lines.
    #[instrument(skip(self, new_lines))]
    pub async fn update(
        &self,
        id: Uuid,
        new_lines: Vec<AdjustmentLineInput>,
    ) -> Result<AdjustmentWithLines, ServiceError> {
        let db = self.db_pool.as_ref();
        let adjustment = self.require_adjustment(id).await?;
        if adjustment.is_archived {
            return Err(ServiceError::InvalidOperation(format!(
                "Adjustment {} is archived and cannot be edited",
                id
            )));
        }

        let result = db
            .transaction::<_, AdjustmentWithLines, ServiceError>(move |txn| {
                Box::pin(async move {
                    let old_lines = InventoryAdjustmentLine::find()
                        .filter(inventory_adjustment_line::Column::AdjustmentId.eq(id))
                        .all(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    let diff = diff_lines(&old_lines, &new_lines);
                    if diff.is_empty() {
                        // No observable change; leave quantities untouched.
                        return Ok(AdjustmentWithLines {
                            adjustment,
                            lines: old_lines,
                        });
                    }

                    for line in &old_lines {
                        let entry = StockLedger::get_entry_by_id(txn, line.stock_entry_id).await?;
                        StockLedger::apply_delta(
                            txn,
                            entry.variant_id,
                            entry.warehouse_id,
                            -line.quantity_change,
                        )
                        .await?;
                    }

                    InventoryAdjustmentLine::delete_many()
                        .filter(inventory_adjustment_line::Column::AdjustmentId.eq(id))
                        .exec(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    let now = Utc::now();
                    let mut lines = Vec::with_capacity(new_lines.len());
                    for line in &new_lines {
                        let entry = StockLedger::get_entry_by_id(txn, line.stock_entry_id).await?;
                        StockLedger::apply_delta(
                            txn,
                            entry.variant_id,
                            entry.warehouse_id,
                            line.quantity_change,
                        )
                        .await?;

                        let persisted = inventory_adjustment_line::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            adjustment_id: Set(id),
                            stock_entry_id: Set(line.stock_entry_id),
                            quantity_change: Set(line.quantity_change),
                            created_at: Set(now),
                        }
                        .insert(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                        lines.push(persisted);
                    }

                    let mut active: inventory_adjustment::ActiveModel = adjustment.into();
                    active.updated_at = Set(now);
                    let adjustment = active.update(txn).await.map_err(ServiceError::db_error)?;

                    Ok(AdjustmentWithLines { adjustment, lines })
                })
            })
            .await?;

        self.emit(Event::AdjustmentUpdated(id)).await;
        Ok(result)
    }

    /// Archives the document, reversing each line's delta exactly once.
    /// Archiving an already-archived document is rejected so the effect can
    /// never be reversed twice.
    #[instrument(skip(self))]
    pub async fn archive(&self, id: Uuid) -> Result<inventory_adjustment::Model, ServiceError> {
        let adjustment = self.require_adjustment(id).await?;
        if adjustment.is_archived {
            return Err(ServiceError::InvalidOperation(format!(
                "Adjustment {} is already archived",
                id
            )));
        }

        let model = self.apply_document(adjustment, -1, true).await?;
        self.emit(Event::AdjustmentArchived(id)).await;
        Ok(model)
    }

    /// Restores an archived document, re-applying each line's delta exactly
    /// once.
    #[instrument(skip(self))]
    pub async fn restore(&self, id: Uuid) -> Result<inventory_adjustment::Model, ServiceError> {
        let adjustment = self.require_adjustment(id).await?;
        if !adjustment.is_archived {
            return Err(ServiceError::InvalidOperation(format!(
                "Adjustment {} is not archived",
                id
            )));
        }

        let model = self.apply_document(adjustment, 1, false).await?;
        self.emit(Event::AdjustmentRestored(id)).await;
        Ok(model)
    }

    pub async fn get(&self, id: Uuid) -> Result<AdjustmentWithLines, ServiceError> {
        let db = self.db_pool.as_ref();
        let adjustment = self.require_adjustment(id).await?;
        let lines = InventoryAdjustmentLine::find()
            .filter(inventory_adjustment_line::Column::AdjustmentId.eq(id))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(AdjustmentWithLines { adjustment, lines })
    }

    pub async fn list(&self) -> Result<Vec<inventory_adjustment::Model>, ServiceError> {
        InventoryAdjustment::find()
            .order_by_desc(inventory_adjustment::Column::CreatedAt)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    pub async fn create_reason(
        &self,
        name: String,
    ) -> Result<inventory_adjustment_reason::Model, ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "Reason name must not be empty".into(),
            ));
        }
        inventory_adjustment_reason::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            created_at: Set(Utc::now()),
        }
        .insert(self.db_pool.as_ref())
        .await
        .map_err(ServiceError::db_error)
    }

    pub async fn list_reasons(
        &self,
    ) -> Result<Vec<inventory_adjustment_reason::Model>, ServiceError> {
        InventoryAdjustmentReason::find()
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Deletes a reason. Fails with Conflict while any adjustment references
    /// it (archived documents included; they can be restored).
    #[instrument(skip(self))]
    pub async fn remove_reason(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = self.db_pool.as_ref();
        let referencing = InventoryAdjustment::find()
            .filter(inventory_adjustment::Column::ReasonId.eq(id))
            .count(db)
            .await
            .map_err(ServiceError::db_error)?;
        if referencing > 0 {
            return Err(ServiceError::Conflict(format!(
                "Adjustment reason {} is referenced by {} adjustment(s)",
                id, referencing
            )));
        }

        let deleted = InventoryAdjustmentReason::delete_by_id(id)
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;
        if deleted.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Adjustment reason {} not found",
                id
            )));
        }
        Ok(())
    }

    /// Applies the whole document's deltas with the given sign and flips the
    /// archive flag, in one transaction.
    async fn apply_document(
        &self,
        adjustment: inventory_adjustment::Model,
        sign: i64,
        archived: bool,
    ) -> Result<inventory_adjustment::Model, ServiceError> {
        let db = self.db_pool.as_ref();
        let model = db
            .transaction::<_, inventory_adjustment::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let lines = InventoryAdjustmentLine::find()
                        .filter(inventory_adjustment_line::Column::AdjustmentId.eq(adjustment.id))
                        .all(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    for line in &lines {
                        let entry = StockLedger::get_entry_by_id(txn, line.stock_entry_id).await?;
                        StockLedger::apply_delta(
                            txn,
                            entry.variant_id,
                            entry.warehouse_id,
                            sign * line.quantity_change,
                        )
                        .await?;
                    }

                    let mut active: inventory_adjustment::ActiveModel = adjustment.into();
                    active.is_archived = Set(archived);
                    active.updated_at = Set(Utc::now());
                    active.update(txn).await.map_err(ServiceError::db_error)
                })
            })
            .await?;
        Ok(model)
    }

    async fn require_adjustment(
        &self,
        id: Uuid,
    ) -> Result<inventory_adjustment::Model, ServiceError> {
        InventoryAdjustment::find_by_id(id)
            .one(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Adjustment {} not found", id)))
    }

    async fn emit(&self, event: Event) {
        if let Err(e) = self.event_sender.send(event).await {
            error!("Failed to send event: {}", e);
        }
    }
}
