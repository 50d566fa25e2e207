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
        inventory_transfer::{self, Entity as InventoryTransfer},
        inventory_transfer_item::{self, Entity as InventoryTransferItem},
        inventory_transfer_reason::{self, Entity as InventoryTransferReason},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::ledger::StockLedger,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferItemInput {
    pub variant_id: Uuid,
    pub quantity: i64,
}

#[derive(Debug, Clone)]
pub struct CreateTransferInput {
    pub date: DateTime<Utc>,
    pub reason_id: Uuid,
    pub source_warehouse_id: Uuid,
    pub destination_warehouse_id: Uuid,
    pub items: Vec<TransferItemInput>,
}

/// Patch for an active transfer. `None` fields keep their current value;
/// `items: None` keeps the current item set.
#[derive(Debug, Clone, Default)]
pub struct UpdateTransferInput {
    pub date: Option<DateTime<Utc>>,
    pub reason_id: Option<Uuid>,
    pub source_warehouse_id: Option<Uuid>,
    pub destination_warehouse_id: Option<Uuid>,
    pub items: Option<Vec<TransferItemInput>>,
}

#[derive(Debug, Clone)]
pub struct TransferWithItems {
    pub transfer: inventory_transfer::Model,
    pub items: Vec<inventory_transfer_item::Model>,
}

/// One ledger movement produced by reconciliation: apply `delta` to the
/// (variant, warehouse) stock entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferMove {
    pub variant_id: Uuid,
    pub warehouse_id: Uuid,
    pub delta: i64,
}

/// Pure reconciliation of a transfer edit.
///
/// Produces the ledger moves that take the stock from the state where the old
/// document (items under `old_src`/`old_dst`) is applied to the state where
/// the new document (items under `new_src`/`new_dst`) is applied — observably
/// identical to undoing every old item and re-applying every new item, with
/// same-warehouse components collapsed to their net delta. Conservation holds
/// by construction: every item contributes paired deltas summing to zero.
///
/// Old warehouse ids locate existing entries; new ids locate new homes.
pub fn reconcile_items(
    old_src: Uuid,
    old_dst: Uuid,
    new_src: Uuid,
    new_dst: Uuid,
    old_items: &[TransferItemInput],
    new_items: &[TransferItemInput],
) -> Vec<TransferMove> {
    let mut moves = Vec::new();
    let mut push = |variant_id: Uuid, warehouse_id: Uuid, delta: i64| {
        if delta != 0 {
            moves.push(TransferMove {
                variant_id,
                warehouse_id,
                delta,
            });
        }
    };

    for old in old_items {
        match new_items.iter().find(|n| n.variant_id == old.variant_id) {
            // Removed: return the quantity from the old destination to the
            // old source.
            None => {
                push(old.variant_id, old_dst, -old.quantity);
                push(old.variant_id, old_src, old.quantity);
            }
            // Kept: undo against the old warehouses, redo against the new
            // ones, collapsing when a warehouse did not change.
            Some(new) => {
                if new_src == old_src {
                    push(old.variant_id, old_src, -(new.quantity - old.quantity));
                } else {
                    push(old.variant_id, old_src, old.quantity);
                    push(old.variant_id, new_src, -new.quantity);
                }
                if new_dst == old_dst {
                    push(old.variant_id, old_dst, new.quantity - old.quantity);
                } else {
                    push(old.variant_id, old_dst, -old.quantity);
                    push(old.variant_id, new_dst, new.quantity);
                }
            }
        }
    }

    // Added: move from the new source to the new destination, exactly as in
    // create.
    for new in new_items {
        if !old_items.iter().any(|o| o.variant_id == new.variant_id) {
            push(new.variant_id, new_src, -new.quantity);
            push(new.variant_id, new_dst, new.quantity);
        }
    }

    moves
}

/// Service owning the inventory-transfer document lifecycle.
///
/// State machine per document: active ⇄ archived, with active documents
/// further mutable via [`InventoryTransferService::update`]. The whole stock
/// movement of any operation is one transaction.
#[derive(Clone)]
pub struct InventoryTransferService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl InventoryTransferService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a transfer and moves each item's quantity from the source
    /// warehouse to the destination warehouse (creating destination entries
    /// as needed). Conservation of the per-variant total follows from the
    /// paired deltas.
    #[instrument(skip(self, input), fields(items = input.items.len()))]
    pub async fn create(&self, input: CreateTransferInput) -> Result<TransferWithItems, ServiceError> {
        let db = self.db_pool.as_ref();

        self.require_reason(input.reason_id).await?;
        StockLedger::require_warehouse(db, input.source_warehouse_id, "Source").await?;
        StockLedger::require_warehouse(db, input.destination_warehouse_id, "Destination").await?;
        validate_items(&input.items)?;

        let result = db
            .transaction::<_, TransferWithItems, ServiceError>(move |txn| {
                Box::pin(async move {
                    // Counted inside the transaction so concurrent creates
                    // cannot mint the same "#N" name.
                    let sequence = InventoryTransfer::find()
                        .count(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        + 1;
                    let now = Utc::now();
                    let transfer = inventory_transfer::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        name: Set(format!("Transfer #{}", sequence)),
                        date: Set(input.date),
                        reason_id: Set(input.reason_id),
                        source_warehouse_id: Set(input.source_warehouse_id),
                        destination_warehouse_id: Set(input.destination_warehouse_id),
                        is_archived: Set(false),
                        created_at: Set(now),
                        updated_at: Set(now),
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    let mut items = Vec::with_capacity(input.items.len());
                    for item in &input.items {
                        StockLedger::apply_delta(
                            txn,
                            item.variant_id,
                            input.source_warehouse_id,
                            -item.quantity,
                        )
                        .await?;
                        StockLedger::apply_delta(
                            txn,
                            item.variant_id,
                            input.destination_warehouse_id,
                            item.quantity,
                        )
                        .await?;

                        let persisted = inventory_transfer_item::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            transfer_id: Set(transfer.id),
                            variant_id: Set(item.variant_id),
                            quantity: Set(item.quantity),
                            created_at: Set(now),
                        }
                        .insert(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                        items.push(persisted);
                    }

                    Ok(TransferWithItems { transfer, items })
                })
            })
            .await?;

        info!(transfer_id = %result.transfer.id, "inventory transfer created");
        self.emit(Event::TransferCreated(result.transfer.id)).await;
        Ok(result)
    }

    /// Edits an active transfer. Reconciliation is computed by
    /// [`reconcile_items`] from the pre-update and post-update warehouse ids
    /// and item sets, then applied move by move; the persisted item set and
    /// document header are replaced in the same transaction.
    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        id: Uuid,
        patch: UpdateTransferInput,
    ) -> Result<TransferWithItems, ServiceError> {
        let db = self.db_pool.as_ref();
        let transfer = self.require_transfer(id).await?;
        if transfer.is_archived {
            return Err(ServiceError::InvalidOperation(format!(
                "Transfer {} is archived and cannot be edited",
                id
            )));
        }

        if let Some(reason_id) = patch.reason_id {
            self.require_reason(reason_id).await?;
        }
        if let Some(source_id) = patch.source_warehouse_id {
            StockLedger::require_warehouse(db, source_id, "Source").await?;
        }
        if let Some(destination_id) = patch.destination_warehouse_id {
            StockLedger::require_warehouse(db, destination_id, "Destination").await?;
        }
        if let Some(items) = &patch.items {
            validate_items(items)?;
        }

        let result = db
            .transaction::<_, TransferWithItems, ServiceError>(move |txn| {
                Box::pin(async move {
                    let old_models = InventoryTransferItem::find()
                        .filter(inventory_transfer_item::Column::TransferId.eq(id))
                        .all(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                    let old_items: Vec<TransferItemInput> = old_models
                        .iter()
                        .map(|m| TransferItemInput {
                            variant_id: m.variant_id,
                            quantity: m.quantity,
                        })
                        .collect();

                    let new_src = patch
                        .source_warehouse_id
                        .unwrap_or(transfer.source_warehouse_id);
                    let new_dst = patch
                        .destination_warehouse_id
                        .unwrap_or(transfer.destination_warehouse_id);
                    let new_items = patch.items.unwrap_or_else(|| old_items.clone());

                    let moves = reconcile_items(
                        transfer.source_warehouse_id,
                        transfer.destination_warehouse_id,
                        new_src,
                        new_dst,
                        &old_items,
                        &new_items,
                    );
                    for mv in &moves {
                        StockLedger::apply_delta(txn, mv.variant_id, mv.warehouse_id, mv.delta)
                            .await?;
                    }

                    InventoryTransferItem::delete_many()
                        .filter(inventory_transfer_item::Column::TransferId.eq(id))
                        .exec(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    let now = Utc::now();
                    let mut items = Vec::with_capacity(new_items.len());
                    for item in &new_items {
                        let persisted = inventory_transfer_item::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            transfer_id: Set(id),
                            variant_id: Set(item.variant_id),
                            quantity: Set(item.quantity),
                            created_at: Set(now),
                        }
                        .insert(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                        items.push(persisted);
                    }

                    let mut active: inventory_transfer::ActiveModel = transfer.into();
                    if let Some(date) = patch.date {
                        active.date = Set(date);
                    }
                    if let Some(reason_id) = patch.reason_id {
                        active.reason_id = Set(reason_id);
                    }
                    active.source_warehouse_id = Set(new_src);
                    active.destination_warehouse_id = Set(new_dst);
                    active.updated_at = Set(now);
                    let transfer = active.update(txn).await.map_err(ServiceError::db_error)?;

                    Ok(TransferWithItems { transfer, items })
                })
            })
            .await?;

        self.emit(Event::TransferUpdated(id)).await;
        Ok(result)
    }

    /// Archives the transfer: every item's quantity moves from destination
    /// back to source, exactly once.
    #[instrument(skip(self))]
    pub async fn archive(&self, id: Uuid) -> Result<inventory_transfer::Model, ServiceError> {
        let transfer = self.require_transfer(id).await?;
        if transfer.is_archived {
            return Err(ServiceError::InvalidOperation(format!(
                "Transfer {} is already archived",
                id
            )));
        }

        let model = self.apply_document(transfer, -1, true).await?;
        self.emit(Event::TransferArchived(id)).await;
        Ok(model)
    }

    /// Restores an archived transfer: every item's quantity moves from source
    /// back to destination.
    #[instrument(skip(self))]
    pub async fn restore(&self, id: Uuid) -> Result<inventory_transfer::Model, ServiceError> {
        let transfer = self.require_transfer(id).await?;
        if !transfer.is_archived {
            return Err(ServiceError::InvalidOperation(format!(
                "Transfer {} is not archived",
                id
            )));
        }

        let model = self.apply_document(transfer, 1, false).await?;
        self.emit(Event::TransferRestored(id)).await;
        Ok(model)
    }

    pub async fn get(&self, id: Uuid) -> Result<TransferWithItems, ServiceError> {
        let transfer = self.require_transfer(id).await?;
        let items = InventoryTransferItem::find()
            .filter(inventory_transfer_item::Column::TransferId.eq(id))
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?;
        Ok(TransferWithItems { transfer, items })
    }

    pub async fn list(&self) -> Result<Vec<inventory_transfer::Model>, ServiceError> {
        InventoryTransfer::find()
            .order_by_desc(inventory_transfer::Column::CreatedAt)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    pub async fn create_reason(
        &self,
        name: String,
    ) -> Result<inventory_transfer_reason::Model, ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "Reason name must not be empty".into(),
            ));
        }
        inventory_transfer_reason::ActiveModel {
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
    ) -> Result<Vec<inventory_transfer_reason::Model>, ServiceError> {
        InventoryTransferReason::find()
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Deletes a reason. Fails with Conflict while any transfer references it.
    #[instrument(skip(self))]
    pub async fn remove_reason(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = self.db_pool.as_ref();
        let referencing = InventoryTransfer::find()
            .filter(inventory_transfer::Column::ReasonId.eq(id))
            .count(db)
            .await
            .map_err(ServiceError::db_error)?;
        if referencing > 0 {
            return Err(ServiceError::Conflict(format!(
                "Transfer reason {} is referenced by {} transfer(s)",
                id, referencing
            )));
        }

        let deleted = InventoryTransferReason::delete_by_id(id)
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;
        if deleted.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Transfer reason {} not found",
                id
            )));
        }
        Ok(())
    }

    /// Moves the whole document between source and destination with the given
    /// sign (-1 reverses, +1 re-applies) and flips the archive flag.
    async fn apply_document(
        &self,
        transfer: inventory_transfer::Model,
        sign: i64,
        archived: bool,
    ) -> Result<inventory_transfer::Model, ServiceError> {
        let db = self.db_pool.as_ref();
        let model = db
            .transaction::<_, inventory_transfer::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let items = InventoryTransferItem::find()
                        .filter(inventory_transfer_item::Column::TransferId.eq(transfer.id))
                        .all(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    for item in &items {
                        StockLedger::apply_delta(
                            txn,
                            item.variant_id,
                            transfer.source_warehouse_id,
                            -sign * item.quantity,
                        )
                        .await?;
                        StockLedger::apply_delta(
                            txn,
                            item.variant_id,
                            transfer.destination_warehouse_id,
                            sign * item.quantity,
                        )
                        .await?;
                    }

                    let mut active: inventory_transfer::ActiveModel = transfer.into();
                    active.is_archived = Set(archived);
                    active.updated_at = Set(Utc::now());
                    active.update(txn).await.map_err(ServiceError::db_error)
                })
            })
            .await?;
        Ok(model)
    }

    async fn require_transfer(&self, id: Uuid) -> Result<inventory_transfer::Model, ServiceError> {
        InventoryTransfer::find_by_id(id)
            .one(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Transfer {} not found", id)))
    }

    async fn require_reason(&self, id: Uuid) -> Result<(), ServiceError> {
        InventoryTransferReason::find_by_id(id)
            .one(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Transfer reason {} not found", id)))?;
        Ok(())
    }

    async fn emit(&self, event: Event) {
        if let Err(e) = self.event_sender.send(event).await {
            error!("Failed to send event: {}", e);
        }
    }
}

fn validate_items(items: &[TransferItemInput]) -> Result<(), ServiceError> {
    let mut seen = std::collections::HashSet::new();
    for item in items {
        if item.quantity <= 0 {
            return Err(ServiceError::InvalidInput(format!(
                "Transfer quantity for variant {} must be positive",
                item.variant_id
            )));
        }
        // Reconciliation pairs old and new items by variant id, so one item
        // per variant is a precondition for edits to stay conservative.
        if !seen.insert(item.variant_id) {
            return Err(ServiceError::InvalidInput(format!(
                "Transfer lists variant {} more than once",
                item.variant_id
            )));
        }
    }
    Ok(())
}
