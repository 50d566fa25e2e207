use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
};
use tracing::warn;
use uuid::Uuid;

use crate::{
    entities::{
        product::{self, Entity as Product},
        product_variant::{self, Entity as ProductVariant},
        stock_entry::{self, Entity as StockEntry},
        warehouse::{self, Entity as Warehouse},
    },
    errors::ServiceError,
};

/// The aggregate maintainer for the stock ledger.
///
/// [`StockLedger::apply_delta`] is the only write path to
/// `stock_entries.warehouse_quantity`, `product_variants.total_warehouse_quantity`
/// and `products.total_warehouse_quantity`. Every document engine (adjustments,
/// transfers, orders, refunds, import) expresses its stock effect as calls to
/// this primitive inside its own transaction, so entry quantities and the
/// denormalized totals agree whenever that transaction commits.
pub struct StockLedger;

impl StockLedger {
    /// Applies a signed quantity delta to the (variant, warehouse) stock entry
    /// and to the owning variant's and product's denormalized totals.
    ///
    /// The entry is created at quantity zero if absent. All three increments
    /// are executed as `SET col = col + delta` expressions, never
    /// read-modify-write, so concurrent writers on the same row cannot lose
    /// updates.
    ///
    /// Negative resulting quantities are permitted (logged, not rejected);
    /// callers own that policy.
    pub async fn apply_delta<C: ConnectionTrait>(
        db: &C,
        variant_id: Uuid,
        warehouse_id: Uuid,
        delta: i64,
    ) -> Result<stock_entry::Model, ServiceError> {
        let entry = Self::find_or_create_entry(db, variant_id, warehouse_id).await?;

        StockEntry::update_many()
            .col_expr(
                stock_entry::Column::WarehouseQuantity,
                Expr::col(stock_entry::Column::WarehouseQuantity).add(delta),
            )
            .col_expr(
                stock_entry::Column::UpdatedAt,
                Expr::value(Utc::now()),
            )
            .filter(stock_entry::Column::Id.eq(entry.id))
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;

        ProductVariant::update_many()
            .col_expr(
                product_variant::Column::TotalWarehouseQuantity,
                Expr::col(product_variant::Column::TotalWarehouseQuantity).add(delta),
            )
            .col_expr(product_variant::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(product_variant::Column::Id.eq(variant_id))
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;

        let variant = ProductVariant::find_by_id(variant_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product variant {} not found", variant_id))
            })?;

        Product::update_many()
            .col_expr(
                product::Column::TotalWarehouseQuantity,
                Expr::col(product::Column::TotalWarehouseQuantity).add(delta),
            )
            .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(product::Column::Id.eq(variant.product_id))
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;

        let updated = StockEntry::find_by_id(entry.id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::InternalError(format!("Stock entry {} vanished mid-update", entry.id))
            })?;

        if updated.warehouse_quantity < 0 {
            warn!(
                stock_entry_id = %updated.id,
                %variant_id,
                %warehouse_id,
                quantity = updated.warehouse_quantity,
                "stock entry went negative"
            );
        }

        Ok(updated)
    }

    /// Applies a delta to the received-quantity totals of a variant and its
    /// product. Used by bulk import bookkeeping; warehouse quantities are
    /// untouched.
    pub async fn apply_received_delta<C: ConnectionTrait>(
        db: &C,
        variant_id: Uuid,
        delta: i64,
    ) -> Result<(), ServiceError> {
        let variant = ProductVariant::find_by_id(variant_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product variant {} not found", variant_id))
            })?;

        ProductVariant::update_many()
            .col_expr(
                product_variant::Column::TotalReceivedQuantity,
                Expr::col(product_variant::Column::TotalReceivedQuantity).add(delta),
            )
            .col_expr(product_variant::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(product_variant::Column::Id.eq(variant_id))
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;

        Product::update_many()
            .col_expr(
                product::Column::TotalReceivedQuantity,
                Expr::col(product::Column::TotalReceivedQuantity).add(delta),
            )
            .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(product::Column::Id.eq(variant.product_id))
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(())
    }

    /// Finds the stock entry for (variant, warehouse), creating it at quantity
    /// zero when absent. Validates that both the variant and the warehouse
    /// exist before creating.
    pub async fn find_or_create_entry<C: ConnectionTrait>(
        db: &C,
        variant_id: Uuid,
        warehouse_id: Uuid,
    ) -> Result<stock_entry::Model, ServiceError> {
        if let Some(entry) = Self::get_entry(db, variant_id, warehouse_id).await? {
            return Ok(entry);
        }

        ProductVariant::find_by_id(variant_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product variant {} not found", variant_id))
            })?;

        Warehouse::find_by_id(warehouse_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Warehouse {} not found", warehouse_id))
            })?;

        let now = Utc::now();
        let entry = stock_entry::ActiveModel {
            id: Set(Uuid::new_v4()),
            variant_id: Set(variant_id),
            warehouse_id: Set(warehouse_id),
            warehouse_quantity: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };

        entry.insert(db).await.map_err(ServiceError::db_error)
    }

    /// Looks up the stock entry for a (variant, warehouse) pair.
    pub async fn get_entry<C: ConnectionTrait>(
        db: &C,
        variant_id: Uuid,
        warehouse_id: Uuid,
    ) -> Result<Option<stock_entry::Model>, ServiceError> {
        StockEntry::find()
            .filter(stock_entry::Column::VariantId.eq(variant_id))
            .filter(stock_entry::Column::WarehouseId.eq(warehouse_id))
            .one(db)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Looks up a stock entry by id, failing with NotFound when absent.
    pub async fn get_entry_by_id<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<stock_entry::Model, ServiceError> {
        StockEntry::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Stock entry {} not found", id)))
    }

    /// All stock entries for one variant, across warehouses.
    pub async fn find_entries_for_variant<C: ConnectionTrait>(
        db: &C,
        variant_id: Uuid,
    ) -> Result<Vec<stock_entry::Model>, ServiceError> {
        StockEntry::find()
            .filter(stock_entry::Column::VariantId.eq(variant_id))
            .all(db)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Requires a warehouse to exist, with a role-specific message so transfer
    /// diagnostics can distinguish source from destination.
    pub async fn require_warehouse<C: ConnectionTrait>(
        db: &C,
        warehouse_id: Uuid,
        role: &str,
    ) -> Result<warehouse::Model, ServiceError> {
        Warehouse::find_by_id(warehouse_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("{} warehouse {} not found", role, warehouse_id))
            })
    }
}
