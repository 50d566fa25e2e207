use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Inventory transfer document: quantity moved from the source warehouse to
/// the destination warehouse for each item. While active, each item's
/// quantity has been subtracted at the source and added at the destination;
/// the variant's total across warehouses is unchanged (conservation).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_transfers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Sequence-numbered display name, e.g. "Transfer #3"
    pub name: String,
    pub date: DateTime<Utc>,
    pub reason_id: Uuid,
    pub source_warehouse_id: Uuid,
    pub destination_warehouse_id: Uuid,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::inventory_transfer_reason::Entity",
        from = "Column::ReasonId",
        to = "super::inventory_transfer_reason::Column::Id"
    )]
    Reason,
    #[sea_orm(
        belongs_to = "super::warehouse::Entity",
        from = "Column::SourceWarehouseId",
        to = "super::warehouse::Column::Id"
    )]
    SourceWarehouse,
    #[sea_orm(
        belongs_to = "super::warehouse::Entity",
        from = "Column::DestinationWarehouseId",
        to = "super::warehouse::Column::Id"
    )]
    DestinationWarehouse,
    #[sea_orm(has_many = "super::inventory_transfer_item::Entity")]
    Items,
}

impl Related<super::inventory_transfer_reason::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reason.def()
    }
}

impl Related<super::inventory_transfer_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
