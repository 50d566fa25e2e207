use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Inventory adjustment document. While the document is active its lines'
/// signed deltas are applied to the ledger; archiving reverses them exactly
/// once and restoring re-applies them exactly once.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_adjustments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Sequence-numbered display name, e.g. "Adjustment #7"
    pub name: String,
    pub date: DateTime<Utc>,
    pub reason_id: Uuid,
    pub warehouse_id: Uuid,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::inventory_adjustment_reason::Entity",
        from = "Column::ReasonId",
        to = "super::inventory_adjustment_reason::Column::Id"
    )]
    Reason,
    #[sea_orm(
        belongs_to = "super::warehouse::Entity",
        from = "Column::WarehouseId",
        to = "super::warehouse::Column::Id"
    )]
    Warehouse,
    #[sea_orm(has_many = "super::inventory_adjustment_line::Entity")]
    Lines,
}

impl Related<super::inventory_adjustment_reason::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reason.def()
    }
}

impl Related<super::inventory_adjustment_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
