use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Cashier shift. Orders, refunds, and register transactions require an open
/// shift.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shifts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub point_of_sale_id: Uuid,
    pub is_opened: bool,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::point_of_sale::Entity",
        from = "Column::PointOfSaleId",
        to = "super::point_of_sale::Column::Id"
    )]
    PointOfSale,
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
    #[sea_orm(has_many = "super::register_transaction::Entity")]
    RegisterTransactions,
}

impl Related<super::point_of_sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PointOfSale.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
