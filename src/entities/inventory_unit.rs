use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle of a single physical unit. A unit references a sales order
/// iff its status is Allocated or Sold.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum UnitStatus {
    #[sea_orm(string_value = "Available")]
    Available,
    #[sea_orm(string_value = "Allocated")]
    Allocated,
    #[sea_orm(string_value = "Sold")]
    Sold,
    #[sea_orm(string_value = "Returned")]
    Returned,
    #[sea_orm(string_value = "Spoiled")]
    Spoiled,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_units")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Serial code `{batch_code}-{seq}`, printed on the unit's label.
    #[sea_orm(unique)]
    pub serial_code: String,

    pub batch_id: i64,

    pub status: UnitStatus,

    /// Set only while Allocated or Sold.
    pub sales_order_id: Option<i64>,

    /// Captured at allocation from the product catalog (or a draft-order
    /// price edit); cleared on release and cancellation.
    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub sold_price: Option<Decimal>,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::harvest_batch::Entity",
        from = "Column::BatchId",
        to = "super::harvest_batch::Column::Id"
    )]
    HarvestBatch,
    #[sea_orm(
        belongs_to = "super::sales_order::Entity",
        from = "Column::SalesOrderId",
        to = "super::sales_order::Column::Id"
    )]
    SalesOrder,
}

impl Related<super::harvest_batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HarvestBatch.def()
    }
}

impl Related<super::sales_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SalesOrder.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
