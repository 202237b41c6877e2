use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "harvest_batches")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Assigned from the row id after insert; never reused, never derived
    /// from a row count.
    #[sea_orm(unique)]
    pub batch_code: String,

    pub product_id: i64,

    pub batch_date: Date,

    /// Batch-specific shelf life override; falls back to the product default.
    pub shelf_life_days: Option<i32>,

    /// batch_date + shelf_life_days. None means the batch never expires.
    pub expiry_date: Option<Date>,

    /// Set at creation, immutable thereafter.
    pub total_units: i32,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    #[sea_orm(has_many = "super::inventory_unit::Entity")]
    InventoryUnits,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::inventory_unit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryUnits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// A batch is expired when its expiry date is strictly before `today`.
    pub fn is_expired(&self, today: Date) -> bool {
        matches!(self.expiry_date, Some(expiry) if expiry < today)
    }
}
