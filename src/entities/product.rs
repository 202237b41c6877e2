use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub name: String,

    #[sea_orm(unique)]
    pub sku: String,

    pub unit_of_measure: String,

    /// Default shelf life applied to new batches; a batch may override it.
    pub shelf_life_days: Option<i32>,

    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub retail_price: Option<Decimal>,

    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub wholesale_price: Option<Decimal>,

    pub deleted: bool,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::harvest_batch::Entity")]
    HarvestBatches,
}

impl Related<super::harvest_batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HarvestBatches.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
