use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Customer account type. Retail customers (and hidden walk-in accounts)
/// must always prepay in full; wholesale customers may carry a balance.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum CustomerType {
    #[sea_orm(string_value = "Retail")]
    Retail,
    #[sea_orm(string_value = "Wholesale")]
    Wholesale,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub name: String,
    pub customer_type: CustomerType,

    /// Walk-in/guest accounts, excluded from pick-lists and statements.
    pub is_hidden: bool,

    /// None = unlimited credit.
    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub credit_limit: Option<Decimal>,

    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,

    /// Soft delete flag; deleted customers keep their ledger history.
    pub deleted: bool,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::sales_order::Entity")]
    SalesOrders,
    #[sea_orm(has_many = "super::invoice::Entity")]
    Invoices,
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
    #[sea_orm(has_many = "super::credit_note::Entity")]
    CreditNotes,
}

impl Related<super::sales_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SalesOrders.def()
    }
}

impl Related<super::invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoices.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl Related<super::credit_note::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CreditNotes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Retail semantics apply to retail-typed and hidden (walk-in) accounts:
    /// refunds are paid out in cash and orders must be prepaid in full.
    pub fn is_retail(&self) -> bool {
        self.customer_type == CustomerType::Retail || self.is_hidden
    }
}
