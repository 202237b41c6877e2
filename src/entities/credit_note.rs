use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Store credit owed to a customer. Issued by returns, order cancellation
/// after payment, and overpayment capture; spent during settlement.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "credit_notes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// `CN-{id:05}`, assigned from the row id after insert.
    #[sea_orm(unique)]
    pub note_number: String,

    pub customer_id: i64,

    /// Invoice the goods came back against, when the note was issued by a
    /// return.
    pub original_invoice_id: Option<i64>,

    /// Payment whose surplus produced this note, when issued by
    /// overpayment capture. Checked during void so a spent surplus blocks
    /// the reversal.
    pub source_payment_id: Option<i64>,

    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount: Decimal,

    /// Tax portion of `amount`, informational for reporting.
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub tax_amount: Decimal,

    /// Unspent balance; settlement consumes notes partially.
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub remaining_amount: Decimal,

    pub is_used: bool,

    pub reason: Option<String>,

    pub note_date: Date,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
    #[sea_orm(
        belongs_to = "super::invoice::Entity",
        from = "Column::OriginalInvoiceId",
        to = "super::invoice::Column::Id"
    )]
    OriginalInvoice,
    #[sea_orm(
        belongs_to = "super::payment::Entity",
        from = "Column::SourcePaymentId",
        to = "super::payment::Column::Id"
    )]
    SourcePayment,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OriginalInvoice.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SourcePayment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
