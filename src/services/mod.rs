use rust_decimal::{Decimal, RoundingStrategy};

use crate::entities::invoice::InvoiceStatus;

pub mod batches;
pub mod catalog;
pub mod inventory;
pub mod orders;
pub mod payments;
pub mod returns;

pub use batches::BatchService;
pub use catalog::CatalogService;
pub use inventory::InventoryService;
pub use orders::OrderService;
pub use payments::PaymentService;
pub use returns::ReturnsService;

/// Rounds a monetary value to 2 fractional digits, HALF_UP.
pub(crate) fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Invoice status follows the balance, never the other way around.
pub(crate) fn derive_invoice_status(total_amount: Decimal, balance_due: Decimal) -> InvoiceStatus {
    if balance_due <= Decimal::ZERO {
        InvoiceStatus::Paid
    } else if balance_due >= total_amount {
        InvoiceStatus::Unpaid
    } else {
        InvoiceStatus::PartiallyPaid
    }
}
