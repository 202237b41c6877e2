pub mod credit_note;
pub mod customer;
pub mod harvest_batch;
pub mod inventory_unit;
pub mod invoice;
pub mod payment;
pub mod payment_allocation;
pub mod product;
pub mod sales_order;

pub use credit_note::Entity as CreditNote;
pub use customer::Entity as Customer;
pub use harvest_batch::Entity as HarvestBatch;
pub use inventory_unit::Entity as InventoryUnit;
pub use invoice::Entity as Invoice;
pub use payment::Entity as Payment;
pub use payment_allocation::Entity as PaymentAllocation;
pub use product::Entity as Product;
pub use sales_order::Entity as SalesOrder;
