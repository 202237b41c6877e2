use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_customers_table::Migration),
            Box::new(m20240101_000002_create_products_table::Migration),
            Box::new(m20240101_000003_create_harvest_batches_table::Migration),
            Box::new(m20240101_000004_create_inventory_units_table::Migration),
            Box::new(m20240101_000005_create_sales_orders_table::Migration),
            Box::new(m20240101_000006_create_invoices_table::Migration),
            Box::new(m20240101_000007_create_payments_table::Migration),
            Box::new(m20240101_000008_create_payment_allocations_table::Migration),
            Box::new(m20240101_000009_create_credit_notes_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_customers_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_customers_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Customers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Customers::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Customers::Name).string().not_null())
                        .col(ColumnDef::new(Customers::CustomerType).string().not_null())
                        .col(
                            ColumnDef::new(Customers::IsHidden)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Customers::CreditLimit).decimal().null())
                        .col(ColumnDef::new(Customers::Phone).string().null())
                        .col(ColumnDef::new(Customers::Email).string().null())
                        .col(ColumnDef::new(Customers::Address).string().null())
                        .col(
                            ColumnDef::new(Customers::Deleted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Customers::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_customers_name")
                        .table(Customers::Table)
                        .col(Customers::Name)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Customers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Customers {
        Table,
        Id,
        Name,
        CustomerType,
        IsHidden,
        CreditLimit,
        Phone,
        Email,
        Address,
        Deleted,
        CreatedAt,
    }
}

mod m20240101_000002_create_products_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_products_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Products::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(
                            ColumnDef::new(Products::Sku)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Products::UnitOfMeasure).string().not_null())
                        .col(ColumnDef::new(Products::ShelfLifeDays).integer().null())
                        .col(ColumnDef::new(Products::RetailPrice).decimal().null())
                        .col(ColumnDef::new(Products::WholesalePrice).decimal().null())
                        .col(
                            ColumnDef::new(Products::Deleted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Products::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Products {
        Table,
        Id,
        Name,
        Sku,
        UnitOfMeasure,
        ShelfLifeDays,
        RetailPrice,
        WholesalePrice,
        Deleted,
        CreatedAt,
    }
}

mod m20240101_000003_create_harvest_batches_table {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000002_create_products_table::Products;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_harvest_batches_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(HarvestBatches::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(HarvestBatches::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(HarvestBatches::BatchCode)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(HarvestBatches::ProductId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(HarvestBatches::BatchDate).date().not_null())
                        .col(
                            ColumnDef::new(HarvestBatches::ShelfLifeDays)
                                .integer()
                                .null(),
                        )
                        .col(ColumnDef::new(HarvestBatches::ExpiryDate).date().null())
                        .col(
                            ColumnDef::new(HarvestBatches::TotalUnits)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(HarvestBatches::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_harvest_batches_product_id")
                                .from(HarvestBatches::Table, HarvestBatches::ProductId)
                                .to(Products::Table, Products::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_harvest_batches_product_id")
                        .table(HarvestBatches::Table)
                        .col(HarvestBatches::ProductId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(HarvestBatches::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum HarvestBatches {
        Table,
        Id,
        BatchCode,
        ProductId,
        BatchDate,
        ShelfLifeDays,
        ExpiryDate,
        TotalUnits,
        CreatedAt,
    }
}

mod m20240101_000004_create_inventory_units_table {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000003_create_harvest_batches_table::HarvestBatches;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_inventory_units_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryUnits::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryUnits::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(InventoryUnits::SerialCode)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(InventoryUnits::BatchId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryUnits::Status).string().not_null())
                        .col(
                            ColumnDef::new(InventoryUnits::SalesOrderId)
                                .big_integer()
                                .null(),
                        )
                        .col(ColumnDef::new(InventoryUnits::SoldPrice).decimal().null())
                        .col(
                            ColumnDef::new(InventoryUnits::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_units_batch_id")
                                .from(InventoryUnits::Table, InventoryUnits::BatchId)
                                .to(HarvestBatches::Table, HarvestBatches::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_units_batch_id")
                        .table(InventoryUnits::Table)
                        .col(InventoryUnits::BatchId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_units_sales_order_id")
                        .table(InventoryUnits::Table)
                        .col(InventoryUnits::SalesOrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_units_status")
                        .table(InventoryUnits::Table)
                        .col(InventoryUnits::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryUnits::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum InventoryUnits {
        Table,
        Id,
        SerialCode,
        BatchId,
        Status,
        SalesOrderId,
        SoldPrice,
        CreatedAt,
    }
}

mod m20240101_000005_create_sales_orders_table {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000001_create_customers_table::Customers;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_sales_orders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(SalesOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SalesOrders::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(SalesOrders::OrderNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(SalesOrders::CustomerId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SalesOrders::OrderType).string().not_null())
                        .col(ColumnDef::new(SalesOrders::Status).string().not_null())
                        .col(
                            ColumnDef::new(SalesOrders::DiscountPercent)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(SalesOrders::PaymentMethodHint)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(SalesOrders::OrderDate).date().not_null())
                        .col(
                            ColumnDef::new(SalesOrders::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_sales_orders_customer_id")
                                .from(SalesOrders::Table, SalesOrders::CustomerId)
                                .to(Customers::Table, Customers::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_sales_orders_customer_id")
                        .table(SalesOrders::Table)
                        .col(SalesOrders::CustomerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_sales_orders_status")
                        .table(SalesOrders::Table)
                        .col(SalesOrders::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SalesOrders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum SalesOrders {
        Table,
        Id,
        OrderNumber,
        CustomerId,
        OrderType,
        Status,
        DiscountPercent,
        PaymentMethodHint,
        OrderDate,
        CreatedAt,
    }
}

mod m20240101_000006_create_invoices_table {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000001_create_customers_table::Customers;
    use super::m20240101_000005_create_sales_orders_table::SalesOrders;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_invoices_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Invoices::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Invoices::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Invoices::InvoiceNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Invoices::SalesOrderId)
                                .big_integer()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Invoices::CustomerId).big_integer().not_null())
                        .col(ColumnDef::new(Invoices::InvoiceDate).date().not_null())
                        .col(ColumnDef::new(Invoices::TotalAmount).decimal().not_null())
                        .col(
                            ColumnDef::new(Invoices::TaxAmount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Invoices::NetAmount).decimal().not_null())
                        .col(
                            ColumnDef::new(Invoices::AmountPaid)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Invoices::BalanceDue).decimal().not_null())
                        .col(ColumnDef::new(Invoices::Status).string().not_null())
                        .col(ColumnDef::new(Invoices::CreatedAt).timestamp().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_invoices_sales_order_id")
                                .from(Invoices::Table, Invoices::SalesOrderId)
                                .to(SalesOrders::Table, SalesOrders::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_invoices_customer_id")
                                .from(Invoices::Table, Invoices::CustomerId)
                                .to(Customers::Table, Customers::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_invoices_customer_id")
                        .table(Invoices::Table)
                        .col(Invoices::CustomerId)
                        .to_owned(),
                )
                .await?;

            // Waterfall distribution scans open invoices oldest-first.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_invoices_status_invoice_date")
                        .table(Invoices::Table)
                        .col(Invoices::Status)
                        .col(Invoices::InvoiceDate)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Invoices::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Invoices {
        Table,
        Id,
        InvoiceNumber,
        SalesOrderId,
        CustomerId,
        InvoiceDate,
        TotalAmount,
        TaxAmount,
        NetAmount,
        AmountPaid,
        BalanceDue,
        Status,
        CreatedAt,
    }
}

mod m20240101_000007_create_payments_table {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000001_create_customers_table::Customers;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000007_create_payments_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Payments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Payments::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Payments::CustomerId).big_integer().not_null())
                        .col(ColumnDef::new(Payments::Amount).decimal().not_null())
                        .col(ColumnDef::new(Payments::PaymentDate).date().not_null())
                        .col(ColumnDef::new(Payments::Method).string().not_null())
                        .col(ColumnDef::new(Payments::Reference).string().null())
                        .col(
                            ColumnDef::new(Payments::Reversed)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Payments::CreatedAt).timestamp().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_payments_customer_id")
                                .from(Payments::Table, Payments::CustomerId)
                                .to(Customers::Table, Customers::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_payments_customer_id")
                        .table(Payments::Table)
                        .col(Payments::CustomerId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Payments::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Payments {
        Table,
        Id,
        CustomerId,
        Amount,
        PaymentDate,
        Method,
        Reference,
        Reversed,
        CreatedAt,
    }
}

mod m20240101_000008_create_payment_allocations_table {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000006_create_invoices_table::Invoices;
    use super::m20240101_000007_create_payments_table::Payments;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000008_create_payment_allocations_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PaymentAllocations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PaymentAllocations::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(PaymentAllocations::PaymentId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PaymentAllocations::InvoiceId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PaymentAllocations::Amount)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PaymentAllocations::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_payment_allocations_payment_id")
                                .from(PaymentAllocations::Table, PaymentAllocations::PaymentId)
                                .to(Payments::Table, Payments::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_payment_allocations_invoice_id")
                                .from(PaymentAllocations::Table, PaymentAllocations::InvoiceId)
                                .to(Invoices::Table, Invoices::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_payment_allocations_payment_id")
                        .table(PaymentAllocations::Table)
                        .col(PaymentAllocations::PaymentId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_payment_allocations_invoice_id")
                        .table(PaymentAllocations::Table)
                        .col(PaymentAllocations::InvoiceId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PaymentAllocations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum PaymentAllocations {
        Table,
        Id,
        PaymentId,
        InvoiceId,
        Amount,
        CreatedAt,
    }
}

mod m20240101_000009_create_credit_notes_table {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000001_create_customers_table::Customers;
    use super::m20240101_000006_create_invoices_table::Invoices;
    use super::m20240101_000007_create_payments_table::Payments;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000009_create_credit_notes_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(CreditNotes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CreditNotes::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(CreditNotes::NoteNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(CreditNotes::CustomerId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CreditNotes::OriginalInvoiceId)
                                .big_integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(CreditNotes::SourcePaymentId)
                                .big_integer()
                                .null(),
                        )
                        .col(ColumnDef::new(CreditNotes::Amount).decimal().not_null())
                        .col(
                            ColumnDef::new(CreditNotes::TaxAmount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(CreditNotes::RemainingAmount)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CreditNotes::IsUsed)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(CreditNotes::Reason).string().null())
                        .col(ColumnDef::new(CreditNotes::NoteDate).date().not_null())
                        .col(ColumnDef::new(CreditNotes::CreatedAt).timestamp().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_credit_notes_customer_id")
                                .from(CreditNotes::Table, CreditNotes::CustomerId)
                                .to(Customers::Table, Customers::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_credit_notes_original_invoice_id")
                                .from(CreditNotes::Table, CreditNotes::OriginalInvoiceId)
                                .to(Invoices::Table, Invoices::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_credit_notes_source_payment_id")
                                .from(CreditNotes::Table, CreditNotes::SourcePaymentId)
                                .to(Payments::Table, Payments::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_credit_notes_customer_id")
                        .table(CreditNotes::Table)
                        .col(CreditNotes::CustomerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_credit_notes_source_payment_id")
                        .table(CreditNotes::Table)
                        .col(CreditNotes::SourcePaymentId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_credit_notes_original_invoice_id")
                        .table(CreditNotes::Table)
                        .col(CreditNotes::OriginalInvoiceId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CreditNotes::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum CreditNotes {
        Table,
        Id,
        NoteNumber,
        CustomerId,
        OriginalInvoiceId,
        SourcePaymentId,
        Amount,
        TaxAmount,
        RemainingAmount,
        IsUsed,
        Reason,
        NoteDate,
        CreatedAt,
    }
}
