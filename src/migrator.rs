use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_catalog_tables::Migration),
            Box::new(m20240101_000002_create_adjustment_tables::Migration),
            Box::new(m20240101_000003_create_transfer_tables::Migration),
            Box::new(m20240101_000004_create_pos_tables::Migration),
            Box::new(m20240101_000005_create_order_tables::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_catalog_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_catalog_tables"
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
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(
                            ColumnDef::new(Products::Sku)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Products::TotalReceivedQuantity)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::TotalWarehouseQuantity)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::IsArchived)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Products::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Products::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductVariants::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductVariants::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductVariants::ProductId).uuid().not_null())
                        .col(ColumnDef::new(ProductVariants::Name).string().not_null())
                        .col(ColumnDef::new(ProductVariants::Sku).string().not_null())
                        .col(
                            ColumnDef::new(ProductVariants::Barcode)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(ProductVariants::Price)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(ProductVariants::SalePrice).decimal().null())
                        .col(
                            ColumnDef::new(ProductVariants::TotalReceivedQuantity)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductVariants::TotalWarehouseQuantity)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductVariants::IsArchived)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(ProductVariants::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductVariants::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_product_variants_product")
                                .from(ProductVariants::Table, ProductVariants::ProductId)
                                .to(Products::Table, Products::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Warehouses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Warehouses::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Warehouses::Name).string().not_null())
                        .col(
                            ColumnDef::new(Warehouses::IsArchived)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Warehouses::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Warehouses::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockEntries::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockEntries::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockEntries::VariantId).uuid().not_null())
                        .col(ColumnDef::new(StockEntries::WarehouseId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockEntries::WarehouseQuantity)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockEntries::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockEntries::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_entries_variant")
                                .from(StockEntries::Table, StockEntries::VariantId)
                                .to(ProductVariants::Table, ProductVariants::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_entries_warehouse")
                                .from(StockEntries::Table, StockEntries::WarehouseId)
                                .to(Warehouses::Table, Warehouses::Id),
                        )
                        .to_owned(),
                )
                .await?;

            // One entry per (variant, warehouse); a racing duplicate create
            // fails the constraint and rolls its transaction back.
            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_entries_variant_warehouse")
                        .table(StockEntries::Table)
                        .col(StockEntries::VariantId)
                        .col(StockEntries::WarehouseId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockEntries::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ProductVariants::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Warehouses::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(Iden)]
    enum Products {
        Table,
        Id,
        Name,
        Sku,
        TotalReceivedQuantity,
        TotalWarehouseQuantity,
        IsArchived,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum ProductVariants {
        Table,
        Id,
        ProductId,
        Name,
        Sku,
        Barcode,
        Price,
        SalePrice,
        TotalReceivedQuantity,
        TotalWarehouseQuantity,
        IsArchived,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum Warehouses {
        Table,
        Id,
        Name,
        IsArchived,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    pub(super) enum StockEntries {
        Table,
        Id,
        VariantId,
        WarehouseId,
        WarehouseQuantity,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_adjustment_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_adjustment_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryAdjustmentReasons::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryAdjustmentReasons::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryAdjustmentReasons::Name)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryAdjustmentReasons::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InventoryAdjustments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryAdjustments::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryAdjustments::Name)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryAdjustments::Date)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryAdjustments::ReasonId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryAdjustments::WarehouseId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryAdjustments::IsArchived)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(InventoryAdjustments::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryAdjustments::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_adjustments_reason")
                                .from(
                                    InventoryAdjustments::Table,
                                    InventoryAdjustments::ReasonId,
                                )
                                .to(
                                    InventoryAdjustmentReasons::Table,
                                    InventoryAdjustmentReasons::Id,
                                ),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InventoryAdjustmentLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryAdjustmentLines::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryAdjustmentLines::AdjustmentId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryAdjustmentLines::StockEntryId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryAdjustmentLines::QuantityChange)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryAdjustmentLines::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_adjustment_lines_adjustment")
                                .from(
                                    InventoryAdjustmentLines::Table,
                                    InventoryAdjustmentLines::AdjustmentId,
                                )
                                .to(InventoryAdjustments::Table, InventoryAdjustments::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_inventory_adjustment_lines_adjustment")
                        .table(InventoryAdjustmentLines::Table)
                        .col(InventoryAdjustmentLines::AdjustmentId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(
                    Table::drop()
                        .table(InventoryAdjustmentLines::Table)
                        .to_owned(),
                )
                .await?;
            manager
                .drop_table(Table::drop().table(InventoryAdjustments::Table).to_owned())
                .await?;
            manager
                .drop_table(
                    Table::drop()
                        .table(InventoryAdjustmentReasons::Table)
                        .to_owned(),
                )
                .await?;
            Ok(())
        }
    }

    #[derive(Iden)]
    enum InventoryAdjustmentReasons {
        Table,
        Id,
        Name,
        CreatedAt,
    }

    #[derive(Iden)]
    enum InventoryAdjustments {
        Table,
        Id,
        Name,
        Date,
        ReasonId,
        WarehouseId,
        IsArchived,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum InventoryAdjustmentLines {
        Table,
        Id,
        AdjustmentId,
        StockEntryId,
        QuantityChange,
        CreatedAt,
    }
}

mod m20240101_000003_create_transfer_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_transfer_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryTransferReasons::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryTransferReasons::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransferReasons::Name)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransferReasons::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InventoryTransfers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryTransfers::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryTransfers::Name).string().not_null())
                        .col(
                            ColumnDef::new(InventoryTransfers::Date)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransfers::ReasonId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransfers::SourceWarehouseId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransfers::DestinationWarehouseId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransfers::IsArchived)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(InventoryTransfers::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransfers::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_transfers_reason")
                                .from(InventoryTransfers::Table, InventoryTransfers::ReasonId)
                                .to(
                                    InventoryTransferReasons::Table,
                                    InventoryTransferReasons::Id,
                                ),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InventoryTransferItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryTransferItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransferItems::TransferId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransferItems::VariantId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransferItems::Quantity)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransferItems::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_transfer_items_transfer")
                                .from(
                                    InventoryTransferItems::Table,
                                    InventoryTransferItems::TransferId,
                                )
                                .to(InventoryTransfers::Table, InventoryTransfers::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_inventory_transfer_items_transfer")
                        .table(InventoryTransferItems::Table)
                        .col(InventoryTransferItems::TransferId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(
                    Table::drop()
                        .table(InventoryTransferItems::Table)
                        .to_owned(),
                )
                .await?;
            manager
                .drop_table(Table::drop().table(InventoryTransfers::Table).to_owned())
                .await?;
            manager
                .drop_table(
                    Table::drop()
                        .table(InventoryTransferReasons::Table)
                        .to_owned(),
                )
                .await?;
            Ok(())
        }
    }

    #[derive(Iden)]
    enum InventoryTransferReasons {
        Table,
        Id,
        Name,
        CreatedAt,
    }

    #[derive(Iden)]
    enum InventoryTransfers {
        Table,
        Id,
        Name,
        Date,
        ReasonId,
        SourceWarehouseId,
        DestinationWarehouseId,
        IsArchived,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum InventoryTransferItems {
        Table,
        Id,
        TransferId,
        VariantId,
        Quantity,
        CreatedAt,
    }
}

mod m20240101_000004_create_pos_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_pos_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PointsOfSale::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PointsOfSale::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PointsOfSale::Name).string().not_null())
                        .col(ColumnDef::new(PointsOfSale::WarehouseId).uuid().not_null())
                        .col(
                            ColumnDef::new(PointsOfSale::Balance)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(PointsOfSale::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PointsOfSale::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Shifts::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Shifts::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Shifts::PointOfSaleId).uuid().not_null())
                        .col(
                            ColumnDef::new(Shifts::IsOpened)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Shifts::OpenedAt).timestamp().not_null())
                        .col(ColumnDef::new(Shifts::ClosedAt).timestamp().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_shifts_point_of_sale")
                                .from(Shifts::Table, Shifts::PointOfSaleId)
                                .to(PointsOfSale::Table, PointsOfSale::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(RegisterTransactions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(RegisterTransactions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RegisterTransactions::ShiftId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RegisterTransactions::Kind)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RegisterTransactions::Amount)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RegisterTransactions::Date)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_register_transactions_shift")
                                .from(RegisterTransactions::Table, RegisterTransactions::ShiftId)
                                .to(Shifts::Table, Shifts::Id),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(
                    Table::drop()
                        .table(RegisterTransactions::Table)
                        .to_owned(),
                )
                .await?;
            manager
                .drop_table(Table::drop().table(Shifts::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PointsOfSale::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(Iden)]
    enum PointsOfSale {
        Table,
        Id,
        Name,
        WarehouseId,
        Balance,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum Shifts {
        Table,
        Id,
        PointOfSaleId,
        IsOpened,
        OpenedAt,
        ClosedAt,
    }

    #[derive(Iden)]
    enum RegisterTransactions {
        Table,
        Id,
        ShiftId,
        Kind,
        Amount,
        Date,
    }
}

mod m20240101_000005_create_order_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Orders::Name).string().not_null())
                        .col(ColumnDef::new(Orders::ShiftId).uuid().not_null())
                        .col(ColumnDef::new(Orders::Date).timestamp().not_null())
                        .col(ColumnDef::new(Orders::PaymentMethod).string().not_null())
                        .col(
                            ColumnDef::new(Orders::TotalAmount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::TotalCashAmount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::TotalCardAmount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Orders::BulkDiscountKind).string().null())
                        .col(ColumnDef::new(Orders::BulkDiscountValue).decimal().null())
                        .col(ColumnDef::new(Orders::CreatedAt).timestamp().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_shift")
                                .from(Orders::Table, Orders::ShiftId)
                                .to(Shifts::Table, Shifts::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItems::OrderId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::StockEntryId).uuid().not_null())
                        .col(
                            ColumnDef::new(OrderItems::Quantity)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItems::UnitPrice).decimal().not_null())
                        .col(
                            ColumnDef::new(OrderItems::DiscountedPrice)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderItems::CustomDiscountKind)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(OrderItems::CustomDiscountValue)
                                .decimal()
                                .null(),
                        )
                        .col(ColumnDef::new(OrderItems::CreatedAt).timestamp().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_order")
                                .from(OrderItems::Table, OrderItems::OrderId)
                                .to(Orders::Table, Orders::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Refunds::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Refunds::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Refunds::Name).string().not_null())
                        .col(ColumnDef::new(Refunds::OrderId).uuid().not_null())
                        .col(ColumnDef::new(Refunds::ShiftId).uuid().not_null())
                        .col(
                            ColumnDef::new(Refunds::TotalAmount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Refunds::Date).timestamp().not_null())
                        .col(ColumnDef::new(Refunds::CreatedAt).timestamp().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_refunds_order")
                                .from(Refunds::Table, Refunds::OrderId)
                                .to(Orders::Table, Orders::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(RefundItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(RefundItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(RefundItems::RefundId).uuid().not_null())
                        .col(ColumnDef::new(RefundItems::OrderItemId).uuid().not_null())
                        .col(
                            ColumnDef::new(RefundItems::Quantity)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(RefundItems::Amount).decimal().not_null())
                        .col(
                            ColumnDef::new(RefundItems::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_refund_items_refund")
                                .from(RefundItems::Table, RefundItems::RefundId)
                                .to(Refunds::Table, Refunds::Id),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(RefundItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Refunds::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(OrderItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(Iden)]
    enum Orders {
        Table,
        Id,
        Name,
        ShiftId,
        Date,
        PaymentMethod,
        TotalAmount,
        TotalCashAmount,
        TotalCardAmount,
        BulkDiscountKind,
        BulkDiscountValue,
        CreatedAt,
    }

    #[derive(Iden)]
    enum OrderItems {
        Table,
        Id,
        OrderId,
        StockEntryId,
        Quantity,
        UnitPrice,
        DiscountedPrice,
        CustomDiscountKind,
        CustomDiscountValue,
        CreatedAt,
    }

    #[derive(Iden)]
    enum Refunds {
        Table,
        Id,
        Name,
        OrderId,
        ShiftId,
        TotalAmount,
        Date,
        CreatedAt,
    }

    #[derive(Iden)]
    enum RefundItems {
        Table,
        Id,
        RefundId,
        OrderItemId,
        Quantity,
        Amount,
        CreatedAt,
    }

    #[derive(Iden)]
    enum Shifts {
        Table,
        Id,
    }
}
