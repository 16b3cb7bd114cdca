use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_catalog_tables::Migration),
            Box::new(m20240101_000002_create_formulation_tables::Migration),
            Box::new(m20240101_000003_create_recipe_tables::Migration),
            Box::new(m20240101_000004_create_ingredient_lots_table::Migration),
            Box::new(m20240101_000005_create_production_tables::Migration),
            Box::new(m20240101_000006_create_do_not_combine_table::Migration),
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
                        .table(Suppliers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Suppliers::SupplierId)
                                .big_integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Suppliers::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Suppliers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Manufacturers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Manufacturers::ManufacturerId)
                                .big_integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Manufacturers::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Manufacturers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductCategories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductCategories::CategoryId)
                                .big_integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductCategories::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(ProductCategories::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Ingredients::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Ingredients::IngredientId)
                                .big_integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Ingredients::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Ingredients::IsCompound).boolean().not_null())
                        .col(
                            ColumnDef::new(Ingredients::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Products::ProductId)
                                .big_integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::ManufacturerId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Products::CategoryId).big_integer().not_null())
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(
                            ColumnDef::new(Products::DefaultBatchSize)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_products_manufacturer_id")
                                .from(Products::Table, Products::ManufacturerId)
                                .to(Manufacturers::Table, Manufacturers::ManufacturerId),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_products_category_id")
                                .from(Products::Table, Products::CategoryId)
                                .to(ProductCategories::Table, ProductCategories::CategoryId),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_manufacturer_id")
                        .table(Products::Table)
                        .col(Products::ManufacturerId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Ingredients::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ProductCategories::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Manufacturers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Suppliers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Suppliers {
        Table,
        SupplierId,
        Name,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Manufacturers {
        Table,
        ManufacturerId,
        Name,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum ProductCategories {
        Table,
        CategoryId,
        Name,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Ingredients {
        Table,
        IngredientId,
        Name,
        IsCompound,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Products {
        Table,
        ProductId,
        ManufacturerId,
        CategoryId,
        Name,
        DefaultBatchSize,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_formulation_tables {

    use super::m20240101_000001_create_catalog_tables::{Ingredients, Suppliers};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_formulation_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Formulations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Formulations::FormulationId)
                                .big_integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Formulations::IngredientId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Formulations::SupplierId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Formulations::PackSizeOz)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Formulations::UnitPrice)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Formulations::VersionNumber)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Formulations::EffectiveStart)
                                .date()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Formulations::EffectiveEnd).date().null())
                        .col(
                            ColumnDef::new(Formulations::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_formulations_ingredient_id")
                                .from(Formulations::Table, Formulations::IngredientId)
                                .to(Ingredients::Table, Ingredients::IngredientId),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_formulations_supplier_id")
                                .from(Formulations::Table, Formulations::SupplierId)
                                .to(Suppliers::Table, Suppliers::SupplierId),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_formulations_supplier_ingredient_version")
                        .table(Formulations::Table)
                        .col(Formulations::SupplierId)
                        .col(Formulations::IngredientId)
                        .col(Formulations::VersionNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(FormulationMaterials::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(FormulationMaterials::Id)
                                .big_integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FormulationMaterials::FormulationId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FormulationMaterials::MaterialId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FormulationMaterials::QuantityOz)
                                .decimal()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_formulation_materials_formulation_id")
                                .from(
                                    FormulationMaterials::Table,
                                    FormulationMaterials::FormulationId,
                                )
                                .to(Formulations::Table, Formulations::FormulationId)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_formulation_materials_material_id")
                                .from(
                                    FormulationMaterials::Table,
                                    FormulationMaterials::MaterialId,
                                )
                                .to(Ingredients::Table, Ingredients::IngredientId),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_formulation_materials_formulation_id")
                        .table(FormulationMaterials::Table)
                        .col(FormulationMaterials::FormulationId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(FormulationMaterials::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Formulations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Formulations {
        Table,
        FormulationId,
        IngredientId,
        SupplierId,
        PackSizeOz,
        UnitPrice,
        VersionNumber,
        EffectiveStart,
        EffectiveEnd,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum FormulationMaterials {
        Table,
        Id,
        FormulationId,
        MaterialId,
        QuantityOz,
    }
}

mod m20240101_000003_create_recipe_tables {

    use super::m20240101_000001_create_catalog_tables::{Ingredients, Products};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_recipe_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Recipes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Recipes::RecipeId)
                                .big_integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Recipes::ProductId).big_integer().not_null())
                        .col(
                            ColumnDef::new(Recipes::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_recipes_product_id")
                                .from(Recipes::Table, Recipes::ProductId)
                                .to(Products::Table, Products::ProductId),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(RecipeBomLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(RecipeBomLines::LineId)
                                .big_integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RecipeBomLines::RecipeId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RecipeBomLines::IngredientId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RecipeBomLines::QuantityPerUnitOz)
                                .decimal()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_recipe_bom_lines_recipe_id")
                                .from(RecipeBomLines::Table, RecipeBomLines::RecipeId)
                                .to(Recipes::Table, Recipes::RecipeId)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_recipe_bom_lines_ingredient_id")
                                .from(RecipeBomLines::Table, RecipeBomLines::IngredientId)
                                .to(Ingredients::Table, Ingredients::IngredientId),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_recipe_bom_lines_recipe_ingredient")
                        .table(RecipeBomLines::Table)
                        .col(RecipeBomLines::RecipeId)
                        .col(RecipeBomLines::IngredientId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(RecipeBomLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Recipes::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Recipes {
        Table,
        RecipeId,
        ProductId,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum RecipeBomLines {
        Table,
        LineId,
        RecipeId,
        IngredientId,
        QuantityPerUnitOz,
    }
}

mod m20240101_000004_create_ingredient_lots_table {

    use super::m20240101_000001_create_catalog_tables::Manufacturers;
    use super::m20240101_000002_create_formulation_tables::Formulations;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_ingredient_lots_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(IngredientLots::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(IngredientLots::LotId)
                                .big_integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(IngredientLots::LotNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(IngredientLots::FormulationId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(IngredientLots::QuantityPacks)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(IngredientLots::TotalMassOz)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(IngredientLots::ExpirationDate)
                                .date()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(IngredientLots::ReceivedDate)
                                .date()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(IngredientLots::ManufacturerId)
                                .big_integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(IngredientLots::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_ingredient_lots_formulation_id")
                                .from(IngredientLots::Table, IngredientLots::FormulationId)
                                .to(Formulations::Table, Formulations::FormulationId),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_ingredient_lots_manufacturer_id")
                                .from(IngredientLots::Table, IngredientLots::ManufacturerId)
                                .to(Manufacturers::Table, Manufacturers::ManufacturerId),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_ingredient_lots_formulation_id")
                        .table(IngredientLots::Table)
                        .col(IngredientLots::FormulationId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_ingredient_lots_expiration")
                        .table(IngredientLots::Table)
                        .col(IngredientLots::ExpirationDate)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(IngredientLots::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum IngredientLots {
        Table,
        LotId,
        LotNumber,
        FormulationId,
        QuantityPacks,
        TotalMassOz,
        ExpirationDate,
        ReceivedDate,
        ManufacturerId,
        CreatedAt,
    }
}

mod m20240101_000005_create_production_tables {

    use super::m20240101_000003_create_recipe_tables::Recipes;
    use super::m20240101_000004_create_ingredient_lots_table::IngredientLots;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_production_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ProductBatches::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductBatches::LotId)
                                .big_integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductBatches::LotNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(ProductBatches::RecipeId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductBatches::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(ProductBatches::ProductionDate)
                                .date()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductBatches::ExpirationDate)
                                .date()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductBatches::BatchCost)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductBatches::PerUnitCost)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductBatches::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_product_batches_recipe_id")
                                .from(ProductBatches::Table, ProductBatches::RecipeId)
                                .to(Recipes::Table, Recipes::RecipeId),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_batches_production_date")
                        .table(ProductBatches::Table)
                        .col(ProductBatches::ProductionDate)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(BatchConsumptions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(BatchConsumptions::ConsumptionId)
                                .big_integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BatchConsumptions::ProductLotId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BatchConsumptions::IngredientLotId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BatchConsumptions::MassConsumedOz)
                                .decimal()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_batch_consumptions_product_lot_id")
                                .from(BatchConsumptions::Table, BatchConsumptions::ProductLotId)
                                .to(ProductBatches::Table, ProductBatches::LotId)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_batch_consumptions_ingredient_lot_id")
                                .from(
                                    BatchConsumptions::Table,
                                    BatchConsumptions::IngredientLotId,
                                )
                                .to(IngredientLots::Table, IngredientLots::LotId),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_batch_consumptions_product_lot_id")
                        .table(BatchConsumptions::Table)
                        .col(BatchConsumptions::ProductLotId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_batch_consumptions_ingredient_lot_id")
                        .table(BatchConsumptions::Table)
                        .col(BatchConsumptions::IngredientLotId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(BatchConsumptions::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ProductBatches::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum ProductBatches {
        Table,
        LotId,
        LotNumber,
        RecipeId,
        Quantity,
        ProductionDate,
        ExpirationDate,
        BatchCost,
        PerUnitCost,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum BatchConsumptions {
        Table,
        ConsumptionId,
        ProductLotId,
        IngredientLotId,
        MassConsumedOz,
    }
}

mod m20240101_000006_create_do_not_combine_table {

    use super::m20240101_000001_create_catalog_tables::Ingredients;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_do_not_combine_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(DoNotCombine::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DoNotCombine::Ingredient1Id)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DoNotCombine::Ingredient2Id)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DoNotCombine::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .primary_key(
                            Index::create()
                                .col(DoNotCombine::Ingredient1Id)
                                .col(DoNotCombine::Ingredient2Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_do_not_combine_ingredient1_id")
                                .from(DoNotCombine::Table, DoNotCombine::Ingredient1Id)
                                .to(Ingredients::Table, Ingredients::IngredientId),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_do_not_combine_ingredient2_id")
                                .from(DoNotCombine::Table, DoNotCombine::Ingredient2Id)
                                .to(Ingredients::Table, Ingredients::IngredientId),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(DoNotCombine::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum DoNotCombine {
        Table,
        Ingredient1Id,
        Ingredient2Id,
        CreatedAt,
    }
}
