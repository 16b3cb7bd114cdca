use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One allocation segment: the mass a product batch drew from a single
/// ingredient lot. A batch may draw partial quantities from several lots.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "batch_consumptions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub consumption_id: i64,
    pub product_lot_id: i64,
    pub ingredient_lot_id: i64,
    /// Mass consumed from the ingredient lot, in ounces.
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub mass_consumed_oz: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product_batch::Entity",
        from = "Column::ProductLotId",
        to = "super::product_batch::Column::LotId"
    )]
    ProductBatch,
    #[sea_orm(
        belongs_to = "super::ingredient_lot::Entity",
        from = "Column::IngredientLotId",
        to = "super::ingredient_lot::Column::LotId"
    )]
    IngredientLot,
}

impl Related<super::product_batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductBatch.def()
    }
}

impl Related<super::ingredient_lot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IngredientLot.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
