use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Line item of a compound-ingredient formulation: one material ingredient
/// and the mass of it contained in a single package.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "formulation_materials")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub formulation_id: i64,
    pub material_id: i64,
    /// Mass per package, in ounces.
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity_oz: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::formulation::Entity",
        from = "Column::FormulationId",
        to = "super::formulation::Column::FormulationId"
    )]
    Formulation,
    #[sea_orm(
        belongs_to = "super::ingredient::Entity",
        from = "Column::MaterialId",
        to = "super::ingredient::Column::IngredientId"
    )]
    Material,
}

impl Related<super::formulation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Formulation.def()
    }
}

impl Related<super::ingredient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Material.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
