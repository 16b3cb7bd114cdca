use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ingredients")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub ingredient_id: i64,
    #[sea_orm(unique)]
    pub name: String,
    /// Compound ingredients are produced from a formulation's material list;
    /// atomic ingredients are allocable base materials.
    pub is_compound: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::formulation::Entity")]
    Formulations,
    #[sea_orm(has_many = "super::recipe_bom_line::Entity")]
    RecipeBomLines,
}

impl Related<super::formulation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Formulations.def()
    }
}

impl Related<super::recipe_bom_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecipeBomLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
