use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A supplier's versioned recipe/packaging spec for one ingredient.
///
/// For a given (supplier, ingredient) pair at most one row is open-ended
/// (`effective_end` = NULL). `effective_end` is exclusive: the version stops
/// being active on that date, which is the same date its successor starts.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "formulations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub formulation_id: i64,
    pub ingredient_id: i64,
    pub supplier_id: i64,
    /// Mass per package, in ounces.
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub pack_size_oz: Decimal,
    /// Price per package.
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub unit_price: Decimal,
    pub version_number: i32,
    pub effective_start: NaiveDate,
    pub effective_end: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::ingredient::Entity",
        from = "Column::IngredientId",
        to = "super::ingredient::Column::IngredientId"
    )]
    Ingredient,
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::SupplierId"
    )]
    Supplier,
    #[sea_orm(has_many = "super::formulation_material::Entity")]
    Materials,
    #[sea_orm(has_many = "super::ingredient_lot::Entity")]
    IngredientLots,
}

impl Related<super::ingredient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ingredient.def()
    }
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<super::formulation_material::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Materials.def()
    }
}

impl Related<super::ingredient_lot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IngredientLots.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether this version is the active one on `as_of`.
    pub fn is_active_on(&self, as_of: NaiveDate) -> bool {
        self.effective_start <= as_of && self.effective_end.map_or(true, |end| end > as_of)
    }
}
