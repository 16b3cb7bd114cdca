use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A received batch of one supplier formulation. `manufacturer_id` is NULL
/// while the lot is unclaimed and visible to manufacturers whose recipes use
/// the ingredient; claiming sets it exactly once (conditional update).
///
/// Consumption is recorded as `batch_consumption` rows, never as an in-place
/// decrement of `total_mass_oz`; available mass is the difference.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ingredient_lots")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub lot_id: i64,
    #[sea_orm(unique)]
    pub lot_number: String,
    pub formulation_id: i64,
    /// Number of packages received.
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity_packs: Decimal,
    /// Total mass received, in ounces (packs x pack size).
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_mass_oz: Decimal,
    pub expiration_date: NaiveDate,
    pub received_date: NaiveDate,
    pub manufacturer_id: Option<i64>,
    pub created_at: DateTime<Utc>,
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
        belongs_to = "super::manufacturer::Entity",
        from = "Column::ManufacturerId",
        to = "super::manufacturer::Column::ManufacturerId"
    )]
    Manufacturer,
    #[sea_orm(has_many = "super::batch_consumption::Entity")]
    Consumptions,
}

impl Related<super::formulation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Formulation.def()
    }
}

impl Related<super::manufacturer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Manufacturer.def()
    }
}

impl Related<super::batch_consumption::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Consumptions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
