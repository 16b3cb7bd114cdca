use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Unordered pair of atomic ingredients that must never co-occur in a
/// production batch. Rows are canonicalized with the smaller id first, so a
/// reversed duplicate cannot exist.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "do_not_combine")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub ingredient1_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub ingredient2_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
