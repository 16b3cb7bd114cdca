use rust_decimal::Decimal;
use serde::Serialize;

use crate::services::conflicts::ConflictPair;

/// Error type shared by every service operation.
///
/// `Storage` errors always abort and roll back the transaction they occur
/// in. `InsufficientInventory` and `HealthRiskViolation` abort only the
/// operation that raised them, leaving all previously committed state
/// intact. `Validation`, `NotFound` and `Duplicate` are recoverable at the
/// point of input collection.
#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Storage(
        #[from]
        #[serde(skip)]
        sea_orm::DbErr,
    ),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Recipe draft has no line items")]
    EmptyRecipe,

    #[error(
        "Insufficient inventory for {ingredient_name} (ingredient {ingredient_id}): {shortfall} oz short"
    )]
    InsufficientInventory {
        ingredient_id: i64,
        ingredient_name: String,
        shortfall: Decimal,
    },

    #[error("Health risk violation: {} do-not-combine pair(s) in allocated lots", .0.len())]
    HealthRiskViolation(Vec<ConflictPair>),

    #[error("Event error: {0}")]
    Event(String),
}
