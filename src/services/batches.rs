use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, DatabaseConnection, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::entities::{batch_consumption, product_batch};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::allocation::{AllocationPlan, FefoAllocator};
use crate::services::conflicts::{ConflictChecker, ConflictPair};

/// Input for committing a production batch.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitBatchInput {
    pub recipe_id: i64,
    pub manufacturer_id: i64,
    pub target_quantity: i32,
    pub production_date: NaiveDate,
    pub expiration_date: NaiveDate,
}

/// Read-only preview of what a commit would do: the FEFO plan plus any
/// conflicts in the lots it selected. Shown to the operator before the real
/// commit; the commit re-runs both checks inside its own transaction.
#[derive(Debug, Clone, Serialize)]
pub struct BatchPreview {
    pub plan: AllocationPlan,
    pub conflicts: Vec<ConflictPair>,
}

/// Orchestrates allocation, conflict gating, and atomic persistence of a
/// production batch.
#[derive(Clone)]
pub struct BatchService {
    db: Arc<DatabaseConnection>,
    allocator: Arc<FefoAllocator>,
    conflicts: Arc<ConflictChecker>,
    event_sender: Option<EventSender>,
}

impl BatchService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        allocator: Arc<FefoAllocator>,
        conflicts: Arc<ConflictChecker>,
        event_sender: Option<EventSender>,
    ) -> Self {
        Self {
            db,
            allocator,
            conflicts,
            event_sender,
        }
    }

    /// Plans an allocation and checks the selected lots without writing
    /// anything.
    #[instrument(skip(self))]
    pub async fn preview_allocation(
        &self,
        recipe_id: i64,
        manufacturer_id: i64,
        target_quantity: i32,
        as_of: NaiveDate,
    ) -> Result<BatchPreview, ServiceError> {
        let plan = self
            .allocator
            .allocate(recipe_id, manufacturer_id, target_quantity, as_of)
            .await?;
        let conflicts = self
            .conflicts
            .find_conflicts_for_lots(&plan.lot_ids())
            .await?;

        Ok(BatchPreview { plan, conflicts })
    }

    /// Produces a batch: allocates FEFO, hard-gates on do-not-combine
    /// conflicts in the allocated lots, then persists the batch header and
    /// all consumption rows as one transaction. Every failure path leaves
    /// storage untouched.
    #[instrument(skip(self), fields(recipe_id = input.recipe_id, quantity = input.target_quantity))]
    pub async fn commit_batch(
        &self,
        input: CommitBatchInput,
    ) -> Result<product_batch::Model, ServiceError> {
        if input.target_quantity <= 0 {
            return Err(ServiceError::Validation(format!(
                "Target quantity must be positive, got {}",
                input.target_quantity
            )));
        }
        if input.expiration_date <= input.production_date {
            return Err(ServiceError::Validation(format!(
                "Expiration date ({}) must be after production date ({})",
                input.expiration_date, input.production_date
            )));
        }

        let txn = self.db.begin().await?;

        // Steps 1-2 are read-only; failing here drops the transaction,
        // which rolls it back with nothing written.
        let plan = self
            .allocator
            .allocate_in(
                &txn,
                input.recipe_id,
                input.manufacturer_id,
                input.target_quantity,
                input.production_date,
            )
            .await?;

        let conflicts = self
            .conflicts
            .find_conflicts_for_lots_in(&txn, &plan.lot_ids())
            .await?;
        if !conflicts.is_empty() {
            warn!(
                recipe_id = input.recipe_id,
                pairs = conflicts.len(),
                "Production blocked: allocated lots trip do-not-combine rules"
            );
            return Err(ServiceError::HealthRiskViolation(conflicts));
        }

        let batch = product_batch::ActiveModel {
            lot_number: Set(format!("PB-{}", Uuid::new_v4().as_simple())),
            recipe_id: Set(input.recipe_id),
            quantity: Set(input.target_quantity),
            production_date: Set(input.production_date),
            expiration_date: Set(input.expiration_date),
            batch_cost: Set(plan.total_cost),
            per_unit_cost: Set(plan.per_unit_cost),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for segment in &plan.segments {
            batch_consumption::ActiveModel {
                product_lot_id: Set(batch.lot_id),
                ingredient_lot_id: Set(segment.lot_id),
                mass_consumed_oz: Set(segment.mass_oz),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;

        info!(
            product_lot_id = batch.lot_id,
            recipe_id = batch.recipe_id,
            total_cost = %batch.batch_cost,
            "Product batch created"
        );

        if let Some(sender) = &self.event_sender {
            sender
                .send(Event::ProductBatchCreated {
                    product_lot_id: batch.lot_id,
                    recipe_id: batch.recipe_id,
                    quantity: batch.quantity,
                    total_cost: batch.batch_cost,
                    production_date: batch.production_date,
                })
                .await
                .map_err(ServiceError::Event)?;
        }

        Ok(batch)
    }
}
