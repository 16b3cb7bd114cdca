use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::config::InventoryConfig;
use crate::entities::{
    batch_consumption, batch_consumption::Entity as BatchConsumptionEntity, formulation,
    formulation::Entity as FormulationEntity, ingredient_lot,
    ingredient_lot::Entity as IngredientLotEntity, product, product::Entity as ProductEntity,
    product_batch, product_batch::Entity as ProductBatchEntity, recipe,
    recipe::Entity as RecipeEntity,
};
use crate::errors::ServiceError;

/// What to trace: either every lot of an ingredient, or one specific lot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum TraceSelector {
    Ingredient(i64),
    IngredientLot(i64),
}

/// Inclusive date window for a recall search.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TraceWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl TraceWindow {
    /// The `days` days ending on `today`, inclusive.
    pub fn ending_on(today: NaiveDate, days: i64) -> Self {
        let from = today
            .checked_sub_days(Days::new(days as u64))
            .unwrap_or(today);
        Self { from, to: today }
    }
}

/// A product batch pulled into a recall search, one row per consumption
/// record that matched the selector.
#[derive(Debug, Clone, Serialize)]
pub struct AffectedBatch {
    pub product_lot_id: i64,
    pub product_lot_number: String,
    pub product_id: i64,
    pub product_name: String,
    pub recipe_id: i64,
    pub production_date: NaiveDate,
    pub expiration_date: NaiveDate,
    pub quantity: i32,
    pub ingredient_lot_id: i64,
    pub ingredient_lot_number: String,
    pub mass_consumed_oz: Decimal,
}

/// Recall-scoping queries over stored consumption records. Traceability
/// follows what batches actually consumed, never a recomputed BOM
/// expansion, so supplier-specific formulation paths are always included.
#[derive(Clone)]
pub struct TraceabilityService {
    db: Arc<DatabaseConnection>,
    inventory: InventoryConfig,
}

impl TraceabilityService {
    pub fn new(db: Arc<DatabaseConnection>, inventory: InventoryConfig) -> Self {
        Self { db, inventory }
    }

    /// Finds every product batch produced inside the window that consumed
    /// the selected ingredient (any of its lots) or the selected lot.
    /// `window` defaults to the configured trailing window ending today.
    #[instrument(skip(self))]
    pub async fn trace(
        &self,
        selector: TraceSelector,
        window: Option<TraceWindow>,
        today: NaiveDate,
    ) -> Result<Vec<AffectedBatch>, ServiceError> {
        let window =
            window.unwrap_or_else(|| TraceWindow::ending_on(today, self.inventory.trace_window_days));
        if window.from > window.to {
            return Err(ServiceError::Validation(format!(
                "Trace window start ({}) is after its end ({})",
                window.from, window.to
            )));
        }

        let lots = self.resolve_lots(selector).await?;
        if lots.is_empty() {
            return Ok(Vec::new());
        }
        let lot_numbers: HashMap<i64, String> = lots
            .iter()
            .map(|l| (l.lot_id, l.lot_number.clone()))
            .collect();

        let consumptions = BatchConsumptionEntity::find()
            .filter(
                batch_consumption::Column::IngredientLotId
                    .is_in(lot_numbers.keys().copied().collect::<Vec<_>>()),
            )
            .all(&*self.db)
            .await?;
        if consumptions.is_empty() {
            return Ok(Vec::new());
        }

        let batch_ids: Vec<i64> = consumptions.iter().map(|c| c.product_lot_id).collect();
        let batches: HashMap<i64, product_batch::Model> = ProductBatchEntity::find()
            .filter(product_batch::Column::LotId.is_in(batch_ids))
            .filter(product_batch::Column::ProductionDate.gte(window.from))
            .filter(product_batch::Column::ProductionDate.lte(window.to))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|b| (b.lot_id, b))
            .collect();

        let recipe_ids: Vec<i64> = batches.values().map(|b| b.recipe_id).collect();
        let recipes: HashMap<i64, recipe::Model> = RecipeEntity::find()
            .filter(recipe::Column::RecipeId.is_in(recipe_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|r| (r.recipe_id, r))
            .collect();

        let product_ids: Vec<i64> = recipes.values().map(|r| r.product_id).collect();
        let products: HashMap<i64, product::Model> = ProductEntity::find()
            .filter(product::Column::ProductId.is_in(product_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|p| (p.product_id, p))
            .collect();

        let mut affected: Vec<AffectedBatch> = consumptions
            .into_iter()
            .filter_map(|consumption| {
                let batch = batches.get(&consumption.product_lot_id)?;
                let recipe = recipes.get(&batch.recipe_id)?;
                let product = products.get(&recipe.product_id)?;
                Some(AffectedBatch {
                    product_lot_id: batch.lot_id,
                    product_lot_number: batch.lot_number.clone(),
                    product_id: product.product_id,
                    product_name: product.name.clone(),
                    recipe_id: batch.recipe_id,
                    production_date: batch.production_date,
                    expiration_date: batch.expiration_date,
                    quantity: batch.quantity,
                    ingredient_lot_id: consumption.ingredient_lot_id,
                    ingredient_lot_number: lot_numbers
                        .get(&consumption.ingredient_lot_id)
                        .cloned()
                        .unwrap_or_default(),
                    mass_consumed_oz: consumption.mass_consumed_oz,
                })
            })
            .collect();

        affected.sort_by_key(|a| (a.production_date, a.product_lot_id, a.ingredient_lot_id));
        Ok(affected)
    }

    async fn resolve_lots(
        &self,
        selector: TraceSelector,
    ) -> Result<Vec<ingredient_lot::Model>, ServiceError> {
        match selector {
            TraceSelector::IngredientLot(lot_id) => {
                let lot = IngredientLotEntity::find_by_id(lot_id)
                    .one(&*self.db)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("Ingredient lot {} not found", lot_id))
                    })?;
                Ok(vec![lot])
            }
            TraceSelector::Ingredient(ingredient_id) => {
                let formulation_ids: Vec<i64> = FormulationEntity::find()
                    .filter(formulation::Column::IngredientId.eq(ingredient_id))
                    .all(&*self.db)
                    .await?
                    .into_iter()
                    .map(|f| f.formulation_id)
                    .collect();
                if formulation_ids.is_empty() {
                    return Ok(Vec::new());
                }

                Ok(IngredientLotEntity::find()
                    .filter(ingredient_lot::Column::FormulationId.is_in(formulation_ids))
                    .all(&*self.db)
                    .await?)
            }
        }
    }
}
