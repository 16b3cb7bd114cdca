use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Serialize;
use strum::Display;
use tracing::instrument;

use crate::config::InventoryConfig;
use crate::entities::{
    batch_consumption, batch_consumption::Entity as BatchConsumptionEntity, formulation,
    formulation::Entity as FormulationEntity, ingredient, ingredient::Entity as IngredientEntity,
    ingredient_lot, ingredient_lot::Entity as IngredientLotEntity, product,
    product::Entity as ProductEntity, product_batch::Entity as ProductBatchEntity, recipe,
    recipe::Entity as RecipeEntity, recipe_bom_line,
    recipe_bom_line::Entity as RecipeBomLineEntity,
};
use crate::errors::ServiceError;

/// An ingredient whose on-hand mass cannot cover one default-size batch of
/// some product.
#[derive(Debug, Clone, Serialize)]
pub struct LowStockRow {
    pub ingredient_id: i64,
    pub ingredient_name: String,
    pub on_hand_oz: Decimal,
    pub quantity_per_unit_oz: Decimal,
    pub default_batch_size: i32,
    pub required_oz: Decimal,
    pub product_id: i64,
    pub product_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LotExpiryStatus {
    Expired,
    ExpiringSoon,
}

/// An owned lot with remaining mass that is expired or expiring soon.
#[derive(Debug, Clone, Serialize)]
pub struct ExpiringLotRow {
    pub lot_id: i64,
    pub lot_number: String,
    pub ingredient_id: i64,
    pub ingredient_name: String,
    pub remaining_mass_oz: Decimal,
    pub expiration_date: NaiveDate,
    pub days_left: i64,
    pub status: LotExpiryStatus,
}

/// Per-segment cost breakdown of a produced batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchCostLine {
    pub ingredient_id: i64,
    pub ingredient_name: String,
    pub ingredient_lot_id: i64,
    pub ingredient_lot_number: String,
    pub mass_consumed_oz: Decimal,
    pub pack_size_oz: Decimal,
    pub unit_price: Decimal,
    pub cost: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchCostSummary {
    pub product_lot_id: i64,
    pub product_lot_number: String,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i32,
    pub production_date: NaiveDate,
    pub expiration_date: NaiveDate,
    pub batch_cost: Decimal,
    pub per_unit_cost: Decimal,
    pub lines: Vec<BatchCostLine>,
}

/// Read-only inventory and costing reports for a manufacturer.
#[derive(Clone)]
pub struct ReportService {
    db: Arc<DatabaseConnection>,
    inventory: InventoryConfig,
}

impl ReportService {
    pub fn new(db: Arc<DatabaseConnection>, inventory: InventoryConfig) -> Self {
        Self { db, inventory }
    }

    /// Ingredients where on-hand available mass is below what one
    /// default-size batch of a product needs, judged against each product's
    /// latest recipe.
    #[instrument(skip(self))]
    pub async fn nearly_out_of_stock(
        &self,
        manufacturer_id: i64,
        as_of: NaiveDate,
    ) -> Result<Vec<LowStockRow>, ServiceError> {
        let products = ProductEntity::find()
            .filter(product::Column::ManufacturerId.eq(manufacturer_id))
            .all(&*self.db)
            .await?;
        if products.is_empty() {
            return Ok(Vec::new());
        }

        let product_ids: Vec<i64> = products.iter().map(|p| p.product_id).collect();
        let recipes = RecipeEntity::find()
            .filter(recipe::Column::ProductId.is_in(product_ids))
            .all(&*self.db)
            .await?;

        // Latest recipe per product decides the requirement.
        let mut latest_by_product: HashMap<i64, recipe::Model> = HashMap::new();
        for r in recipes {
            let slot = latest_by_product.entry(r.product_id).or_insert_with(|| r.clone());
            if (r.created_at, r.recipe_id) > (slot.created_at, slot.recipe_id) {
                *slot = r;
            }
        }
        if latest_by_product.is_empty() {
            return Ok(Vec::new());
        }

        let recipe_ids: Vec<i64> = latest_by_product.values().map(|r| r.recipe_id).collect();
        let lines = RecipeBomLineEntity::find()
            .filter(recipe_bom_line::Column::RecipeId.is_in(recipe_ids))
            .all(&*self.db)
            .await?;

        let ingredient_ids: Vec<i64> = lines.iter().map(|l| l.ingredient_id).collect();
        let on_hand = self
            .on_hand_by_ingredient(manufacturer_id, &ingredient_ids, as_of)
            .await?;
        let names: HashMap<i64, String> = IngredientEntity::find()
            .filter(ingredient::Column::IngredientId.is_in(ingredient_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|i| (i.ingredient_id, i.name))
            .collect();

        let product_by_recipe: HashMap<i64, &product::Model> = latest_by_product
            .values()
            .filter_map(|r| {
                products
                    .iter()
                    .find(|p| p.product_id == r.product_id)
                    .map(|p| (r.recipe_id, p))
            })
            .collect();

        let mut rows = Vec::new();
        for line in lines {
            let Some(product) = product_by_recipe.get(&line.recipe_id) else {
                continue;
            };
            let required =
                line.quantity_per_unit_oz * Decimal::from(product.default_batch_size);
            let available = on_hand
                .get(&line.ingredient_id)
                .copied()
                .unwrap_or(Decimal::ZERO);
            if available < required {
                rows.push(LowStockRow {
                    ingredient_id: line.ingredient_id,
                    ingredient_name: names
                        .get(&line.ingredient_id)
                        .cloned()
                        .unwrap_or_default(),
                    on_hand_oz: available,
                    quantity_per_unit_oz: line.quantity_per_unit_oz,
                    default_batch_size: product.default_batch_size,
                    required_oz: required,
                    product_id: product.product_id,
                    product_name: product.name.clone(),
                });
            }
        }

        rows.sort_by_key(|r| (r.ingredient_id, r.product_id));
        Ok(rows)
    }

    /// Owned lots with remaining mass expiring within `days` (default from
    /// config). Already expired lots are included and flagged.
    #[instrument(skip(self))]
    pub async fn almost_expired(
        &self,
        manufacturer_id: i64,
        days: Option<i64>,
        as_of: NaiveDate,
    ) -> Result<Vec<ExpiringLotRow>, ServiceError> {
        let days = days.unwrap_or(self.inventory.expiry_warning_days);
        let cutoff = as_of
            .checked_add_days(Days::new(days as u64))
            .unwrap_or(as_of);

        let lots = IngredientLotEntity::find()
            .find_also_related(FormulationEntity)
            .filter(ingredient_lot::Column::ManufacturerId.eq(manufacturer_id))
            .filter(ingredient_lot::Column::ExpirationDate.lte(cutoff))
            .all(&*self.db)
            .await?;

        let lot_ids: Vec<i64> = lots.iter().map(|(l, _)| l.lot_id).collect();
        let consumed = self.consumed_by_lot(&lot_ids).await?;

        let ingredient_ids: Vec<i64> = lots
            .iter()
            .filter_map(|(_, f)| f.as_ref().map(|f| f.ingredient_id))
            .collect();
        let names: HashMap<i64, String> = IngredientEntity::find()
            .filter(ingredient::Column::IngredientId.is_in(ingredient_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|i| (i.ingredient_id, i.name))
            .collect();

        let mut rows = Vec::new();
        for (lot, formulation) in lots {
            let Some(formulation) = formulation else {
                continue;
            };
            let remaining =
                lot.total_mass_oz - consumed.get(&lot.lot_id).copied().unwrap_or(Decimal::ZERO);
            if remaining <= Decimal::ZERO {
                continue;
            }

            let days_left = (lot.expiration_date - as_of).num_days();
            rows.push(ExpiringLotRow {
                lot_id: lot.lot_id,
                lot_number: lot.lot_number,
                ingredient_id: formulation.ingredient_id,
                ingredient_name: names
                    .get(&formulation.ingredient_id)
                    .cloned()
                    .unwrap_or_default(),
                remaining_mass_oz: remaining,
                expiration_date: lot.expiration_date,
                days_left,
                status: if days_left < 0 {
                    LotExpiryStatus::Expired
                } else {
                    LotExpiryStatus::ExpiringSoon
                },
            });
        }

        rows.sort_by_key(|r| (r.expiration_date, r.lot_id));
        Ok(rows)
    }

    /// Batch header plus per-segment ingredient costs, recomputed from the
    /// stored consumption rows and the consumed lots' formulation pricing.
    #[instrument(skip(self))]
    pub async fn batch_cost_summary(
        &self,
        product_lot_id: i64,
    ) -> Result<BatchCostSummary, ServiceError> {
        let batch = ProductBatchEntity::find_by_id(product_lot_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product batch {} not found", product_lot_id))
            })?;

        let recipe = RecipeEntity::find_by_id(batch.recipe_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Recipe {} not found", batch.recipe_id))
            })?;
        let product = ProductEntity::find_by_id(recipe.product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", recipe.product_id))
            })?;

        let consumptions = BatchConsumptionEntity::find()
            .filter(batch_consumption::Column::ProductLotId.eq(product_lot_id))
            .all(&*self.db)
            .await?;

        let lot_ids: Vec<i64> = consumptions.iter().map(|c| c.ingredient_lot_id).collect();
        let lots: HashMap<i64, (ingredient_lot::Model, Option<formulation::Model>)> =
            IngredientLotEntity::find()
                .find_also_related(FormulationEntity)
                .filter(ingredient_lot::Column::LotId.is_in(lot_ids))
                .all(&*self.db)
                .await?
                .into_iter()
                .map(|(l, f)| (l.lot_id, (l, f)))
                .collect();

        let ingredient_ids: Vec<i64> = lots
            .values()
            .filter_map(|(_, f)| f.as_ref().map(|f| f.ingredient_id))
            .collect();
        let names: HashMap<i64, String> = IngredientEntity::find()
            .filter(ingredient::Column::IngredientId.is_in(ingredient_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|i| (i.ingredient_id, i.name))
            .collect();

        let mut lines = Vec::new();
        for consumption in consumptions {
            let Some((lot, Some(formulation))) = lots.get(&consumption.ingredient_lot_id) else {
                continue;
            };
            let cost = (consumption.mass_consumed_oz / formulation.pack_size_oz
                * formulation.unit_price)
                .round_dp(4);
            lines.push(BatchCostLine {
                ingredient_id: formulation.ingredient_id,
                ingredient_name: names
                    .get(&formulation.ingredient_id)
                    .cloned()
                    .unwrap_or_default(),
                ingredient_lot_id: lot.lot_id,
                ingredient_lot_number: lot.lot_number.clone(),
                mass_consumed_oz: consumption.mass_consumed_oz,
                pack_size_oz: formulation.pack_size_oz,
                unit_price: formulation.unit_price,
                cost,
            });
        }
        lines.sort_by_key(|l| (l.ingredient_id, l.ingredient_lot_id));

        Ok(BatchCostSummary {
            product_lot_id: batch.lot_id,
            product_lot_number: batch.lot_number,
            product_id: product.product_id,
            product_name: product.name,
            quantity: batch.quantity,
            production_date: batch.production_date,
            expiration_date: batch.expiration_date,
            batch_cost: batch.batch_cost,
            per_unit_cost: batch.per_unit_cost,
            lines,
        })
    }

    async fn on_hand_by_ingredient(
        &self,
        manufacturer_id: i64,
        ingredient_ids: &[i64],
        as_of: NaiveDate,
    ) -> Result<HashMap<i64, Decimal>, ServiceError> {
        if ingredient_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let lots = IngredientLotEntity::find()
            .find_also_related(FormulationEntity)
            .filter(formulation::Column::IngredientId.is_in(ingredient_ids.iter().copied()))
            .filter(ingredient_lot::Column::ManufacturerId.eq(manufacturer_id))
            .filter(ingredient_lot::Column::ExpirationDate.gte(as_of))
            .all(&*self.db)
            .await?;

        let lot_ids: Vec<i64> = lots.iter().map(|(l, _)| l.lot_id).collect();
        let consumed = self.consumed_by_lot(&lot_ids).await?;

        let mut on_hand: HashMap<i64, Decimal> = HashMap::new();
        for (lot, formulation) in lots {
            let Some(formulation) = formulation else {
                continue;
            };
            let remaining =
                lot.total_mass_oz - consumed.get(&lot.lot_id).copied().unwrap_or(Decimal::ZERO);
            if remaining > Decimal::ZERO {
                *on_hand
                    .entry(formulation.ingredient_id)
                    .or_insert(Decimal::ZERO) += remaining;
            }
        }
        Ok(on_hand)
    }

    async fn consumed_by_lot(&self, lot_ids: &[i64]) -> Result<HashMap<i64, Decimal>, ServiceError> {
        if lot_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = BatchConsumptionEntity::find()
            .filter(batch_consumption::Column::IngredientLotId.is_in(lot_ids.iter().copied()))
            .all(&*self.db)
            .await?;

        let mut consumed: HashMap<i64, Decimal> = HashMap::new();
        for row in rows {
            *consumed.entry(row.ingredient_lot_id).or_insert(Decimal::ZERO) +=
                row.mass_consumed_oz;
        }
        Ok(consumed)
    }
}
