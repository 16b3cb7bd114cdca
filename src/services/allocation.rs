use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::entities::{
    batch_consumption, batch_consumption::Entity as BatchConsumptionEntity, formulation,
    formulation::Entity as FormulationEntity, ingredient, ingredient::Entity as IngredientEntity,
    ingredient_lot, ingredient_lot::Entity as IngredientLotEntity, recipe::Entity as RecipeEntity,
    recipe_bom_line, recipe_bom_line::Entity as RecipeBomLineEntity,
};
use crate::errors::ServiceError;

/// Required mass of one ingredient for the whole batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientRequirement {
    pub ingredient_id: i64,
    pub ingredient_name: String,
    pub required_mass_oz: Decimal,
}

/// One candidate lot in the inventory snapshot the allocator plans against.
/// `available_mass_oz` already has prior consumption subtracted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotSnapshot {
    pub lot_id: i64,
    pub lot_number: String,
    pub ingredient_id: i64,
    pub available_mass_oz: Decimal,
    pub pack_size_oz: Decimal,
    pub unit_price: Decimal,
    pub expiration_date: NaiveDate,
}

/// One allocation segment: mass drawn from a single lot and its cost share.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationSegment {
    pub lot_id: i64,
    pub lot_number: String,
    pub ingredient_id: i64,
    pub ingredient_name: String,
    pub mass_oz: Decimal,
    pub cost: Decimal,
}

/// Complete allocation plan for a batch. Pure planning output; producing it
/// writes nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationPlan {
    pub recipe_id: i64,
    pub target_quantity: i32,
    pub segments: Vec<AllocationSegment>,
    pub total_cost: Decimal,
    pub per_unit_cost: Decimal,
}

impl AllocationPlan {
    pub fn lot_ids(&self) -> Vec<i64> {
        self.segments.iter().map(|s| s.lot_id).collect()
    }
}

/// First-Expired-First-Out allocator over a manufacturer's owned inventory.
#[derive(Clone)]
pub struct FefoAllocator {
    db: Arc<DatabaseConnection>,
}

impl FefoAllocator {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Computes an allocation plan for producing `target_quantity` units of
    /// the recipe's product from the manufacturer's owned, unexpired lots.
    /// All-or-nothing: any shortfall fails the whole call and no segments
    /// are returned.
    #[instrument(skip(self))]
    pub async fn allocate(
        &self,
        recipe_id: i64,
        manufacturer_id: i64,
        target_quantity: i32,
        as_of: NaiveDate,
    ) -> Result<AllocationPlan, ServiceError> {
        self.allocate_in(&*self.db, recipe_id, manufacturer_id, target_quantity, as_of)
            .await
    }

    /// Transactional variant: plans against the snapshot visible to `conn`.
    pub async fn allocate_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        recipe_id: i64,
        manufacturer_id: i64,
        target_quantity: i32,
        as_of: NaiveDate,
    ) -> Result<AllocationPlan, ServiceError> {
        if target_quantity <= 0 {
            return Err(ServiceError::Validation(format!(
                "Target quantity must be positive, got {}",
                target_quantity
            )));
        }

        RecipeEntity::find_by_id(recipe_id)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Recipe {} not found", recipe_id)))?;

        let requirements = self
            .load_requirements(conn, recipe_id, target_quantity)
            .await?;

        let ingredient_ids: Vec<i64> = requirements.iter().map(|r| r.ingredient_id).collect();
        let lots_by_ingredient = self
            .inventory_snapshot(conn, manufacturer_id, &ingredient_ids, as_of)
            .await?;

        plan_allocation(recipe_id, target_quantity, &requirements, &lots_by_ingredient)
    }

    /// Resolves the recipe's BOM lines into per-ingredient required mass,
    /// ordered by ingredient id so repeated runs see an identical sequence.
    async fn load_requirements<C: ConnectionTrait>(
        &self,
        conn: &C,
        recipe_id: i64,
        target_quantity: i32,
    ) -> Result<Vec<IngredientRequirement>, ServiceError> {
        let lines = RecipeBomLineEntity::find()
            .filter(recipe_bom_line::Column::RecipeId.eq(recipe_id))
            .all(conn)
            .await?;

        if lines.is_empty() {
            return Err(ServiceError::NotFound(format!(
                "Recipe {} has no BOM lines",
                recipe_id
            )));
        }

        let ids: Vec<i64> = lines.iter().map(|l| l.ingredient_id).collect();
        let names: HashMap<i64, String> = IngredientEntity::find()
            .filter(ingredient::Column::IngredientId.is_in(ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|i| (i.ingredient_id, i.name))
            .collect();

        let quantity = Decimal::from(target_quantity);
        let mut requirements: Vec<IngredientRequirement> = lines
            .into_iter()
            .map(|line| IngredientRequirement {
                ingredient_id: line.ingredient_id,
                ingredient_name: names
                    .get(&line.ingredient_id)
                    .cloned()
                    .unwrap_or_default(),
                required_mass_oz: line.quantity_per_unit_oz * quantity,
            })
            .collect();
        requirements.sort_by_key(|r| r.ingredient_id);

        Ok(requirements)
    }

    /// Fetches the manufacturer's owned, unexpired, positive-availability
    /// lots for the given ingredients. Availability subtracts everything
    /// already consumed by committed product batches.
    async fn inventory_snapshot<C: ConnectionTrait>(
        &self,
        conn: &C,
        manufacturer_id: i64,
        ingredient_ids: &[i64],
        as_of: NaiveDate,
    ) -> Result<HashMap<i64, Vec<LotSnapshot>>, ServiceError> {
        let lots_with_formulations = IngredientLotEntity::find()
            .find_also_related(FormulationEntity)
            .filter(formulation::Column::IngredientId.is_in(ingredient_ids.iter().copied()))
            .filter(ingredient_lot::Column::ManufacturerId.eq(manufacturer_id))
            .filter(ingredient_lot::Column::ExpirationDate.gte(as_of))
            .all(conn)
            .await?;

        let lot_ids: Vec<i64> = lots_with_formulations
            .iter()
            .map(|(lot, _)| lot.lot_id)
            .collect();

        let consumed = self.consumed_by_lot(conn, &lot_ids).await?;

        let mut snapshot: HashMap<i64, Vec<LotSnapshot>> = HashMap::new();
        for (lot, formulation) in lots_with_formulations {
            let formulation = formulation.ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Formulation {} for lot {} not found",
                    lot.formulation_id, lot.lot_id
                ))
            })?;

            let already_consumed = consumed.get(&lot.lot_id).copied().unwrap_or(Decimal::ZERO);
            let available = lot.total_mass_oz - already_consumed;
            if available <= Decimal::ZERO {
                continue;
            }

            snapshot
                .entry(formulation.ingredient_id)
                .or_default()
                .push(LotSnapshot {
                    lot_id: lot.lot_id,
                    lot_number: lot.lot_number,
                    ingredient_id: formulation.ingredient_id,
                    available_mass_oz: available,
                    pack_size_oz: formulation.pack_size_oz,
                    unit_price: formulation.unit_price,
                    expiration_date: lot.expiration_date,
                });
        }

        Ok(snapshot)
    }

    async fn consumed_by_lot<C: ConnectionTrait>(
        &self,
        conn: &C,
        lot_ids: &[i64],
    ) -> Result<HashMap<i64, Decimal>, ServiceError> {
        if lot_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = BatchConsumptionEntity::find()
            .filter(batch_consumption::Column::IngredientLotId.is_in(lot_ids.iter().copied()))
            .all(conn)
            .await?;

        let mut consumed: HashMap<i64, Decimal> = HashMap::new();
        for row in rows {
            *consumed.entry(row.ingredient_lot_id).or_insert(Decimal::ZERO) +=
                row.mass_consumed_oz;
        }
        Ok(consumed)
    }
}

/// Greedy FEFO pass over an inventory snapshot. Pure computation: candidate
/// lots are sorted by expiration date then lot id and consumed in that order
/// until each requirement is met. Returns the full plan or the first
/// shortfall, never a partial plan.
pub fn plan_allocation(
    recipe_id: i64,
    target_quantity: i32,
    requirements: &[IngredientRequirement],
    lots_by_ingredient: &HashMap<i64, Vec<LotSnapshot>>,
) -> Result<AllocationPlan, ServiceError> {
    if target_quantity <= 0 {
        return Err(ServiceError::Validation(format!(
            "Target quantity must be positive, got {}",
            target_quantity
        )));
    }

    let mut segments: Vec<AllocationSegment> = Vec::new();
    let mut total_cost = Decimal::ZERO;

    for requirement in requirements {
        let mut candidates: Vec<LotSnapshot> = lots_by_ingredient
            .get(&requirement.ingredient_id)
            .cloned()
            .unwrap_or_default();
        candidates.sort_by_key(|lot| (lot.expiration_date, lot.lot_id));

        let mut remaining = requirement.required_mass_oz;
        for lot in &candidates {
            if remaining <= Decimal::ZERO {
                break;
            }

            let take = remaining.min(lot.available_mass_oz);
            let cost = take / lot.pack_size_oz * lot.unit_price;
            segments.push(AllocationSegment {
                lot_id: lot.lot_id,
                lot_number: lot.lot_number.clone(),
                ingredient_id: requirement.ingredient_id,
                ingredient_name: requirement.ingredient_name.clone(),
                mass_oz: take,
                cost,
            });
            total_cost += cost;
            remaining -= take;
        }

        if remaining > Decimal::ZERO {
            return Err(ServiceError::InsufficientInventory {
                ingredient_id: requirement.ingredient_id,
                ingredient_name: requirement.ingredient_name.clone(),
                shortfall: remaining,
            });
        }
    }

    let total_cost = total_cost.round_dp(4);
    let per_unit_cost = (total_cost / Decimal::from(target_quantity)).round_dp(4);

    Ok(AllocationPlan {
        recipe_id,
        target_quantity,
        segments,
        total_cost,
        per_unit_cost,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn lot(
        lot_id: i64,
        ingredient_id: i64,
        available: Decimal,
        expires: NaiveDate,
    ) -> LotSnapshot {
        LotSnapshot {
            lot_id,
            lot_number: format!("IL-{}", lot_id),
            ingredient_id,
            available_mass_oz: available,
            pack_size_oz: dec!(10),
            unit_price: dec!(2),
            expiration_date: expires,
        }
    }

    fn requirement(ingredient_id: i64, required: Decimal) -> IngredientRequirement {
        IngredientRequirement {
            ingredient_id,
            ingredient_name: format!("ingredient-{}", ingredient_id),
            required_mass_oz: required,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn worked_example_two_lots() {
        // 10 oz per unit, 5 units -> 50 oz; L1 has 30 oz expiring first,
        // L2 has 40 oz. Expect 30 from L1 ($6.00) + 20 from L2 ($4.00).
        let requirements = vec![requirement(1, dec!(50))];
        let mut lots = HashMap::new();
        lots.insert(
            1,
            vec![
                lot(2, 1, dec!(40), date(2025, 2, 1)),
                lot(1, 1, dec!(30), date(2025, 1, 1)),
            ],
        );

        let plan = plan_allocation(7, 5, &requirements, &lots).unwrap();
        assert_eq!(plan.segments.len(), 2);
        assert_eq!(plan.segments[0].lot_id, 1);
        assert_eq!(plan.segments[0].mass_oz, dec!(30));
        assert_eq!(plan.segments[0].cost, dec!(6));
        assert_eq!(plan.segments[1].lot_id, 2);
        assert_eq!(plan.segments[1].mass_oz, dec!(20));
        assert_eq!(plan.segments[1].cost, dec!(4));
        assert_eq!(plan.total_cost, dec!(10));
        assert_eq!(plan.per_unit_cost, dec!(2));
    }

    #[test]
    fn fefo_exhausts_earlier_expirations_first() {
        let requirements = vec![requirement(1, dec!(25))];
        let mut lots = HashMap::new();
        // Inserted out of order on purpose.
        lots.insert(
            1,
            vec![
                lot(3, 1, dec!(10), date(2025, 3, 1)),
                lot(1, 1, dec!(10), date(2025, 1, 1)),
                lot(2, 1, dec!(10), date(2025, 2, 1)),
            ],
        );

        let plan = plan_allocation(1, 1, &requirements, &lots).unwrap();
        let order: Vec<i64> = plan.segments.iter().map(|s| s.lot_id).collect();
        assert_eq!(order, vec![1, 2, 3]);
        assert_eq!(plan.segments[2].mass_oz, dec!(5));
    }

    #[test]
    fn equal_expirations_tie_break_on_lot_id() {
        let requirements = vec![requirement(1, dec!(15))];
        let mut lots = HashMap::new();
        lots.insert(
            1,
            vec![
                lot(9, 1, dec!(10), date(2025, 1, 1)),
                lot(4, 1, dec!(10), date(2025, 1, 1)),
            ],
        );

        let plan = plan_allocation(1, 1, &requirements, &lots).unwrap();
        let order: Vec<i64> = plan.segments.iter().map(|s| s.lot_id).collect();
        assert_eq!(order, vec![4, 9]);
    }

    #[test]
    fn shortfall_fails_whole_plan() {
        let requirements = vec![requirement(1, dec!(10)), requirement(2, dec!(100))];
        let mut lots = HashMap::new();
        lots.insert(1, vec![lot(1, 1, dec!(50), date(2025, 1, 1))]);
        lots.insert(2, vec![lot(2, 2, dec!(60), date(2025, 1, 1))]);

        let err = plan_allocation(1, 1, &requirements, &lots).unwrap_err();
        match err {
            ServiceError::InsufficientInventory {
                ingredient_id,
                shortfall,
                ..
            } => {
                assert_eq!(ingredient_id, 2);
                assert_eq!(shortfall, dec!(40));
            }
            other => panic!("expected InsufficientInventory, got {:?}", other),
        }
    }

    #[test]
    fn missing_ingredient_inventory_reports_full_requirement() {
        let requirements = vec![requirement(5, dec!(12))];
        let lots = HashMap::new();

        let err = plan_allocation(1, 1, &requirements, &lots).unwrap_err();
        match err {
            ServiceError::InsufficientInventory { shortfall, .. } => {
                assert_eq!(shortfall, dec!(12))
            }
            other => panic!("expected InsufficientInventory, got {:?}", other),
        }
    }

    proptest! {
        /// Whenever total availability covers the requirement, the plan's
        /// segment masses sum to exactly the required mass and no segment
        /// overdraws its lot.
        #[test]
        fn exact_sum_when_satisfiable(
            required in 1u32..5_000,
            availabilities in prop::collection::vec(1u32..2_000, 1..8),
        ) {
            let total: u64 = availabilities.iter().map(|a| *a as u64).sum();
            prop_assume!(total >= required as u64);

            let requirements = vec![requirement(1, Decimal::from(required))];
            let lots_vec: Vec<LotSnapshot> = availabilities
                .iter()
                .enumerate()
                .map(|(i, a)| lot(
                    i as i64 + 1,
                    1,
                    Decimal::from(*a),
                    date(2025, 1, 1) + chrono::Days::new(i as u64),
                ))
                .collect();
            let mut lots = HashMap::new();
            lots.insert(1, lots_vec.clone());

            let plan = plan_allocation(1, 1, &requirements, &lots).unwrap();
            let allocated: Decimal = plan.segments.iter().map(|s| s.mass_oz).sum();
            prop_assert_eq!(allocated, Decimal::from(required));

            for segment in &plan.segments {
                let source = lots_vec.iter().find(|l| l.lot_id == segment.lot_id).unwrap();
                prop_assert!(segment.mass_oz <= source.available_mass_oz);
                prop_assert!(segment.mass_oz > Decimal::ZERO);
            }
        }

        /// Identical snapshots always produce identical plans.
        #[test]
        fn deterministic_for_fixed_snapshot(
            required in 1u32..1_000,
            availabilities in prop::collection::vec(1u32..500, 1..6),
        ) {
            let total: u64 = availabilities.iter().map(|a| *a as u64).sum();
            prop_assume!(total >= required as u64);

            let requirements = vec![requirement(1, Decimal::from(required))];
            let lots_vec: Vec<LotSnapshot> = availabilities
                .iter()
                .enumerate()
                .map(|(i, a)| lot(i as i64 + 1, 1, Decimal::from(*a), date(2025, 6, 1)))
                .collect();
            let mut lots = HashMap::new();
            lots.insert(1, lots_vec);

            let first = plan_allocation(1, 1, &requirements, &lots).unwrap();
            let second = plan_allocation(1, 1, &requirements, &lots).unwrap();
            let first_order: Vec<(i64, Decimal)> =
                first.segments.iter().map(|s| (s.lot_id, s.mass_oz)).collect();
            let second_order: Vec<(i64, Decimal)> =
                second.segments.iter().map(|s| (s.lot_id, s.mass_oz)).collect();
            prop_assert_eq!(first_order, second_order);
        }
    }
}
