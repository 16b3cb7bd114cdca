use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::entities::{
    do_not_combine, do_not_combine::Entity as DoNotCombineEntity, formulation,
    formulation::Entity as FormulationEntity, formulation_material,
    formulation_material::Entity as FormulationMaterialEntity, ingredient,
    ingredient::Entity as IngredientEntity, ingredient_lot,
    ingredient_lot::Entity as IngredientLotEntity, recipe_bom_line,
    recipe_bom_line::Entity as RecipeBomLineEntity,
};
use crate::errors::ServiceError;

/// A do-not-combine rule tripped by a concrete ingredient set. Always
/// canonical: `ingredient1_id < ingredient2_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConflictPair {
    pub ingredient1_id: i64,
    pub ingredient1_name: String,
    pub ingredient2_id: i64,
    pub ingredient2_name: String,
}

/// Orders an unordered ingredient pair with the smaller id first.
pub fn canonical_pair(a: i64, b: i64) -> (i64, i64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Cross-references ingredient sets against the do-not-combine list.
///
/// Compound ingredients are expanded one level through their active
/// formulations' material lists; nested compounds are not recursed into.
#[derive(Clone)]
pub struct ConflictChecker {
    db: Arc<DatabaseConnection>,
}

impl ConflictChecker {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Advisory check of a committed recipe version's nominal ingredient set.
    #[instrument(skip(self))]
    pub async fn find_conflicts_for_recipe(
        &self,
        recipe_id: i64,
        as_of: NaiveDate,
    ) -> Result<Vec<ConflictPair>, ServiceError> {
        self.find_conflicts_for_recipe_in(&*self.db, recipe_id, as_of)
            .await
    }

    pub async fn find_conflicts_for_recipe_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        recipe_id: i64,
        as_of: NaiveDate,
    ) -> Result<Vec<ConflictPair>, ServiceError> {
        let lines = RecipeBomLineEntity::find()
            .filter(recipe_bom_line::Column::RecipeId.eq(recipe_id))
            .all(conn)
            .await?;

        let ingredient_ids: BTreeSet<i64> = lines.iter().map(|l| l.ingredient_id).collect();
        self.find_conflicts_among_in(conn, &ingredient_ids, as_of)
            .await
    }

    /// Advisory check of one formulation's material list (plus its owning
    /// ingredient, when atomic).
    #[instrument(skip(self))]
    pub async fn find_conflicts_for_formulation(
        &self,
        formulation_id: i64,
        as_of: NaiveDate,
    ) -> Result<Vec<ConflictPair>, ServiceError> {
        self.find_conflicts_for_formulation_in(&*self.db, formulation_id, as_of)
            .await
    }

    pub async fn find_conflicts_for_formulation_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        formulation_id: i64,
        as_of: NaiveDate,
    ) -> Result<Vec<ConflictPair>, ServiceError> {
        let formulation = FormulationEntity::find_by_id(formulation_id)
            .one(conn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Formulation {} not found", formulation_id))
            })?;

        let materials = FormulationMaterialEntity::find()
            .filter(formulation_material::Column::FormulationId.eq(formulation_id))
            .all(conn)
            .await?;

        let mut ingredient_ids: BTreeSet<i64> = materials.iter().map(|m| m.material_id).collect();
        ingredient_ids.insert(formulation.ingredient_id);

        self.find_conflicts_among_in(conn, &ingredient_ids, as_of)
            .await
    }

    /// Hard-gate check of the lots an allocation actually selected. Resolves
    /// each lot to its formulation's ingredient plus that formulation's own
    /// material list, so supplier-specific materials the recipe author never
    /// saw still count.
    #[instrument(skip(self))]
    pub async fn find_conflicts_for_lots(
        &self,
        lot_ids: &[i64],
    ) -> Result<Vec<ConflictPair>, ServiceError> {
        self.find_conflicts_for_lots_in(&*self.db, lot_ids).await
    }

    pub async fn find_conflicts_for_lots_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        lot_ids: &[i64],
    ) -> Result<Vec<ConflictPair>, ServiceError> {
        if lot_ids.is_empty() {
            return Ok(Vec::new());
        }

        let lots = IngredientLotEntity::find()
            .filter(ingredient_lot::Column::LotId.is_in(lot_ids.iter().copied()))
            .all(conn)
            .await?;

        let formulation_ids: BTreeSet<i64> = lots.iter().map(|l| l.formulation_id).collect();

        let formulations = FormulationEntity::find()
            .filter(formulation::Column::FormulationId.is_in(formulation_ids.iter().copied()))
            .all(conn)
            .await?;

        let materials = FormulationMaterialEntity::find()
            .filter(
                formulation_material::Column::FormulationId
                    .is_in(formulation_ids.iter().copied()),
            )
            .all(conn)
            .await?;

        let mut ingredient_ids: BTreeSet<i64> =
            formulations.iter().map(|f| f.ingredient_id).collect();
        ingredient_ids.extend(materials.iter().map(|m| m.material_id));

        // Lot formulations are already concrete; their material lists stand
        // in for the one-level expansion of the nominal set.
        self.check_pairs(conn, &ingredient_ids).await
    }

    /// Expands the given ingredient set one level and cross-references every
    /// unordered pair against the do-not-combine list. Symmetric in its
    /// input and returns canonical pairs sorted by id.
    #[instrument(skip(self))]
    pub async fn find_conflicts_among(
        &self,
        ingredient_ids: &BTreeSet<i64>,
        as_of: NaiveDate,
    ) -> Result<Vec<ConflictPair>, ServiceError> {
        self.find_conflicts_among_in(&*self.db, ingredient_ids, as_of)
            .await
    }

    pub async fn find_conflicts_among_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        ingredient_ids: &BTreeSet<i64>,
        as_of: NaiveDate,
    ) -> Result<Vec<ConflictPair>, ServiceError> {
        let expanded = self.expand_to_atomic(conn, ingredient_ids, as_of).await?;
        self.check_pairs(conn, &expanded).await
    }

    /// One-level expansion: compound ingredients are replaced by the union of
    /// the material lists of all their formulations active on `as_of`.
    async fn expand_to_atomic<C: ConnectionTrait>(
        &self,
        conn: &C,
        ingredient_ids: &BTreeSet<i64>,
        as_of: NaiveDate,
    ) -> Result<BTreeSet<i64>, ServiceError> {
        if ingredient_ids.is_empty() {
            return Ok(BTreeSet::new());
        }

        let ingredients = IngredientEntity::find()
            .filter(ingredient::Column::IngredientId.is_in(ingredient_ids.iter().copied()))
            .all(conn)
            .await?;

        let mut expanded: BTreeSet<i64> = BTreeSet::new();
        let mut compound_ids: Vec<i64> = Vec::new();
        for ing in &ingredients {
            if ing.is_compound {
                compound_ids.push(ing.ingredient_id);
            } else {
                expanded.insert(ing.ingredient_id);
            }
        }

        if compound_ids.is_empty() {
            return Ok(expanded);
        }

        let active_formulations = FormulationEntity::find()
            .filter(formulation::Column::IngredientId.is_in(compound_ids.clone()))
            .all(conn)
            .await?
            .into_iter()
            .filter(|f| f.is_active_on(as_of))
            .collect::<Vec<_>>();

        if active_formulations.is_empty() {
            warn!(
                ?compound_ids,
                "Compound ingredients have no active formulation; conflict \
                 expansion is incomplete for them"
            );
            return Ok(expanded);
        }

        let formulation_ids: Vec<i64> = active_formulations
            .iter()
            .map(|f| f.formulation_id)
            .collect();

        let materials = FormulationMaterialEntity::find()
            .filter(formulation_material::Column::FormulationId.is_in(formulation_ids))
            .all(conn)
            .await?;

        expanded.extend(materials.iter().map(|m| m.material_id));
        Ok(expanded)
    }

    /// Loads every do-not-combine rule whose two members are both in the set.
    async fn check_pairs<C: ConnectionTrait>(
        &self,
        conn: &C,
        ingredient_ids: &BTreeSet<i64>,
    ) -> Result<Vec<ConflictPair>, ServiceError> {
        if ingredient_ids.len() < 2 {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = ingredient_ids.iter().copied().collect();
        let rules = DoNotCombineEntity::find()
            .filter(do_not_combine::Column::Ingredient1Id.is_in(ids.clone()))
            .filter(do_not_combine::Column::Ingredient2Id.is_in(ids))
            .all(conn)
            .await?;

        if rules.is_empty() {
            return Ok(Vec::new());
        }

        let names = self.ingredient_names(conn, &rules).await?;
        let mut conflicts: Vec<ConflictPair> = rules
            .into_iter()
            .map(|r| ConflictPair {
                ingredient1_id: r.ingredient1_id,
                ingredient1_name: names
                    .get(&r.ingredient1_id)
                    .cloned()
                    .unwrap_or_default(),
                ingredient2_id: r.ingredient2_id,
                ingredient2_name: names
                    .get(&r.ingredient2_id)
                    .cloned()
                    .unwrap_or_default(),
            })
            .collect();

        conflicts.sort_by_key(|c| (c.ingredient1_id, c.ingredient2_id));
        Ok(conflicts)
    }

    async fn ingredient_names<C: ConnectionTrait>(
        &self,
        conn: &C,
        rules: &[do_not_combine::Model],
    ) -> Result<HashMap<i64, String>, ServiceError> {
        let ids: BTreeSet<i64> = rules
            .iter()
            .flat_map(|r| [r.ingredient1_id, r.ingredient2_id])
            .collect();

        let ingredients = IngredientEntity::find()
            .filter(ingredient::Column::IngredientId.is_in(ids))
            .all(conn)
            .await?;

        Ok(ingredients
            .into_iter()
            .map(|i| (i.ingredient_id, i.name))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_pair_puts_smaller_id_first() {
        assert_eq!(canonical_pair(3, 9), (3, 9));
        assert_eq!(canonical_pair(9, 3), (3, 9));
        assert_eq!(canonical_pair(5, 5), (5, 5));
    }
}
