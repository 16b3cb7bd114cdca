use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use serde::Serialize;
use tracing::{info, instrument};

use crate::entities::{
    ingredient, ingredient::Entity as IngredientEntity, product::Entity as ProductEntity, recipe,
    recipe::Entity as RecipeEntity, recipe_bom_line,
    recipe_bom_line::Entity as RecipeBomLineEntity,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::conflicts::{ConflictChecker, ConflictPair};

/// In-memory draft of a recipe version's BOM. Edits never touch storage;
/// the header and all lines are written together at commit.
#[derive(Debug, Clone, Default)]
pub struct RecipeDraft {
    lines: BTreeMap<i64, Decimal>,
}

impl RecipeDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the ingredient or replaces its quantity-per-unit.
    pub fn upsert_line(&mut self, ingredient_id: i64, quantity_per_unit_oz: Decimal) {
        self.lines.insert(ingredient_id, quantity_per_unit_oz);
    }

    /// Returns whether the ingredient was present.
    pub fn remove_line(&mut self, ingredient_id: i64) -> bool {
        self.lines.remove(&ingredient_id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &BTreeMap<i64, Decimal> {
        &self.lines
    }
}

/// A committed recipe with the advisory conflict-check result. A conflicted
/// recipe still commits; production against it is blocked later, at batch
/// time, by the hard gate on allocated lots.
#[derive(Debug, Clone, Serialize)]
pub struct CommittedRecipe {
    pub recipe: recipe::Model,
    pub conflicts: Vec<ConflictPair>,
}

/// One BOM line joined with its ingredient.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeLineView {
    pub ingredient_id: i64,
    pub ingredient_name: String,
    pub is_compound: bool,
    pub quantity_per_unit_oz: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeDetail {
    pub recipe: recipe::Model,
    pub lines: Vec<RecipeLineView>,
}

/// Versioned store of manufacturer recipes.
#[derive(Clone)]
pub struct RecipeService {
    db: Arc<DatabaseConnection>,
    conflicts: Arc<ConflictChecker>,
    event_sender: Option<EventSender>,
}

impl RecipeService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        conflicts: Arc<ConflictChecker>,
        event_sender: Option<EventSender>,
    ) -> Self {
        Self {
            db,
            conflicts,
            event_sender,
        }
    }

    /// Seeds a draft by deep-copying an existing recipe's lines. The draft
    /// is independent of the source recipe from then on.
    #[instrument(skip(self))]
    pub async fn draft_from(&self, recipe_id: i64) -> Result<RecipeDraft, ServiceError> {
        RecipeEntity::find_by_id(recipe_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Recipe {} not found", recipe_id)))?;

        let lines = RecipeBomLineEntity::find()
            .filter(recipe_bom_line::Column::RecipeId.eq(recipe_id))
            .all(&*self.db)
            .await?;

        let mut draft = RecipeDraft::new();
        for line in lines {
            draft.upsert_line(line.ingredient_id, line.quantity_per_unit_oz);
        }
        Ok(draft)
    }

    /// Commits a draft as a new recipe version for the product. The header
    /// and every BOM line are inserted in one transaction; committing an
    /// empty draft fails with `EmptyRecipe` before any storage is touched.
    #[instrument(skip(self, draft))]
    pub async fn commit_version(
        &self,
        product_id: i64,
        draft: RecipeDraft,
        today: NaiveDate,
    ) -> Result<CommittedRecipe, ServiceError> {
        if draft.is_empty() {
            return Err(ServiceError::EmptyRecipe);
        }
        if let Some(bad) = draft.lines.iter().find(|(_, qty)| **qty <= Decimal::ZERO) {
            return Err(ServiceError::Validation(format!(
                "Quantity for ingredient {} must be positive, got {}",
                bad.0, bad.1
            )));
        }

        let txn = self.db.begin().await?;

        ProductEntity::find_by_id(product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let ingredient_ids: Vec<i64> = draft.lines.keys().copied().collect();
        let found = IngredientEntity::find()
            .filter(ingredient::Column::IngredientId.is_in(ingredient_ids.clone()))
            .all(&txn)
            .await?;
        if found.len() != ingredient_ids.len() {
            let found_ids: BTreeSet<i64> = found.iter().map(|i| i.ingredient_id).collect();
            let missing: Vec<i64> = ingredient_ids
                .iter()
                .copied()
                .filter(|id| !found_ids.contains(id))
                .collect();
            return Err(ServiceError::NotFound(format!(
                "Ingredients not found: {:?}",
                missing
            )));
        }

        let committed = recipe::ActiveModel {
            product_id: Set(product_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for (ingredient_id, quantity) in &draft.lines {
            recipe_bom_line::ActiveModel {
                recipe_id: Set(committed.recipe_id),
                ingredient_id: Set(*ingredient_id),
                quantity_per_unit_oz: Set(*quantity),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        let nominal_set: BTreeSet<i64> = draft.lines.keys().copied().collect();
        let conflicts = self
            .conflicts
            .find_conflicts_among_in(&txn, &nominal_set, today)
            .await?;

        txn.commit().await?;

        info!(
            recipe_id = committed.recipe_id,
            product_id,
            lines = draft.lines.len(),
            advisory_conflicts = conflicts.len(),
            "Recipe version committed"
        );

        if let Some(sender) = &self.event_sender {
            sender
                .send(Event::RecipeCommitted {
                    recipe_id: committed.recipe_id,
                    product_id,
                    line_count: draft.lines.len(),
                })
                .await
                .map_err(ServiceError::Event)?;
        }

        Ok(CommittedRecipe {
            recipe: committed,
            conflicts,
        })
    }

    /// All recipe versions for a product, newest first.
    #[instrument(skip(self))]
    pub async fn list_recipes(&self, product_id: i64) -> Result<Vec<recipe::Model>, ServiceError> {
        Ok(RecipeEntity::find()
            .filter(recipe::Column::ProductId.eq(product_id))
            .order_by_desc(recipe::Column::CreatedAt)
            .order_by_desc(recipe::Column::RecipeId)
            .all(&*self.db)
            .await?)
    }

    /// Header plus BOM lines joined with ingredient names.
    #[instrument(skip(self))]
    pub async fn recipe_detail(&self, recipe_id: i64) -> Result<RecipeDetail, ServiceError> {
        let header = RecipeEntity::find_by_id(recipe_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Recipe {} not found", recipe_id)))?;

        let lines = RecipeBomLineEntity::find()
            .filter(recipe_bom_line::Column::RecipeId.eq(recipe_id))
            .all(&*self.db)
            .await?;

        let ids: Vec<i64> = lines.iter().map(|l| l.ingredient_id).collect();
        let ingredients: HashMap<i64, ingredient::Model> = IngredientEntity::find()
            .filter(ingredient::Column::IngredientId.is_in(ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|i| (i.ingredient_id, i))
            .collect();

        let lines = lines
            .into_iter()
            .map(|line| {
                let ing = ingredients.get(&line.ingredient_id);
                RecipeLineView {
                    ingredient_id: line.ingredient_id,
                    ingredient_name: ing.map(|i| i.name.clone()).unwrap_or_default(),
                    is_compound: ing.map(|i| i.is_compound).unwrap_or(false),
                    quantity_per_unit_oz: line.quantity_per_unit_oz,
                }
            })
            .collect();

        Ok(RecipeDetail {
            recipe: header,
            lines,
        })
    }
}
