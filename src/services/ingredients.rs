use std::sync::Arc;

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    SqlErr,
};
use serde::Serialize;
use tracing::{info, instrument};

use crate::entities::{
    do_not_combine, do_not_combine::Entity as DoNotCombineEntity, ingredient,
    ingredient::Entity as IngredientEntity,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::conflicts::canonical_pair;

/// A do-not-combine rule joined with ingredient names.
#[derive(Debug, Clone, Serialize)]
pub struct DoNotCombineView {
    pub ingredient1_id: i64,
    pub ingredient1_name: String,
    pub ingredient2_id: i64,
    pub ingredient2_name: String,
}

/// Ingredient catalog and do-not-combine rule management.
#[derive(Clone)]
pub struct IngredientService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<EventSender>,
}

impl IngredientService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Adds an ingredient to the shared catalog. Names are unique; a second
    /// insert of the same name surfaces as `Duplicate`.
    #[instrument(skip(self))]
    pub async fn create_ingredient(
        &self,
        name: &str,
        is_compound: bool,
    ) -> Result<ingredient::Model, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::Validation(
                "Ingredient name cannot be empty".to_string(),
            ));
        }

        let created = ingredient::ActiveModel {
            name: Set(name.to_string()),
            is_compound: Set(is_compound),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                ServiceError::Duplicate(format!("Ingredient '{}' already exists", name))
            }
            _ => ServiceError::Storage(e),
        })?;

        info!(
            ingredient_id = created.ingredient_id,
            is_compound, "Ingredient created"
        );

        if let Some(sender) = &self.event_sender {
            sender
                .send(Event::IngredientCreated {
                    ingredient_id: created.ingredient_id,
                    is_compound,
                })
                .await
                .map_err(ServiceError::Event)?;
        }

        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_ingredient(&self, ingredient_id: i64) -> Result<ingredient::Model, ServiceError> {
        IngredientEntity::find_by_id(ingredient_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Ingredient {} not found", ingredient_id)))
    }

    #[instrument(skip(self))]
    pub async fn list_ingredients(&self) -> Result<Vec<ingredient::Model>, ServiceError> {
        Ok(IngredientEntity::find()
            .order_by_asc(ingredient::Column::Name)
            .all(&*self.db)
            .await?)
    }

    /// Adds a do-not-combine rule between two atomic ingredients. The pair
    /// is canonicalized smaller-id-first, so reversed inserts converge on
    /// the same row. Returns false if the rule already existed.
    #[instrument(skip(self))]
    pub async fn add_do_not_combine(&self, a: i64, b: i64) -> Result<bool, ServiceError> {
        if a == b {
            return Err(ServiceError::Validation(
                "Cannot create a do-not-combine rule for a single ingredient".to_string(),
            ));
        }
        let (first, second) = canonical_pair(a, b);

        for id in [first, second] {
            let ing = self.get_ingredient(id).await?;
            if ing.is_compound {
                return Err(ServiceError::Validation(format!(
                    "Do-not-combine rules apply to atomic ingredients only; '{}' is compound",
                    ing.name
                )));
            }
        }

        let existing = DoNotCombineEntity::find_by_id((first, second))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Ok(false);
        }

        do_not_combine::ActiveModel {
            ingredient1_id: Set(first),
            ingredient2_id: Set(second),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await
        .map_err(|e| match e.sql_err() {
            // Lost a race with a concurrent identical insert; the rule
            // exists either way.
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                ServiceError::Duplicate(format!("Rule ({}, {}) already exists", first, second))
            }
            _ => ServiceError::Storage(e),
        })?;

        info!(first, second, "Do-not-combine rule added");

        if let Some(sender) = &self.event_sender {
            sender
                .send(Event::DoNotCombineRuleAdded {
                    ingredient1_id: first,
                    ingredient2_id: second,
                })
                .await
                .map_err(ServiceError::Event)?;
        }

        Ok(true)
    }

    /// Removes a rule; accepts the pair in either order.
    #[instrument(skip(self))]
    pub async fn remove_do_not_combine(&self, a: i64, b: i64) -> Result<(), ServiceError> {
        let (first, second) = canonical_pair(a, b);

        let rule = DoNotCombineEntity::find_by_id((first, second))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Do-not-combine rule ({}, {}) does not exist",
                    first, second
                ))
            })?;

        DoNotCombineEntity::delete_by_id((rule.ingredient1_id, rule.ingredient2_id))
            .exec(&*self.db)
            .await?;

        info!(first, second, "Do-not-combine rule removed");
        Ok(())
    }

    /// All rules with ingredient names, ordered by the canonical pair.
    #[instrument(skip(self))]
    pub async fn list_do_not_combine(&self) -> Result<Vec<DoNotCombineView>, ServiceError> {
        let rules = DoNotCombineEntity::find()
            .order_by_asc(do_not_combine::Column::Ingredient1Id)
            .order_by_asc(do_not_combine::Column::Ingredient2Id)
            .all(&*self.db)
            .await?;

        let ids: Vec<i64> = rules
            .iter()
            .flat_map(|r| [r.ingredient1_id, r.ingredient2_id])
            .collect();
        let names: std::collections::HashMap<i64, String> = IngredientEntity::find()
            .filter(ingredient::Column::IngredientId.is_in(ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|i| (i.ingredient_id, i.name))
            .collect();

        Ok(rules
            .into_iter()
            .map(|r| DoNotCombineView {
                ingredient1_id: r.ingredient1_id,
                ingredient1_name: names.get(&r.ingredient1_id).cloned().unwrap_or_default(),
                ingredient2_id: r.ingredient2_id,
                ingredient2_name: names.get(&r.ingredient2_id).cloned().unwrap_or_default(),
            })
            .collect())
    }
}
