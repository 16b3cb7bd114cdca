use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::InventoryConfig;
use crate::entities::{
    formulation, formulation::Entity as FormulationEntity, ingredient,
    ingredient::Entity as IngredientEntity, ingredient_lot,
    ingredient_lot::Entity as IngredientLotEntity, product, product::Entity as ProductEntity,
    recipe, recipe::Entity as RecipeEntity, recipe_bom_line,
    recipe_bom_line::Entity as RecipeBomLineEntity,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Input for receiving a new ingredient lot from a supplier.
#[derive(Debug, Clone, Deserialize)]
pub struct ReceiveLotInput {
    pub supplier_id: i64,
    pub formulation_id: i64,
    pub quantity_packs: Decimal,
    pub expiration_date: NaiveDate,
}

/// An unclaimed lot visible to a manufacturer whose recipes use its
/// ingredient.
#[derive(Debug, Clone, Serialize)]
pub struct AvailableLot {
    pub lot_id: i64,
    pub lot_number: String,
    pub ingredient_id: i64,
    pub ingredient_name: String,
    pub supplier_id: i64,
    pub quantity_packs: Decimal,
    pub total_mass_oz: Decimal,
    pub pack_size_oz: Decimal,
    pub unit_price: Decimal,
    pub expiration_date: NaiveDate,
    pub days_until_expiry: i64,
}

/// Result of a claim attempt. `claimed` may be less than `requested` when
/// another manufacturer won the race for some of the lots.
#[derive(Debug, Clone, Serialize)]
pub struct ClaimOutcome {
    pub requested: usize,
    pub claimed: usize,
    pub claimed_lot_ids: Vec<i64>,
}

/// Ingredient-lot intake and claiming.
#[derive(Clone)]
pub struct LotService {
    db: Arc<DatabaseConnection>,
    inventory: InventoryConfig,
    event_sender: Option<EventSender>,
}

impl LotService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        inventory: InventoryConfig,
        event_sender: Option<EventSender>,
    ) -> Self {
        Self {
            db,
            inventory,
            event_sender,
        }
    }

    /// Records a newly produced/received supplier lot against one of the
    /// supplier's own formulations. Total mass is packs x pack size; the
    /// expiration must be at least the configured minimum shelf life out.
    #[instrument(skip(self))]
    pub async fn create_ingredient_lot(
        &self,
        input: ReceiveLotInput,
        today: NaiveDate,
    ) -> Result<ingredient_lot::Model, ServiceError> {
        if input.quantity_packs <= Decimal::ZERO {
            return Err(ServiceError::Validation(format!(
                "Quantity of packages must be positive, got {}",
                input.quantity_packs
            )));
        }

        let min_expiry = today
            .checked_add_days(Days::new(self.inventory.min_shelf_life_days as u64))
            .ok_or_else(|| ServiceError::Validation("Expiration date overflow".to_string()))?;
        if input.expiration_date < min_expiry {
            return Err(ServiceError::Validation(format!(
                "Expiration {} is earlier than the minimum shelf life of {} days (needs {} or later)",
                input.expiration_date, self.inventory.min_shelf_life_days, min_expiry
            )));
        }

        let formulation = FormulationEntity::find_by_id(input.formulation_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Formulation {} not found", input.formulation_id))
            })?;
        if formulation.supplier_id != input.supplier_id {
            return Err(ServiceError::NotFound(format!(
                "Formulation {} is not owned by supplier {}",
                input.formulation_id, input.supplier_id
            )));
        }

        let total_mass = input.quantity_packs * formulation.pack_size_oz;
        let lot = ingredient_lot::ActiveModel {
            lot_number: Set(format!("IL-{}", Uuid::new_v4().as_simple())),
            formulation_id: Set(input.formulation_id),
            quantity_packs: Set(input.quantity_packs),
            total_mass_oz: Set(total_mass),
            expiration_date: Set(input.expiration_date),
            received_date: Set(today),
            manufacturer_id: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(
            lot_id = lot.lot_id,
            formulation_id = lot.formulation_id,
            total_mass = %lot.total_mass_oz,
            "Ingredient lot received"
        );

        if let Some(sender) = &self.event_sender {
            sender
                .send(Event::IngredientLotReceived {
                    lot_id: lot.lot_id,
                    formulation_id: lot.formulation_id,
                    total_mass_oz: lot.total_mass_oz,
                    expiration_date: lot.expiration_date,
                })
                .await
                .map_err(ServiceError::Event)?;
        }

        Ok(lot)
    }

    /// Lists unclaimed, unexpired lots whose ingredient appears in any of
    /// the manufacturer's recipe BOMs.
    #[instrument(skip(self))]
    pub async fn available_unclaimed_lots(
        &self,
        manufacturer_id: i64,
        as_of: NaiveDate,
    ) -> Result<Vec<AvailableLot>, ServiceError> {
        let needed = self.recipe_ingredient_ids(manufacturer_id).await?;
        if needed.is_empty() {
            return Ok(Vec::new());
        }

        let lots = IngredientLotEntity::find()
            .find_also_related(FormulationEntity)
            .filter(formulation::Column::IngredientId.is_in(needed.iter().copied()))
            .filter(ingredient_lot::Column::ManufacturerId.is_null())
            .filter(ingredient_lot::Column::ExpirationDate.gte(as_of))
            .all(&*self.db)
            .await?;

        let names: HashMap<i64, String> = IngredientEntity::find()
            .filter(ingredient::Column::IngredientId.is_in(needed.iter().copied()))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|i| (i.ingredient_id, i.name))
            .collect();

        let mut available: Vec<AvailableLot> = lots
            .into_iter()
            .filter_map(|(lot, formulation)| {
                let formulation = formulation?;
                Some(AvailableLot {
                    lot_id: lot.lot_id,
                    lot_number: lot.lot_number,
                    ingredient_id: formulation.ingredient_id,
                    ingredient_name: names
                        .get(&formulation.ingredient_id)
                        .cloned()
                        .unwrap_or_default(),
                    supplier_id: formulation.supplier_id,
                    quantity_packs: lot.quantity_packs,
                    total_mass_oz: lot.total_mass_oz,
                    pack_size_oz: formulation.pack_size_oz,
                    unit_price: formulation.unit_price,
                    expiration_date: lot.expiration_date,
                    days_until_expiry: (lot.expiration_date - as_of).num_days(),
                })
            })
            .collect();

        available.sort_by(|a, b| {
            (a.ingredient_name.as_str(), a.expiration_date, a.lot_id).cmp(&(
                b.ingredient_name.as_str(),
                b.expiration_date,
                b.lot_id,
            ))
        });
        Ok(available)
    }

    /// Claims unclaimed lots for a manufacturer. Each claim is a conditional
    /// update that only succeeds while `manufacturer_id` is still NULL, so
    /// two manufacturers racing for the same lot cannot both win it. Reports
    /// how many claims actually went through.
    #[instrument(skip(self))]
    pub async fn claim_lots(
        &self,
        manufacturer_id: i64,
        lot_ids: &[i64],
    ) -> Result<ClaimOutcome, ServiceError> {
        if lot_ids.is_empty() {
            return Err(ServiceError::Validation(
                "No lots selected to claim".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        let mut claimed_lot_ids = Vec::new();

        for &lot_id in lot_ids {
            let result = IngredientLotEntity::update_many()
                .col_expr(
                    ingredient_lot::Column::ManufacturerId,
                    Expr::value(manufacturer_id),
                )
                .filter(ingredient_lot::Column::LotId.eq(lot_id))
                .filter(ingredient_lot::Column::ManufacturerId.is_null())
                .exec(&txn)
                .await?;

            if result.rows_affected > 0 {
                claimed_lot_ids.push(lot_id);
            }
        }

        txn.commit().await?;

        let outcome = ClaimOutcome {
            requested: lot_ids.len(),
            claimed: claimed_lot_ids.len(),
            claimed_lot_ids,
        };

        info!(
            manufacturer_id,
            requested = outcome.requested,
            claimed = outcome.claimed,
            "Lot claim completed"
        );

        if let Some(sender) = &self.event_sender {
            sender
                .send(Event::IngredientLotsClaimed {
                    manufacturer_id,
                    requested: outcome.requested,
                    claimed: outcome.claimed,
                })
                .await
                .map_err(ServiceError::Event)?;
        }

        Ok(outcome)
    }

    /// Every ingredient referenced by any recipe of any of the
    /// manufacturer's products.
    async fn recipe_ingredient_ids(
        &self,
        manufacturer_id: i64,
    ) -> Result<BTreeSet<i64>, ServiceError> {
        let product_ids: Vec<i64> = ProductEntity::find()
            .filter(product::Column::ManufacturerId.eq(manufacturer_id))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|p| p.product_id)
            .collect();
        if product_ids.is_empty() {
            return Ok(BTreeSet::new());
        }

        let recipe_ids: Vec<i64> = RecipeEntity::find()
            .filter(recipe::Column::ProductId.is_in(product_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|r| r.recipe_id)
            .collect();
        if recipe_ids.is_empty() {
            return Ok(BTreeSet::new());
        }

        let lines = RecipeBomLineEntity::find()
            .filter(recipe_bom_line::Column::RecipeId.is_in(recipe_ids))
            .all(&*self.db)
            .await?;

        Ok(lines.into_iter().map(|l| l.ingredient_id).collect())
    }
}
