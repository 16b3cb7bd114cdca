use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::entities::{
    formulation, formulation::Entity as FormulationEntity, formulation_material,
    formulation_material::Entity as FormulationMaterialEntity, ingredient,
    ingredient::Entity as IngredientEntity, supplier::Entity as SupplierEntity,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::conflicts::{ConflictChecker, ConflictPair};

/// In-memory draft of a formulation version. Freely editable; nothing is
/// persisted until `FormulationService::commit_version`, so abandoning a
/// draft has no storage effect.
#[derive(Debug, Clone, Default)]
pub struct FormulationDraft {
    pack_size_oz: Decimal,
    unit_price: Decimal,
    materials: BTreeMap<i64, Decimal>,
}

impl FormulationDraft {
    pub fn new(pack_size_oz: Decimal, unit_price: Decimal) -> Self {
        Self {
            pack_size_oz,
            unit_price,
            materials: BTreeMap::new(),
        }
    }

    pub fn set_pricing(&mut self, pack_size_oz: Decimal, unit_price: Decimal) {
        self.pack_size_oz = pack_size_oz;
        self.unit_price = unit_price;
    }

    /// Adds the material or replaces its quantity.
    pub fn upsert_material(&mut self, material_id: i64, quantity_oz: Decimal) {
        self.materials.insert(material_id, quantity_oz);
    }

    /// Returns whether the material was present.
    pub fn remove_material(&mut self, material_id: i64) -> bool {
        self.materials.remove(&material_id).is_some()
    }

    pub fn pack_size_oz(&self) -> Decimal {
        self.pack_size_oz
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    pub fn materials(&self) -> &BTreeMap<i64, Decimal> {
        &self.materials
    }
}

/// A committed version together with the advisory conflict-check result.
/// Conflicts do not block the commit; they are surfaced for the supplier.
#[derive(Debug, Clone, Serialize)]
pub struct CommittedFormulation {
    pub formulation: formulation::Model,
    pub conflicts: Vec<ConflictPair>,
}

/// Formulation header plus material lines.
#[derive(Debug, Clone, Serialize)]
pub struct FormulationDetail {
    pub formulation: formulation::Model,
    pub materials: Vec<formulation_material::Model>,
}

/// Versioned store of supplier formulations.
#[derive(Clone)]
pub struct FormulationService {
    db: Arc<DatabaseConnection>,
    conflicts: Arc<ConflictChecker>,
    event_sender: Option<EventSender>,
}

impl FormulationService {
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

    /// Seeds a draft from an existing version: pricing and a deep copy of
    /// the material list. The draft holds no reference back to storage.
    #[instrument(skip(self))]
    pub async fn draft_from(&self, formulation_id: i64) -> Result<FormulationDraft, ServiceError> {
        let detail = self.formulation_detail(formulation_id).await?;
        let mut draft =
            FormulationDraft::new(detail.formulation.pack_size_oz, detail.formulation.unit_price);
        for material in detail.materials {
            draft.upsert_material(material.material_id, material.quantity_oz);
        }
        Ok(draft)
    }

    /// Commits a draft as the next version for (supplier, ingredient).
    ///
    /// Runs in one transaction: assigns version = 1 + MAX(existing), closes
    /// the previously open version's effective range as of `today`, and
    /// inserts the new header and material lines. The do-not-combine check
    /// on the material set is advisory; its findings are returned but never
    /// block the commit.
    #[instrument(skip(self, draft))]
    pub async fn commit_version(
        &self,
        supplier_id: i64,
        ingredient_id: i64,
        draft: FormulationDraft,
        today: NaiveDate,
    ) -> Result<CommittedFormulation, ServiceError> {
        if draft.pack_size_oz <= Decimal::ZERO {
            return Err(ServiceError::Validation(format!(
                "Pack size must be positive, got {}",
                draft.pack_size_oz
            )));
        }
        if draft.unit_price <= Decimal::ZERO {
            return Err(ServiceError::Validation(format!(
                "Unit price must be positive, got {}",
                draft.unit_price
            )));
        }

        let txn = self.db.begin().await?;

        SupplierEntity::find_by_id(supplier_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Supplier {} not found", supplier_id)))?;
        let ing = IngredientEntity::find_by_id(ingredient_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Ingredient {} not found", ingredient_id))
            })?;

        if ing.is_compound && draft.materials.is_empty() {
            return Err(ServiceError::Validation(format!(
                "Formulation for compound ingredient '{}' must list at least one material",
                ing.name
            )));
        }
        if !ing.is_compound && !draft.materials.is_empty() {
            return Err(ServiceError::Validation(format!(
                "Formulation for atomic ingredient '{}' cannot list materials",
                ing.name
            )));
        }

        if !draft.materials.is_empty() {
            let material_ids: Vec<i64> = draft.materials.keys().copied().collect();
            let found = IngredientEntity::find()
                .filter(ingredient::Column::IngredientId.is_in(material_ids.clone()))
                .all(&txn)
                .await?;
            if found.len() != material_ids.len() {
                return Err(ServiceError::NotFound(
                    "One or more material ingredients do not exist".to_string(),
                ));
            }
            if let Some(bad) = draft
                .materials
                .iter()
                .find(|(_, qty)| **qty <= Decimal::ZERO)
            {
                return Err(ServiceError::Validation(format!(
                    "Material {} quantity must be positive, got {}",
                    bad.0, bad.1
                )));
            }
        }

        let latest = FormulationEntity::find()
            .filter(formulation::Column::SupplierId.eq(supplier_id))
            .filter(formulation::Column::IngredientId.eq(ingredient_id))
            .order_by_desc(formulation::Column::VersionNumber)
            .one(&txn)
            .await?;
        let next_version = latest.map(|f| f.version_number + 1).unwrap_or(1);

        // Close the open version; its effective_end is exclusive, so the new
        // version is the single active one from `today` on.
        FormulationEntity::update_many()
            .col_expr(formulation::Column::EffectiveEnd, Expr::value(today))
            .filter(formulation::Column::SupplierId.eq(supplier_id))
            .filter(formulation::Column::IngredientId.eq(ingredient_id))
            .filter(formulation::Column::EffectiveEnd.is_null())
            .exec(&txn)
            .await?;

        let committed = formulation::ActiveModel {
            ingredient_id: Set(ingredient_id),
            supplier_id: Set(supplier_id),
            pack_size_oz: Set(draft.pack_size_oz),
            unit_price: Set(draft.unit_price),
            version_number: Set(next_version),
            effective_start: Set(today),
            effective_end: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for (material_id, quantity_oz) in &draft.materials {
            formulation_material::ActiveModel {
                formulation_id: Set(committed.formulation_id),
                material_id: Set(*material_id),
                quantity_oz: Set(*quantity_oz),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        let conflicts = self
            .conflicts
            .find_conflicts_for_formulation_in(&txn, committed.formulation_id, today)
            .await?;

        txn.commit().await?;

        info!(
            formulation_id = committed.formulation_id,
            ingredient_id,
            supplier_id,
            version = next_version,
            advisory_conflicts = conflicts.len(),
            "Formulation version committed"
        );

        if let Some(sender) = &self.event_sender {
            sender
                .send(Event::FormulationCommitted {
                    formulation_id: committed.formulation_id,
                    ingredient_id,
                    supplier_id,
                    version_number: next_version,
                })
                .await
                .map_err(ServiceError::Event)?;
        }

        Ok(CommittedFormulation {
            formulation: committed,
            conflicts,
        })
    }

    /// The version of (supplier, ingredient) active on `as_of`, if any.
    #[instrument(skip(self))]
    pub async fn active_formulation(
        &self,
        supplier_id: i64,
        ingredient_id: i64,
        as_of: NaiveDate,
    ) -> Result<Option<formulation::Model>, ServiceError> {
        let versions = FormulationEntity::find()
            .filter(formulation::Column::SupplierId.eq(supplier_id))
            .filter(formulation::Column::IngredientId.eq(ingredient_id))
            .all(&*self.db)
            .await?;

        Ok(versions.into_iter().find(|f| f.is_active_on(as_of)))
    }

    /// All versions for (supplier, ingredient), newest first.
    #[instrument(skip(self))]
    pub async fn list_versions(
        &self,
        supplier_id: i64,
        ingredient_id: i64,
    ) -> Result<Vec<formulation::Model>, ServiceError> {
        Ok(FormulationEntity::find()
            .filter(formulation::Column::SupplierId.eq(supplier_id))
            .filter(formulation::Column::IngredientId.eq(ingredient_id))
            .order_by_desc(formulation::Column::VersionNumber)
            .all(&*self.db)
            .await?)
    }

    /// Header plus material lines.
    #[instrument(skip(self))]
    pub async fn formulation_detail(
        &self,
        formulation_id: i64,
    ) -> Result<FormulationDetail, ServiceError> {
        let header = FormulationEntity::find_by_id(formulation_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Formulation {} not found", formulation_id))
            })?;

        let materials = FormulationMaterialEntity::find()
            .filter(formulation_material::Column::FormulationId.eq(formulation_id))
            .all(&*self.db)
            .await?;

        if materials.is_empty() {
            let ing = IngredientEntity::find_by_id(header.ingredient_id)
                .one(&*self.db)
                .await?;
            if ing.map(|i| i.is_compound).unwrap_or(false) {
                warn!(
                    formulation_id,
                    "Compound-ingredient formulation has no material lines"
                );
            }
        }

        Ok(FormulationDetail {
            formulation: header,
            materials,
        })
    }
}
