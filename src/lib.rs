//! Foodtrace API Library
//!
//! Core services for food-manufacturing inventory: versioned recipes and
//! supplier formulations, FEFO ingredient-lot allocation with batch costing,
//! do-not-combine safety gating, atomic batch production, and recall
//! traceability. The presentation layer (menu/CLI) and authentication live
//! outside this crate and consume the services exposed from [`AppState`].
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod logging;
pub mod migrator;
pub mod services;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::services::allocation::FefoAllocator;
use crate::services::batches::BatchService;
use crate::services::conflicts::ConflictChecker;
use crate::services::formulations::FormulationService;
use crate::services::ingredients::IngredientService;
use crate::services::lots::LotService;
use crate::services::products::ProductService;
use crate::services::recipes::RecipeService;
use crate::services::reports::ReportService;
use crate::services::traceability::TraceabilityService;

/// All services wired against one connection pool.
#[derive(Clone)]
pub struct AppServices {
    pub ingredients: Arc<IngredientService>,
    pub products: Arc<ProductService>,
    pub formulations: Arc<FormulationService>,
    pub recipes: Arc<RecipeService>,
    pub conflicts: Arc<ConflictChecker>,
    pub allocator: Arc<FefoAllocator>,
    pub batches: Arc<BatchService>,
    pub lots: Arc<LotService>,
    pub traceability: Arc<TraceabilityService>,
    pub reports: Arc<ReportService>,
}

impl AppServices {
    pub fn build(
        db: Arc<DatabaseConnection>,
        config: &config::AppConfig,
        event_sender: Option<events::EventSender>,
    ) -> Self {
        let conflicts = Arc::new(ConflictChecker::new(db.clone()));
        let allocator = Arc::new(FefoAllocator::new(db.clone()));

        Self {
            ingredients: Arc::new(IngredientService::new(db.clone(), event_sender.clone())),
            products: Arc::new(ProductService::new(db.clone())),
            formulations: Arc::new(FormulationService::new(
                db.clone(),
                conflicts.clone(),
                event_sender.clone(),
            )),
            recipes: Arc::new(RecipeService::new(
                db.clone(),
                conflicts.clone(),
                event_sender.clone(),
            )),
            batches: Arc::new(BatchService::new(
                db.clone(),
                allocator.clone(),
                conflicts.clone(),
                event_sender.clone(),
            )),
            lots: Arc::new(LotService::new(
                db.clone(),
                config.inventory.clone(),
                event_sender,
            )),
            traceability: Arc::new(TraceabilityService::new(
                db.clone(),
                config.inventory.clone(),
            )),
            reports: Arc::new(ReportService::new(db.clone(), config.inventory.clone())),
            conflicts,
            allocator,
        }
    }
}

/// App state definition handed to the presentation layer.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: AppServices,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: events::EventSender,
    ) -> Self {
        let services = AppServices::build(db.clone(), &config, Some(event_sender.clone()));
        Self {
            db,
            config,
            event_sender,
            services,
        }
    }
}
