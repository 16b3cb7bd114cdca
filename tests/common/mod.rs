#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait};

use foodtrace_api::config::AppConfig;
use foodtrace_api::db;
use foodtrace_api::entities::{batch_consumption, manufacturer, product_batch, supplier};
use foodtrace_api::services::formulations::FormulationDraft;
use foodtrace_api::services::recipes::RecipeDraft;
use foodtrace_api::AppServices;

pub struct TestContext {
    pub db: Arc<DatabaseConnection>,
    pub services: AppServices,
    pub config: AppConfig,
}

/// Fresh in-memory database with the full schema applied. A single pooled
/// connection keeps every query on the same in-memory SQLite instance.
pub async fn setup() -> TestContext {
    let config = AppConfig::new("sqlite::memory:");
    let pool = db::establish_connection_with_config(&db::DbConfig {
        url: config.database_url.clone(),
        max_connections: 1,
        min_connections: 1,
        ..Default::default()
    })
    .await
    .expect("db connect");
    db::run_migrations(&pool).await.expect("migrations");

    let db = Arc::new(pool);
    let services = AppServices::build(db.clone(), &config, None);
    TestContext {
        db,
        services,
        config,
    }
}

pub fn d(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub async fn seed_supplier(ctx: &TestContext, name: &str) -> i64 {
    supplier::ActiveModel {
        name: Set(name.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&*ctx.db)
    .await
    .expect("insert supplier")
    .supplier_id
}

pub async fn seed_manufacturer(ctx: &TestContext, name: &str) -> i64 {
    manufacturer::ActiveModel {
        name: Set(name.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&*ctx.db)
    .await
    .expect("insert manufacturer")
    .manufacturer_id
}

pub async fn seed_atomic_ingredient(ctx: &TestContext, name: &str) -> i64 {
    ctx.services
        .ingredients
        .create_ingredient(name, false)
        .await
        .expect("create atomic ingredient")
        .ingredient_id
}

pub async fn seed_compound_ingredient(ctx: &TestContext, name: &str) -> i64 {
    ctx.services
        .ingredients
        .create_ingredient(name, true)
        .await
        .expect("create compound ingredient")
        .ingredient_id
}

pub async fn seed_product(
    ctx: &TestContext,
    manufacturer_id: i64,
    name: &str,
    default_batch_size: i32,
) -> i64 {
    let category = ctx
        .services
        .products
        .get_or_create_category("General")
        .await
        .expect("category");
    ctx.services
        .products
        .create_product(
            manufacturer_id,
            category.category_id,
            name,
            default_batch_size,
        )
        .await
        .expect("create product")
        .product_id
}

pub async fn seed_atomic_formulation(
    ctx: &TestContext,
    supplier_id: i64,
    ingredient_id: i64,
    pack_size_oz: Decimal,
    unit_price: Decimal,
    today: NaiveDate,
) -> i64 {
    let draft = FormulationDraft::new(pack_size_oz, unit_price);
    ctx.services
        .formulations
        .commit_version(supplier_id, ingredient_id, draft, today)
        .await
        .expect("commit atomic formulation")
        .formulation
        .formulation_id
}

pub async fn seed_compound_formulation(
    ctx: &TestContext,
    supplier_id: i64,
    ingredient_id: i64,
    pack_size_oz: Decimal,
    unit_price: Decimal,
    materials: &[(i64, Decimal)],
    today: NaiveDate,
) -> i64 {
    let mut draft = FormulationDraft::new(pack_size_oz, unit_price);
    for (material_id, quantity) in materials {
        draft.upsert_material(*material_id, *quantity);
    }
    ctx.services
        .formulations
        .commit_version(supplier_id, ingredient_id, draft, today)
        .await
        .expect("commit compound formulation")
        .formulation
        .formulation_id
}

/// Receives a supplier lot, leaving it unclaimed.
pub async fn seed_lot(
    ctx: &TestContext,
    supplier_id: i64,
    formulation_id: i64,
    quantity_packs: Decimal,
    expiration_date: NaiveDate,
    today: NaiveDate,
) -> i64 {
    ctx.services
        .lots
        .create_ingredient_lot(
            foodtrace_api::services::lots::ReceiveLotInput {
                supplier_id,
                formulation_id,
                quantity_packs,
                expiration_date,
            },
            today,
        )
        .await
        .expect("create lot")
        .lot_id
}

/// Receives a supplier lot and claims it for the manufacturer.
pub async fn seed_claimed_lot(
    ctx: &TestContext,
    supplier_id: i64,
    manufacturer_id: i64,
    formulation_id: i64,
    quantity_packs: Decimal,
    expiration_date: NaiveDate,
    today: NaiveDate,
) -> i64 {
    let lot_id = seed_lot(
        ctx,
        supplier_id,
        formulation_id,
        quantity_packs,
        expiration_date,
        today,
    )
    .await;
    let outcome = ctx
        .services
        .lots
        .claim_lots(manufacturer_id, &[lot_id])
        .await
        .expect("claim lot");
    assert_eq!(outcome.claimed, 1, "seed lot must be claimable");
    lot_id
}

pub async fn seed_recipe(
    ctx: &TestContext,
    product_id: i64,
    lines: &[(i64, Decimal)],
    today: NaiveDate,
) -> i64 {
    let mut draft = RecipeDraft::new();
    for (ingredient_id, quantity) in lines {
        draft.upsert_line(*ingredient_id, *quantity);
    }
    ctx.services
        .recipes
        .commit_version(product_id, draft, today)
        .await
        .expect("commit recipe")
        .recipe
        .recipe_id
}

pub async fn product_batch_count(ctx: &TestContext) -> u64 {
    product_batch::Entity::find()
        .count(&*ctx.db)
        .await
        .expect("count product batches")
}

pub async fn consumption_count(ctx: &TestContext) -> u64 {
    batch_consumption::Entity::find()
        .count(&*ctx.db)
        .await
        .expect("count consumptions")
}
