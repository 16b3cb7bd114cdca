//! Inventory and costing report tests.

mod common;

use rust_decimal_macros::dec;

use common::*;
use foodtrace_api::services::batches::CommitBatchInput;
use foodtrace_api::services::reports::LotExpiryStatus;

#[tokio::test]
async fn nearly_out_of_stock_compares_on_hand_to_one_default_batch() {
    let ctx = setup().await;
    let today = d(2024, 6, 1);

    let supplier = seed_supplier(&ctx, "Acme").await;
    let manufacturer = seed_manufacturer(&ctx, "Maker").await;
    let sugar = seed_atomic_ingredient(&ctx, "Sugar").await;
    let formulation =
        seed_atomic_formulation(&ctx, supplier, sugar, dec!(10), dec!(2), today).await;

    // Default batch of 10 units x 10 oz = 100 oz required; 70 oz on hand.
    seed_claimed_lot(
        &ctx,
        supplier,
        manufacturer,
        formulation,
        dec!(7),
        d(2025, 6, 1),
        today,
    )
    .await;

    let product = seed_product(&ctx, manufacturer, "Cookies", 10).await;
    seed_recipe(&ctx, product, &[(sugar, dec!(10))], today).await;

    let rows = ctx
        .services
        .reports
        .nearly_out_of_stock(manufacturer, d(2024, 12, 1))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].ingredient_id, sugar);
    assert_eq!(rows[0].on_hand_oz, dec!(70));
    assert_eq!(rows[0].required_oz, dec!(100));
    assert_eq!(rows[0].product_id, product);

    // Topping up to exactly the requirement clears the warning.
    seed_claimed_lot(
        &ctx,
        supplier,
        manufacturer,
        formulation,
        dec!(3),
        d(2025, 6, 1),
        today,
    )
    .await;
    let rows = ctx
        .services
        .reports
        .nearly_out_of_stock(manufacturer, d(2024, 12, 1))
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn nearly_out_of_stock_uses_the_latest_recipe() {
    let ctx = setup().await;
    let today = d(2024, 6, 1);

    let supplier = seed_supplier(&ctx, "Acme").await;
    let manufacturer = seed_manufacturer(&ctx, "Maker").await;
    let sugar = seed_atomic_ingredient(&ctx, "Sugar").await;
    let formulation =
        seed_atomic_formulation(&ctx, supplier, sugar, dec!(10), dec!(2), today).await;
    seed_claimed_lot(
        &ctx,
        supplier,
        manufacturer,
        formulation,
        dec!(5),
        d(2025, 6, 1),
        today,
    )
    .await;

    let product = seed_product(&ctx, manufacturer, "Cookies", 10).await;
    // Old recipe needs 100 oz per batch, the amendment only 40 oz.
    seed_recipe(&ctx, product, &[(sugar, dec!(10))], today).await;
    seed_recipe(&ctx, product, &[(sugar, dec!(4))], d(2024, 7, 1)).await;

    // 50 oz on hand covers the latest recipe's 40 oz requirement.
    let rows = ctx
        .services
        .reports
        .nearly_out_of_stock(manufacturer, d(2024, 12, 1))
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn almost_expired_flags_and_excludes_correctly() {
    let ctx = setup().await;
    let today = d(2024, 6, 1);

    let supplier = seed_supplier(&ctx, "Acme").await;
    let manufacturer = seed_manufacturer(&ctx, "Maker").await;
    let sugar = seed_atomic_ingredient(&ctx, "Sugar").await;
    let formulation =
        seed_atomic_formulation(&ctx, supplier, sugar, dec!(10), dec!(2), today).await;

    let expired = seed_claimed_lot(
        &ctx,
        supplier,
        manufacturer,
        formulation,
        dec!(1),
        d(2024, 12, 30),
        today,
    )
    .await;
    let soon = seed_claimed_lot(
        &ctx,
        supplier,
        manufacturer,
        formulation,
        dec!(1),
        d(2025, 1, 5),
        today,
    )
    .await;
    // Far enough out to stay off the report.
    seed_claimed_lot(
        &ctx,
        supplier,
        manufacturer,
        formulation,
        dec!(1),
        d(2025, 3, 1),
        today,
    )
    .await;

    let rows = ctx
        .services
        .reports
        .almost_expired(manufacturer, None, d(2025, 1, 1))
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0].lot_id, expired);
    assert_eq!(rows[0].status, LotExpiryStatus::Expired);
    assert_eq!(rows[0].days_left, -2);

    assert_eq!(rows[1].lot_id, soon);
    assert_eq!(rows[1].status, LotExpiryStatus::ExpiringSoon);
    assert_eq!(rows[1].days_left, 4);

    // A wider threshold pulls the third lot in too.
    let rows = ctx
        .services
        .reports
        .almost_expired(manufacturer, Some(90), d(2025, 1, 1))
        .await
        .unwrap();
    assert_eq!(rows.len(), 3);
}

#[tokio::test]
async fn fully_consumed_lots_drop_off_the_expiry_report() {
    let ctx = setup().await;
    let today = d(2024, 6, 1);

    let supplier = seed_supplier(&ctx, "Acme").await;
    let manufacturer = seed_manufacturer(&ctx, "Maker").await;
    let sugar = seed_atomic_ingredient(&ctx, "Sugar").await;
    let formulation =
        seed_atomic_formulation(&ctx, supplier, sugar, dec!(10), dec!(2), today).await;
    seed_claimed_lot(
        &ctx,
        supplier,
        manufacturer,
        formulation,
        dec!(5),
        d(2025, 1, 5),
        today,
    )
    .await;

    let product = seed_product(&ctx, manufacturer, "Cookies", 10).await;
    let recipe = seed_recipe(&ctx, product, &[(sugar, dec!(10))], today).await;

    // Consume the whole lot.
    ctx.services
        .batches
        .commit_batch(CommitBatchInput {
            recipe_id: recipe,
            manufacturer_id: manufacturer,
            target_quantity: 5,
            production_date: d(2024, 12, 1),
            expiration_date: d(2025, 2, 1),
        })
        .await
        .unwrap();

    let rows = ctx
        .services
        .reports
        .almost_expired(manufacturer, None, d(2025, 1, 1))
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn batch_cost_summary_reconstructs_segment_costs() {
    let ctx = setup().await;
    let today = d(2024, 6, 1);

    let supplier = seed_supplier(&ctx, "Acme").await;
    let manufacturer = seed_manufacturer(&ctx, "Maker").await;
    let sugar = seed_atomic_ingredient(&ctx, "Sugar").await;
    let formulation =
        seed_atomic_formulation(&ctx, supplier, sugar, dec!(10), dec!(2), today).await;

    let l1 = seed_claimed_lot(
        &ctx,
        supplier,
        manufacturer,
        formulation,
        dec!(3),
        d(2025, 1, 1),
        today,
    )
    .await;
    let l2 = seed_claimed_lot(
        &ctx,
        supplier,
        manufacturer,
        formulation,
        dec!(4),
        d(2025, 2, 1),
        today,
    )
    .await;

    let product = seed_product(&ctx, manufacturer, "Cookies", 10).await;
    let recipe = seed_recipe(&ctx, product, &[(sugar, dec!(10))], today).await;

    let batch = ctx
        .services
        .batches
        .commit_batch(CommitBatchInput {
            recipe_id: recipe,
            manufacturer_id: manufacturer,
            target_quantity: 5,
            production_date: d(2024, 12, 1),
            expiration_date: d(2025, 6, 1),
        })
        .await
        .unwrap();

    let summary = ctx
        .services
        .reports
        .batch_cost_summary(batch.lot_id)
        .await
        .unwrap();

    assert_eq!(summary.product_name, "Cookies");
    assert_eq!(summary.quantity, 5);
    assert_eq!(summary.batch_cost, dec!(10));
    assert_eq!(summary.per_unit_cost, dec!(2));
    assert_eq!(summary.lines.len(), 2);

    let line = |lot: i64| summary.lines.iter().find(|l| l.ingredient_lot_id == lot);
    let l1_line = line(l1).unwrap();
    assert_eq!(l1_line.mass_consumed_oz, dec!(30));
    assert_eq!(l1_line.cost, dec!(6));
    let l2_line = line(l2).unwrap();
    assert_eq!(l2_line.mass_consumed_oz, dec!(20));
    assert_eq!(l2_line.cost, dec!(4));

    let total: rust_decimal::Decimal = summary.lines.iter().map(|l| l.cost).sum();
    assert_eq!(total, summary.batch_cost);
}
