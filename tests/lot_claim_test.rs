//! Lot intake and conditional-claim tests.

mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use sea_orm::EntityTrait;

use common::*;
use foodtrace_api::entities::ingredient_lot;
use foodtrace_api::errors::ServiceError;
use foodtrace_api::services::lots::ReceiveLotInput;

#[tokio::test]
async fn intake_computes_total_mass_and_enforces_shelf_life() {
    let ctx = setup().await;
    let today = d(2024, 6, 1);

    let supplier = seed_supplier(&ctx, "Acme").await;
    let sugar = seed_atomic_ingredient(&ctx, "Sugar").await;
    let formulation =
        seed_atomic_formulation(&ctx, supplier, sugar, dec!(16), dec!(2), today).await;

    let lot = ctx
        .services
        .lots
        .create_ingredient_lot(
            ReceiveLotInput {
                supplier_id: supplier,
                formulation_id: formulation,
                quantity_packs: dec!(3),
                expiration_date: d(2025, 1, 1),
            },
            today,
        )
        .await
        .unwrap();
    assert_eq!(lot.total_mass_oz, dec!(48));
    assert_eq!(lot.manufacturer_id, None);

    // 89 days out is below the 90-day minimum.
    let err = ctx
        .services
        .lots
        .create_ingredient_lot(
            ReceiveLotInput {
                supplier_id: supplier,
                formulation_id: formulation,
                quantity_packs: dec!(1),
                expiration_date: d(2024, 8, 29),
            },
            today,
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Validation(_));

    // Exactly 90 days out is allowed.
    ctx.services
        .lots
        .create_ingredient_lot(
            ReceiveLotInput {
                supplier_id: supplier,
                formulation_id: formulation,
                quantity_packs: dec!(1),
                expiration_date: d(2024, 8, 30),
            },
            today,
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn intake_requires_owning_the_formulation() {
    let ctx = setup().await;
    let today = d(2024, 6, 1);

    let supplier = seed_supplier(&ctx, "Acme").await;
    let other = seed_supplier(&ctx, "Bulk Foods").await;
    let sugar = seed_atomic_ingredient(&ctx, "Sugar").await;
    let formulation =
        seed_atomic_formulation(&ctx, supplier, sugar, dec!(10), dec!(2), today).await;

    let err = ctx
        .services
        .lots
        .create_ingredient_lot(
            ReceiveLotInput {
                supplier_id: other,
                formulation_id: formulation,
                quantity_packs: dec!(1),
                expiration_date: d(2025, 1, 1),
            },
            today,
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

/// The claim is a compare-and-set: whoever updates the row while
/// `manufacturer_id` is still NULL wins; everyone else is told the truth
/// about how many claims went through.
#[tokio::test]
async fn racing_claims_cannot_double_assign_a_lot() {
    let ctx = setup().await;
    let today = d(2024, 6, 1);

    let supplier = seed_supplier(&ctx, "Acme").await;
    let first = seed_manufacturer(&ctx, "First Foods").await;
    let second = seed_manufacturer(&ctx, "Second Snacks").await;
    let sugar = seed_atomic_ingredient(&ctx, "Sugar").await;
    let formulation =
        seed_atomic_formulation(&ctx, supplier, sugar, dec!(10), dec!(2), today).await;

    let lot = seed_lot(&ctx, supplier, formulation, dec!(5), d(2025, 1, 1), today).await;

    let won = ctx.services.lots.claim_lots(first, &[lot]).await.unwrap();
    assert_eq!(won.claimed, 1);
    assert_eq!(won.claimed_lot_ids, vec![lot]);

    let lost = ctx.services.lots.claim_lots(second, &[lot]).await.unwrap();
    assert_eq!(lost.requested, 1);
    assert_eq!(lost.claimed, 0);
    assert!(lost.claimed_lot_ids.is_empty());

    let stored = ingredient_lot::Entity::find_by_id(lot)
        .one(&*ctx.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.manufacturer_id, Some(first));
}

#[tokio::test]
async fn partial_claim_batches_report_actual_success_count() {
    let ctx = setup().await;
    let today = d(2024, 6, 1);

    let supplier = seed_supplier(&ctx, "Acme").await;
    let first = seed_manufacturer(&ctx, "First Foods").await;
    let second = seed_manufacturer(&ctx, "Second Snacks").await;
    let sugar = seed_atomic_ingredient(&ctx, "Sugar").await;
    let formulation =
        seed_atomic_formulation(&ctx, supplier, sugar, dec!(10), dec!(2), today).await;

    let a = seed_lot(&ctx, supplier, formulation, dec!(5), d(2025, 1, 1), today).await;
    let b = seed_lot(&ctx, supplier, formulation, dec!(5), d(2025, 1, 1), today).await;
    let c = seed_lot(&ctx, supplier, formulation, dec!(5), d(2025, 1, 1), today).await;

    ctx.services.lots.claim_lots(second, &[b]).await.unwrap();

    let outcome = ctx
        .services
        .lots
        .claim_lots(first, &[a, b, c])
        .await
        .unwrap();
    assert_eq!(outcome.requested, 3);
    assert_eq!(outcome.claimed, 2);
    assert_eq!(outcome.claimed_lot_ids, vec![a, c]);
}

#[tokio::test]
async fn available_lots_are_scoped_to_the_manufacturers_recipe_needs() {
    let ctx = setup().await;
    let today = d(2024, 6, 1);

    let supplier = seed_supplier(&ctx, "Acme").await;
    let manufacturer = seed_manufacturer(&ctx, "Maker").await;
    let sugar = seed_atomic_ingredient(&ctx, "Sugar").await;
    let pepper = seed_atomic_ingredient(&ctx, "Pepper").await;
    let sugar_formulation =
        seed_atomic_formulation(&ctx, supplier, sugar, dec!(10), dec!(2), today).await;
    let pepper_formulation =
        seed_atomic_formulation(&ctx, supplier, pepper, dec!(10), dec!(2), today).await;

    let sugar_lot = seed_lot(
        &ctx,
        supplier,
        sugar_formulation,
        dec!(5),
        d(2025, 1, 1),
        today,
    )
    .await;
    // Pepper is not in any of the manufacturer's recipes.
    seed_lot(
        &ctx,
        supplier,
        pepper_formulation,
        dec!(5),
        d(2025, 1, 1),
        today,
    )
    .await;
    // Already claimed sugar lots are not offered either.
    let claimed = seed_lot(
        &ctx,
        supplier,
        sugar_formulation,
        dec!(5),
        d(2025, 1, 1),
        today,
    )
    .await;
    ctx.services
        .lots
        .claim_lots(manufacturer, &[claimed])
        .await
        .unwrap();

    let product = seed_product(&ctx, manufacturer, "Cookies", 10).await;
    seed_recipe(&ctx, product, &[(sugar, dec!(4))], today).await;

    let available = ctx
        .services
        .lots
        .available_unclaimed_lots(manufacturer, d(2024, 7, 1))
        .await
        .unwrap();
    assert_eq!(available.len(), 1);
    assert_eq!(available[0].lot_id, sugar_lot);
    assert_eq!(available[0].ingredient_name, "Sugar");
    assert_eq!(available[0].pack_size_oz, dec!(10));
}

#[tokio::test]
async fn claiming_nothing_is_a_validation_error() {
    let ctx = setup().await;
    let manufacturer = seed_manufacturer(&ctx, "Maker").await;

    let err = ctx
        .services
        .lots
        .claim_lots(manufacturer, &[])
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Validation(_));
}
