//! Recipe version store tests: draft-then-commit, immutability, ordering.

mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait};

use common::*;
use foodtrace_api::entities::recipe;
use foodtrace_api::errors::ServiceError;
use foodtrace_api::services::recipes::RecipeDraft;

#[tokio::test]
async fn empty_draft_is_rejected_before_touching_storage() {
    let ctx = setup().await;
    let manufacturer = seed_manufacturer(&ctx, "Maker").await;
    let product = seed_product(&ctx, manufacturer, "Cookies", 10).await;

    let err = ctx
        .services
        .recipes
        .commit_version(product, RecipeDraft::new(), d(2024, 6, 1))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::EmptyRecipe);

    let count = recipe::Entity::find().count(&*ctx.db).await.unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn commit_writes_header_and_lines_together() {
    let ctx = setup().await;
    let today = d(2024, 6, 1);

    let manufacturer = seed_manufacturer(&ctx, "Maker").await;
    let product = seed_product(&ctx, manufacturer, "Cookies", 10).await;
    let sugar = seed_atomic_ingredient(&ctx, "Sugar").await;
    let flour = seed_atomic_ingredient(&ctx, "Flour").await;

    let recipe_id = seed_recipe(
        &ctx,
        product,
        &[(sugar, dec!(4)), (flour, dec!(12))],
        today,
    )
    .await;

    let detail = ctx.services.recipes.recipe_detail(recipe_id).await.unwrap();
    assert_eq!(detail.recipe.product_id, product);
    assert_eq!(detail.lines.len(), 2);
    let flour_line = detail
        .lines
        .iter()
        .find(|l| l.ingredient_id == flour)
        .unwrap();
    assert_eq!(flour_line.quantity_per_unit_oz, dec!(12));
    assert_eq!(flour_line.ingredient_name, "Flour");
}

#[tokio::test]
async fn draft_edits_and_deep_copy_leave_committed_versions_untouched() {
    let ctx = setup().await;
    let today = d(2024, 6, 1);

    let manufacturer = seed_manufacturer(&ctx, "Maker").await;
    let product = seed_product(&ctx, manufacturer, "Cookies", 10).await;
    let sugar = seed_atomic_ingredient(&ctx, "Sugar").await;
    let flour = seed_atomic_ingredient(&ctx, "Flour").await;
    let salt = seed_atomic_ingredient(&ctx, "Salt").await;

    let v1 = seed_recipe(&ctx, product, &[(sugar, dec!(4)), (flour, dec!(12))], today).await;

    // Amend by basing a new draft on v1.
    let mut draft = ctx.services.recipes.draft_from(v1).await.unwrap();
    assert!(draft.remove_line(sugar));
    draft.upsert_line(salt, dec!(1));
    draft.upsert_line(flour, dec!(14));
    let v2 = ctx
        .services
        .recipes
        .commit_version(product, draft, d(2024, 7, 1))
        .await
        .unwrap();

    let v1_detail = ctx.services.recipes.recipe_detail(v1).await.unwrap();
    assert_eq!(v1_detail.lines.len(), 2);
    assert!(v1_detail.lines.iter().any(|l| l.ingredient_id == sugar));

    let v2_detail = ctx
        .services
        .recipes
        .recipe_detail(v2.recipe.recipe_id)
        .await
        .unwrap();
    assert_eq!(v2_detail.lines.len(), 2);
    assert!(v2_detail.lines.iter().all(|l| l.ingredient_id != sugar));

    let listed = ctx.services.recipes.list_recipes(product).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].recipe_id, v2.recipe.recipe_id, "newest first");
}

#[tokio::test]
async fn abandoned_drafts_have_no_storage_effect() {
    let ctx = setup().await;
    let manufacturer = seed_manufacturer(&ctx, "Maker").await;
    let product = seed_product(&ctx, manufacturer, "Cookies", 10).await;
    let sugar = seed_atomic_ingredient(&ctx, "Sugar").await;

    {
        let mut draft = RecipeDraft::new();
        draft.upsert_line(sugar, dec!(4));
        // Dropped without committing.
    }

    assert!(ctx
        .services
        .recipes
        .list_recipes(product)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn unknown_references_fail_with_not_found_and_roll_back() {
    let ctx = setup().await;
    let today = d(2024, 6, 1);

    let manufacturer = seed_manufacturer(&ctx, "Maker").await;
    let product = seed_product(&ctx, manufacturer, "Cookies", 10).await;

    let mut draft = RecipeDraft::new();
    draft.upsert_line(4040, dec!(1));
    let err = ctx
        .services
        .recipes
        .commit_version(product, draft, today)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));

    let mut draft = RecipeDraft::new();
    draft.upsert_line(4040, dec!(1));
    let err = ctx
        .services
        .recipes
        .commit_version(9999, draft, today)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));

    let count = recipe::Entity::find().count(&*ctx.db).await.unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn non_positive_quantities_are_rejected() {
    let ctx = setup().await;
    let manufacturer = seed_manufacturer(&ctx, "Maker").await;
    let product = seed_product(&ctx, manufacturer, "Cookies", 10).await;
    let sugar = seed_atomic_ingredient(&ctx, "Sugar").await;

    let mut draft = RecipeDraft::new();
    draft.upsert_line(sugar, dec!(0));
    let err = ctx
        .services
        .recipes
        .commit_version(product, draft, d(2024, 6, 1))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Validation(_));
}
