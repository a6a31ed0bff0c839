//! Catalog writes followed by invalidation hooks.
//!
//! After a hook returns, the next read must reflect the change.

use rust_decimal::Decimal;

use recipe_cost_core::{IngredientId, MeasurementUnit, RecipeId};
use recipe_cost_engine::models::{PricingSuggestionInput, Product};
use recipe_cost_integration_tests::{
    BROWNIE, BROWNIES, CHOCOLATE, TENANT, bakery_service, brownie_product, ingredient,
};

fn d(s: &str) -> Decimal {
    s.parse().expect("valid decimal")
}

// =============================================================================
// Ingredient Changes
// =============================================================================

#[tokio::test]
async fn test_ingredient_price_change_reaches_readers() {
    let (catalog, _, service) = bakery_service().await;
    let before = service
        .compute_recipe_cost(TENANT, BROWNIES)
        .await
        .expect("before");
    assert_eq!(before.cost_per_unit, d("4.85"));

    catalog
        .upsert_ingredient(ingredient(100, "Chocolate", d("6.00"), MeasurementUnit::Kg))
        .await;

    // Not yet invalidated: the cached cost is still served
    let stale = service
        .compute_recipe_cost(TENANT, BROWNIES)
        .await
        .expect("stale");
    assert_eq!(stale, before);

    let evicted = service
        .invalidate_by_ingredient(TENANT, CHOCOLATE)
        .await
        .expect("reverse lookup");
    // Brownies, cake and recipe 14 use chocolate
    assert_eq!(evicted, 3);

    let after = service
        .compute_recipe_cost(TENANT, BROWNIES)
        .await
        .expect("after");
    // 4.4 kg * 6.00 + 45.50 + 0.40 = 72.30
    assert_eq!(after.ingredient_cost, d("26.40"));
    assert_eq!(after.total_cost, d("72.30"));
    assert_eq!(after.cost_per_unit, d("5.16"));
}

#[tokio::test]
async fn test_bulk_delete_evicts_each_recipe_once() {
    let (_, backend, service) = bakery_service().await;
    let ingredients = [IngredientId::new(100), IngredientId::new(101), IngredientId::new(102)];

    let evicted = service
        .invalidate_by_ingredients(TENANT, &ingredients)
        .await
        .expect("reverse lookups");

    // 3 + 2 + 3 references, 5 distinct recipes
    assert_eq!(evicted, 5);
    assert_eq!(backend.deletes(), 5);
}

#[tokio::test]
async fn test_repeated_ingredient_ids_are_deduplicated() {
    let (_, backend, service) = bakery_service().await;

    let evicted = service
        .invalidate_by_ingredients(TENANT, &[CHOCOLATE, CHOCOLATE])
        .await
        .expect("reverse lookups");

    assert_eq!(evicted, 3);
    assert_eq!(backend.deletes(), 3);
}

// =============================================================================
// Recipe And Product Changes
// =============================================================================

#[tokio::test]
async fn test_recipe_edit_reaches_readers() {
    let (catalog, _, service) = bakery_service().await;
    service
        .compute_recipe_cost(TENANT, BROWNIES)
        .await
        .expect("warm the cache");

    let mut brownies = catalog
        .remove_recipe(TENANT, BROWNIES)
        .await
        .expect("brownies exist");
    brownies.yield_quantity = d("20");
    catalog.upsert_recipe(brownies).await;

    assert_eq!(service.invalidate_recipe(TENANT, BROWNIES).await, 1);

    let after = service
        .compute_recipe_cost(TENANT, BROWNIES)
        .await
        .expect("after");
    // 67.90 / 20
    assert_eq!(after.cost_per_unit, d("3.40"));
}

#[tokio::test]
async fn test_product_relink_prices_new_recipe() {
    let (catalog, backend, service) = bakery_service().await;
    service
        .suggest(&PricingSuggestionInput::for_product(TENANT, BROWNIE))
        .await
        .expect("warm the cache");

    let previous = catalog
        .upsert_product(Product {
            recipe_id: RecipeId::new(11),
            ..brownie_product()
        })
        .await
        .expect("product existed");

    let evicted = service
        .invalidate_by_product(TENANT, BROWNIE, Some(previous.recipe_id))
        .await
        .expect("product lookup");
    assert_eq!(evicted, 2);
    assert_eq!(backend.deletes(), 2);

    let s = service
        .suggest(&PricingSuggestionInput::for_product(TENANT, BROWNIE))
        .await
        .expect("suggestion on new recipe");
    assert_eq!(s.recipe_id, RecipeId::new(11));
}

#[tokio::test]
async fn test_deleted_product_evicts_previous_recipe() {
    let (catalog, backend, service) = bakery_service().await;

    let removed = catalog
        .remove_product(TENANT, BROWNIE)
        .await
        .expect("product existed");

    let evicted = service
        .invalidate_by_product(TENANT, BROWNIE, Some(removed.recipe_id))
        .await
        .expect("product lookup");
    assert_eq!(evicted, 1);
    assert_eq!(backend.deletes(), 1);
}
