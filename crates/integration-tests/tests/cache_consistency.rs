//! Cache behavior seen through `CostingService`.
//!
//! Hits must return exactly what a miss computes, an unreachable cache must
//! not fail reads, and a read abandoned at its deadline must not write.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;

use recipe_cost_engine::PricingError;
use recipe_cost_engine::models::PricingSuggestionInput;
use recipe_cost_integration_tests::{
    BROWNIE, BROWNIES, CountingBackend, SlowCatalog, TENANT, UnreachableBackend, bakery_catalog,
    bakery_service, service_with,
};

#[tokio::test]
async fn test_hit_equals_miss() {
    let (_, backend, service) = bakery_service().await;

    let miss = service
        .compute_recipe_cost(TENANT, BROWNIES)
        .await
        .expect("first read");
    assert_eq!(backend.sets(), 1);

    let hit = service
        .compute_recipe_cost(TENANT, BROWNIES)
        .await
        .expect("second read");

    assert_eq!(hit, miss);
    assert_eq!(backend.gets(), 2);
    // Served from the cache, nothing written again
    assert_eq!(backend.sets(), 1);
}

#[tokio::test]
async fn test_suggestion_reuses_cached_cost() {
    let (_, backend, service) = bakery_service().await;

    service
        .compute_recipe_cost(TENANT, BROWNIES)
        .await
        .expect("warm the cache");
    let s = service
        .suggest(&PricingSuggestionInput::for_product(TENANT, BROWNIE))
        .await
        .expect("suggestion");

    assert_eq!(s.suggested_price, Decimal::new(717, 2));
    assert_eq!(backend.sets(), 1);
}

#[tokio::test]
async fn test_unreachable_cache_still_serves_reads() {
    let catalog = bakery_catalog().await;
    let service = service_with(catalog.clone(), catalog, Arc::new(UnreachableBackend));

    let summary = service
        .compute_recipe_cost(TENANT, BROWNIES)
        .await
        .expect("computed without cache");
    assert_eq!(summary.cost_per_unit, Decimal::new(485, 2));

    let s = service
        .suggest(&PricingSuggestionInput::for_product(TENANT, BROWNIE))
        .await
        .expect("suggestion without cache");
    assert_eq!(s.suggested_price, Decimal::new(717, 2));

    let evicted = service
        .invalidate_recipe(TENANT, BROWNIES)
        .await;
    assert_eq!(evicted, 1);
}

#[tokio::test]
async fn test_expired_deadline_writes_nothing() {
    let catalog = bakery_catalog().await;
    let slow = Arc::new(SlowCatalog::new(catalog.clone(), Duration::from_millis(300)));
    let backend = Arc::new(CountingBackend::new());
    let service = service_with(slow, catalog, backend.clone());

    let err = service
        .compute_recipe_cost_within(TENANT, BROWNIES, Duration::from_millis(20))
        .await
        .expect_err("catalog is slower than the deadline");

    assert!(matches!(err, PricingError::DeadlineExceeded(20)));
    assert_eq!(err.status_code(), 504);

    // Give an abandoned computation time to finish, if it were still running
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(backend.sets(), 0);
}

#[tokio::test]
async fn test_default_read_timeout_applies() {
    let catalog = bakery_catalog().await;
    let slow = Arc::new(SlowCatalog::new(catalog.clone(), Duration::from_millis(300)));
    let backend = Arc::new(CountingBackend::new());
    let service =
        service_with(slow, catalog, backend.clone()).with_read_timeout(Duration::from_millis(20));

    let err = service
        .suggest(&PricingSuggestionInput::for_recipe(TENANT, BROWNIES))
        .await
        .expect_err("read timeout expires");

    assert!(matches!(err, PricingError::DeadlineExceeded(_)));
    assert_eq!(backend.sets(), 0);
}

#[tokio::test]
async fn test_generous_deadline_completes() {
    let catalog = bakery_catalog().await;
    let slow = Arc::new(SlowCatalog::new(catalog.clone(), Duration::from_millis(10)));
    let backend = Arc::new(CountingBackend::new());
    let service = service_with(slow, catalog, backend.clone());

    let summary = service
        .compute_recipe_cost_within(TENANT, BROWNIES, Duration::from_secs(5))
        .await
        .expect("finishes in time");

    assert_eq!(summary.cost_per_unit, Decimal::new(485, 2));
    assert_eq!(backend.sets(), 1);
}
