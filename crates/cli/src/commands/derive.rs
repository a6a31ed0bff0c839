//! `rc-cli derive` - display figures from a product's saved prices.

use recipe_cost_core::{ProductId, TenantId};

use super::catalog::Engine;
use super::print_json;

/// Print the product's pricing summary.
///
/// # Errors
///
/// Returns an error if the product does not exist.
pub async fn run(engine: &Engine, tenant: i32, product: i32) -> Result<(), Box<dyn std::error::Error>> {
    let summary = engine
        .service
        .product_summary(TenantId::new(tenant), ProductId::new(product))
        .await?;
    print_json(&summary)
}
