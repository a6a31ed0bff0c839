//! `rc-cli suggest` - suggested selling price for a recipe or product.

use clap::Args;
use rust_decimal::Decimal;

use recipe_cost_core::{ProductId, RecipeId, TenantId};
use recipe_cost_engine::models::PricingSuggestionInput;

use super::catalog::Engine;
use super::print_json;

/// Pricing parameters. Anything left out defaults to the product's saved
/// values, then to the tenant's settings.
#[derive(Args, Debug)]
pub struct SuggestArgs {
    /// Recipe ID
    #[arg(long, required_unless_present = "product")]
    pub recipe: Option<i32>,

    /// Product ID
    #[arg(long)]
    pub product: Option<i32>,

    /// Margin over full cost, in percent
    #[arg(long)]
    pub margin: Option<Decimal>,

    /// Per-unit packaging cost
    #[arg(long)]
    pub packaging: Option<Decimal>,

    /// Quote the price with tax included
    #[arg(long)]
    pub include_tax: bool,

    /// Tax rate in percent (implies --include-tax)
    #[arg(long)]
    pub tax_rate: Option<Decimal>,

    /// Monthly fixed costs to allocate
    #[arg(long)]
    pub fixed_costs: Option<Decimal>,

    /// Variable costs, in percent
    #[arg(long)]
    pub variable_percent: Option<Decimal>,

    /// Expected units sold per month
    #[arg(long)]
    pub sales_volume: Option<Decimal>,

    /// Price currently charged
    #[arg(long)]
    pub current_price: Option<Decimal>,
}

impl SuggestArgs {
    fn into_input(self, tenant: i32) -> PricingSuggestionInput {
        PricingSuggestionInput {
            tenant_id: TenantId::new(tenant),
            recipe_id: self.recipe.map(RecipeId::new),
            product_id: self.product.map(ProductId::new),
            margin_percent: self.margin,
            packaging_cost: self.packaging,
            include_tax: self.include_tax,
            tax_rate: self.tax_rate,
            fixed_monthly_costs: self.fixed_costs,
            variable_cost_percent: self.variable_percent,
            sales_volume_monthly: self.sales_volume,
            current_price: self.current_price,
        }
    }
}

/// Print a pricing suggestion.
///
/// # Errors
///
/// Returns an error if the inputs are invalid or the recipe cannot be costed.
pub async fn run(
    engine: &Engine,
    tenant: i32,
    args: SuggestArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let input = args.into_input(tenant);
    let suggestion = engine.service.suggest(&input).await?;
    print_json(&suggestion)
}
