//! Domain models for recipe costing and pricing.
//!
//! # Models
//!
//! - `catalog` - Ingredients, recipes and products as read from the store
//! - `settings` - Per-tenant pricing defaults
//! - `cost` - Derived recipe cost summaries (cached)
//! - `pricing` - Pricing suggestion inputs, outputs and product summaries

pub mod catalog;
pub mod cost;
pub mod pricing;
pub mod settings;

pub use catalog::{Ingredient, Product, Recipe, RecipeItem};
pub use cost::{CostLine, RecipeCostSummary};
pub use pricing::{
    PricingFlags, PricingParameters, PricingSuggestion, PricingSuggestionInput, ProductPricing,
    ProductPricingSummary, TaxTreatment,
};
pub use settings::PricingSettings;
