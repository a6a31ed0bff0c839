//! Recipe costing and pricing suggestion engine.
//!
//! Computes what a batch of a recipe costs from its ingredients, labor and
//! packaging, memoizes that cost per tenant and recipe, evicts it when an
//! ingredient, recipe or product changes, and turns it into a suggested
//! selling price.
//!
//! # Entry point
//!
//! [`CostingService`] owns the read path and the invalidation hooks:
//!
//! - `compute_recipe_cost` - cached cost summary of a recipe batch
//! - `suggest` - suggested price for a recipe or product
//! - `invalidate_recipe`, `invalidate_by_ingredient`,
//!   `invalidate_by_ingredients`, `invalidate_by_product` - call after a write
//! - `derive_product_summary` - display figures from saved product prices
//!
//! The catalog is read through [`db::CatalogRepository`] and
//! [`db::SettingsRepository`]; the engine never writes it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use config::EngineConfig;
pub use error::{PricingError, PricingResult};
pub use services::CostingService;
