//! Costing and pricing services.
//!
//! # Services
//!
//! - `cost_aggregator` - Recipe bill-of-materials costing
//! - `pricing_formula` - Suggested selling price and indicators
//! - `invalidation` - Cache eviction on catalog writes
//! - `product_summary` - Display figures from a product's saved prices
//! - `costing` - Coordinating service tying the above to the cost cache

pub mod cost_aggregator;
pub mod costing;
pub mod invalidation;
pub mod pricing_formula;
pub mod product_summary;

pub use cost_aggregator::{BatchRates, CostAggregator, summarize};
pub use costing::CostingService;
pub use invalidation::{InvalidationCoordinator, InvalidationEpochs};
pub use pricing_formula::PricingFormulaEngine;
pub use product_summary::derive_product_summary;
