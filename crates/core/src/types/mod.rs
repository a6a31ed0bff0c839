//! Core types for recipe costing.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod money;
pub mod unit;

pub use id::*;
pub use money::{percent_of, ratio_percent, round_currency, safe_div};
pub use unit::{Dimension, MeasurementUnit, UnitError};
