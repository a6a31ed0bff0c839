//! Recipe Cost Core - Shared types library.
//!
//! This crate provides common types used across the recipe costing components:
//! - `engine` - Cost aggregation, caching, invalidation and pricing suggestions
//! - `cli` - Command-line tools for costing recipes from catalog fixtures
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no database
//! access, no cache clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, currency rounding helpers, and measurement units

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
