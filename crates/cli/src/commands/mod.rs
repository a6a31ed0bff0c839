//! Subcommand implementations.

pub mod catalog;
pub mod cost;
pub mod derive;
pub mod suggest;
pub mod what_if;

use std::io::Write;

use serde::Serialize;

/// Write a value to stdout as pretty-printed JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(value)?;
    let mut out = std::io::stdout().lock();
    writeln!(out, "{json}")?;
    Ok(())
}
