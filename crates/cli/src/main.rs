//! Recipe costing CLI - cost, price and inspect recipes from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Cost one batch of recipe 10 from a YAML catalog
//! rc-cli cost --catalog crates/cli/fixtures/bakery.yaml --tenant 1 --recipe 10
//!
//! # Suggest a price for product 7 at a 45% margin, tax included
//! rc-cli suggest -c crates/cli/fixtures/bakery.yaml -t 1 --product 7 --margin 45 --include-tax
//!
//! # Display figures from product 8's saved prices
//! rc-cli derive -c crates/cli/fixtures/bakery.yaml -t 1 --product 8
//!
//! # Re-cost recipe 10 after chocolate goes up to 6.50/kg
//! rc-cli what-if -c crates/cli/fixtures/bakery.yaml -t 1 --recipe 10 --ingredient 100 --unit-cost 6.50
//! ```
//!
//! Without `--catalog`, the catalog is read from `PostgreSQL` at
//! `PRICING_DATABASE_URL`. Results are printed to stdout as JSON; logs go to
//! stderr (`LOG_FORMAT=json` for structured logs).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "rc-cli")]
#[command(author, version, about = "Recipe costing and pricing tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the catalog comes from and whose data to read.
#[derive(Args)]
struct Source {
    /// YAML catalog fixture (defaults to `PostgreSQL` at `PRICING_DATABASE_URL`)
    #[arg(short, long)]
    catalog: Option<PathBuf>,

    /// Tenant ID
    #[arg(short, long)]
    tenant: i32,
}

#[derive(Subcommand)]
enum Commands {
    /// Cost one batch of a recipe
    Cost {
        #[command(flatten)]
        source: Source,

        /// Recipe ID
        #[arg(short, long)]
        recipe: i32,
    },
    /// Suggest a selling price for a recipe or product
    Suggest {
        #[command(flatten)]
        source: Source,

        #[command(flatten)]
        pricing: commands::suggest::SuggestArgs,
    },
    /// Show display figures derived from a product's saved prices
    Derive {
        #[command(flatten)]
        source: Source,

        /// Product ID
        #[arg(short, long)]
        product: i32,
    },
    /// Re-cost a recipe after changing an ingredient's unit cost (fixture only)
    WhatIf {
        #[command(flatten)]
        source: Source,

        /// Recipe ID
        #[arg(short, long)]
        recipe: i32,

        /// Ingredient ID to reprice
        #[arg(short, long)]
        ingredient: i32,

        /// New unit cost
        #[arg(short, long)]
        unit_cost: Decimal,
    },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so stdout stays parseable JSON
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "recipe_cost_engine=info,rc_cli=info".into());

    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let json_layer = json_logs.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer =
        (!json_logs).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Cost { source, recipe } => {
            let engine = commands::catalog::open(source.catalog.as_deref()).await?;
            commands::cost::run(&engine, source.tenant, recipe).await?;
        }
        Commands::Suggest { source, pricing } => {
            let engine = commands::catalog::open(source.catalog.as_deref()).await?;
            commands::suggest::run(&engine, source.tenant, pricing).await?;
        }
        Commands::Derive { source, product } => {
            let engine = commands::catalog::open(source.catalog.as_deref()).await?;
            commands::derive::run(&engine, source.tenant, product).await?;
        }
        Commands::WhatIf {
            source,
            recipe,
            ingredient,
            unit_cost,
        } => {
            let engine = commands::catalog::open(source.catalog.as_deref()).await?;
            commands::what_if::run(&engine, source.tenant, recipe, ingredient, unit_cost).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_suggest_needs_recipe_or_product() {
        let err = Cli::try_parse_from(["rc-cli", "suggest", "-t", "1"]);
        assert!(err.is_err());

        let cli = Cli::try_parse_from(["rc-cli", "suggest", "-t", "1", "--product", "7", "--margin", "45"])
            .unwrap();
        match cli.command {
            Commands::Suggest { source, pricing } => {
                assert_eq!(source.tenant, 1);
                assert_eq!(pricing.product, Some(7));
                assert_eq!(pricing.margin, Some(Decimal::new(45, 0)));
                assert!(!pricing.include_tax);
            }
            _ => panic!("expected suggest"),
        }
    }

    #[test]
    fn test_what_if_parses_unit_cost() {
        let cli = Cli::try_parse_from([
            "rc-cli",
            "what-if",
            "-c",
            "bakery.yaml",
            "-t",
            "1",
            "--recipe",
            "10",
            "--ingredient",
            "100",
            "--unit-cost",
            "6.50",
        ])
        .unwrap();
        match cli.command {
            Commands::WhatIf {
                source, unit_cost, ..
            } => {
                assert_eq!(source.catalog, Some(PathBuf::from("bakery.yaml")));
                assert_eq!(unit_cost, Decimal::new(650, 2));
            }
            _ => panic!("expected what-if"),
        }
    }
}
