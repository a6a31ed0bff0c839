//! Opening the catalog and building the costing service.
//!
//! A `--catalog` YAML fixture is loaded into memory; otherwise the catalog is
//! read from `PostgreSQL` at `PRICING_DATABASE_URL`.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use recipe_cost_engine::db::{self, CatalogFixture, InMemoryCatalog, PgCatalogRepository};
use recipe_cost_engine::{CostingService, EngineConfig};

/// A ready costing service plus the in-memory catalog behind it, if any.
pub struct Engine {
    /// Costing service over the opened catalog.
    pub service: CostingService,
    /// The fixture catalog, when one was loaded.
    pub fixture: Option<Arc<InMemoryCatalog>>,
}

/// Load configuration and open the catalog.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the fixture cannot be read
/// or parsed, or the database or cache cannot be reached.
pub async fn open(catalog_path: Option<&Path>) -> Result<Engine, Box<dyn std::error::Error>> {
    let config = EngineConfig::from_env()?;

    if let Some(path) = catalog_path {
        if !path.exists() {
            return Err(format!("File not found: {}", path.display()).into());
        }
        let content = tokio::fs::read_to_string(path).await?;
        let fixture: CatalogFixture = serde_yaml::from_str(&content)?;
        info!(
            path = %path.display(),
            ingredients = fixture.ingredients.len(),
            recipes = fixture.recipes.len(),
            products = fixture.products.len(),
            "Loaded catalog fixture"
        );

        let catalog = Arc::new(InMemoryCatalog::from_fixture(fixture));
        let service = CostingService::from_config(&config, catalog.clone(), catalog.clone()).await?;
        return Ok(Engine {
            service,
            fixture: Some(catalog),
        });
    }

    let database_url = config
        .database_url
        .as_ref()
        .ok_or("PRICING_DATABASE_URL not set and no --catalog given")?;
    let pool = db::create_pool(database_url).await?;
    info!("Connected to database");

    let repo = Arc::new(PgCatalogRepository::new(pool));
    let service = CostingService::from_config(&config, repo.clone(), repo).await?;
    Ok(Engine {
        service,
        fixture: None,
    })
}
