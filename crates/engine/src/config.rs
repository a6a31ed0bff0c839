//! Engine configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Cache
//! - `PRICING_CACHE_BACKEND` - `memory` or `redis` (default: memory)
//! - `PRICING_CACHE_TTL_SECS` - Lifetime of a cached cost summary (default: 600)
//! - `PRICING_CACHE_MAX_CAPACITY` - Entry limit of the memory backend (default: 10000)
//! - `PRICING_REDIS_URL` - Redis connection string (required for the redis backend)
//!
//! ## Store
//! - `PRICING_DATABASE_URL` - `PostgreSQL` connection string for the catalog
//!
//! ## Reads
//! - `PRICING_READ_TIMEOUT_MS` - Deadline applied to every read (default: none)
//!
//! ## Fallback pricing settings
//!
//! Used for tenants with no stored settings:
//! - `PRICING_DEFAULT_LABOR_COST_PER_MINUTE` (default: 0)
//! - `PRICING_DEFAULT_PACKAGING_COST` (default: 0)
//! - `PRICING_DEFAULT_MARGIN_PERCENT` (default: 30)
//! - `PRICING_DEFAULT_FIXED_MONTHLY_COSTS` (default: 0)
//! - `PRICING_DEFAULT_VARIABLE_COST_PERCENT` (default: 0)
//! - `PRICING_DEFAULT_SALES_VOLUME` (optional)
//! - `PRICING_DEFAULT_TAX_RATE` (optional)

use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;

use crate::models::PricingSettings;

const DEFAULT_CACHE_TTL_SECS: &str = "600";
const DEFAULT_CACHE_MAX_CAPACITY: &str = "10000";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Which cache backend to build.
#[derive(Clone)]
pub enum CacheBackendConfig {
    /// In-process `moka` cache.
    Memory {
        /// Maximum number of entries.
        max_capacity: u64,
    },
    /// Shared Redis instance.
    Redis {
        /// Connection string.
        url: SecretString,
    },
}

impl std::fmt::Debug for CacheBackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory { max_capacity } => f
                .debug_struct("Memory")
                .field("max_capacity", max_capacity)
                .finish(),
            Self::Redis { .. } => f.debug_struct("Redis").field("url", &"[REDACTED]").finish(),
        }
    }
}

/// Cost cache settings.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Backend to use.
    pub backend: CacheBackendConfig,
    /// Lifetime of a cached summary.
    pub ttl: Duration,
}

/// Engine configuration.
///
/// Implements `Debug` manually to redact connection strings.
#[derive(Clone)]
pub struct EngineConfig {
    /// Cost cache settings.
    pub cache: CacheConfig,
    /// Catalog database connection string, if the catalog lives in `PostgreSQL`.
    pub database_url: Option<SecretString>,
    /// Deadline applied to reads that don't carry their own.
    pub read_timeout: Option<Duration>,
    /// Settings used for tenants with none stored.
    pub fallback_settings: PricingSettings,
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("cache", &self.cache)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("read_timeout", &self.read_timeout)
            .field("fallback_settings", &self.fallback_settings)
            .finish()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig {
                backend: CacheBackendConfig::Memory {
                    max_capacity: 10_000,
                },
                ttl: crate::cache::DEFAULT_CACHE_TTL,
            },
            database_url: None,
            read_timeout: None,
            fallback_settings: PricingSettings::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value
    /// does not parse.
    pub fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let backend = match env.get_or_default("PRICING_CACHE_BACKEND", "memory").as_str() {
            "memory" => CacheBackendConfig::Memory {
                max_capacity: env
                    .parse_or_default("PRICING_CACHE_MAX_CAPACITY", DEFAULT_CACHE_MAX_CAPACITY)?,
            },
            "redis" => CacheBackendConfig::Redis {
                url: SecretString::from(env.get_required("PRICING_REDIS_URL")?),
            },
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "PRICING_CACHE_BACKEND".to_string(),
                    format!("expected memory or redis, got {other}"),
                ));
            }
        };
        let ttl_secs: u64 = env.parse_or_default("PRICING_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?;
        if ttl_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "PRICING_CACHE_TTL_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let database_url = env.get_optional("PRICING_DATABASE_URL").map(SecretString::from);
        let read_timeout = env
            .parse_optional::<u64>("PRICING_READ_TIMEOUT_MS")?
            .map(Duration::from_millis);

        let defaults = PricingSettings::default();
        let fallback_settings = PricingSettings {
            labor_cost_per_minute: env
                .parse_optional::<Decimal>("PRICING_DEFAULT_LABOR_COST_PER_MINUTE")?
                .unwrap_or(defaults.labor_cost_per_minute),
            default_packaging_cost: env
                .parse_optional::<Decimal>("PRICING_DEFAULT_PACKAGING_COST")?
                .unwrap_or(defaults.default_packaging_cost),
            default_margin_percent: env
                .parse_optional::<Decimal>("PRICING_DEFAULT_MARGIN_PERCENT")?
                .unwrap_or(defaults.default_margin_percent),
            fixed_monthly_costs: env
                .parse_optional::<Decimal>("PRICING_DEFAULT_FIXED_MONTHLY_COSTS")?
                .unwrap_or(defaults.fixed_monthly_costs),
            variable_cost_percent: env
                .parse_optional::<Decimal>("PRICING_DEFAULT_VARIABLE_COST_PERCENT")?
                .unwrap_or(defaults.variable_cost_percent),
            default_sales_volume: env.parse_optional("PRICING_DEFAULT_SALES_VOLUME")?,
            default_tax_rate: env.parse_optional("PRICING_DEFAULT_TAX_RATE")?,
        };

        Ok(Self {
            cache: CacheConfig {
                backend,
                ttl: Duration::from_secs(ttl_secs),
            },
            database_url,
            read_timeout,
            fallback_settings,
        })
    }
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get_required(&self, key: &str) -> Result<String, ConfigError> {
        (self.0)(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn get_optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn get_or_default(&self, key: &str, default: &str) -> String {
        self.get_optional(key)
            .unwrap_or_else(|| default.to_string())
    }

    fn parse_or_default<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        parse(key, &self.get_or_default(key, default))
    }

    fn parse_optional<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get_optional(key).map(|v| parse(key, &v)).transpose()
    }
}

fn parse<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<EngineConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        EngineConfig::from_source(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();

        assert!(matches!(
            config.cache.backend,
            CacheBackendConfig::Memory {
                max_capacity: 10_000
            }
        ));
        assert_eq!(config.cache.ttl, Duration::from_secs(600));
        assert!(config.database_url.is_none());
        assert!(config.read_timeout.is_none());
        assert_eq!(config.fallback_settings, PricingSettings::default());
    }

    #[test]
    fn test_redis_backend_requires_url() {
        let err = load(&[("PRICING_CACHE_BACKEND", "redis")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "PRICING_REDIS_URL"));

        let config = load(&[
            ("PRICING_CACHE_BACKEND", "redis"),
            ("PRICING_REDIS_URL", "redis://127.0.0.1:6379"),
        ])
        .unwrap();
        match config.cache.backend {
            CacheBackendConfig::Redis { url } => {
                assert_eq!(url.expose_secret(), "redis://127.0.0.1:6379");
            }
            CacheBackendConfig::Memory { .. } => panic!("expected redis backend"),
        }
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let err = load(&[("PRICING_CACHE_BACKEND", "memcached")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(..)));
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        assert!(load(&[("PRICING_CACHE_TTL_SECS", "ten")]).is_err());
        assert!(load(&[("PRICING_CACHE_TTL_SECS", "0")]).is_err());
        assert!(load(&[("PRICING_READ_TIMEOUT_MS", "-5")]).is_err());
        assert!(load(&[("PRICING_DEFAULT_MARGIN_PERCENT", "thirty")]).is_err());
    }

    #[test]
    fn test_fallback_settings_from_env() {
        let config = load(&[
            ("PRICING_DEFAULT_LABOR_COST_PER_MINUTE", "0.65"),
            ("PRICING_DEFAULT_MARGIN_PERCENT", "45"),
            ("PRICING_DEFAULT_TAX_RATE", "8.25"),
            ("PRICING_READ_TIMEOUT_MS", "250"),
        ])
        .unwrap();

        assert_eq!(
            config.fallback_settings.labor_cost_per_minute,
            Decimal::new(65, 2)
        );
        assert_eq!(
            config.fallback_settings.default_margin_percent,
            Decimal::new(45, 0)
        );
        assert_eq!(
            config.fallback_settings.default_tax_rate,
            Some(Decimal::new(825, 2))
        );
        assert!(config.fallback_settings.default_sales_volume.is_none());
        assert_eq!(config.read_timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_debug_redacts_urls() {
        let config = load(&[
            ("PRICING_CACHE_BACKEND", "redis"),
            ("PRICING_REDIS_URL", "redis://:hunter2@cache:6379"),
            ("PRICING_DATABASE_URL", "postgres://app:hunter2@db/pricing"),
        ])
        .unwrap();

        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }
}
