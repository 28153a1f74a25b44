//! [`Config`]-related definitions.

use std::time;

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use serde::Deserialize;
use service::{
    domain::Product,
    infra::{catalog, postgres},
};
use smart_default::SmartDefault;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Postgres configuration.
    pub postgres: Postgres,

    /// Catalog configuration.
    pub catalog: Catalog,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Catalog configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Catalog {
    /// [`Product`]s of the catalog replacing the default ones.
    pub products: Option<Vec<Product>>,
}

impl From<Catalog> for catalog::Seeded {
    fn from(value: Catalog) -> Self {
        value.products.map_or_else(Self::default, Self::new)
    }
}

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[default("postgres".to_owned())]
    pub password: String,

    /// Database name to connect to.
    #[default("postgres".to_owned())]
    pub dbname: String,

    /// Maximum number of pooled connections.
    #[default(16)]
    pub pool_size: usize,

    /// Maximum time to wait for a pooled connection.
    #[default(time::Duration::from_secs(5))]
    #[serde(with = "humantime_serde")]
    pub pool_wait: time::Duration,

    /// Maximum time of a single statement execution.
    #[default(time::Duration::from_secs(5))]
    #[serde(with = "humantime_serde")]
    pub query_timeout: time::Duration,
}

impl From<Postgres> for postgres::Config {
    fn from(value: Postgres) -> Self {
        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
            pool_size,
            pool_wait,
            query_timeout: _,
        } = value;

        let mut pool = postgres::PoolConfig::new(pool_size);
        pool.timeouts.wait = Some(pool_wait);

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            pool: Some(pool),
            ..Self::default()
        }
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use service::infra::catalog;

    use super::Config;

    #[test]
    fn falls_back_to_defaults() {
        let conf = Config::new("non-existent.toml").unwrap();

        assert_eq!(conf.postgres.pool_size, 16);
        assert_eq!(conf.postgres.query_timeout, Duration::from_secs(5));
        assert_eq!(catalog::Seeded::from(conf.catalog).products().len(), 2);
    }

    fn from_toml(toml: &str) -> Result<Config, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    #[test]
    fn reads_catalog_products() {
        let conf = from_toml(
            r#"
            [[catalog.products]]
            id = "5c0b7e2e-3f0a-4c1e-9b6a-1d2f3e4a5b6c"
            title = "Green tea"
            price = "12.50"
            "#,
        )
        .unwrap();

        let seeded = catalog::Seeded::from(conf.catalog);
        let products = seeded.products();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].title.to_string(), "Green tea");
        assert_eq!(products[0].price.to_string(), "12.50");
    }

    #[test]
    fn rejects_negative_price() {
        let res = from_toml(
            r#"
            [[catalog.products]]
            id = "5c0b7e2e-3f0a-4c1e-9b6a-1d2f3e4a5b6c"
            title = "Green tea"
            price = "-1"
            "#,
        );

        assert!(res.is_err());
    }
}
