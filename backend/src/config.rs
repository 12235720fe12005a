//! Configuration management for the RetailHub distribution service
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with RH_ prefix
//!
//! `jwt.secret` has no default and must come from a file or `RH__JWT__SECRET`.

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::NumberingStrategy;
use uuid::Uuid;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT validation configuration
    pub jwt: JwtConfig,

    /// Distribution engine settings
    pub distribution: DistributionConfig,

    /// Outbound notification settings
    #[serde(default)]
    pub notifications: NotificationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret shared with the identity provider for HS256 tokens
    pub secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DistributionConfig {
    /// The warehouse every shipment is drawn from
    pub warehouse_id: Uuid,

    /// Give rejected units back to the warehouse
    pub restore_on_reject: bool,

    /// Batch id strategy
    pub numbering: NumberingStrategy,

    /// Page size when the caller does not ask for one
    pub default_page_size: u32,

    /// Upper bound on requested page sizes
    pub max_page_size: u32,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct NotificationConfig {
    /// Receives a signed JSON POST per notification when set
    pub webhook_url: Option<String>,

    /// HMAC-SHA256 key for the `X-Signature` header
    pub webhook_secret: Option<String>,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("RH_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("distribution.restore_on_reject", false)?
            .set_default("distribution.numbering", "sequential")?
            .set_default("distribution.default_page_size", 20)?
            .set_default("distribution.max_page_size", 100)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (RH_ prefix)
            .add_source(
                Environment::with_prefix("RH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Settings the service cannot run safely without
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.trim().is_empty() {
            return Err(ConfigError::Message("jwt.secret must be set".to_string()));
        }
        if self.environment != "development" && self.jwt.secret == DEVELOPMENT_JWT_SECRET {
            return Err(ConfigError::Message(format!(
                "jwt.secret still holds the development key in {}",
                self.environment
            )));
        }
        Ok(())
    }
}

/// Key shipped in `config/development.toml`
const DEVELOPMENT_JWT_SECRET: &str = "development-secret-key";
