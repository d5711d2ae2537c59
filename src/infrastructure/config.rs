//! Application settings loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `HOST`: Server host address (default: `0.0.0.0`)
//! - `PORT`: Server port (default: `8080`)
//! - `JWT_SECRET`: HMAC secret for access tokens (required)
//! - `JWT_TTL_SECONDS`: Access token lifetime (default: `86400`)
//! - `BCRYPT_COST`: bcrypt work factor, `4..=31` (default: `12`)
//! - `LOG_FORMAT`: `pretty` (default) | `json`
//!
//! Storage and cache variables are read by [`RepositoryConfig`].
//!
//! Every reader takes a lookup function so tests can supply variables
//! without touching the process environment.

use std::env::VarError;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use super::factory::RepositoryConfig;

/// Default token lifetime: 24 hours.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Accepted range for `BCRYPT_COST`.
const BCRYPT_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

// =============================================================================
// Error Types
// =============================================================================

/// Errors raised while reading or validating configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Invalid storage mode value.
    #[error("Invalid storage mode: '{0}'. Expected 'in_memory' or 'postgres'")]
    InvalidStorageMode(String),

    /// Invalid cache mode value.
    #[error("Invalid cache mode: '{0}'. Expected 'none' or 'redis'")]
    InvalidCacheMode(String),

    /// Missing `DATABASE_URL` when storage mode is Postgres.
    #[error("DATABASE_URL environment variable is required when STORAGE_MODE=postgres")]
    MissingDatabaseUrl,

    /// Missing `REDIS_URL` when cache mode is Redis.
    #[error("REDIS_URL environment variable is required when CACHE_MODE=redis")]
    MissingRedisUrl,

    /// Missing or empty `JWT_SECRET`.
    #[error("JWT_SECRET environment variable is required and must not be empty")]
    MissingJwtSecret,

    /// A variable is set but cannot be used.
    #[error("Invalid value for {name}: {message} (got '{value}')")]
    InvalidValue {
        /// Variable name.
        name: String,
        /// Why the value was rejected.
        message: String,
        /// Actual value.
        value: String,
    },
}

// =============================================================================
// Lookup Helpers
// =============================================================================

/// Reads a variable, treating unset and whitespace-only values as absent.
pub(crate) fn read_var<F>(lookup: &F, name: &str) -> Result<Option<String>, ConfigurationError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    match lookup(name) {
        Ok(value) => {
            let trimmed = value.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        Err(VarError::NotPresent) => Ok(None),
        Err(error @ VarError::NotUnicode(_)) => Err(ConfigurationError::InvalidValue {
            name: name.to_string(),
            message: error.to_string(),
            value: String::new(),
        }),
    }
}

/// Parses a variable, falling back to `default` when it is absent.
pub(crate) fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigurationError>
where
    F: Fn(&str) -> Result<String, VarError>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    read_var(lookup, name)?.map_or(Ok(default), |value| {
        value
            .parse()
            .map_err(|error: T::Err| ConfigurationError::InvalidValue {
                name: name.to_string(),
                message: error.to_string(),
                value,
            })
    })
}

// =============================================================================
// Server
// =============================================================================

/// Listener address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// Reads `HOST` and `PORT`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidValue` if `PORT` is not a valid port.
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let defaults = Self::default();
        Ok(Self {
            host: read_var(lookup, "HOST")?.unwrap_or(defaults.host),
            port: parse_var(lookup, "PORT", defaults.port)?,
        })
    }

    /// Resolves the socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidValue` if `host:port` is not an address.
    pub fn socket_address(&self) -> Result<SocketAddr, ConfigurationError> {
        let address = format!("{}:{}", self.host, self.port);
        address
            .parse()
            .map_err(|error: std::net::AddrParseError| ConfigurationError::InvalidValue {
                name: "HOST".to_string(),
                message: error.to_string(),
                value: address.clone(),
            })
    }
}

// =============================================================================
// Authentication
// =============================================================================

/// Token signing and password hashing settings.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub bcrypt_cost: u32,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

impl AuthConfig {
    /// Creates a configuration with the default lifetime and cost.
    #[must_use]
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_ttl: DEFAULT_TOKEN_TTL,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }

    #[must_use]
    pub const fn with_token_ttl(mut self, token_ttl: Duration) -> Self {
        self.token_ttl = token_ttl;
        self
    }

    #[must_use]
    pub const fn with_bcrypt_cost(mut self, bcrypt_cost: u32) -> Self {
        self.bcrypt_cost = bcrypt_cost;
        self
    }

    /// Reads `JWT_SECRET`, `JWT_TTL_SECONDS` and `BCRYPT_COST`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the secret is missing or a value is
    /// out of range.
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let jwt_secret =
            read_var(lookup, "JWT_SECRET")?.ok_or(ConfigurationError::MissingJwtSecret)?;
        let ttl_seconds = parse_var(lookup, "JWT_TTL_SECONDS", DEFAULT_TOKEN_TTL.as_secs())?;
        let bcrypt_cost = parse_var(lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST)?;

        let config = Self::new(jwt_secret)
            .with_token_ttl(Duration::from_secs(ttl_seconds))
            .with_bcrypt_cost(bcrypt_cost);
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` for an empty secret, a zero lifetime or a
    /// bcrypt cost outside `4..=31`.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigurationError::MissingJwtSecret);
        }

        if self.token_ttl.is_zero() {
            return Err(ConfigurationError::InvalidValue {
                name: "JWT_TTL_SECONDS".to_string(),
                message: "must be greater than zero".to_string(),
                value: "0".to_string(),
            });
        }

        if !BCRYPT_COST_RANGE.contains(&self.bcrypt_cost) {
            return Err(ConfigurationError::InvalidValue {
                name: "BCRYPT_COST".to_string(),
                message: format!(
                    "must be between {} and {}",
                    BCRYPT_COST_RANGE.start(),
                    BCRYPT_COST_RANGE.end()
                ),
                value: self.bcrypt_cost.to_string(),
            });
        }

        Ok(())
    }
}

// =============================================================================
// Logging
// =============================================================================

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "pretty" | "text" | "plain" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err("expected 'pretty' or 'json'".to_string()),
        }
    }
}

// =============================================================================
// Application Settings
// =============================================================================

/// Everything `main` needs to start the service.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub repository: RepositoryConfig,
    pub log_format: LogFormat,
}

impl AppSettings {
    /// Reads all settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigurationError` encountered.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(&|name: &str| std::env::var(name))
    }

    /// Reads all settings through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigurationError` encountered.
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        Ok(Self {
            server: ServerConfig::from_lookup(lookup)?,
            auth: AuthConfig::from_lookup(lookup)?,
            repository: RepositoryConfig::from_lookup(lookup)?,
            log_format: parse_var(lookup, "LOG_FORMAT", LogFormat::default())?,
        })
    }
}
