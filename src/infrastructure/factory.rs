//! Repository factory for runtime backend selection.
//!
//! Selects the in-memory or `PostgreSQL` backend from configuration and
//! optionally connects to Redis.
//!
//! # Environment Variables
//!
//! - `STORAGE_MODE`: `in_memory` (default) | `postgres`
//! - `DATABASE_URL`: `PostgreSQL` connection URL (required when `STORAGE_MODE=postgres`)
//! - `DATABASE_MAX_CONNECTIONS`: pool size (default: `10`)
//! - `CACHE_MODE`: `none` (default) | `redis`
//! - `REDIS_URL`: Redis connection URL (required when `CACHE_MODE=redis`)
//!
//! # Example
//!
//! ```ignore
//! let settings = AppSettings::from_env()?;
//! let repositories = RepositoryFactory::new(settings.repository).create().await?;
//! let projects = repositories.project_repository.list_by_owner(&user_id).await?;
//! ```

use std::env::VarError;
use std::str::FromStr;
use std::sync::Arc;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use super::cache::{CacheError, RedisCache};
use super::config::{ConfigurationError, parse_var, read_var};
use super::{
    InMemoryDatabase, PostgresProjectRepository, PostgresTaskRepository, PostgresUserRepository,
    ProjectRepository, RepositoryError, TaskRepository, UserRepository,
};

const DEFAULT_MAX_CONNECTIONS: u32 = 10;

// =============================================================================
// Configuration Types
// =============================================================================

/// Storage mode for persistent data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    /// Process-local tables. Suitable for testing and development.
    #[default]
    InMemory,
    /// `PostgreSQL` storage for production use.
    Postgres,
}

impl StorageMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InMemory => "in_memory",
            Self::Postgres => "postgres",
        }
    }
}

impl FromStr for StorageMode {
    type Err = ConfigurationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            _ => Err(ConfigurationError::InvalidStorageMode(value.to_string())),
        }
    }
}

/// Whether a Redis connection is maintained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    #[default]
    None,
    Redis,
}

impl CacheMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Redis => "redis",
        }
    }
}

impl FromStr for CacheMode {
    type Err = ConfigurationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "none" | "off" | "disabled" => Ok(Self::None),
            "redis" => Ok(Self::Redis),
            _ => Err(ConfigurationError::InvalidCacheMode(value.to_string())),
        }
    }
}

/// Configuration for the repository factory.
///
/// Use `RepositoryConfigBuilder` for a fluent API to construct this.
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    pub storage_mode: StorageMode,
    pub cache_mode: CacheMode,
    /// `PostgreSQL` connection URL (required when `storage_mode` is `Postgres`).
    pub database_url: Option<String>,
    /// Redis connection URL (required when `cache_mode` is `Redis`).
    pub redis_url: Option<String>,
    pub max_connections: u32,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            storage_mode: StorageMode::default(),
            cache_mode: CacheMode::default(),
            database_url: None,
            redis_url: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl RepositoryConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> RepositoryConfigBuilder {
        RepositoryConfigBuilder::default()
    }

    /// Creates a configuration through a variable lookup function, such as
    /// `std::env::var`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if:
    /// - `STORAGE_MODE` or `CACHE_MODE` contains an invalid value
    /// - `DATABASE_URL` is missing when `STORAGE_MODE=postgres`
    /// - `REDIS_URL` is missing when `CACHE_MODE=redis`
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let storage_mode = read_var(lookup, "STORAGE_MODE")?
            .map(|value| value.parse::<StorageMode>())
            .transpose()?
            .unwrap_or_default();
        let cache_mode = read_var(lookup, "CACHE_MODE")?
            .map(|value| value.parse::<CacheMode>())
            .transpose()?
            .unwrap_or_default();

        let config = Self {
            storage_mode,
            cache_mode,
            database_url: read_var(lookup, "DATABASE_URL")?,
            redis_url: read_var(lookup, "REDIS_URL")?,
            max_connections: parse_var(
                lookup,
                "DATABASE_MAX_CONNECTIONS",
                DEFAULT_MAX_CONNECTIONS,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if required URLs are missing for the
    /// selected modes or the pool size is zero.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.storage_mode == StorageMode::Postgres && self.database_url.is_none() {
            return Err(ConfigurationError::MissingDatabaseUrl);
        }

        if self.cache_mode == CacheMode::Redis && self.redis_url.is_none() {
            return Err(ConfigurationError::MissingRedisUrl);
        }

        if self.max_connections == 0 {
            return Err(ConfigurationError::InvalidValue {
                name: "DATABASE_MAX_CONNECTIONS".to_string(),
                message: "must be greater than zero".to_string(),
                value: "0".to_string(),
            });
        }

        Ok(())
    }
}

/// Builder for `RepositoryConfig`.
#[derive(Debug, Clone, Default)]
pub struct RepositoryConfigBuilder {
    config: RepositoryConfig,
}

impl RepositoryConfigBuilder {
    #[must_use]
    pub const fn storage_mode(mut self, mode: StorageMode) -> Self {
        self.config.storage_mode = mode;
        self
    }

    #[must_use]
    pub const fn cache_mode(mut self, mode: CacheMode) -> Self {
        self.config.cache_mode = mode;
        self
    }

    #[must_use]
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn redis_url(mut self, url: impl Into<String>) -> Self {
        self.config.redis_url = Some(url.into());
        self
    }

    #[must_use]
    pub const fn max_connections(mut self, max_connections: u32) -> Self {
        self.config.max_connections = max_connections;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the configuration is invalid.
    pub fn build(self) -> Result<RepositoryConfig, ConfigurationError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during factory initialization.
#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Database connection error: {0}")]
    DatabaseConnection(String),

    #[error("Database migration error: {0}")]
    Migration(String),

    #[error("Redis connection error: {0}")]
    RedisConnection(#[from] CacheError),
}

// =============================================================================
// Storage Handle
// =============================================================================

/// Backend behind the repositories, kept for health checks and shutdown.
#[derive(Debug, Clone)]
pub enum Storage {
    InMemory(InMemoryDatabase),
    Postgres(PgPool),
}

impl Storage {
    #[must_use]
    pub const fn mode(&self) -> StorageMode {
        match self {
            Self::InMemory(_) => StorageMode::InMemory,
            Self::Postgres(_) => StorageMode::Postgres,
        }
    }

    /// Checks that the backend answers queries.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DatabaseError` if `SELECT 1` fails.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        match self {
            Self::InMemory(_) => Ok(()),
            Self::Postgres(pool) => sqlx::query("SELECT 1")
                .execute(pool)
                .await
                .map(|_| ())
                .map_err(|error| RepositoryError::DatabaseError(error.to_string())),
        }
    }

    /// Closes pooled connections. A no-op for the in-memory backend.
    pub async fn close(&self) {
        if let Self::Postgres(pool) = self {
            pool.close().await;
        }
    }
}

// =============================================================================
// Repository Factory
// =============================================================================

/// Collection of initialized repositories.
#[derive(Clone)]
pub struct Repositories {
    pub user_repository: Arc<dyn UserRepository + Send + Sync>,
    pub project_repository: Arc<dyn ProjectRepository + Send + Sync>,
    pub task_repository: Arc<dyn TaskRepository + Send + Sync>,
    pub storage: Storage,
    pub cache: Option<RedisCache>,
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Repositories")
            .field("user_repository", &"Arc<dyn UserRepository>")
            .field("project_repository", &"Arc<dyn ProjectRepository>")
            .field("task_repository", &"Arc<dyn TaskRepository>")
            .field("storage", &self.storage.mode())
            .field("cache", &self.cache)
            .finish()
    }
}

impl Repositories {
    /// Repositories over a fresh in-memory database, without a cache.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_in_memory(InMemoryDatabase::new())
    }

    /// Repositories over an existing in-memory database.
    #[must_use]
    pub fn from_in_memory(database: InMemoryDatabase) -> Self {
        Self {
            user_repository: Arc::new(database.user_repository()),
            project_repository: Arc::new(database.project_repository()),
            task_repository: Arc::new(database.task_repository()),
            storage: Storage::InMemory(database),
            cache: None,
        }
    }

    /// `PostgreSQL`-backed repositories sharing one pool.
    #[must_use]
    pub fn from_postgres(pool: PgPool) -> Self {
        Self {
            user_repository: Arc::new(PostgresUserRepository::new(pool.clone())),
            project_repository: Arc::new(PostgresProjectRepository::new(pool.clone())),
            task_repository: Arc::new(PostgresTaskRepository::new(pool.clone())),
            storage: Storage::Postgres(pool),
            cache: None,
        }
    }

    #[must_use]
    pub fn with_cache(self, cache: RedisCache) -> Self {
        Self {
            cache: Some(cache),
            ..self
        }
    }
}

/// Factory for creating repository instances based on configuration.
#[derive(Debug, Clone)]
pub struct RepositoryFactory {
    config: RepositoryConfig,
}

impl RepositoryFactory {
    #[must_use]
    pub const fn new(config: RepositoryConfig) -> Self {
        Self { config }
    }

    /// Creates all repositories based on the configuration.
    ///
    /// For `PostgreSQL` the pending migrations are applied before any
    /// repository is handed out. An unreachable Redis server is logged but
    /// does not fail startup; the health endpoint reports it instead.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError` if:
    /// - Database connection or migration fails (when `storage_mode` is `Postgres`)
    /// - The Redis URL is rejected (when `cache_mode` is `Redis`)
    pub async fn create(&self) -> Result<Repositories, FactoryError> {
        let repositories = match self.config.storage_mode {
            StorageMode::InMemory => Repositories::in_memory(),
            StorageMode::Postgres => {
                let pool = self.create_postgres_pool().await?;
                Self::run_migrations(&pool).await?;
                Repositories::from_postgres(pool)
            }
        };

        match self.config.cache_mode {
            CacheMode::None => Ok(repositories),
            CacheMode::Redis => {
                let cache = self.create_redis_cache()?;
                if let Err(error) = cache.ping().await {
                    tracing::warn!(%error, "Redis is not reachable at startup");
                }
                Ok(repositories.with_cache(cache))
            }
        }
    }

    async fn create_postgres_pool(&self) -> Result<PgPool, FactoryError> {
        let database_url = self
            .config
            .database_url
            .as_ref()
            .ok_or(ConfigurationError::MissingDatabaseUrl)?;

        PgPoolOptions::new()
            .max_connections(self.config.max_connections)
            .connect(database_url)
            .await
            .map_err(|error| FactoryError::DatabaseConnection(error.to_string()))
    }

    async fn run_migrations(pool: &PgPool) -> Result<(), FactoryError> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(|error| FactoryError::Migration(error.to_string()))?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    fn create_redis_cache(&self) -> Result<RedisCache, FactoryError> {
        let redis_url = self
            .config
            .redis_url
            .as_ref()
            .ok_or(ConfigurationError::MissingRedisUrl)?;

        Ok(RedisCache::from_url(redis_url)?)
    }
}
