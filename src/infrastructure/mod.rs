//! Infrastructure module for external services.
//!
//! This module contains the repositories, configuration loading, the
//! optional Redis connection and the credential services.

pub mod cache;
pub mod config;
pub mod factory;
pub mod in_memory;
pub mod password;
pub mod postgres;
pub mod repository;
pub mod token;

pub use cache::{CacheError, RedisCache};
pub use config::{AppSettings, AuthConfig, ConfigurationError, LogFormat, ServerConfig};
pub use factory::{
    CacheMode, FactoryError, Repositories, RepositoryConfig, RepositoryConfigBuilder,
    RepositoryFactory, Storage, StorageMode,
};
pub use in_memory::{
    InMemoryDatabase, InMemoryProjectRepository, InMemoryTaskRepository, InMemoryUserRepository,
};
pub use password::{PasswordError, PasswordHasher};
pub use postgres::{PostgresProjectRepository, PostgresTaskRepository, PostgresUserRepository};
pub use repository::{
    ProjectRepository, RepositoryError, RepositoryFuture, TaskRepository, UserRepository,
};
pub use token::{TokenError, TokenService};
