//! Optional Redis connection.
//!
//! The service keeps no state in Redis. When `CACHE_MODE=redis` the pool is
//! created at startup and checked by the health endpoint.

use deadpool_redis::{Config, Pool, Runtime};
use thiserror::Error;

/// Errors raised by the Redis connection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The pool could not be created from the URL.
    #[error("Failed to create Redis pool: {0}")]
    Pool(String),

    /// A connection could not be checked out or a command failed.
    #[error("Redis unavailable: {0}")]
    Unavailable(String),
}

/// Pooled Redis connection.
#[derive(Clone)]
pub struct RedisCache {
    pool: Pool,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self.pool.status();
        formatter
            .debug_struct("RedisCache")
            .field("size", &status.size)
            .field("available", &status.available)
            .finish()
    }
}

impl RedisCache {
    /// Creates a pool from a Redis URL. No connection is opened yet.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Pool` if the URL is rejected.
    pub fn from_url(redis_url: &str) -> Result<Self, CacheError> {
        let pool = Config::from_url(redis_url)
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|error| CacheError::Pool(error.to_string()))?;
        Ok(Self { pool })
    }

    /// Sends `PING` over a pooled connection.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Unavailable` if Redis cannot be reached.
    pub async fn ping(&self) -> Result<(), CacheError> {
        let mut connection = self
            .pool
            .get()
            .await
            .map_err(|error| CacheError::Unavailable(error.to_string()))?;

        let reply: String = redis::cmd("PING")
            .query_async(&mut connection)
            .await
            .map_err(|error| CacheError::Unavailable(error.to_string()))?;

        if reply == "PONG" {
            Ok(())
        } else {
            Err(CacheError::Unavailable(format!("unexpected PING reply: {reply}")))
        }
    }
}
