//! Cache error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Backend unreachable or the cache has been disabled for this process
    #[error("cache backend unavailable")]
    Unavailable,
}

pub type CacheResult<T> = Result<T, CacheError>;
