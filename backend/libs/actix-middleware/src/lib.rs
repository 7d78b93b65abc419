//! Shared HTTP middleware for Tavola services.
//!
//! - `JwtAuth`: credential extraction and verification in front of protected
//!   routes
//! - `CacheResponse`: read-through response caching for idempotent routes
//! - `compat`: adapter for handlers written against the legacy body contract

pub mod cache_response;
pub mod compat;
pub mod jwt_auth;

pub use cache_response::CacheResponse;
pub use jwt_auth::{JwtAuth, UserId};
