/// Tavola Order Service
///
/// REST backend for catalog browsing, cart management, checkout and order
/// tracking. Protected routes authenticate through the shared JWT middleware;
/// catalog reads are served through the Redis response cache and invalidated
/// when the catalog changes.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers (users, food, cart, orders)
/// - `models`: Domain data structures
/// - `store`: In-process repositories backing the handlers
/// - `routes`: Route table wiring middleware and handlers
/// - `password`: Argon2id password hashing
/// - `error`: Error types and HTTP mapping
/// - `config`: Configuration management
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod password;
pub mod routes;
pub mod store;

pub use config::Config;
pub use error::{AppError, Result};
