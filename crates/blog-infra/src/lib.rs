//! # Blog Infrastructure
//!
//! Concrete implementations of the ports defined in `blog-core`.
//! This crate contains post storage and CSRF token handling.
//!
//! ## Feature Flags
//!
//! - `postgres` (default) - SeaORM repository and schema migrations
//! - `minimal` - No external dependencies, in-memory only

pub mod csrf;
pub mod database;

// Re-exports - In-Memory
pub use csrf::HmacCsrfTokenManager;
pub use database::{DatabaseConfig, InMemoryPostRepository};

#[cfg(feature = "postgres")]
pub use database::PostgresPostRepository;
