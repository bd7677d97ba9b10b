//! Database layer
//!
//! SQLite persistence for the site: a shared pool, code-embedded migrations
//! and one repository per entity.
//!
//! # Usage
//!
//! ```ignore
//! use orgsite::config::DatabaseConfig;
//! use orgsite::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool, Database, DbPool};
