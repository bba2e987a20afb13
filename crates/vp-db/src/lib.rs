//! vp-db: database access and persistence layer.
//!
//! SQLite-backed storage with connection pooling, embedded migrations, typed
//! models, and query modules for jobs and user settings.

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
