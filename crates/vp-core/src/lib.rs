//! vp-core: shared types, IDs, errors, and configuration.
//!
//! This crate is the foundational dependency for all other vp-* crates,
//! providing the job domain enums, a type-safe job identifier, a unified
//! error type, and application configuration.

pub mod config;
pub mod error;
pub mod ids;
pub mod media;
pub mod urls;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use ids::JobId;
pub use media::{JobSource, JobStatus, Profile};
