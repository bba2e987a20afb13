//! Query modules, one per entity.

pub mod jobs;
pub mod settings;
