//! Utility modules for the build pipeline.

pub mod category;
pub mod exec;
pub mod fs;
