//! postman-executor - manifest-driven integration test runner
//!
//! This library validates a YAML manifest of seed data and Postman
//! collections, turns it into an ordered execution plan, and runs that plan
//! against MongoDB and a live server.

pub mod cli;
pub mod commands;
pub mod common;
pub mod executor;
pub mod manifest;
pub mod plan;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use manifest::{DataSpec, SeedFile, TestSpec, ValidatedManifest};
pub use plan::{ExecutionPlan, ExecutionPlanEntry};
