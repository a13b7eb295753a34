//! Common utilities shared by validation and execution

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{EntryKind, Error, Result};
