//! File system operations with transaction support.
//!
//! Provides file writes that can be committed or rolled back as a unit,
//! plus the YAML load/dump conventions shared by the rewriting steps.

pub mod transaction;
pub mod yaml;

pub use transaction::{Operation, Transaction};
