//! In-place rewrites of migrated sources and tests.

pub mod integration;
pub mod module;

pub use integration::{TestsUpdate, update_tests};
pub use module::{DEST_IMPORT, ModulePatterns, SOURCE_IMPORT, update_modules};
