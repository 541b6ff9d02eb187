//! Moving history between repositories as patch files.

pub mod apply;
pub mod export;
pub mod filter;

pub use apply::{ApplyOutcome, apply_patches};
pub use export::{CommitQueue, ExportOutcome, ExportRequest, create_patches};
