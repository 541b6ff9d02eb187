//! Collection metadata: `meta/runtime.yml` and changelog fragments.

pub mod changelog;
pub mod runtime;

pub use runtime::{Merge, Runtime, RuntimeRequest, RuntimeUpdate, update_runtime};
