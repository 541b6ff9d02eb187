//! Validation and verification before a migration step runs.

pub mod preflight;
pub mod rules;

pub use preflight::{
    check_clean, check_collection, check_git_available, check_modules_exist, check_work_tree,
};
pub use rules::{validate_branch_name, validate_module_name, validate_selection, validate_target_name};
