//! Path conventions inside a collection checkout.
//!
//! Relative paths use forward slashes because they double as git pathspecs
//! and as the prefixes written in sanity ignore files.

use std::path::{Path, PathBuf};

pub const RUNTIME_FILE: &str = "meta/runtime.yml";
pub const FRAGMENTS_DIR: &str = "changelogs/fragments";
pub const SANITY_DIR: &str = "tests/sanity";

/// `plugins/modules/<module>.py`
pub fn module_file(module: &str) -> String {
    format!("plugins/modules/{module}.py")
}

/// `tests/integration/targets/<target>/`
pub fn target_dir(target: &str) -> String {
    format!("tests/integration/targets/{target}/")
}

/// Prefixes of every path that moves with a migration.
///
/// Each module brings its own same-named integration target along, in
/// addition to the explicitly listed targets.
pub fn migrated_prefixes(modules: &[String], integration_tests: &[String]) -> Vec<String> {
    let mut prefixes: Vec<String> = modules.iter().map(|m| module_file(m)).collect();
    for target in modules.iter().chain(integration_tests) {
        let dir = target_dir(target);
        if !prefixes.contains(&dir) {
            prefixes.push(dir);
        }
    }
    prefixes
}

pub fn module_path(root: &Path, module: &str) -> PathBuf {
    root.join(module_file(module))
}

pub fn target_path(root: &Path, target: &str) -> PathBuf {
    root.join("tests/integration/targets").join(target)
}

pub fn runtime_path(root: &Path) -> PathBuf {
    root.join(RUNTIME_FILE)
}

pub fn sanity_path(root: &Path) -> PathBuf {
    root.join(SANITY_DIR)
}

/// Changelog fragment named after the migrated modules, e.g. `migrate_foo_bar.yml`.
pub fn fragment_path(root: &Path, modules: &[String]) -> PathBuf {
    root.join(FRAGMENTS_DIR)
        .join(format!("migrate_{}.yml", modules.join("_")))
}

/// Version embedded in an `ignore-<version>.txt` file name.
pub fn ignore_file_version(file_name: &str) -> Option<&str> {
    file_name
        .strip_prefix("ignore-")
        .and_then(|rest| rest.strip_suffix(".txt"))
        .filter(|version| !version.is_empty())
}
