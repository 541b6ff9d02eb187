//! Dropping a collection from the `collections:` keyword of integration tests.
//!
//! Once a module lives in the collection under test, its targets no longer
//! need to declare that collection. Every `*.yml` below each target is
//! parsed as a list of plays or tasks; each mapping whose `collections`
//! list names the collection loses that entry, and an emptied list is
//! removed altogether.

use crate::collection::layout;
use crate::error::Result;
use crate::fs::{Transaction, yaml};
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};

const COLLECTIONS_KEY: &str = "collections";

/// Result of rewriting the targets of one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TestsUpdate {
    pub changed: bool,
    pub files: Vec<PathBuf>,
}

/// Removes `collection` from one task mapping. Returns whether it changed.
pub fn strip_collection(task: &mut Mapping, collection: &str) -> bool {
    let Some(Value::Sequence(names)) = task.get_mut(COLLECTIONS_KEY) else {
        return false;
    };
    if names.is_empty() {
        return false;
    }

    let before = names.len();
    names.retain(|name| name.as_str() != Some(collection));
    let mut updated = names.len() != before;

    if names.is_empty() {
        task.remove(COLLECTIONS_KEY);
        updated = true;
    }
    updated
}

/// Applies [`strip_collection`] to every mapping of a parsed test file.
pub fn strip_document(document: &mut Value, collection: &str) -> bool {
    let Value::Sequence(items) = document else {
        return false;
    };

    let mut updated = false;
    for item in items.iter_mut() {
        if let Value::Mapping(task) = item {
            updated |= strip_collection(task, collection);
        }
    }
    updated
}

/// `*.yml` files below a target directory, sorted.
fn target_files(target_dir: &Path) -> Vec<PathBuf> {
    if !target_dir.is_dir() {
        log::debug!("No test target at {}", target_dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = ignore::WalkBuilder::new(target_dir)
        .standard_filters(false)
        .build()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                log::debug!("Skipping entry due to error: {}", e);
                None
            }
        })
        .filter(|e| e.file_type().is_some_and(|ft| ft.is_file()))
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("yml"))
        .collect();
    files.sort();
    files
}

/// Stages the rewrite of every test file of the given targets.
pub fn update_tests(
    collection_path: &Path,
    collection: &str,
    targets: &[String],
    txn: &mut Transaction,
) -> Result<TestsUpdate> {
    let mut update = TestsUpdate::default();

    for target in targets {
        for file in target_files(&layout::target_path(collection_path, target)) {
            let content = fs::read_to_string(&file)?;
            let mut document: Value = serde_yaml::from_str(&content)?;

            if strip_document(&mut document, collection) {
                log::info!("Dropping {} from {}", collection, file.display());
                txn.update_file(file.clone(), yaml::dump(&document)?)?;
                update.files.push(file);
                update.changed = true;
            }
        }
    }

    Ok(update)
}
