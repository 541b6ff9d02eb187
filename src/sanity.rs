//! Moving sanity-test ignore entries between collections.
//!
//! Each `tests/sanity/ignore-<version>.txt` of the source collection is
//! split into the lines that concern migrated paths and the rest. Migrated
//! lines are appended to the destination's file of the same version.

use crate::collection::layout;
use crate::error::Result;
use crate::fs::Transaction;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize)]
pub struct IgnoreUpdate {
    pub changed: bool,
    /// Every version that has a source ignore file.
    pub versions: Vec<String>,
    /// Versions whose files changed.
    pub changed_versions: Vec<String>,
    pub src_files: Vec<PathBuf>,
    pub dest_files: Vec<PathBuf>,
}

/// Splits `content` into (kept, moved) non-empty lines.
pub fn partition_lines<'a>(content: &'a str, prefixes: &[String]) -> (Vec<&'a str>, Vec<&'a str>) {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .partition(|line| !prefixes.iter().any(|p| line.starts_with(p.as_str())))
}

fn join_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Source ignore files, sorted by name, with their version.
fn ignore_files(sanity_dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(sanity_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(version) = layout::ignore_file_version(&name) {
            files.push((version.to_string(), entry.path()));
        }
    }
    files.sort();
    Ok(files)
}

/// Stages the move of every ignore entry for the migrated paths.
///
/// A source collection without `tests/sanity` has nothing to move.
pub fn refresh_ignore(
    src: &Path,
    dest: &Path,
    modules: &[String],
    integration_tests: &[String],
    txn: &mut Transaction,
) -> Result<IgnoreUpdate> {
    let src_sanity = layout::sanity_path(src);
    if !src_sanity.is_dir() {
        log::debug!("No sanity ignores at {}", src_sanity.display());
        return Ok(IgnoreUpdate::default());
    }
    let dest_sanity = layout::sanity_path(dest);
    let prefixes = layout::migrated_prefixes(modules, integration_tests);

    let mut update = IgnoreUpdate::default();
    for (version, src_file) in ignore_files(&src_sanity)? {
        update.versions.push(version.clone());

        let content = fs::read_to_string(&src_file)?;
        let (kept, moved) = partition_lines(&content, &prefixes);
        if moved.is_empty() {
            continue;
        }
        log::info!(
            "Moving {} entries of ignore-{}.txt to {}",
            moved.len(),
            version,
            dest.display()
        );

        let dest_file = dest_sanity.join(format!("ignore-{version}.txt"));
        let existing = if dest_file.is_file() {
            fs::read_to_string(&dest_file)?
        } else {
            String::new()
        };
        let merged = existing
            .lines()
            .filter(|line| !line.trim().is_empty())
            .chain(moved.iter().copied());

        txn.update_file(src_file.clone(), join_lines(kept))?;
        txn.write_file(dest_file.clone(), join_lines(merged))?;

        update.changed = true;
        update.changed_versions.push(version);
        update.src_files.push(src_file);
        update.dest_files.push(dest_file);
    }

    Ok(update)
}
