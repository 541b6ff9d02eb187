//! Loading and dumping the YAML documents a collection carries.
//!
//! Output always starts with an explicit `---` so ansible-lint accepts it.
//! Comments and quoting of the input are not preserved.

use crate::error::{MigrateError, Result};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

/// Reads and parses a YAML file.
///
/// # Errors
///
/// - `NotFound`: the file does not exist
/// - `Yaml`: the content does not parse
pub fn load(path: &Path) -> Result<Value> {
    if !path.is_file() {
        return Err(MigrateError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

/// Serializes `value` as a document with an explicit start marker.
pub fn dump(value: &Value) -> Result<String> {
    let body = serde_yaml::to_string(value)?;
    Ok(if body.starts_with("---") {
        body
    } else {
        format!("---\n{body}")
    })
}

/// Like [`dump`], with blank lines removed.
pub fn dump_compact(value: &Value) -> Result<String> {
    let mut content: String = dump(value)?
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    content.push('\n');
    Ok(content)
}

/// Rebuilds `mapping` with its keys in ascending order.
pub fn sort_mapping(mapping: &mut Mapping) {
    let mut entries: Vec<(Value, Value)> = std::mem::take(mapping).into_iter().collect();
    entries.sort_by(|(a, _), (b, _)| key_string(a).cmp(&key_string(b)));
    mapping.extend(entries);
}

fn key_string(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
