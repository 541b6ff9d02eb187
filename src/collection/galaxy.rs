//! Reading `galaxy.yml`.

use crate::error::{MigrateError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::CollectionName;

/// The identifying fields of a collection manifest.
///
/// Missing fields deserialize to `None`; callers decide whether that matters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Galaxy {
    pub namespace: Option<String>,
    pub name: Option<String>,
}

impl Galaxy {
    /// Both fields as a [`CollectionName`], if the manifest has them.
    pub fn collection_name(&self) -> Option<CollectionName> {
        match (&self.namespace, &self.name) {
            (Some(namespace), Some(name)) => Some(CollectionName::new(namespace, name)),
            _ => None,
        }
    }
}

/// Reads `<path>/galaxy.yml`.
///
/// # Errors
///
/// - `NotFound`: the manifest does not exist
/// - `Yaml`: the manifest is not valid YAML
pub fn identify(path: &Path) -> Result<Galaxy> {
    let galaxy_path = path.join("galaxy.yml");
    if !galaxy_path.is_file() {
        return Err(MigrateError::NotFound(galaxy_path));
    }

    let content = fs::read_to_string(&galaxy_path)?;
    let value: serde_yaml::Value = serde_yaml::from_str(&content)?;
    if value.is_null() {
        return Ok(Galaxy::default());
    }

    let galaxy: Galaxy = serde_yaml::from_value(value)?;
    log::debug!(
        "Identified {} as {:?}.{:?}",
        galaxy_path.display(),
        galaxy.namespace,
        galaxy.name
    );
    Ok(galaxy)
}
