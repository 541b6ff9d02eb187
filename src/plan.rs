//! Migration plans for the `run` pipeline.
//!
//! ```toml
//! [source]
//! path = "~/collections/ansible_collections/community/aws"
//!
//! [destination]
//! path = "~/collections/ansible_collections/amazon/aws"
//!
//! [migration]
//! modules = ["foo", "bar"]
//! integration_tests = ["setup_foo"]   # optional
//! branch_prefix = "promote"           # optional
//! upstream = "upstream/main"          # optional
//! ```
//!
//! Relative paths are resolved against the plan's directory; a leading `~/`
//! is expanded from `HOME`.

use crate::branch::DEFAULT_PREFIX;
use crate::error::{MigrateError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use toml_edit::{DocumentMut, Item, TableLike};

pub const DEFAULT_UPSTREAM: &str = "upstream/main";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub modules: Vec<String>,
    pub integration_tests: Vec<String>,
    pub branch_prefix: String,
    pub upstream: String,
}

impl Plan {
    /// Reads and validates a plan file.
    ///
    /// # Errors
    ///
    /// - `NotFound`: the plan does not exist
    /// - `Toml`: invalid TOML syntax
    /// - `Malformed`: a required key is missing or has the wrong type
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(MigrateError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse(&content, path, base)
    }

    /// Parses plan `content`; `origin` names it in errors.
    pub fn parse(content: &str, origin: &Path, base: &Path) -> Result<Self> {
        let doc: DocumentMut = content.parse()?;
        let reader = PlanReader { doc: &doc, origin };

        let source = reader.required_str("source", "path")?;
        let destination = reader.required_str("destination", "path")?;
        let modules = reader.strings("migration", "modules")?;
        if modules.is_empty() {
            return Err(reader.malformed("migration.modules must list at least one module"));
        }

        Ok(Self {
            source: resolve(&source, base),
            destination: resolve(&destination, base),
            modules,
            integration_tests: reader.strings("migration", "integration_tests")?,
            branch_prefix: reader
                .optional_str("migration", "branch_prefix")?
                .unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            upstream: reader
                .optional_str("migration", "upstream")?
                .unwrap_or_else(|| DEFAULT_UPSTREAM.to_string()),
        })
    }
}

struct PlanReader<'a> {
    doc: &'a DocumentMut,
    origin: &'a Path,
}

impl PlanReader<'_> {
    fn malformed(&self, reason: &str) -> MigrateError {
        MigrateError::Malformed {
            path: self.origin.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    fn item(&self, section: &str, key: &str) -> Result<Option<&Item>> {
        let Some(table) = self.doc.get(section) else {
            return Ok(None);
        };
        let table: &dyn TableLike = table
            .as_table_like()
            .ok_or_else(|| self.malformed(&format!("[{section}] is not a table")))?;
        Ok(table.get(key).filter(|item| !item.is_none()))
    }

    fn optional_str(&self, section: &str, key: &str) -> Result<Option<String>> {
        match self.item(section, key)? {
            None => Ok(None),
            Some(item) => item
                .as_str()
                .map(|s| Some(s.to_string()))
                .ok_or_else(|| self.malformed(&format!("{section}.{key} must be a string"))),
        }
    }

    fn required_str(&self, section: &str, key: &str) -> Result<String> {
        self.optional_str(section, key)?
            .ok_or_else(|| self.malformed(&format!("{section}.{key} is required")))
    }

    fn strings(&self, section: &str, key: &str) -> Result<Vec<String>> {
        let Some(item) = self.item(section, key)? else {
            return Ok(Vec::new());
        };
        let wrong_type = || self.malformed(&format!("{section}.{key} must be a list of strings"));

        item.as_array()
            .ok_or_else(wrong_type)?
            .iter()
            .map(|v| v.as_str().map(str::to_string).ok_or_else(wrong_type))
            .collect()
    }
}

fn resolve(path: &str, base: &Path) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return PathBuf::from(home).join(rest);
    }
    let path = PathBuf::from(path);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}
