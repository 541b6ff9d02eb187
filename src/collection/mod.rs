//! Collections: their names, their manifest, and where things live inside them.

pub mod galaxy;
pub mod layout;

pub use galaxy::{Galaxy, identify};

use crate::error::{MigrateError, Result};
use std::fmt;
use std::str::FromStr;

/// A `namespace.name` collection identifier, e.g. `community.aws`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionName {
    pub namespace: String,
    pub name: String,
}

impl CollectionName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Fully-qualified collection name of a module in this collection.
    pub fn fqcn(&self, module: &str) -> String {
        format!("{}.{}.{}", self.namespace, self.name, module)
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

impl FromStr for CollectionName {
    type Err = MigrateError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| MigrateError::InvalidName(s.to_string(), reason.to_string());

        let (namespace, name) = s
            .split_once('.')
            .ok_or_else(|| invalid("expected '<namespace>.<name>'"))?;

        for part in [namespace, name] {
            if part.is_empty() {
                return Err(invalid("namespace and name cannot be empty"));
            }
            if !part
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
            {
                return Err(invalid(
                    "only lowercase letters, digits and '_' are allowed",
                ));
            }
        }

        Ok(Self::new(namespace, name))
    }
}
