//! Rewriting migrated module sources for their new collection.
//!
//! Four substitutions are applied to each `plugins/modules/<name>.py`:
//!
//! ```text
//! community.aws.foo                          -> amazon.aws.foo
//! collection_name="community.aws"            -> collection_name="amazon.aws"
//! from ...community.aws...modules import X   -> from ...amazon.aws...modules import Y
//! version_added: 1.0.0                       -> version_added: 1.0.0
//!                                               version_added_collection: community.aws
//! ```
//!
//! A file is only staged when one of them actually changed something.

use crate::collection::layout;
use crate::error::{MigrateError, Result};
use crate::fs::Transaction;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Base-class import used by source-collection modules.
pub const SOURCE_IMPORT: &str = "from ansible_collections.community.aws.plugins.module_utils.modules import AnsibleCommunityAWSModule as AnsibleAWSModule";
/// Its destination-collection equivalent.
pub const DEST_IMPORT: &str =
    "from ansible_collections.amazon.aws.plugins.module_utils.modules import AnsibleAWSModule";

/// Compiled substitutions for one source/destination pair.
pub struct ModulePatterns {
    src_name: String,
    dest_name: String,
    literal: Vec<(String, String)>,
    version_added: Regex,
    version_added_collection: String,
}

impl ModulePatterns {
    pub fn new(src_name: &str, dest_name: &str, import_from: &str, import_to: &str) -> Result<Self> {
        Ok(Self {
            src_name: src_name.to_string(),
            dest_name: dest_name.to_string(),
            literal: vec![
                (
                    format!("collection_name=\"{src_name}\""),
                    format!("collection_name=\"{dest_name}\""),
                ),
                (import_from.to_string(), import_to.to_string()),
            ],
            version_added: Regex::new(r"(?m)^version_added:.*$")?,
            version_added_collection: format!("version_added_collection: {src_name}"),
        })
    }

    /// Returns `Some(rewritten)` if anything changed, `None` otherwise.
    pub fn apply(&self, module: &str, content: &str) -> Result<Option<String>> {
        let fqcn = Regex::new(&format!(
            r"\b{}\b",
            regex::escape(&format!("{}.{}", self.src_name, module))
        ))?;
        let mut result = fqcn
            .replace_all(content, format!("{}.{}", self.dest_name, module).as_str())
            .into_owned();

        for (from, to) in &self.literal {
            if !from.is_empty() && result.contains(from.as_str()) {
                result = result.replace(from.as_str(), to);
            }
        }

        if !result.contains(&self.version_added_collection)
            && let Some(found) = self.version_added.find(&result)
        {
            let at = found.end();
            result.insert_str(at, &format!("\n{}", self.version_added_collection));
        }

        Ok((result != content).then_some(result))
    }
}

/// Stages the rewrite of every listed module, returning the ones that changed.
///
/// # Errors
///
/// - `NotFound`: a module file does not exist in the collection
pub fn update_modules(
    collection: &Path,
    modules: &[String],
    patterns: &ModulePatterns,
    txn: &mut Transaction,
) -> Result<Vec<String>> {
    let mut changed = Vec::new();

    for module in modules {
        let path = layout::module_path(collection, module);
        if !path.is_file() {
            return Err(MigrateError::NotFound(path));
        }

        let content = fs::read_to_string(&path)?;
        match patterns.apply(module, &content)? {
            Some(new_content) => {
                log::info!("Rewriting {}", path.display());
                txn.update_file(path, new_content)?;
                changed.push(module.clone());
            }
            None => log::debug!("Already up to date: {}", path.display()),
        }
    }

    Ok(changed)
}
