//! Changelog fragments announcing a migration.

use crate::collection::{CollectionName, layout};
use crate::error::Result;
use crate::fs::{Transaction, yaml};
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

/// Fragment section used in the collection that gained the modules.
pub const DEST_SECTION: &str = "major_changes";
/// Fragment section used in the collection that lost them.
pub const SRC_SECTION: &str = "breaking_changes";

/// The notice for one migrated module.
///
/// `_facts` modules were renamed `_info` along the way, so the new FQCN
/// uses the `_info` name.
pub fn migration_notice(module: &str, src_name: &CollectionName, dest_name: &CollectionName) -> String {
    let new_name = module.replace("_facts", "_info");
    format!(
        "{module} - The module has been migrated from the ``{src_name}`` collection. \
         Playbooks using the Fully Qualified Collection Name for this module should be \
         updated to use ``{}``.",
        dest_name.fqcn(&new_name)
    )
}

/// Renders a fragment with a single section.
pub fn render_fragment(section: &str, notices: &[String]) -> Result<String> {
    let mut fragment = Mapping::new();
    fragment.insert(
        section.into(),
        Value::Sequence(notices.iter().map(|n| n.as_str().into()).collect()),
    );
    yaml::dump(&Value::Mapping(fragment))
}

/// Stages `changelogs/fragments/migrate_<modules>.yml` in both collections.
///
/// Returns the destination fragment first.
pub fn stage_fragments(
    src: &Path,
    dest: &Path,
    src_name: &CollectionName,
    dest_name: &CollectionName,
    modules: &[String],
    moved: &[String],
    txn: &mut Transaction,
) -> Result<Vec<PathBuf>> {
    let notices: Vec<String> = moved
        .iter()
        .map(|m| migration_notice(m, src_name, dest_name))
        .collect();

    let dest_fragment = layout::fragment_path(dest, modules);
    let src_fragment = layout::fragment_path(src, modules);

    txn.write_file(dest_fragment.clone(), render_fragment(DEST_SECTION, &notices)?)?;
    txn.write_file(src_fragment.clone(), render_fragment(SRC_SECTION, &notices)?)?;

    Ok(vec![dest_fragment, src_fragment])
}
