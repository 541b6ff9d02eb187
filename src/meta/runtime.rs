//! Merging `meta/runtime.yml` of two collections.
//!
//! ## Steps
//!
//! 1. Select the source action-group entries naming a migrated module
//! 2. Select the source redirects that point at a migrated module
//! 3. Move both to the destination, re-qualifying the redirects
//! 4. Leave a redirect stub in the source for every moved entry
//! 5. Sort action groups and routing tables, stage both files
//!
//! The action group is the one named after the destination collection,
//! i.e. `aws` for `amazon.aws`.

use crate::collection::{CollectionName, layout};
use crate::error::{MigrateError, Result};
use crate::fs::{Transaction, yaml};
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

const ACTION_GROUPS: &str = "action_groups";
const PLUGIN_ROUTING: &str = "plugin_routing";
const MODULES: &str = "modules";
const REDIRECT: &str = "redirect";

/// One collection's `meta/runtime.yml`.
#[derive(Debug, Clone)]
pub struct Runtime {
    path: PathBuf,
    doc: Value,
}

impl Runtime {
    pub fn load(collection: &Path) -> Result<Self> {
        let path = layout::runtime_path(collection);
        let doc = yaml::load(&path)?;
        Ok(Self { path, doc })
    }

    pub fn parse(path: PathBuf, content: &str) -> Result<Self> {
        Ok(Self {
            doc: serde_yaml::from_str(content)?,
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names listed in an action group; empty if the group is absent.
    pub fn action_group_entries(&self, group: &str) -> Result<Vec<String>> {
        let Some(entries) = self.lookup(&[ACTION_GROUPS, group]) else {
            return Ok(Vec::new());
        };
        let list = entries
            .as_sequence()
            .ok_or_else(|| self.malformed(format!("{ACTION_GROUPS}.{group} is not a list")))?;
        Ok(list
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect())
    }

    /// `plugin_routing.modules` entries in document order.
    pub fn routing_entries(&self) -> Result<Vec<(String, Value)>> {
        let Some(routing) = self.lookup(&[PLUGIN_ROUTING, MODULES]) else {
            return Ok(Vec::new());
        };
        let routing = routing.as_mapping().ok_or_else(|| {
            self.malformed(format!("{PLUGIN_ROUTING}.{MODULES} is not a mapping"))
        })?;
        Ok(routing
            .iter()
            .filter_map(|(k, v)| k.as_str().map(|k| (k.to_string(), v.clone())))
            .collect())
    }

    /// The action group list, created if absent.
    pub fn action_group(&mut self, group: &str) -> Result<&mut Vec<Value>> {
        let path = self.path.clone();
        let groups = child(self.root()?, ACTION_GROUPS, empty_mapping)
            .as_mapping_mut()
            .ok_or_else(|| malformed(&path, format!("{ACTION_GROUPS} is not a mapping")))?;
        child(groups, group, empty_sequence)
            .as_sequence_mut()
            .ok_or_else(|| malformed(&path, format!("{ACTION_GROUPS}.{group} is not a list")))
    }

    /// The `plugin_routing.modules` mapping, created if absent.
    pub fn routing(&mut self) -> Result<&mut Mapping> {
        let path = self.path.clone();
        let plugin_routing = child(self.root()?, PLUGIN_ROUTING, empty_mapping)
            .as_mapping_mut()
            .ok_or_else(|| malformed(&path, format!("{PLUGIN_ROUTING} is not a mapping")))?;
        child(plugin_routing, MODULES, empty_mapping)
            .as_mapping_mut()
            .ok_or_else(|| malformed(&path, format!("{PLUGIN_ROUTING}.{MODULES} is not a mapping")))
    }

    /// Sorts `plugin_routing.modules` by key if it exists.
    pub fn sort_routing(&mut self) {
        if let Some(routing) = self
            .doc
            .get_mut(PLUGIN_ROUTING)
            .and_then(|p| p.get_mut(MODULES))
            .and_then(Value::as_mapping_mut)
        {
            yaml::sort_mapping(routing);
        }
    }

    pub fn render(&self) -> Result<String> {
        yaml::dump_compact(&self.doc)
    }

    fn root(&mut self) -> Result<&mut Mapping> {
        if self.doc.is_null() {
            self.doc = empty_mapping();
        }
        self.doc
            .as_mapping_mut()
            .ok_or_else(|| malformed(&self.path, "top level is not a mapping".to_string()))
    }

    fn lookup(&self, keys: &[&str]) -> Option<&Value> {
        let mut current = &self.doc;
        for key in keys {
            current = current.get(*key)?;
        }
        (!current.is_null()).then_some(current)
    }

    fn malformed(&self, reason: String) -> MigrateError {
        malformed(&self.path, reason)
    }
}

fn malformed(path: &Path, reason: String) -> MigrateError {
    MigrateError::Malformed {
        path: path.to_path_buf(),
        reason,
    }
}

fn empty_mapping() -> Value {
    Value::Mapping(Mapping::new())
}

fn empty_sequence() -> Value {
    Value::Sequence(Vec::new())
}

/// `parent[key]`, inserting `empty()` when missing or null.
fn child<'a>(parent: &'a mut Mapping, key: &str, empty: fn() -> Value) -> &'a mut Value {
    let value = parent.entry(Value::from(key)).or_insert_with(empty);
    if value.is_null() {
        *value = empty();
    }
    value
}

/// What [`merge`] moved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Merge {
    pub action_group: String,
    /// Action-group entries now listed in the destination.
    pub moved: Vec<String>,
    /// Routing keys whose redirects now live in the destination.
    pub redirects: Vec<String>,
}

/// Moves the migrated modules' metadata from `src` to `dest` in memory.
pub fn merge(
    src: &mut Runtime,
    dest: &mut Runtime,
    src_name: &CollectionName,
    dest_name: &CollectionName,
    modules: &[String],
) -> Result<Merge> {
    let group = dest_name.name.clone();
    let src_prefix = format!("{src_name}.");
    let dest_prefix = format!("{dest_name}.");

    let src_group = src.action_group_entries(&group)?;
    let mut moved: Vec<String> = Vec::new();
    for module in modules {
        for entry in &src_group {
            if entry.contains(module.as_str()) && !moved.contains(entry) {
                if entry != module {
                    log::warn!(
                        "Action group entry '{}' matches module '{}' by substring only; moving it too",
                        entry,
                        module
                    );
                }
                moved.push(entry.clone());
            }
        }
    }

    let original_routing = src.routing_entries()?;
    let mut redirects: Vec<(String, Value)> = Vec::new();
    for module in modules {
        for (key, directive) in &original_routing {
            let Some(target) = directive.get(REDIRECT).and_then(Value::as_str) else {
                continue;
            };
            let Some(rest) = target.strip_prefix(&src_prefix) else {
                continue;
            };
            if rest.rsplit('.').next() != Some(module.as_str())
                || redirects.iter().any(|(k, _)| k == key)
            {
                continue;
            }

            let mut copied = directive.clone();
            if let Some(fields) = copied.as_mapping_mut() {
                fields.insert(REDIRECT.into(), format!("{dest_prefix}{rest}").into());
            }
            log::info!("Moving redirect '{}' -> {}{}", key, dest_prefix, rest);
            redirects.push((key.clone(), copied));
        }
    }

    if !moved.is_empty() {
        let dest_group = dest.action_group(&group)?;
        for entry in &moved {
            if !dest_group.iter().any(|v| v.as_str() == Some(entry.as_str())) {
                dest_group.push(entry.as_str().into());
            }
        }
        dest_group.sort_by(|a, b| a.as_str().cmp(&b.as_str()));

        src.action_group(&group)?
            .retain(|v| v.as_str().is_none_or(|s| !moved.iter().any(|m| m == s)));
    }

    if !redirects.is_empty() {
        let dest_routing = dest.routing()?;
        for (key, directive) in &redirects {
            dest_routing.insert(key.as_str().into(), directive.clone());
        }
        let src_routing = src.routing()?;
        for (key, _) in &redirects {
            src_routing.remove(key.as_str());
        }
    }

    if !moved.is_empty() {
        let dest_routing = dest.routing()?;
        for entry in &moved {
            let stub = dest_routing
                .get(entry.as_str())
                .and_then(|d| d.get(REDIRECT))
                .and_then(Value::as_str)
                .is_some_and(|target| target.starts_with(&src_prefix));
            if stub {
                log::info!("Dropping stale redirect stub '{}' from {}", entry, dest_name);
                dest_routing.remove(entry.as_str());
            }
        }

        let src_routing = src.routing()?;
        for entry in &moved {
            let target = Value::from(dest_name.fqcn(entry));
            match src_routing.get_mut(entry.as_str()).and_then(Value::as_mapping_mut) {
                Some(fields) => {
                    fields.insert(REDIRECT.into(), target);
                }
                None => {
                    let mut fields = Mapping::new();
                    fields.insert(REDIRECT.into(), target);
                    src_routing.insert(entry.as_str().into(), Value::Mapping(fields));
                }
            }
        }
    }

    src.sort_routing();
    dest.sort_routing();

    Ok(Merge {
        action_group: group,
        moved,
        redirects: redirects.into_iter().map(|(k, _)| k).collect(),
    })
}

/// Input of [`update_runtime`].
#[derive(Debug, Clone, Copy)]
pub struct RuntimeRequest<'a> {
    pub src: &'a Path,
    pub dest: &'a Path,
    pub src_name: &'a CollectionName,
    pub dest_name: &'a CollectionName,
    pub modules: &'a [String],
}

#[derive(Debug, Clone, Serialize)]
pub struct RuntimeUpdate {
    pub changed: bool,
    #[serde(flatten)]
    pub merge: Merge,
    pub changelogs: Vec<PathBuf>,
}

/// Stages both runtime files and, when entries moved, both changelog fragments.
pub fn update_runtime(request: &RuntimeRequest<'_>, txn: &mut Transaction) -> Result<RuntimeUpdate> {
    let mut src = Runtime::load(request.src)?;
    let mut dest = Runtime::load(request.dest)?;

    let merge = merge(
        &mut src,
        &mut dest,
        request.src_name,
        request.dest_name,
        request.modules,
    )?;

    let staged = txn.len();
    if merge.moved.is_empty() && merge.redirects.is_empty() {
        log::info!("Nothing to move between runtime files");
        return Ok(RuntimeUpdate {
            changed: false,
            merge,
            changelogs: Vec::new(),
        });
    }
    txn.update_file(src.path().to_path_buf(), src.render()?)?;
    txn.update_file(dest.path().to_path_buf(), dest.render()?)?;

    let changelogs = if merge.moved.is_empty() {
        Vec::new()
    } else {
        super::changelog::stage_fragments(
            request.src,
            request.dest,
            request.src_name,
            request.dest_name,
            request.modules,
            &merge.moved,
            txn,
        )?
    };

    Ok(RuntimeUpdate {
        changed: txn.len() > staged,
        merge,
        changelogs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMMUNITY: &str = "---
requires_ansible: '>=2.12.0'
action_groups:
  aws:
  - bar
  - baz
  - foo
plugin_routing:
  modules:
    old_thing:
      tombstone:
        removal_version: 2.0.0
    aws_foo:
      redirect: community.aws.foo
";

    const AMAZON: &str = "---
action_groups:
  aws:
  - s3_bucket
  - ec2_instance
plugin_routing:
  modules:
    ec2_thing:
      redirect: amazon.aws.ec2_instance
";

    fn names() -> (CollectionName, CollectionName) {
        ("community.aws".parse().unwrap(), "amazon.aws".parse().unwrap())
    }

    fn runtimes() -> (Runtime, Runtime) {
        (
            Runtime::parse(PathBuf::from("src/meta/runtime.yml"), COMMUNITY).unwrap(),
            Runtime::parse(PathBuf::from("dest/meta/runtime.yml"), AMAZON).unwrap(),
        )
    }

    fn redirect(runtime: &Runtime, key: &str) -> Option<String> {
        runtime
            .routing_entries()
            .unwrap()
            .into_iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.get(REDIRECT).and_then(Value::as_str).map(str::to_string))
    }

    fn keys(runtime: &Runtime) -> Vec<String> {
        runtime
            .routing_entries()
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect()
    }

    #[test]
    fn test_moves_modules_and_redirects() {
        let (src_name, dest_name) = names();
        let (mut src, mut dest) = runtimes();

        let merge = merge(
            &mut src,
            &mut dest,
            &src_name,
            &dest_name,
            &["foo".into(), "bar".into()],
        )
        .unwrap();

        assert_eq!(merge.action_group, "aws");
        assert_eq!(merge.moved, vec!["foo", "bar"]);
        assert_eq!(merge.redirects, vec!["aws_foo"]);

        assert_eq!(
            dest.action_group_entries("aws").unwrap(),
            vec!["bar", "ec2_instance", "foo", "s3_bucket"]
        );
        assert_eq!(src.action_group_entries("aws").unwrap(), vec!["baz"]);

        assert_eq!(redirect(&dest, "aws_foo").as_deref(), Some("amazon.aws.foo"));
        assert_eq!(keys(&dest), vec!["aws_foo", "ec2_thing"]);

        assert_eq!(redirect(&src, "foo").as_deref(), Some("amazon.aws.foo"));
        assert_eq!(redirect(&src, "bar").as_deref(), Some("amazon.aws.bar"));
        assert_eq!(keys(&src), vec!["bar", "foo", "old_thing"]);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let (src_name, dest_name) = names();
        let (mut src, mut dest) = runtimes();
        let modules = vec!["foo".to_string(), "bar".to_string()];

        merge(&mut src, &mut dest, &src_name, &dest_name, &modules).unwrap();
        let (src_once, dest_once) = (src.render().unwrap(), dest.render().unwrap());

        let again = merge(&mut src, &mut dest, &src_name, &dest_name, &modules).unwrap();
        assert!(again.moved.is_empty());
        assert!(again.redirects.is_empty());
        assert_eq!(src.render().unwrap(), src_once);
        assert_eq!(dest.render().unwrap(), dest_once);
    }

    #[test]
    fn test_update_runtime_leaves_untouched_files_alone() {
        let temp = tempfile::TempDir::new().unwrap();
        let (src_dir, dest_dir) = (temp.path().join("src"), temp.path().join("dest"));
        let commented = "# maintained by hand\nplugin_routing:\n  modules:\n    zeta:\n      redirect: 'community.aws.zeta'\n    alpha:\n      tombstone: {removal_version: 2.0.0}\n";
        for dir in [&src_dir, &dest_dir] {
            std::fs::create_dir_all(dir.join("meta")).unwrap();
            std::fs::write(dir.join("meta/runtime.yml"), commented).unwrap();
        }
        let (src_name, dest_name) = names();
        let modules = vec!["foo".to_string()];

        let mut txn = Transaction::new(false);
        let update = update_runtime(
            &RuntimeRequest {
                src: &src_dir,
                dest: &dest_dir,
                src_name: &src_name,
                dest_name: &dest_name,
                modules: &modules,
            },
            &mut txn,
        )
        .unwrap();

        assert!(!update.changed);
        assert!(update.changelogs.is_empty());
        assert!(txn.is_empty());
    }

    #[test]
    fn test_destination_entries_stay_unique() {
        let (src_name, dest_name) = names();
        let (mut src, _) = runtimes();
        let mut dest = Runtime::parse(
            PathBuf::from("dest/meta/runtime.yml"),
            "action_groups:\n  aws:\n  - foo\n",
        )
        .unwrap();

        merge(&mut src, &mut dest, &src_name, &dest_name, &["foo".into()]).unwrap();
        assert_eq!(dest.action_group_entries("aws").unwrap(), vec!["foo"]);
    }

    #[test]
    fn test_substring_match_moves_longer_names() {
        let (src_name, dest_name) = names();
        let mut src = Runtime::parse(
            PathBuf::from("src/meta/runtime.yml"),
            "action_groups:\n  aws:\n  - foo\n  - foo_info\n  - other\n",
        )
        .unwrap();
        let mut dest = Runtime::parse(PathBuf::from("dest/meta/runtime.yml"), "---\n").unwrap();

        let merge = merge(&mut src, &mut dest, &src_name, &dest_name, &["foo".into()]).unwrap();

        assert_eq!(merge.moved, vec!["foo", "foo_info"]);
        assert_eq!(src.action_group_entries("aws").unwrap(), vec!["other"]);
        assert_eq!(dest.action_group_entries("aws").unwrap(), vec!["foo", "foo_info"]);
    }

    #[test]
    fn test_stale_destination_stub_is_dropped() {
        let (src_name, dest_name) = names();
        let (mut src, _) = runtimes();
        let mut dest = Runtime::parse(
            PathBuf::from("dest/meta/runtime.yml"),
            "plugin_routing:\n  modules:\n    foo:\n      redirect: community.aws.foo\n",
        )
        .unwrap();

        merge(&mut src, &mut dest, &src_name, &dest_name, &["foo".into()]).unwrap();
        assert_eq!(redirect(&dest, "foo"), None);
    }

    #[test]
    fn test_malformed_action_groups() {
        let (src_name, dest_name) = names();
        let mut src = Runtime::parse(
            PathBuf::from("src/meta/runtime.yml"),
            "action_groups:\n  aws: foo\n",
        )
        .unwrap();
        let (_, mut dest) = runtimes();

        let err = merge(&mut src, &mut dest, &src_name, &dest_name, &["foo".into()]).unwrap_err();
        assert!(matches!(err, MigrateError::Malformed { .. }));
    }

    #[test]
    fn test_render_has_no_blank_lines() {
        let (_, dest) = runtimes();
        let rendered = dest.render().unwrap();
        assert!(rendered.starts_with("---\n"));
        assert!(!rendered.contains("\n\n"));
    }
}
