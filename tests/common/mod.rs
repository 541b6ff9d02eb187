//! Shared fixtures for the collection-migrate integration tests.
//!
//! Fixtures are small but realistic collection checkouts: a `galaxy.yml`, a
//! `meta/runtime.yml`, modules, integration targets and sanity ignores.

use assert_cmd::cargo::cargo_bin_cmd;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const COMMUNITY_RUNTIME: &str = "---
requires_ansible: '>=2.12.0'
action_groups:
  aws:
  - bar
  - foo
  - other
plugin_routing:
  modules:
    aws_foo:
      redirect: community.aws.foo
";

pub const AMAZON_RUNTIME: &str = "---
action_groups:
  aws:
  - ec2_instance
plugin_routing:
  modules:
    ec2_old:
      redirect: amazon.aws.ec2_instance
";

pub const FOO_MODULE: &str = r#"#!/usr/bin/python

DOCUMENTATION = r"""
module: foo
short_description: Manage foo
version_added: 1.0.0
"""

EXAMPLES = r"""
- community.aws.foo:
    name: example
"""

from ansible_collections.community.aws.plugins.module_utils.modules import AnsibleCommunityAWSModule as AnsibleAWSModule


def main():
    module = AnsibleAWSModule(argument_spec={})
    module.exit_json(changed=False)
"#;

/// Writes `content` to `root/rel`, creating parent directories.
#[allow(unused)]
pub fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[allow(unused)]
pub fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap()
}

/// Creates `community.aws` under `parent/community`.
#[allow(unused)]
pub fn create_source_collection(parent: &Path) -> PathBuf {
    let root = parent.join("community");
    write(&root, "galaxy.yml", "namespace: community\nname: aws\nversion: 9.0.0\n");
    write(&root, "meta/runtime.yml", COMMUNITY_RUNTIME);
    write(&root, "plugins/modules/foo.py", FOO_MODULE);
    write(
        &root,
        "plugins/modules/other.py",
        "# other module\nfrom ansible_collections.community.aws.plugins.module_utils.modules import AnsibleCommunityAWSModule as AnsibleAWSModule\n",
    );
    write(
        &root,
        "tests/integration/targets/foo/tasks/main.yml",
        "- name: Run foo\n  collections:\n    - amazon.aws\n    - community.aws\n  block:\n    - foo:\n        name: x\n",
    );
    write(&root, "tests/integration/targets/foo/aliases", "cloud/aws\n");
    write(&root, "tests/integration/targets/other/aliases", "cloud/aws\n");
    write(
        &root,
        "tests/sanity/ignore-2.15.txt",
        "plugins/modules/foo.py validate-modules:parameter-type-not-in-doc\nplugins/modules/other.py pylint:unused-import\n",
    );
    write(
        &root,
        "tests/sanity/ignore-2.16.txt",
        "plugins/modules/other.py pylint:unused-import\n",
    );
    root
}

/// Creates `amazon.aws` under `parent/amazon`.
#[allow(unused)]
pub fn create_dest_collection(parent: &Path) -> PathBuf {
    let root = parent.join("amazon");
    write(&root, "galaxy.yml", "namespace: amazon\nname: aws\nversion: 8.0.0\n");
    write(&root, "meta/runtime.yml", AMAZON_RUNTIME);
    write(&root, "plugins/modules/ec2_instance.py", "# ec2_instance\n");
    write(&root, "tests/sanity/ignore-2.15.txt", "plugins/modules/ec2_instance.py pylint:bad\n");
    root
}

/// Runs git in `repo`, panicking with its stderr on failure.
#[allow(unused)]
pub fn git(repo: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo)
        .output()
        .expect("git is installed");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Turns `repo` into a git repository on `main` with everything committed.
#[allow(unused)]
pub fn git_init(repo: &Path) {
    git(repo, &["init", "-q", "-b", "main"]);
    git(repo, &["config", "user.email", "migrate@example.com"]);
    git(repo, &["config", "user.name", "Migrate Tests"]);
    git(repo, &["config", "commit.gpgsign", "false"]);
    git(repo, &["add", "-A"]);
    git(repo, &["commit", "-q", "-m", "Initial import"]);
}

/// Commits everything currently in the work tree.
#[allow(unused)]
pub fn git_commit_all(repo: &Path, message: &str) {
    git(repo, &["add", "-A"]);
    git(repo, &["commit", "-q", "-m", message]);
}

/// Runs `collection-migrate <args>` in `cwd`.
#[allow(unused)]
pub fn run_step(cwd: &Path, args: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd = cargo_bin_cmd!("collection-migrate");
    cmd.args(args).current_dir(cwd).env_remove("RUST_LOG");
    cmd.assert()
}

/// Runs a step with `--json` and parses its single stdout line.
#[allow(unused)]
pub fn run_json(cwd: &Path, args: &[&str]) -> (bool, serde_json::Value) {
    let mut cmd = cargo_bin_cmd!("collection-migrate");
    let output = cmd
        .args(args)
        .arg("--json")
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .output()
        .unwrap();
    let value = serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({e}): {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    });
    (output.status.success(), value)
}
