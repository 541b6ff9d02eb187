//! Validation rules for module, target and branch names.
//!
//! Pure functions with no I/O or side effects.

use crate::error::{MigrateError, Result};

const MAX_NAME_LENGTH: usize = 128;

fn invalid(name: &str, reason: impl Into<String>) -> MigrateError {
    MigrateError::InvalidName(name.to_string(), reason.into())
}

/// Validates a module name.
///
/// ## Rules
/// - 1-128 characters
/// - Only `[a-z0-9_]`
/// - Starts with a letter or `_`
///
/// These names become file names, git pathspecs and FQCN suffixes.
pub fn validate_module_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(invalid(name, "cannot be empty"));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(invalid(
            name,
            format!("exceeds {} chars (has {})", MAX_NAME_LENGTH, name.len()),
        ));
    }

    if let Some(first) = name.chars().next()
        && !first.is_ascii_lowercase()
        && first != '_'
    {
        return Err(invalid(name, "must start with lowercase letter or underscore"));
    }

    for (idx, ch) in name.chars().enumerate() {
        if !ch.is_ascii_lowercase() && !ch.is_ascii_digit() && ch != '_' {
            return Err(invalid(
                name,
                format!("invalid character '{}' at position {}", ch, idx),
            ));
        }
    }

    Ok(())
}

/// Validates an integration test target name.
///
/// Targets are directory names: `[A-Za-z0-9_.-]`, no leading `.` or `-`.
pub fn validate_target_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(invalid(name, "cannot be empty"));
    }
    if name.starts_with('.') || name.starts_with('-') {
        return Err(invalid(name, "cannot start with '.' or '-'"));
    }
    for (idx, ch) in name.chars().enumerate() {
        if !ch.is_ascii_alphanumeric() && !"_.-".contains(ch) {
            return Err(invalid(
                name,
                format!("invalid character '{}' at position {}", ch, idx),
            ));
        }
    }
    Ok(())
}

/// Validates a branch name against the subset of `git check-ref-format`
/// rules that matter for generated names.
pub fn validate_branch_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(invalid(name, "cannot be empty"));
    }
    if name.starts_with('-') || name.starts_with('/') || name.ends_with('/') {
        return Err(invalid(name, "cannot start with '-' or start/end with '/'"));
    }
    if name.ends_with(".lock") || name.ends_with('.') {
        return Err(invalid(name, "cannot end with '.lock' or '.'"));
    }
    if name.contains("..") || name.contains("@{") || name.contains("//") {
        return Err(invalid(name, "cannot contain '..', '@{' or '//'"));
    }
    if let Some(ch) = name
        .chars()
        .find(|c| c.is_ascii_control() || c.is_whitespace() || "~^:?*[\\".contains(*c))
    {
        return Err(invalid(name, format!("invalid character {:?}", ch)));
    }
    Ok(())
}

/// Validates every module and target of a migration.
pub fn validate_selection(modules: &[String], integration_tests: &[String]) -> Result<()> {
    if modules.is_empty() {
        return Err(MigrateError::InvalidArguments(
            "at least one module is required".into(),
        ));
    }
    for module in modules {
        validate_module_name(module)?;
    }
    for target in integration_tests {
        validate_target_name(target)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_names() {
        assert!(validate_module_name("ec2_vpc_nat_gateway").is_ok());
        assert!(validate_module_name("_private").is_ok());
        assert!(validate_module_name("s3").is_ok());

        assert!(validate_module_name("").is_err());
        assert!(validate_module_name("1abc").is_err());
        assert!(validate_module_name("Foo").is_err());
        assert!(validate_module_name("foo-bar").is_err());
        assert!(validate_module_name("../foo").is_err());
        assert!(validate_module_name(&"a".repeat(129)).is_err());
    }

    #[test]
    fn test_target_names() {
        assert!(validate_target_name("setup_ec2_facts").is_ok());
        assert!(validate_target_name("legacy-target.v2").is_ok());

        assert!(validate_target_name("").is_err());
        assert!(validate_target_name(".hidden").is_err());
        assert!(validate_target_name("a/b").is_err());
    }

    #[test]
    fn test_branch_names() {
        assert!(validate_branch_name("promote_2401011200_42").is_ok());
        assert!(validate_branch_name("feature/migrate").is_ok());

        assert!(validate_branch_name("").is_err());
        assert!(validate_branch_name("-x").is_err());
        assert!(validate_branch_name("a..b").is_err());
        assert!(validate_branch_name("a b").is_err());
        assert!(validate_branch_name("a.lock").is_err());
        assert!(validate_branch_name("a~1").is_err());
    }

    #[test]
    fn test_selection_requires_modules() {
        let err = validate_selection(&[], &["foo".into()]).unwrap_err();
        assert!(matches!(err, MigrateError::InvalidArguments(_)));
        assert!(validate_selection(&["foo".into()], &[]).is_ok());
    }
}
