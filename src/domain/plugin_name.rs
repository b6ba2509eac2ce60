use std::path::PathBuf;

use crate::domain::AppError;

/// Validate an npm package name as used for plugins (`name` or `@scope/name`).
pub fn validate_plugin_name(name: &str) -> Result<(), AppError> {
    let invalid = |reason: &str| {
        Err(AppError::user_input(format!("Invalid plugin name '{}': {}", name, reason)))
    };

    if name.trim().is_empty() {
        return invalid("must not be empty");
    }
    if name.len() > 214 {
        return invalid("must not be longer than 214 characters");
    }

    let (scope, package) = match name.strip_prefix('@') {
        Some(rest) => match rest.split_once('/') {
            Some((scope, package)) => (Some(scope), package),
            None => return invalid("scoped names must have the form @scope/name"),
        },
        None => (None, name),
    };

    let valid_segment = |segment: &str| {
        !segment.is_empty()
            && !segment.starts_with(['.', '_'])
            && segment.chars().all(|c| {
                c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '.' | '_' | '~')
            })
    };

    if scope.is_some_and(|scope| !valid_segment(scope)) || !valid_segment(package) {
        return invalid(
            "use lowercase letters, digits, '-', '.', '_' or '~' and do not start with '.' or '_'",
        );
    }
    Ok(())
}

/// Directory a new plugin is scaffolded into: the unscoped part of the name.
pub fn plugin_directory_name(name: &str) -> PathBuf {
    PathBuf::from(name.rsplit('/').next().unwrap_or(name))
}
