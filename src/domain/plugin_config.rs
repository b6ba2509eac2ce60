use serde_json::{Map, Value};

use crate::domain::{AppError, PackageManifest};

/// File name of the plugin-specific configuration.
pub const PLUGIN_CONFIG_FILE: &str = "config.json";

/// Parse a plugin `config.json`. The document must be a JSON object.
pub fn parse_plugin_config(content: &str, what: &str) -> Result<Map<String, Value>, AppError> {
    match serde_json::from_str(content).map_err(|err| AppError::config_parse(what, err))? {
        Value::Object(map) => Ok(map),
        _ => Err(AppError::config_parse(what, "expected a JSON object")),
    }
}

/// Backfill `version` (as a caret range) from the package manifest, then `name`.
pub fn complete_plugin_config(
    mut config: Map<String, Value>,
    manifest: &PackageManifest,
    plugin_name: &str,
) -> Map<String, Value> {
    if !has_value(&config, "version")
        && let Some(version) = manifest.version.as_deref()
    {
        config.insert("version".to_string(), Value::String(format!("^{}", version)));
    }
    if !has_value(&config, "name") {
        config.insert("name".to_string(), Value::String(plugin_name.to_string()));
    }
    config
}

fn has_value(config: &Map<String, Value>, key: &str) -> bool {
    match config.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::String(value)) => !value.is_empty(),
        Some(_) => true,
    }
}
