//! Plugin package manifest (`package.json`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::AppError;

/// Name of the host framework package.
pub const HOST_FRAMEWORK_PACKAGE: &str = "@vcmap/ui";

/// Default development entry point when `main` is not declared.
pub const DEFAULT_SOURCE_ENTRY: &str = "src/index.js";

/// Entry point of the production bundle relative to the plugin root.
pub const PRODUCTION_ENTRY: &str = "dist/index.js";

/// Subset of `package.json` the CLI reads; all other keys are preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dev_dependencies: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub peer_dependencies: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PackageManifest {
    pub fn parse(content: &str) -> Result<Self, AppError> {
        serde_json::from_str(content).map_err(|err| AppError::config_parse("package.json", err))
    }

    /// The plugin name, required for every command that works on a plugin.
    pub fn plugin_name(&self) -> Result<&str, AppError> {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| AppError::user_input("please specify the plugin name in the package.json"))
    }

    /// The declared development entry point.
    pub fn source_entry(&self) -> &str {
        self.main.as_deref().filter(|main| !main.is_empty()).unwrap_or(DEFAULT_SOURCE_ENTRY)
    }

    /// Returns the build artifact in production mode, the declared source entry otherwise.
    pub fn resolve_plugin_entry(&self, production: bool) -> &str {
        if production { PRODUCTION_ENTRY } else { self.source_entry() }
    }

    /// Whether the plugin is written in TypeScript.
    pub fn uses_typescript(&self) -> bool {
        self.dev_dependencies.contains_key("typescript")
    }

    /// Names of all dependencies the bundler must treat as provided by the host.
    pub fn external_dependencies(&self) -> Vec<String> {
        let mut names: Vec<String> = self.peer_dependencies.keys().cloned().collect();
        if !names.iter().any(|name| name == HOST_FRAMEWORK_PACKAGE) {
            names.push(HOST_FRAMEWORK_PACKAGE.to_string());
        }
        names.sort();
        names
    }
}

/// How a dependency is recorded in `package.json` when installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepType {
    Dependency,
    Peer,
    Dev,
}

impl DepType {
    /// The npm flag selecting the dependency section.
    pub fn npm_flag(self) -> &'static str {
        match self {
            DepType::Dependency => "--save",
            DepType::Peer => "--save-peer",
            DepType::Dev => "--save-dev",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_manifest_and_keeps_unknown_keys() {
        let manifest = PackageManifest::parse(
            r#"{"name":"demo","version":"1.0.0","type":"module","peerDependencies":{"@vcmap/ui":"^6.0"}}"#,
        )
        .unwrap();
        assert_eq!(manifest.plugin_name().unwrap(), "demo");
        assert_eq!(manifest.extra.get("type"), Some(&Value::String("module".into())));
        assert_eq!(manifest.peer_dependencies.get("@vcmap/ui").map(String::as_str), Some("^6.0"));
    }

    #[test]
    fn missing_name_is_user_input_error() {
        let manifest = PackageManifest::parse(r#"{"version":"1.0.0"}"#).unwrap();
        assert!(matches!(manifest.plugin_name(), Err(AppError::UserInput(_))));
    }

    #[test]
    fn resolve_plugin_entry_switches_on_production() {
        let manifest = PackageManifest::parse(r#"{"name":"demo","main":"src/main.ts"}"#).unwrap();
        assert_eq!(manifest.resolve_plugin_entry(true), "dist/index.js");
        assert_eq!(manifest.resolve_plugin_entry(false), "src/main.ts");
        assert_ne!(manifest.resolve_plugin_entry(true), manifest.resolve_plugin_entry(false));
    }

    #[test]
    fn source_entry_defaults_when_main_is_absent() {
        let manifest = PackageManifest::parse(r#"{"name":"demo"}"#).unwrap();
        assert_eq!(manifest.source_entry(), DEFAULT_SOURCE_ENTRY);
    }

    #[test]
    fn external_dependencies_always_include_host_framework() {
        let manifest =
            PackageManifest::parse(r#"{"name":"demo","peerDependencies":{"vue":"~3.4"}}"#).unwrap();
        assert_eq!(manifest.external_dependencies(), vec!["@vcmap/ui", "vue"]);
    }

    #[test]
    fn uses_typescript_checks_dev_dependencies() {
        let manifest =
            PackageManifest::parse(r#"{"name":"demo","devDependencies":{"typescript":"^5"}}"#)
                .unwrap();
        assert!(manifest.uses_typescript());
    }
}
