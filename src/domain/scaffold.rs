//! Contents of a freshly created plugin.

use std::path::PathBuf;

use serde_json::{Value, json};

use crate::domain::{HOST_FRAMEWORK_PACKAGE, LicenseType};

/// Host framework range new plugins are written against.
pub const DEFAULT_MAP_VERSION: &str = "^6.1";

/// A rendered file of the plugin scaffold, relative to the plugin directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldFile {
    pub path: PathBuf,
    pub content: String,
}

impl ScaffoldFile {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self { path: path.into(), content: content.into() }
    }
}

/// Answers collected by `create`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldOptions {
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
    pub license: LicenseType,
    pub typescript: bool,
    pub map_version: String,
}

impl ScaffoldOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: "1.0.0".to_string(),
            description: String::new(),
            author: String::new(),
            license: LicenseType::default(),
            typescript: false,
            map_version: DEFAULT_MAP_VERSION.to_string(),
        }
    }

    pub fn source_entry(&self) -> &'static str {
        if self.typescript { "src/index.ts" } else { "src/index.js" }
    }
}

/// The `package.json` of a new plugin.
///
/// The host framework itself is not listed: it is installed as a peer
/// dependency right after the files are written.
pub fn scaffold_package_json(options: &ScaffoldOptions) -> Value {
    let mut dev_dependencies = serde_json::Map::new();
    dev_dependencies.insert(
        env!("CARGO_PKG_NAME").to_string(),
        json!(format!("^{}", env!("CARGO_PKG_VERSION"))),
    );
    if options.typescript {
        dev_dependencies.insert("typescript".to_string(), json!("^5.4.0"));
    }

    json!({
        "name": options.name,
        "version": options.version,
        "description": options.description,
        "type": "module",
        "main": options.source_entry(),
        "scripts": {
            "prepublishOnly": "vcmplugin build",
            "build": "vcmplugin build",
            "bundle": "vcmplugin bundle",
            "start": "vcmplugin serve",
            "preview": "vcmplugin preview",
            "buildStagingApp": "vcmplugin buildStagingApp",
        },
        "author": options.author,
        "license": options.license.spdx(),
        "keywords": ["vcmap", "plugin"],
        "files": [
            "src/",
            "dist/",
            "plugin-assets/",
            "LICENSE.md",
            "README.md",
            "CHANGELOG.md",
        ],
        "exports": {
            ".": format!("./{}", options.source_entry()),
            "./dist": "./dist/index.js",
        },
        "mapVersion": options.map_version,
        "peerDependencies": {},
        "devDependencies": dev_dependencies,
    })
}

/// Spec used to install the host framework into a new plugin.
pub fn host_framework_spec(map_version: &str) -> String {
    format!("{}@{}", HOST_FRAMEWORK_PACKAGE, map_version)
}
