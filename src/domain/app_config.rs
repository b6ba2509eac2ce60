//! Application configuration served to a running map application.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::domain::AppError;

/// `_id` of the synthetic module holding the plugin under development.
pub const PLUGIN_CLI_MODULE_ID: &str = "plugin-cli-module";

/// A plugin entry inside a module's `plugins` list.
///
/// Only `name`, `version` and `entry` are interpreted; every other key is
/// plugin-specific configuration and is kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PluginDescriptor {
    /// Build a descriptor from a plugin's own `config.json` content.
    pub fn from_plugin_config(
        config: Map<String, Value>,
        name: &str,
        entry: &str,
    ) -> Result<Self, AppError> {
        let mut descriptor: PluginDescriptor = serde_json::from_value(Value::Object(config))
            .map_err(|err| AppError::config_parse("plugin config", err))?;
        descriptor.name = name.to_string();
        descriptor.entry = Some(entry.to_string());
        Ok(descriptor)
    }
}

/// An inline module definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleConfig {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugins: Option<Vec<PluginDescriptor>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ModuleConfig {
    fn remove_plugin(&mut self, name: &str) {
        if let Some(plugins) = self.plugins.as_mut() {
            plugins.retain(|plugin| plugin.name != name);
        }
    }
}

/// A module is either referenced by URL or defined inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModuleEntry {
    Url(String),
    Inline(ModuleConfig),
}

/// Root document loaded by the host framework.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    #[serde(default)]
    pub modules: Vec<ModuleEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApplicationConfig {
    pub fn parse(content: &str, what: &str) -> Result<Self, AppError> {
        serde_json::from_str(content).map_err(|err| AppError::config_parse(what, err))
    }

    pub fn from_value(value: Value, what: &str) -> Result<Self, AppError> {
        serde_json::from_value(value).map_err(|err| AppError::config_parse(what, err))
    }

    /// All plugin descriptors across inline modules, in module order.
    pub fn plugins(&self) -> impl Iterator<Item = &PluginDescriptor> {
        self.modules
            .iter()
            .filter_map(|module| match module {
                ModuleEntry::Inline(config) => config.plugins.as_ref(),
                ModuleEntry::Url(_) => None,
            })
            .flatten()
    }

    /// Replace relative module URLs with absolute ones resolved against `base`.
    pub fn absolutize_module_urls(&mut self, base: &Url) {
        for module in &mut self.modules {
            if let ModuleEntry::Url(value) = module
                && !is_http_url(value)
                && let Ok(resolved) = base.join(value)
            {
                *value = resolved.to_string();
            }
        }
    }
}

/// Remove `descriptor.name` from every module and prepend a module holding only `descriptor`.
pub fn merge_plugin_into_config(
    mut config: ApplicationConfig,
    descriptor: PluginDescriptor,
) -> ApplicationConfig {
    for module in &mut config.modules {
        if let ModuleEntry::Inline(module) = module {
            module.remove_plugin(&descriptor.name);
        }
    }

    let leading = ModuleConfig {
        id: Some(PLUGIN_CLI_MODULE_ID.to_string()),
        plugins: Some(vec![descriptor]),
        extra: Map::new(),
    };
    config.modules.insert(0, ModuleEntry::Inline(leading));
    config
}

/// Remove a plugin from a standalone module document (`{ "plugins": [...] }`).
pub fn strip_plugin_from_module(document: &mut Value, name: &str) {
    if let Some(plugins) = document.get_mut("plugins").and_then(Value::as_array_mut) {
        plugins.retain(|plugin| plugin.get("name").and_then(Value::as_str) != Some(name));
    }
}

pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}
