//! User level dev-server configuration (`vcs.config.json`).

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::domain::{AppError, ProxyRouteTable};

/// File name looked up in the plugin root.
pub const USER_CONFIG_FILE: &str = "vcs.config.json";

/// Either a path/URL to a config file or an inline config document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ConfigRef {
    Location(String),
    Inline(Map<String, Value>),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserConfig {
    #[serde(default)]
    pub port: Option<u16>,
    /// Base application config: file or URL.
    #[serde(default)]
    pub app_config: Option<ConfigRef>,
    /// `user:password` used for downloading remote resources.
    #[serde(default)]
    pub auth: Option<String>,
    /// Plugin config: file or inline document.
    #[serde(default)]
    pub config: Option<ConfigRef>,
    /// Hosted map application used by `preview`.
    #[serde(default)]
    pub vcm: Option<String>,
    #[serde(default)]
    pub https: bool,
    #[serde(default)]
    pub proxy: Map<String, Value>,
}

impl UserConfig {
    pub fn parse(content: &str) -> Result<Self, AppError> {
        serde_json::from_str(content).map_err(|err| AppError::config_parse(USER_CONFIG_FILE, err))
    }

    pub fn custom_proxy(&self) -> Result<ProxyRouteTable, AppError> {
        ProxyRouteTable::from_custom(&self.proxy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_locations_and_inline_configs() {
        let config = UserConfig::parse(
            r#"{"port":9000,"appConfig":"https://map/app.config.json","config":{"a":1},"proxy":{"/api":"http://x"}}"#,
        )
        .unwrap();

        assert_eq!(config.port, Some(9000));
        assert_eq!(
            config.app_config,
            Some(ConfigRef::Location("https://map/app.config.json".to_string()))
        );
        assert!(matches!(config.config, Some(ConfigRef::Inline(_))));
        assert_eq!(config.custom_proxy().unwrap().len(), 1);
    }

    #[test]
    fn empty_document_uses_defaults() {
        assert_eq!(UserConfig::parse("{}").unwrap(), UserConfig::default());
    }
}
