//! Resolves the application config served to the map application.

use std::path::{Component, Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

use super::cache::{BASE_CONFIG_KEY, ConfigCache, MERGED_CONFIG_KEY};
use crate::adapters::{Credentials, HttpConfigSource};
use crate::domain::app_config::{is_http_url, strip_plugin_from_module};
use crate::domain::plugin_config::parse_plugin_config;
use crate::domain::{
    AppError, ApplicationConfig, ConfigRef, PLUGIN_CONFIG_FILE, PluginDescriptor,
    merge_plugin_into_config,
};

/// Where the base application config is read from.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    Inline(Value),
    File(PathBuf),
    Remote(Url),
}

impl ConfigSource {
    /// A URL when `location` starts with `http(s)://`, a file relative to `root` otherwise.
    pub fn from_location(location: &str, root: &Path) -> Result<Self, AppError> {
        if is_http_url(location) {
            let url = Url::parse(location).map_err(|err| {
                AppError::user_input(format!("Invalid URL {}: {}", location, err))
            })?;
            Ok(ConfigSource::Remote(url))
        } else {
            Ok(ConfigSource::File(root.join(location)))
        }
    }

    pub fn from_ref(config: &ConfigRef, root: &Path) -> Result<Self, AppError> {
        match config {
            ConfigRef::Location(location) => Self::from_location(location, root),
            ConfigRef::Inline(map) => Ok(ConfigSource::Inline(Value::Object(map.clone()))),
        }
    }

    fn describe(&self) -> String {
        match self {
            ConfigSource::Inline(_) => "inline app config".to_string(),
            ConfigSource::File(path) => path.display().to_string(),
            ConfigSource::Remote(url) => url.to_string(),
        }
    }
}

/// Where the configuration of the plugin under development is read from.
#[derive(Debug, Clone, PartialEq)]
pub enum PluginConfigSource {
    Inline(Map<String, Value>),
    File(PathBuf),
}

impl PluginConfigSource {
    /// `--config`, then `config` from `vcs.config.json`, then `<root>/config.json`.
    pub fn select(cli: Option<&str>, user: Option<&ConfigRef>, root: &Path) -> Self {
        match (cli, user) {
            (Some(path), _) => PluginConfigSource::File(root.join(path)),
            (None, Some(ConfigRef::Location(path))) => PluginConfigSource::File(root.join(path)),
            (None, Some(ConfigRef::Inline(map))) => PluginConfigSource::Inline(map.clone()),
            (None, None) => PluginConfigSource::File(root.join(PLUGIN_CONFIG_FILE)),
        }
    }

    /// The file to watch for changes, if any.
    pub fn file(&self) -> Option<&Path> {
        match self {
            PluginConfigSource::File(path) => Some(path),
            PluginConfigSource::Inline(_) => None,
        }
    }

    /// The plugin config; an absent file yields an empty object.
    pub async fn load(&self) -> Result<Map<String, Value>, AppError> {
        match self {
            PluginConfigSource::Inline(map) => Ok(map.clone()),
            PluginConfigSource::File(path) => match tokio::fs::read_to_string(path).await {
                Ok(content) => parse_plugin_config(&content, &path.display().to_string()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    debug!("no plugin config at {}", path.display());
                    Ok(Map::new())
                }
                Err(err) => Err(err.into()),
            },
        }
    }
}

/// Load and parse the base application config.
///
/// Remote configs get their relative module URLs resolved against the config URL.
pub async fn load_base_config(
    source: &ConfigSource,
    http: &HttpConfigSource,
    credentials: Option<&Credentials>,
) -> Result<ApplicationConfig, AppError> {
    let what = source.describe();
    match source {
        ConfigSource::Inline(value) => ApplicationConfig::from_value(value.clone(), &what),
        ConfigSource::File(path) => {
            let content = tokio::fs::read_to_string(path).await?;
            ApplicationConfig::parse(&content, &what)
        }
        ConfigSource::Remote(url) => {
            let value = http.fetch_json(url, credentials).await?;
            let mut config = ApplicationConfig::from_value(value, &what)?;
            config.absolutize_module_urls(url);
            Ok(config)
        }
    }
}

/// Inputs of a [`ConfigResolver`].
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    pub base: ConfigSource,
    pub plugin: PluginConfigSource,
    pub plugin_name: String,
    /// Entry written into the plugin descriptor.
    pub entry: String,
    pub credentials: Option<Credentials>,
}

/// Produces the merged app config and the host framework's module configs,
/// caching each result in the shared [`ConfigCache`].
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    options: ResolverOptions,
    http: HttpConfigSource,
    cache: ConfigCache,
}

impl ConfigResolver {
    pub fn new(options: ResolverOptions, http: HttpConfigSource, cache: ConfigCache) -> Self {
        Self { options, http, cache }
    }

    pub fn cache(&self) -> &ConfigCache {
        &self.cache
    }

    pub fn plugin_name(&self) -> &str {
        &self.options.plugin_name
    }

    pub fn plugin_config_file(&self) -> Option<&Path> {
        self.options.plugin.file()
    }

    /// The base config with the plugin under development merged in.
    pub async fn app_config(&self) -> Result<Value, AppError> {
        if let Some(cached) = self.cache.get(MERGED_CONFIG_KEY) {
            return Ok(cached);
        }

        let base = self.base_config().await?;
        let plugin_config = self.options.plugin.load().await?;
        let descriptor = PluginDescriptor::from_plugin_config(
            plugin_config,
            &self.options.plugin_name,
            &self.options.entry,
        )?;
        let merged = serde_json::to_value(merge_plugin_into_config(base, descriptor))?;

        self.cache.set(MERGED_CONFIG_KEY, merged.clone());
        Ok(merged)
    }

    async fn base_config(&self) -> Result<ApplicationConfig, AppError> {
        if let Some(cached) = self.cache.get(BASE_CONFIG_KEY) {
            return ApplicationConfig::from_value(cached, "cached base config");
        }
        let config =
            load_base_config(&self.options.base, &self.http, self.options.credentials.as_ref())
                .await?;
        self.cache.set(BASE_CONFIG_KEY, serde_json::to_value(&config)?);
        Ok(config)
    }

    /// A module config below `config_root` addressed by the request path
    /// `/config/...`, with the plugin under development removed.
    ///
    /// `Ok(None)` when the file does not exist. Parse failures evict the entry.
    pub async fn module_config(
        &self,
        config_root: &Path,
        request_path: &str,
    ) -> Result<Option<Value>, AppError> {
        if let Some(cached) = self.cache.get(request_path) {
            return Ok(Some(cached));
        }
        let Some(file) = module_config_file(config_root, request_path) else {
            return Ok(None);
        };
        if !file.is_file() {
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(&file).await?;
        match serde_json::from_str::<Value>(&content) {
            Ok(mut document) => {
                strip_plugin_from_module(&mut document, &self.options.plugin_name);
                self.cache.set(request_path, document.clone());
                Ok(Some(document))
            }
            Err(err) => {
                self.cache.invalidate(request_path);
                warn!("Failed to parse config {}", request_path);
                Err(AppError::config_parse(request_path, err))
            }
        }
    }
}

/// Map `/config/a/b.json` onto `<config_root>/config/a/b.json`, refusing traversal.
fn module_config_file(config_root: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = Path::new(request_path.trim_start_matches('/'));
    let safe = relative.components().all(|component| matches!(component, Component::Normal(_)));
    safe.then(|| config_root.join(relative))
}
