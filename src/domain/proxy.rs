//! Proxy routes of the local dev server.
//!
//! A route key starting with `^` is a regular expression matched against the
//! request path; any other key is a plain path prefix. Keys keep the position
//! of their first insertion, re-inserting a key replaces its route in place.

use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use url::Url;

use crate::domain::AppError;

/// Remote host serving the example data used by plugin templates.
pub const EXAMPLE_DATA_HOST: &str = "https://vcmap.virtualcitymap.de";

/// Location of the graphics engine runtime assets inside `node_modules`.
pub const CESIUM_BUILD_PATH: &str = "/node_modules/@vcmap-cesium/engine/Build/";

/// How the request path is rewritten before forwarding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PathRewrite {
    /// Replace the first match of `pattern` with `replacement` (`$1` style groups allowed).
    Replace { pattern: String, replacement: String },
    /// Strip `prefix` and resolve the remainder below `base`. A bare prefix or
    /// `index.js` resolves to `default_file`.
    #[serde(rename_all = "camelCase")]
    Relocate { prefix: String, base: String, default_file: String },
}

impl PathRewrite {
    fn compile(&self) -> Result<CompiledRewrite, AppError> {
        match self {
            PathRewrite::Replace { pattern, replacement } => {
                Ok(CompiledRewrite::Replace(compile_pattern(pattern)?, replacement.clone()))
            }
            PathRewrite::Relocate { prefix, base, default_file } => Ok(CompiledRewrite::Relocate {
                prefix: prefix.clone(),
                base: base.trim_end_matches('/').to_string(),
                default_file: default_file.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
enum CompiledRewrite {
    Replace(Regex, String),
    Relocate { prefix: String, base: String, default_file: String },
}

impl CompiledRewrite {
    fn apply(&self, path: &str) -> String {
        match self {
            CompiledRewrite::Replace(regex, replacement) => {
                regex.replace(path, replacement.as_str()).into_owned()
            }
            CompiledRewrite::Relocate { prefix, base, default_file } => {
                let rest = path.strip_prefix(prefix.as_str()).unwrap_or(path).trim_matches('/');
                let rest =
                    if rest.is_empty() || rest == "index.js" { default_file.as_str() } else { rest };
                format!("{}/{}", base, rest)
            }
        }
    }
}

/// Target of a proxied route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRoute {
    pub target: Url,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewrite: Option<PathRewrite>,
    #[serde(default)]
    pub change_origin: bool,
    #[serde(default = "default_secure")]
    pub secure: bool,
    #[serde(default)]
    pub strip_csp: bool,
}

fn default_secure() -> bool {
    true
}

impl ProxyRoute {
    pub fn to(target: Url) -> Self {
        Self { target, rewrite: None, change_origin: false, secure: true, strip_csp: false }
    }

    pub fn with_rewrite(mut self, rewrite: PathRewrite) -> Self {
        self.rewrite = Some(rewrite);
        self
    }

    pub fn changing_origin(mut self) -> Self {
        self.change_origin = true;
        self
    }

    pub fn insecure(mut self) -> Self {
        self.secure = false;
        self
    }

    pub fn stripping_csp(mut self) -> Self {
        self.strip_csp = true;
        self
    }
}

#[derive(Debug, Clone)]
enum RouteMatcher {
    Pattern(Regex),
    Prefix(String),
}

impl RouteMatcher {
    fn for_key(key: &str) -> Result<Self, AppError> {
        if key.starts_with('^') {
            Ok(RouteMatcher::Pattern(compile_pattern(key)?))
        } else {
            Ok(RouteMatcher::Prefix(key.to_string()))
        }
    }

    fn matches(&self, path: &str) -> bool {
        match self {
            RouteMatcher::Pattern(regex) => regex.is_match(path),
            RouteMatcher::Prefix(prefix) => path.starts_with(prefix.as_str()),
        }
    }
}

#[derive(Debug, Clone)]
struct RouteEntry {
    key: String,
    matcher: RouteMatcher,
    rewrite: Option<CompiledRewrite>,
    route: ProxyRoute,
}

/// A route chosen for a request path.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRoute<'a> {
    pub key: &'a str,
    pub route: &'a ProxyRoute,
    /// Path (without query) to request from the target.
    pub path: String,
}

/// Ordered mapping from route pattern to proxy target.
#[derive(Debug, Clone, Default)]
pub struct ProxyRouteTable {
    entries: Vec<RouteEntry>,
}

impl ProxyRouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from user supplied entries: either a target URL string or a route object.
    pub fn from_custom(entries: &Map<String, Value>) -> Result<Self, AppError> {
        let mut table = Self::new();
        for (key, value) in entries {
            let route = match value {
                Value::String(target) => ProxyRoute::to(parse_target(key, target)?),
                other => serde_json::from_value(other.clone())
                    .map_err(|err| AppError::config_parse(format!("proxy entry '{}'", key), err))?,
            };
            table.insert(key.clone(), route)?;
        }
        Ok(table)
    }

    /// Insert or replace a route (last write wins, position of first insert is kept).
    pub fn insert(&mut self, key: impl Into<String>, route: ProxyRoute) -> Result<(), AppError> {
        let key = key.into();
        let rewrite = route.rewrite.as_ref().map(PathRewrite::compile).transpose()?;
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.key == key) {
            entry.rewrite = rewrite;
            entry.route = route;
            return Ok(());
        }
        let matcher = RouteMatcher::for_key(&key)?;
        self.entries.push(RouteEntry { key, matcher, rewrite, route });
        Ok(())
    }

    /// Merge `other` into this table; routes from `other` win on key collisions.
    pub fn extend(&mut self, other: ProxyRouteTable) {
        for entry in other.entries {
            if let Some(existing) = self.entries.iter_mut().find(|e| e.key == entry.key) {
                *existing = entry;
            } else {
                self.entries.push(entry);
            }
        }
    }

    pub fn remove_where(&mut self, predicate: impl Fn(&str) -> bool) {
        self.entries.retain(|entry| !predicate(&entry.key));
    }

    pub fn get(&self, key: &str) -> Option<&ProxyRoute> {
        self.entries.iter().find(|entry| entry.key == key).map(|entry| &entry.route)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First route (in table order) matching `path`, with the rewritten path.
    pub fn resolve(&self, path: &str) -> Option<ResolvedRoute<'_>> {
        self.entries.iter().find(|entry| entry.matcher.matches(path)).map(|entry| ResolvedRoute {
            key: &entry.key,
            route: &entry.route,
            path: entry.rewrite.as_ref().map_or_else(|| path.to_string(), |r| r.apply(path)),
        })
    }
}

impl PartialEq for ProxyRouteTable {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(&other.entries)
                .all(|(a, b)| a.key == b.key && a.route == b.route)
    }
}

impl Serialize for ProxyRouteTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.key, &entry.route)?;
        }
        map.end()
    }
}

/// A plugin shipped inside the host framework installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlinePlugin {
    pub name: String,
    /// Path of the plugin directory as served by the bundler, e.g. `/node_modules/@vcmap/ui/plugins/foo`.
    pub served_path: String,
}

/// Inputs of a proxy assembly run.
#[derive(Debug, Clone)]
pub struct ProxyAssembly<'a> {
    /// Routes produced by the host framework's own tooling.
    pub base: ProxyRouteTable,
    pub inline_plugins: &'a [InlinePlugin],
    /// Plugin under development; never proxied.
    pub plugin_name: &'a str,
    /// Local bundler dev server.
    pub bundler_target: &'a Url,
    /// Caller supplied entries (user config), merged last among the additions.
    pub custom: ProxyRouteTable,
}

/// Route pattern for a plugin served below `/plugins/`. The name is matched literally.
pub fn plugin_route_key(name: &str) -> String {
    format!("^/plugins/{}/.*", regex::escape(name))
}

/// Whether a route key addresses the given plugin, with the name written
/// literally or regex-escaped.
pub fn targets_plugin(key: &str, name: &str) -> bool {
    let path = key.trim_start_matches('^');
    [name.to_string(), regex::escape(name)].iter().any(|candidate| {
        let prefix = format!("/plugins/{}", candidate);
        match path.strip_prefix(prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with(['/', '$', '(', '?']),
            None => false,
        }
    })
}

/// Compute the route table for the dev server.
///
/// Order: host base table, inline plugins, fixed supplementary routes, custom
/// entries, then removal of every route addressing the plugin under development.
pub fn assemble_proxy_routes(assembly: ProxyAssembly<'_>) -> Result<ProxyRouteTable, AppError> {
    let ProxyAssembly { base, inline_plugins, plugin_name, bundler_target, custom } = assembly;
    let mut table = base;

    for plugin in inline_plugins {
        let prefix = format!("/plugins/{}/", plugin.name);
        let route = ProxyRoute::to(bundler_target.clone()).with_rewrite(PathRewrite::Relocate {
            prefix,
            base: plugin.served_path.clone(),
            default_file: "index.js".to_string(),
        });
        table.insert(plugin_route_key(&plugin.name), route)?;
    }

    table.extend(supplementary_routes(bundler_target)?);
    table.extend(custom);
    table.remove_where(|key| targets_plugin(key, plugin_name));

    Ok(table)
}

/// Routes for resources outside the host framework's standard build output.
pub fn supplementary_routes(bundler_target: &Url) -> Result<ProxyRouteTable, AppError> {
    let mut table = ProxyRouteTable::new();
    table.insert(
        "^/exampleData/.*",
        ProxyRoute::to(parse_target("^/exampleData/.*", EXAMPLE_DATA_HOST)?).changing_origin(),
    )?;
    table.insert(
        "^/assets/cesium/.*",
        ProxyRoute::to(bundler_target.clone()).with_rewrite(PathRewrite::Replace {
            pattern: "^/assets/cesium/".to_string(),
            replacement: CESIUM_BUILD_PATH.to_string(),
        }),
    )?;
    Ok(table)
}

/// Routes forwarding the framework's static resources to a hosted instance.
pub fn hosted_routes(hosted: &Url) -> Result<ProxyRouteTable, AppError> {
    let mut table = ProxyRouteTable::new();
    for key in ["^/style.css", "^/assets", "^/plugins"] {
        table.insert(
            key,
            ProxyRoute::to(hosted.clone()).changing_origin().insecure().stripping_csp(),
        )?;
    }
    Ok(table)
}

fn compile_pattern(pattern: &str) -> Result<Regex, AppError> {
    Regex::new(pattern).map_err(|err| AppError::InvalidProxyPattern {
        pattern: pattern.to_string(),
        details: err.to_string(),
    })
}

fn parse_target(key: &str, target: &str) -> Result<Url, AppError> {
    Url::parse(target)
        .map_err(|err| AppError::config_parse(format!("proxy target of '{}'", key), err))
}
