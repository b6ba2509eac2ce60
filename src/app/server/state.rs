use std::path::PathBuf;
use std::sync::Arc;

use url::Url;

use super::forward::Forwarder;
use crate::adapters::{Credentials, HttpConfigSource};
use crate::app::config::ConfigResolver;
use crate::domain::ProxyRouteTable;

/// Where the map application's `index.html` comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexSource {
    /// A local file. `inject_client` adds the bundler's HMR client script.
    File { path: PathBuf, inject_client: bool },
    /// The index page of a hosted map application.
    Remote { url: Url, credentials: Option<Credentials> },
}

/// A directory served verbatim below a URL prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticMount {
    pub prefix: String,
    pub dir: PathBuf,
}

impl StaticMount {
    pub fn new(prefix: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self { prefix: prefix.into(), dir: dir.into() }
    }

    /// The request path below this mount, if the mount owns `path`.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix(self.prefix.as_str())?;
        (rest.is_empty() || rest.starts_with('/')).then_some(rest)
    }
}

/// Everything a request handler needs, shared by every connection.
#[derive(Debug, Clone)]
pub struct ServerState {
    pub resolver: ConfigResolver,
    pub proxies: Arc<ProxyRouteTable>,
    pub forwarder: Forwarder,
    pub http: HttpConfigSource,
    pub index: IndexSource,
    /// Root of the host framework's `config/` directory, when served locally.
    pub config_root: Option<PathBuf>,
    pub mounts: Arc<Vec<StaticMount>>,
    /// Prefix (e.g. `/src/plugin-assets`) redirected to `/plugin-assets`.
    pub asset_redirect: Option<String>,
    /// Bundler dev server receiving every unmatched request.
    pub fallback: Option<Url>,
}
