//! Command implementations. Each `execute` returns an outcome; printing is left to the CLI.

pub mod build;
pub mod create;
pub mod pack;
pub mod preview;
pub mod serve;
pub mod setup_map_ui;
pub mod staging;
pub mod update;

use std::net::{Ipv4Addr, SocketAddr, TcpListener};
use std::path::{Component, Path, PathBuf};

use tokio::runtime::{Builder, Runtime};

use crate::domain::{AppError, PLUGIN_ASSETS_DIR};
use crate::ports::HostFramework;

/// Single threaded runtime driving servers and concurrent file writes.
pub(crate) fn runtime() -> Result<Runtime, AppError> {
    Ok(Builder::new_current_thread().enable_all().build()?)
}

/// A loopback port nothing listens on right now.
pub(crate) fn free_port() -> Result<u16, AppError> {
    let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))?;
    Ok(listener.local_addr()?.port())
}

/// The host framework's default app config.
///
/// Production servers prefer the built `dist/app.config.json` when present.
pub(crate) fn default_base_config<H: HostFramework>(host: &H, production: bool) -> PathBuf {
    let built = host.resolve(&["dist", "app.config.json"]);
    if production && built.is_file() { built } else { host.resolve(&["app.config.json"]) }
}

/// Where the bundler asks for plugin assets relative to the entry, e.g.
/// `/src/plugin-assets` for `src/index.js`. `None` for an entry at the plugin root,
/// whose assets already resolve to `/plugin-assets`.
pub(crate) fn entry_assets_path(entry: &str) -> Option<String> {
    let segments: Vec<String> = Path::new(entry)
        .parent()?
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if segments.is_empty() {
        return None;
    }
    Some(format!("/{}/{}", segments.join("/"), PLUGIN_ASSETS_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeHostFramework;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn free_port_is_bindable() {
        let port = free_port().unwrap();
        assert_ne!(port, 0);
        assert!(TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, port))).is_ok());
    }

    #[test]
    fn production_prefers_built_app_config() {
        let dir = TempDir::new().unwrap();
        let host = FakeHostFramework::new(dir.path());
        assert_eq!(default_base_config(&host, true), dir.path().join("app.config.json"));

        fs::create_dir_all(dir.path().join("dist")).unwrap();
        fs::write(dir.path().join("dist/app.config.json"), "{}").unwrap();
        assert_eq!(default_base_config(&host, true), dir.path().join("dist/app.config.json"));
        assert_eq!(default_base_config(&host, false), dir.path().join("app.config.json"));
    }

    #[test]
    fn entry_assets_path_follows_entry_dir() {
        assert_eq!(entry_assets_path("src/index.js").as_deref(), Some("/src/plugin-assets"));
        assert_eq!(entry_assets_path("./dist/index.js").as_deref(), Some("/dist/plugin-assets"));
        assert_eq!(entry_assets_path("lib/esm/index.js").as_deref(), Some("/lib/esm/plugin-assets"));
    }

    #[test]
    fn root_entry_has_no_asset_redirect() {
        assert_eq!(entry_assets_path("index.js"), None);
        assert_eq!(entry_assets_path("./index.js"), None);
    }
}
