use std::path::Path;

use url::Url;

use crate::domain::{AppError, InlinePlugin, ProxyRouteTable};

/// Capabilities of the installed host framework (`@vcmap/ui`).
///
/// Resolved once per command; locating it fails with `HostFrameworkMissing`
/// when the package is not installed in the plugin context.
pub trait HostFramework {
    /// Installation directory of the host framework.
    fn root(&self) -> &Path;

    /// Installed host framework version.
    fn version(&self) -> Result<String, AppError>;

    /// Proxy routes for plugins the host framework serves itself.
    fn plugin_proxies(&self, target: &Url) -> Result<ProxyRouteTable, AppError>;

    /// Plugins shipped alongside the host framework installation.
    fn inline_plugins(&self) -> Result<Vec<InlinePlugin>, AppError>;

    /// Build the host framework's production `dist`.
    fn build_library(&self) -> Result<(), AppError>;

    /// Build the host framework's plugins into the plugin context's `dist/plugins`.
    fn build_plugins_for_preview(&self) -> Result<(), AppError>;

    /// Install the dev plugins declared by the host framework.
    fn install_plugins(&self) -> Result<(), AppError>;

    /// Build the host framework's type declarations if they are missing.
    fn ensure_types(&self) -> Result<(), AppError>;

    fn resolve(&self, segments: &[&str]) -> std::path::PathBuf {
        segments.iter().fold(self.root().to_path_buf(), |path, segment| path.join(segment))
    }
}
