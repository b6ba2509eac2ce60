use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::debug;

use crate::domain::{AppError, PackageManifest, USER_CONFIG_FILE, UserConfig};
use crate::ports::{Bundler, PackageManager};

/// Application context holding the plugin location and the external tools.
pub struct AppContext<P: PackageManager, B: Bundler> {
    root: PathBuf,
    plugin_name: Option<String>,
    npm: P,
    bundler: B,
    manifest: OnceLock<PackageManifest>,
}

impl<P: PackageManager, B: Bundler> AppContext<P, B> {
    /// Create a context for the plugin at `root`. `plugin_name` overrides the manifest name.
    pub fn new(
        root: impl Into<PathBuf>,
        plugin_name: Option<String>,
        npm: P,
        bundler: B,
    ) -> Self {
        Self { root: root.into(), plugin_name, npm, bundler, manifest: OnceLock::new() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn npm(&self) -> &P {
        &self.npm
    }

    pub fn bundler(&self) -> &B {
        &self.bundler
    }

    /// Path below the plugin root.
    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    /// The plugin's `package.json`, read once.
    pub fn manifest(&self) -> Result<&PackageManifest, AppError> {
        if let Some(manifest) = self.manifest.get() {
            return Ok(manifest);
        }
        let path = self.resolve("package.json");
        if !path.is_file() {
            return Err(AppError::ManifestMissing(self.root.clone()));
        }
        let manifest = PackageManifest::parse(&fs::read_to_string(&path)?)?;
        Ok(self.manifest.get_or_init(|| manifest))
    }

    /// The `--plugin-name` override, or the manifest name.
    pub fn plugin_name(&self) -> Result<String, AppError> {
        match &self.plugin_name {
            Some(name) => Ok(name.clone()),
            None => Ok(self.manifest()?.plugin_name()?.to_string()),
        }
    }

    /// `vcs.config.json` from the plugin root; defaults when absent.
    pub fn user_config(&self) -> Result<UserConfig, AppError> {
        let path = self.resolve(USER_CONFIG_FILE);
        if !path.is_file() {
            debug!("no {} in {}", USER_CONFIG_FILE, self.root.display());
            return Ok(UserConfig::default());
        }
        UserConfig::parse(&fs::read_to_string(path)?)
    }
}
