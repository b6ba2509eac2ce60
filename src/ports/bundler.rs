use std::fs;
use std::path::PathBuf;
use std::process::Child;

use tracing::{debug, warn};
use url::Url;

use crate::domain::AppError;

/// A library build of the plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleRequest {
    pub root: PathBuf,
    pub plugin_name: String,
    pub entry: String,
    /// Output directory relative to `root`.
    pub out_dir: String,
    /// Modules provided by the host at runtime.
    pub externals: Vec<String>,
    pub development: bool,
    pub watch: bool,
    /// Remove the output directory before building.
    pub empty_out_dir: bool,
}

/// A bundler dev server serving the plugin sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevServerRequest {
    pub root: PathBuf,
    pub plugin_name: String,
    pub port: u16,
    pub https: bool,
}

impl DevServerRequest {
    pub fn url(&self) -> Result<Url, AppError> {
        let scheme = if self.https { "https" } else { "http" };
        Url::parse(&format!("{}://localhost:{}", scheme, self.port))
            .map_err(|err| AppError::config_parse("bundler url", err))
    }
}

/// A running bundler subprocess and the temporary files created for it.
#[derive(Debug, Default)]
pub struct BundlerProcess {
    child: Option<Child>,
    temp_files: Vec<PathBuf>,
}

impl BundlerProcess {
    pub fn new(child: Child, temp_files: Vec<PathBuf>) -> Self {
        Self { child: Some(child), temp_files }
    }

    /// A handle not backed by a subprocess.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Kill the subprocess, then remove its temporary files.
    pub fn stop(&mut self) {
        self.kill();
        self.remove_temp_files();
    }

    pub fn kill(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(err) = child.kill() {
                debug!("bundler process already exited: {}", err);
            }
            let _ = child.wait();
        }
    }

    pub fn remove_temp_files(&mut self) {
        for file in self.temp_files.drain(..) {
            if let Err(err) = fs::remove_file(&file)
                && file.exists()
            {
                warn!("failed to remove {}: {}", file.display(), err);
            }
        }
    }
}

impl Drop for BundlerProcess {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Module bundler invoked as an external tool.
pub trait Bundler {
    /// Build the plugin. In watch mode this only returns when the bundler exits.
    fn build(&self, request: &BundleRequest) -> Result<(), AppError>;

    /// Start a watch build in the background.
    fn spawn_watch(&self, request: &BundleRequest) -> Result<BundlerProcess, AppError>;

    /// Start the bundler's dev server in the background.
    fn spawn_dev_server(&self, request: &DevServerRequest) -> Result<BundlerProcess, AppError>;
}
