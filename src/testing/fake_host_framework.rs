use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use url::Url;

use crate::domain::{AppError, InlinePlugin, ProxyRouteTable};
use crate::ports::HostFramework;

/// Host framework rooted in a test directory; build steps are only recorded.
#[derive(Clone)]
pub struct FakeHostFramework {
    root: PathBuf,
    pub version: String,
    pub inline: Vec<InlinePlugin>,
    pub proxies: ProxyRouteTable,
    pub calls: Arc<Mutex<Vec<&'static str>>>,
}

impl FakeHostFramework {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            version: "6.1.0".to_string(),
            inline: Vec::new(),
            proxies: ProxyRouteTable::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) -> Result<(), AppError> {
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

impl HostFramework for FakeHostFramework {
    fn root(&self) -> &Path {
        &self.root
    }

    fn version(&self) -> Result<String, AppError> {
        Ok(self.version.clone())
    }

    fn plugin_proxies(&self, _target: &Url) -> Result<ProxyRouteTable, AppError> {
        Ok(self.proxies.clone())
    }

    fn inline_plugins(&self) -> Result<Vec<InlinePlugin>, AppError> {
        Ok(self.inline.clone())
    }

    fn build_library(&self) -> Result<(), AppError> {
        self.record("build_library")
    }

    fn build_plugins_for_preview(&self) -> Result<(), AppError> {
        self.record("build_plugins_for_preview")
    }

    fn install_plugins(&self) -> Result<(), AppError> {
        self.record("install_plugins")
    }

    fn ensure_types(&self) -> Result<(), AppError> {
        self.record("ensure_types")
    }
}
