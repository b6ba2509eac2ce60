use std::fs;
use std::sync::{Arc, Mutex};

use crate::domain::AppError;
use crate::ports::{BundleRequest, Bundler, BundlerProcess, DevServerRequest};

/// Writes a placeholder bundle instead of running the bundler.
#[derive(Clone, Default)]
pub struct FakeBundler {
    pub builds: Arc<Mutex<Vec<BundleRequest>>>,
    pub dev_servers: Arc<Mutex<Vec<DevServerRequest>>>,
    pub fail: Arc<Mutex<bool>>,
}

impl FakeBundler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(self) -> Self {
        *self.fail.lock().unwrap() = true;
        self
    }

    pub fn builds(&self) -> Vec<BundleRequest> {
        self.builds.lock().unwrap().clone()
    }

    fn emit(&self, request: &BundleRequest) -> Result<(), AppError> {
        if *self.fail.lock().unwrap() {
            return Err(AppError::external_tool("vite build", "exited with 1"));
        }
        let out_dir = request.root.join(&request.out_dir);
        if request.empty_out_dir && out_dir.exists() {
            fs::remove_dir_all(&out_dir)?;
        }
        fs::create_dir_all(&out_dir)?;
        fs::write(out_dir.join("index.js"), format!("// {}\n", request.plugin_name))?;
        self.builds.lock().unwrap().push(request.clone());
        Ok(())
    }
}

impl Bundler for FakeBundler {
    fn build(&self, request: &BundleRequest) -> Result<(), AppError> {
        self.emit(request)
    }

    fn spawn_watch(&self, request: &BundleRequest) -> Result<BundlerProcess, AppError> {
        self.emit(request)?;
        Ok(BundlerProcess::detached())
    }

    fn spawn_dev_server(&self, request: &DevServerRequest) -> Result<BundlerProcess, AppError> {
        self.dev_servers.lock().unwrap().push(request.clone());
        Ok(BundlerProcess::detached())
    }
}
