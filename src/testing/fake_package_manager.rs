use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::domain::{AppError, DepType};
use crate::ports::PackageManager;

/// Records npm invocations instead of running them. Clones share their records.
#[derive(Clone, Debug, Default)]
pub struct FakePackageManager {
    pub installs: Arc<Mutex<Vec<(Vec<String>, DepType, PathBuf)>>>,
    pub script_runs: Arc<Mutex<Vec<(String, PathBuf)>>>,
    pub view_response: Arc<Mutex<Option<String>>>,
    pub fail_install: Arc<Mutex<bool>>,
}

impl FakePackageManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_view_response(self, json: &str) -> Self {
        *self.view_response.lock().unwrap() = Some(json.to_string());
        self
    }

    pub fn failing_install(self) -> Self {
        *self.fail_install.lock().unwrap() = true;
        self
    }

    pub fn installed(&self) -> Vec<(Vec<String>, DepType)> {
        self.installs.lock().unwrap().iter().map(|(s, d, _)| (s.clone(), *d)).collect()
    }

    /// Script invocations as `<script> <args>`.
    pub fn scripts(&self) -> Vec<String> {
        self.script_runs.lock().unwrap().iter().map(|(s, _)| s.clone()).collect()
    }
}

impl PackageManager for FakePackageManager {
    fn install(&self, specs: &[String], dep_type: DepType, cwd: &Path) -> Result<(), AppError> {
        if *self.fail_install.lock().unwrap() {
            return Err(AppError::external_tool("npm install", "exited with 1"));
        }
        self.installs.lock().unwrap().push((specs.to_vec(), dep_type, cwd.to_path_buf()));
        Ok(())
    }

    fn view(&self, spec: &str, _cwd: &Path) -> Result<String, AppError> {
        self.view_response
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| AppError::external_tool(format!("npm view {}", spec), "no response"))
    }

    fn run_script(&self, script: &str, args: &[&str], cwd: &Path) -> Result<(), AppError> {
        let invocation = std::iter::once(script).chain(args.iter().copied()).collect::<Vec<_>>();
        self.script_runs.lock().unwrap().push((invocation.join(" "), cwd.to_path_buf()));
        Ok(())
    }
}
