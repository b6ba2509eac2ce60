use std::path::Path;

use crate::domain::{AppError, DepType};

/// Node package manager used to install dependencies and run package scripts.
pub trait PackageManager {
    /// Install `specs` into the package at `cwd`. An empty list installs the lockfile state.
    fn install(&self, specs: &[String], dep_type: DepType, cwd: &Path) -> Result<(), AppError>;

    /// Registry metadata for `spec` as JSON text.
    fn view(&self, spec: &str, cwd: &Path) -> Result<String, AppError>;

    /// Run a `package.json` script of the package at `cwd`.
    fn run_script(&self, script: &str, args: &[&str], cwd: &Path) -> Result<(), AppError>;
}
