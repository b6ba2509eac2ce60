//! Shared testing utilities for vcmplugin CLI tests.

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Testing harness providing an isolated plugin directory for CLI exercises.
#[allow(dead_code)]
pub struct TestContext {
    root: TempDir,
    work_dir: PathBuf,
}

#[allow(dead_code)]
impl TestContext {
    /// Create a new isolated environment.
    pub fn new() -> Self {
        let root = TempDir::new().expect("Failed to create temp directory for tests");
        let work_dir = root.path().join("work");
        fs::create_dir_all(&work_dir).expect("Failed to create test work directory");
        Self { root, work_dir }
    }

    /// Directory used as `--context` and working directory.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Build a command for invoking the compiled `vcmplugin` binary within the work directory.
    pub fn cli(&self) -> Command {
        let mut cmd = Command::cargo_bin("vcmplugin").expect("Failed to locate vcmplugin binary");
        cmd.current_dir(&self.work_dir).env("RUST_LOG", "warn");
        cmd
    }

    /// Write a file below the work directory, creating parents.
    pub fn write(&self, relative: &str, content: &str) {
        let path = self.work_dir.join(relative);
        fs::create_dir_all(path.parent().expect("file has a parent")).unwrap();
        fs::write(path, content).unwrap();
    }

    /// Write a minimal plugin `package.json`.
    pub fn write_manifest(&self, name: &str) {
        self.write("package.json", &format!(r#"{{"name":"{}","version":"1.0.0"}}"#, name));
    }

    /// Run `f` with the process working directory set to the work directory.
    pub fn with_work_dir<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let original = std::env::current_dir().expect("Failed to get current directory");
        std::env::set_current_dir(&self.work_dir).expect("Failed to enter work directory");
        let result = f();
        std::env::set_current_dir(original).expect("Failed to restore working directory");
        result
    }
}
