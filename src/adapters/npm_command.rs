use std::path::Path;
use std::process::{Command, Output, Stdio};

use tracing::{debug, info};

use crate::domain::{AppError, DepType};
use crate::ports::PackageManager;

#[cfg(windows)]
const NPM_PROGRAM: &str = "npm.cmd";
#[cfg(not(windows))]
const NPM_PROGRAM: &str = "npm";

/// `npm` invoked as a subprocess.
#[derive(Debug, Clone, Default)]
pub struct NpmCommandAdapter;

impl NpmCommandAdapter {
    pub fn new() -> Self {
        Self
    }

    fn run(&self, args: &[&str], cwd: &Path) -> Result<Output, AppError> {
        let command_line = format!("npm {}", args.join(" "));
        debug!(cwd = %cwd.display(), "running {}", command_line);

        let output = Command::new(NPM_PROGRAM)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .output()
            .map_err(|err| AppError::external_tool(command_line.clone(), err.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::external_tool(
                command_line,
                format!("exited with {}\nstderr:\n{}", output.status, stderr.trim()),
            ));
        }

        Ok(output)
    }
}

impl PackageManager for NpmCommandAdapter {
    fn install(&self, specs: &[String], dep_type: DepType, cwd: &Path) -> Result<(), AppError> {
        let mut args = vec!["install"];
        if !specs.is_empty() {
            args.push(dep_type.npm_flag());
            args.extend(specs.iter().map(String::as_str));
        }
        info!("npm {}", args.join(" "));
        self.run(&args, cwd)?;
        Ok(())
    }

    fn view(&self, spec: &str, cwd: &Path) -> Result<String, AppError> {
        let output = self.run(&["view", spec, "--json"], cwd)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn run_script(&self, script: &str, args: &[&str], cwd: &Path) -> Result<(), AppError> {
        let mut command = vec!["run", script];
        if !args.is_empty() {
            command.push("--");
            command.extend_from_slice(args);
        }
        self.run(&command, cwd)?;
        Ok(())
    }
}
