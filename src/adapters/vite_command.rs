use std::fs;
use std::net::{SocketAddr, TcpStream};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use minijinja::context;
use tracing::{debug, info};

use crate::adapters::embedded_assets::render_bundler_config;
use crate::domain::AppError;
use crate::ports::{BundleRequest, Bundler, BundlerProcess, DevServerRequest};

#[cfg(windows)]
const NPX_PROGRAM: &str = "npx.cmd";
#[cfg(not(windows))]
const NPX_PROGRAM: &str = "npx";

/// Generated configs live next to the installed packages so vite resolves them.
const CONFIG_DIR: &str = "node_modules/.vcmplugin";

const DEV_SERVER_STARTUP: Duration = Duration::from_secs(30);

/// `vite` invoked through `npx`, configured by generated config files.
#[derive(Debug, Clone, Default)]
pub struct ViteCommandAdapter;

impl ViteCommandAdapter {
    pub fn new() -> Self {
        Self
    }

    fn write_config(
        &self,
        root: &Path,
        file_name: &str,
        content: &str,
    ) -> Result<PathBuf, AppError> {
        let dir = root.join(CONFIG_DIR);
        fs::create_dir_all(&dir)?;
        let path = dir.join(file_name);
        fs::write(&path, content)?;
        debug!("wrote bundler config {}", path.display());
        Ok(path)
    }

    fn build_config(&self, request: &BundleRequest) -> Result<PathBuf, AppError> {
        let mode = if request.development { "development" } else { "production" };
        let content = render_bundler_config(
            "vite.build.config.mjs",
            context! {
                root => json(&request.root.display().to_string())?,
                entry => json(&request.entry)?,
                out_dir => json(&request.out_dir)?,
                empty_out_dir => request.empty_out_dir,
                minify => !request.development,
                sourcemap => request.development,
                mode => json(mode)?,
                externals => json(&request.externals)?,
            },
        )?;
        self.write_config(&request.root, "vite.build.config.mjs", &content)
    }

    fn vite(&self, root: &Path, config: &Path, args: &[&str]) -> Command {
        let mut command = Command::new(NPX_PROGRAM);
        command.arg("vite").args(args).arg("--config").arg(config).current_dir(root);
        command.stdin(Stdio::null());
        command
    }

    fn spawn(&self, mut command: Command, what: &str) -> Result<Child, AppError> {
        command.spawn().map_err(|err| AppError::external_tool(what, err.to_string()))
    }
}

fn json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, AppError> {
    Ok(serde_json::to_string(value)?)
}

fn remove_config(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        debug!("failed to remove {}: {}", path.display(), err);
    }
}

impl Bundler for ViteCommandAdapter {
    fn build(&self, request: &BundleRequest) -> Result<(), AppError> {
        let config = self.build_config(request)?;
        let args: &[&str] = if request.watch { &["build", "--watch"] } else { &["build"] };
        info!("building {}", request.plugin_name);

        let status = self
            .vite(&request.root, &config, args)
            .status()
            .map_err(|err| AppError::external_tool("vite build", err.to_string()));
        remove_config(&config);

        let status = status?;
        if !status.success() {
            return Err(AppError::external_tool("vite build", format!("exited with {}", status)));
        }
        info!("built {}", request.plugin_name);
        Ok(())
    }

    fn spawn_watch(&self, request: &BundleRequest) -> Result<BundlerProcess, AppError> {
        let config = self.build_config(request)?;
        let command = self.vite(&request.root, &config, &["build", "--watch"]);
        match self.spawn(command, "vite build --watch") {
            Ok(child) => {
                info!("watching {}", request.plugin_name);
                Ok(BundlerProcess::new(child, vec![config]))
            }
            Err(err) => {
                remove_config(&config);
                Err(err)
            }
        }
    }

    fn spawn_dev_server(&self, request: &DevServerRequest) -> Result<BundlerProcess, AppError> {
        let content = render_bundler_config(
            "vite.dev.config.mjs",
            context! {
                root => json(&request.root.display().to_string())?,
                port => request.port,
            },
        )?;
        let config = self.write_config(&request.root, "vite.dev.config.mjs", &content)?;

        let command = self.vite(&request.root, &config, &[]);
        let child = match self.spawn(command, "vite") {
            Ok(child) => child,
            Err(err) => {
                remove_config(&config);
                return Err(err);
            }
        };
        let mut process = BundlerProcess::new(child, vec![config]);

        if let Err(err) = wait_for_port(request.port, DEV_SERVER_STARTUP) {
            process.stop();
            return Err(err);
        }
        info!("bundler dev server for {} listening on {}", request.plugin_name, request.port);
        Ok(process)
    }
}

/// Block until something accepts connections on the loopback `port`.
fn wait_for_port(port: u16, timeout: Duration) -> Result<(), AppError> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let started = Instant::now();
    while started.elapsed() < timeout {
        if TcpStream::connect_timeout(&addr, Duration::from_millis(200)).is_ok() {
            return Ok(());
        }
        thread::sleep(Duration::from_millis(100));
    }
    Err(AppError::external_tool(
        "vite",
        format!("dev server did not listen on port {} within {:?}", port, timeout),
    ))
}
