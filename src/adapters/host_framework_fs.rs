use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info};
use url::Url;

use crate::domain::proxy::{PathRewrite, plugin_route_key};
use crate::domain::{
    AppError, HOST_FRAMEWORK_PACKAGE, InlinePlugin, PackageManifest, ProxyRoute,
    ProxyRouteTable,
};
use crate::ports::{HostFramework, PackageManager};

#[cfg(windows)]
const NODE_PROGRAM: &str = "node.exe";
#[cfg(not(windows))]
const NODE_PROGRAM: &str = "node";

/// Script building the host framework's bundled plugins into its `dist`.
const BUILD_PLUGINS_FOR_PREVIEW: &str = concat!(
    "import { buildPluginsForPreview } from '@vcmap/ui/build/buildHelpers.js';\n",
    "await buildPluginsForPreview({}, true);",
);

/// The host framework installed below `<context>/node_modules/@vcmap/ui`.
#[derive(Debug, Clone)]
pub struct NodeModulesHostFramework<P: PackageManager> {
    context: PathBuf,
    root: PathBuf,
    npm: P,
}

impl<P: PackageManager> NodeModulesHostFramework<P> {
    /// Locate the host framework for the plugin at `context`.
    pub fn locate(context: &Path, npm: P) -> Result<Self, AppError> {
        let root = host_framework_dir(context);
        if !root.join("package.json").is_file() {
            return Err(AppError::HostFrameworkMissing(context.to_path_buf()));
        }
        Ok(Self { context: context.to_path_buf(), root, npm })
    }

    fn plugins_dir(&self) -> PathBuf {
        self.root.join("plugins")
    }

    /// URL path under which the bundler serves a directory of the host framework.
    fn served_path(&self, dir: &Path) -> String {
        let relative = dir.strip_prefix(&self.context).unwrap_or(dir);
        let segments: Vec<String> = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy().into_owned())
            .collect();
        format!("/{}", segments.join("/"))
    }
}

/// `<context>/node_modules/@vcmap/ui`
pub fn host_framework_dir(context: &Path) -> PathBuf {
    package_dir(context, HOST_FRAMEWORK_PACKAGE)
}

fn package_dir(base: &Path, package: &str) -> PathBuf {
    package.split('/').fold(base.join("node_modules"), |path, part| path.join(part))
}

fn read_manifest(path: &Path) -> Result<PackageManifest, AppError> {
    let content = fs::read_to_string(path)?;
    PackageManifest::parse(&content)
        .map_err(|err| AppError::config_parse(path.display().to_string(), err))
}

impl<P: PackageManager> HostFramework for NodeModulesHostFramework<P> {
    fn root(&self) -> &Path {
        &self.root
    }

    fn version(&self) -> Result<String, AppError> {
        let manifest = read_manifest(&self.root.join("package.json"))?;
        manifest.version.ok_or_else(|| {
            AppError::config_parse(HOST_FRAMEWORK_PACKAGE, "package.json declares no version")
        })
    }

    /// One route per plugin the host framework installs as a dependency of
    /// its `plugins` package. Requests are resolved against the installed
    /// package, `index.js` mapping to the package's `main`.
    fn plugin_proxies(&self, target: &Url) -> Result<ProxyRouteTable, AppError> {
        let mut table = ProxyRouteTable::new();
        let manifest_path = self.plugins_dir().join("package.json");
        if !manifest_path.is_file() {
            debug!("{} has no plugins package", HOST_FRAMEWORK_PACKAGE);
            return Ok(table);
        }

        let plugins = read_manifest(&manifest_path)?;
        for name in plugins.dependencies.keys() {
            let installed = package_dir(&self.plugins_dir(), name);
            let main = match read_manifest(&installed.join("package.json")) {
                Ok(manifest) => manifest.source_entry().trim_start_matches("./").to_string(),
                Err(err) => {
                    debug!("plugin {} is not installed: {}", name, err);
                    continue;
                }
            };
            let route = ProxyRoute::to(target.clone()).with_rewrite(PathRewrite::Relocate {
                prefix: format!("/plugins/{}/", name),
                base: self.served_path(&installed),
                default_file: main,
            });
            table.insert(plugin_route_key(name), route)?;
        }
        Ok(table)
    }

    /// Plugins checked into the host framework's `plugins` directory.
    fn inline_plugins(&self) -> Result<Vec<InlinePlugin>, AppError> {
        let plugins_dir = self.plugins_dir();
        if !plugins_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut plugins = Vec::new();
        for entry in fs::read_dir(&plugins_dir)? {
            let path = entry?.path();
            let dir_name =
                path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            if !path.is_dir() || dir_name == "node_modules" || dir_name.starts_with('.') {
                continue;
            }

            let manifest_path = path.join("package.json");
            let name = if manifest_path.is_file() {
                read_manifest(&manifest_path)?.name.unwrap_or(dir_name)
            } else if path.join("index.js").is_file() {
                dir_name
            } else {
                continue;
            };
            plugins.push(InlinePlugin { name, served_path: self.served_path(&path) });
        }
        plugins.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(plugins)
    }

    fn build_library(&self) -> Result<(), AppError> {
        info!("building {} dist", HOST_FRAMEWORK_PACKAGE);
        self.npm.run_script("build", &[], &self.root)
    }

    fn build_plugins_for_preview(&self) -> Result<(), AppError> {
        info!("building {} plugins for preview", HOST_FRAMEWORK_PACKAGE);
        let command_line = format!("{} --input-type=module", NODE_PROGRAM);
        let output = Command::new(NODE_PROGRAM)
            .args(["--input-type=module", "-e", BUILD_PLUGINS_FOR_PREVIEW])
            .current_dir(&self.context)
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
        Ok(())
    }

    fn install_plugins(&self) -> Result<(), AppError> {
        info!("installing dev plugins in {}", HOST_FRAMEWORK_PACKAGE);
        self.npm.run_script("install-plugins", &[], &self.root)
    }

    fn ensure_types(&self) -> Result<(), AppError> {
        if self.root.join("index.d.ts").is_file() {
            return Ok(());
        }
        info!("building types");
        self.npm.run_script("build-types", &["--skipValidation"], &self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePackageManager;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn install_host(dir: &Path) -> PathBuf {
        let root = host_framework_dir(dir);
        write(&root.join("package.json"), r#"{"name":"@vcmap/ui","version":"6.1.2"}"#);
        root
    }

    #[test]
    fn missing_package_is_host_framework_missing() {
        let dir = TempDir::new().unwrap();
        let err =
            NodeModulesHostFramework::locate(dir.path(), FakePackageManager::new()).unwrap_err();
        assert!(matches!(err, AppError::HostFrameworkMissing(_)));
    }

    #[test]
    fn reads_installed_version() {
        let dir = TempDir::new().unwrap();
        install_host(dir.path());
        let host = NodeModulesHostFramework::locate(dir.path(), FakePackageManager::new()).unwrap();
        assert_eq!(host.version().unwrap(), "6.1.2");
    }

    #[test]
    fn plugin_proxies_relocate_to_installed_packages() {
        let dir = TempDir::new().unwrap();
        let root = install_host(dir.path());
        write(
            &root.join("plugins/package.json"),
            r#"{"name":"plugins","dependencies":{"@vcmap/search":"^2.0.0","@vcmap/missing":"^1"}}"#,
        );
        write(
            &root.join("plugins/node_modules/@vcmap/search/package.json"),
            r#"{"name":"@vcmap/search","main":"./src/index.js"}"#,
        );

        let host = NodeModulesHostFramework::locate(dir.path(), FakePackageManager::new()).unwrap();
        let target = Url::parse("http://localhost:5173").unwrap();
        let table = host.plugin_proxies(&target).unwrap();

        assert_eq!(table.len(), 1);
        let resolved = table.resolve("/plugins/@vcmap/search/index.js").unwrap();
        assert_eq!(
            resolved.path,
            "/node_modules/@vcmap/ui/plugins/node_modules/@vcmap/search/src/index.js"
        );
    }

    #[test]
    fn inline_plugins_skip_node_modules() {
        let dir = TempDir::new().unwrap();
        let root = install_host(dir.path());
        write(
            &root.join("plugins/@vcmap-show-case/package.json"),
            r#"{"name":"@vcmap-show-case/x"}"#,
        );
        write(&root.join("plugins/simple/index.js"), "export default {}");
        write(&root.join("plugins/node_modules/dep/index.js"), "");

        let host = NodeModulesHostFramework::locate(dir.path(), FakePackageManager::new()).unwrap();
        let plugins = host.inline_plugins().unwrap();

        assert_eq!(
            plugins,
            vec![
                InlinePlugin {
                    name: "@vcmap-show-case/x".to_string(),
                    served_path: "/node_modules/@vcmap/ui/plugins/@vcmap-show-case".to_string(),
                },
                InlinePlugin {
                    name: "simple".to_string(),
                    served_path: "/node_modules/@vcmap/ui/plugins/simple".to_string(),
                },
            ]
        );
    }

    #[test]
    fn ensure_types_runs_build_types_only_when_missing() {
        let dir = TempDir::new().unwrap();
        let root = install_host(dir.path());
        let npm = FakePackageManager::new();
        let host = NodeModulesHostFramework::locate(dir.path(), npm.clone()).unwrap();

        host.ensure_types().unwrap();
        assert_eq!(npm.scripts(), vec!["build-types --skipValidation".to_string()]);

        write(&root.join("index.d.ts"), "");
        host.ensure_types().unwrap();
        assert_eq!(npm.scripts().len(), 1);
    }
}
