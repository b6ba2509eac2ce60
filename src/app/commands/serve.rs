//! Development server: bundler dev server behind the front server.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use super::{default_base_config, entry_assets_path, free_port, runtime};
use crate::adapters::{Credentials, HttpConfigSource};
use crate::app::AppContext;
use crate::app::config::{
    ConfigCache, ConfigResolver, ConfigSource, PluginConfigSource, ResolverOptions,
};
use crate::app::server::{
    Forwarder, IndexSource, ServerState, StaticMount, serve_until_shutdown, watch_plugin_config,
};
use crate::domain::{
    AppError, PLUGIN_ASSETS_DIR, ProxyAssembly, UserConfig, assemble_proxy_routes,
};
use crate::ports::{Bundler, BundlerProcess, DevServerRequest, HostFramework, PackageManager};

pub const DEFAULT_SERVE_PORT: u16 = 8008;

/// Directories of the plugin root shadowed by routes of the front server.
const RESERVED_DIRS: [&str; 3] = ["assets", "plugins", "config"];

/// Options shared by `serve` and `preview`. Unset values fall back to `vcs.config.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerOptions {
    pub port: Option<u16>,
    pub app_config: Option<String>,
    pub auth: Option<String>,
    pub config: Option<String>,
}

impl ServerOptions {
    pub(crate) fn port(&self, user: &UserConfig, default: u16) -> u16 {
        self.port.or(user.port).unwrap_or(default)
    }

    pub(crate) fn credentials(&self, user: &UserConfig) -> Option<Credentials> {
        self.auth.as_deref().or(user.auth.as_deref()).map(Credentials::parse)
    }

    /// `--appConfig`, then `appConfig` from `vcs.config.json`, then `default`.
    pub(crate) fn base_config(
        &self,
        user: &UserConfig,
        root: &Path,
        default: ConfigSource,
    ) -> Result<ConfigSource, AppError> {
        match (&self.app_config, &user.app_config) {
            (Some(location), _) => ConfigSource::from_location(location, root),
            (None, Some(config)) => ConfigSource::from_ref(config, root),
            (None, None) => Ok(default),
        }
    }

    pub(crate) fn plugin_config(&self, user: &UserConfig, root: &Path) -> PluginConfigSource {
        PluginConfigSource::select(self.config.as_deref(), user.config.as_ref(), root)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServeOptions {
    pub server: ServerOptions,
    pub https: bool,
}

/// A front server ready to listen, with the subprocesses it owns.
#[derive(Debug)]
pub struct ServerSession {
    pub state: ServerState,
    pub port: u16,
    pub processes: Vec<BundlerProcess>,
    /// Plugin config file whose changes invalidate the merged app config.
    pub watch_file: Option<PathBuf>,
}

impl ServerSession {
    /// Serve until interrupted.
    pub fn run(self) -> Result<(), AppError> {
        let ServerSession { state, port, processes, watch_file } = self;
        let _watcher = match watch_file {
            Some(file) => Some(watch_plugin_config(&file, state.resolver.cache().clone())?),
            None => None,
        };
        runtime()?.block_on(serve_until_shutdown(state, port, processes))
    }
}

pub fn execute<P, B, H>(
    ctx: &AppContext<P, B>,
    host: &H,
    options: &ServeOptions,
) -> Result<(), AppError>
where
    P: PackageManager,
    B: Bundler,
    H: HostFramework,
{
    prepare(ctx, host, options)?.run()
}

/// Resolve settings, assemble the proxy table and start the bundler dev server.
///
/// Proxy assembly runs before any subprocess or socket is opened.
pub fn prepare<P, B, H>(
    ctx: &AppContext<P, B>,
    host: &H,
    options: &ServeOptions,
) -> Result<ServerSession, AppError>
where
    P: PackageManager,
    B: Bundler,
    H: HostFramework,
{
    let plugin_name = ctx.plugin_name()?;
    let entry = ctx.manifest()?.resolve_plugin_entry(false).to_string();
    let user = ctx.user_config()?;
    warn_reserved_dirs(ctx.root());
    info!("serving {} against @vcmap/ui {}", plugin_name, host.version()?);
    if options.https || user.https {
        warn!("https is not supported by the dev server, serving plain http");
    }

    let dev_server = DevServerRequest {
        root: ctx.root().to_path_buf(),
        plugin_name: plugin_name.clone(),
        port: free_port()?,
        https: false,
    };
    let bundler_target = dev_server.url()?;
    let proxies = assemble_proxy_routes(ProxyAssembly {
        base: host.plugin_proxies(&bundler_target)?,
        inline_plugins: &host.inline_plugins()?,
        plugin_name: &plugin_name,
        bundler_target: &bundler_target,
        custom: user.custom_proxy()?,
    })?;

    let server = &options.server;
    let base = ConfigSource::File(default_base_config(host, false));
    let plugin = server.plugin_config(&user, ctx.root());
    let watch_file = plugin.file().map(Path::to_path_buf);
    let resolver = ConfigResolver::new(
        ResolverOptions {
            base: server.base_config(&user, ctx.root(), base)?,
            plugin,
            plugin_name: plugin_name.clone(),
            entry: entry.clone(),
            credentials: server.credentials(&user),
        },
        HttpConfigSource::new()?,
        ConfigCache::new(),
    );

    let process = ctx.bundler().spawn_dev_server(&dev_server)?;
    let state = ServerState {
        resolver,
        proxies: Arc::new(proxies),
        forwarder: Forwarder::new()?,
        http: HttpConfigSource::new()?,
        index: IndexSource::File { path: host.resolve(&["index.html"]), inject_client: true },
        config_root: Some(host.root().to_path_buf()),
        mounts: Arc::new(vec![StaticMount::new(
            format!("/{}", PLUGIN_ASSETS_DIR),
            ctx.resolve(PLUGIN_ASSETS_DIR),
        )]),
        asset_redirect: entry_assets_path(&entry),
        fallback: Some(bundler_target),
    };

    Ok(ServerSession {
        state,
        port: server.port(&user, DEFAULT_SERVE_PORT),
        processes: vec![process],
        watch_file,
    })
}

fn warn_reserved_dirs(root: &Path) {
    for dir in RESERVED_DIRS {
        if root.join(dir).is_dir() {
            warn!("the directory '{}' is shadowed by routes of the map application", dir);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::proxy::plugin_route_key;
    use crate::domain::{InlinePlugin, ProxyRoute};
    use crate::testing::{FakeBundler, FakeHostFramework, FakePackageManager};
    use std::fs;
    use tempfile::TempDir;
    use url::Url;

    type TestContext = AppContext<FakePackageManager, FakeBundler>;

    fn plugin(dir: &Path, user_config: Option<&str>) -> TestContext {
        fs::write(dir.join("package.json"), r#"{"name":"demo","main":"src/index.js"}"#).unwrap();
        if let Some(content) = user_config {
            fs::write(dir.join("vcs.config.json"), content).unwrap();
        }
        AppContext::new(dir, None, FakePackageManager::new(), FakeBundler::new())
    }

    fn host(dir: &Path) -> FakeHostFramework {
        let mut host = FakeHostFramework::new(dir.join("node_modules/@vcmap/ui"));
        host.inline = ["demo", "other"]
            .into_iter()
            .map(|name| InlinePlugin {
                name: name.to_string(),
                served_path: format!("/node_modules/@vcmap/ui/plugins/{}", name),
            })
            .collect();
        let target = Url::parse("http://localhost:1").unwrap();
        host.proxies.insert(plugin_route_key("demo"), ProxyRoute::to(target)).unwrap();
        host
    }

    #[test]
    fn session_serves_sources_without_proxying_the_plugin() {
        let dir = TempDir::new().unwrap();
        let ctx = plugin(dir.path(), None);

        let session = prepare(&ctx, &host(dir.path()), &ServeOptions::default()).unwrap();

        assert_eq!(session.port, DEFAULT_SERVE_PORT);
        assert!(session.state.proxies.get(&plugin_route_key("demo")).is_none());
        assert!(session.state.proxies.get(&plugin_route_key("other")).is_some());
        assert_eq!(session.state.asset_redirect.as_deref(), Some("/src/plugin-assets"));
        assert_eq!(session.watch_file, Some(dir.path().join("config.json")));

        let dev_servers = ctx.bundler().dev_servers.lock().unwrap().clone();
        assert_eq!(dev_servers.len(), 1);
        assert_eq!(session.state.fallback, Some(dev_servers[0].url().unwrap()));
        assert!(matches!(
            &session.state.index,
            IndexSource::File { path, inject_client: true } if path.ends_with("@vcmap/ui/index.html")
        ));
    }

    #[test]
    fn root_entry_serves_assets_without_redirect() {
        let dir = TempDir::new().unwrap();
        let ctx = plugin(dir.path(), None);
        fs::write(dir.path().join("package.json"), r#"{"name":"demo","main":"index.js"}"#).unwrap();

        let session = prepare(&ctx, &host(dir.path()), &ServeOptions::default()).unwrap();

        assert_eq!(session.state.asset_redirect, None);
        assert_eq!(session.state.mounts[0].prefix, "/plugin-assets");
    }

    #[test]
    fn cli_options_override_user_config() {
        let dir = TempDir::new().unwrap();
        let ctx = plugin(dir.path(), Some(r#"{"port":9001,"config":{"inline":true}}"#));

        let session = prepare(&ctx, &host(dir.path()), &ServeOptions::default()).unwrap();
        assert_eq!(session.port, 9001);
        assert_eq!(session.watch_file, None);

        let options = ServeOptions {
            server: ServerOptions {
                port: Some(9100),
                config: Some("custom.json".into()),
                ..Default::default()
            },
            https: false,
        };
        let session = prepare(&ctx, &host(dir.path()), &options).unwrap();
        assert_eq!(session.port, 9100);
        assert_eq!(session.watch_file, Some(dir.path().join("custom.json")));
    }

    #[test]
    fn invalid_custom_proxy_aborts_before_dev_server() {
        let dir = TempDir::new().unwrap();
        let ctx = plugin(dir.path(), Some(r#"{"proxy":{"^/(broken":"http://x"}}"#));

        let err = prepare(&ctx, &host(dir.path()), &ServeOptions::default()).unwrap_err();

        assert!(matches!(err, AppError::InvalidProxyPattern { .. }));
        assert!(ctx.bundler().dev_servers.lock().unwrap().is_empty());
    }

    #[test]
    fn base_config_precedence() {
        let dir = TempDir::new().unwrap();
        let default = ConfigSource::File(dir.path().join("default.json"));
        let user = UserConfig::parse(r#"{"appConfig":"https://map.example.com/app.config.json"}"#)
            .unwrap();

        let from_user =
            ServerOptions::default().base_config(&user, dir.path(), default.clone()).unwrap();
        assert!(matches!(from_user, ConfigSource::Remote(_)));

        let cli = ServerOptions { app_config: Some("local.json".into()), ..Default::default() };
        let from_cli = cli.base_config(&user, dir.path(), default.clone()).unwrap();
        assert_eq!(from_cli, ConfigSource::File(dir.path().join("local.json")));

        let none = ServerOptions::default();
        let fallback = none.base_config(&UserConfig::default(), dir.path(), default.clone());
        assert_eq!(fallback.unwrap(), default);
    }
}
