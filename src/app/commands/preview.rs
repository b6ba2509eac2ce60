//! Production preview: watch build served next to the map application.

use std::path::Path;
use std::sync::Arc;

use tracing::info;
use url::Url;

use super::build::{BUILD_OUT_DIR, BuildOptions, library_request};
use super::serve::{ServerOptions, ServerSession};
use super::{default_base_config, entry_assets_path};
use crate::adapters::HttpConfigSource;
use crate::app::AppContext;
use crate::app::config::{ConfigCache, ConfigResolver, ConfigSource, ResolverOptions};
use crate::app::server::{Forwarder, IndexSource, ServerState, StaticMount};
use crate::domain::proxy::{hosted_routes, targets_plugin};
use crate::domain::{AppError, PLUGIN_ASSETS_DIR, ProxyRouteTable};
use crate::ports::{Bundler, HostFramework, PackageManager};

pub const DEFAULT_PREVIEW_PORT: u16 = 5005;

/// Where the host framework's plugins are built for preview, below the plugin root.
const PREVIEW_PLUGINS_DIR: &str = "dist/plugins";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewOptions {
    pub server: ServerOptions,
    /// Hosted map application to preview against.
    pub vcm: Option<String>,
}

pub fn execute<P, B, H>(
    ctx: &AppContext<P, B>,
    host: Option<&H>,
    options: &PreviewOptions,
) -> Result<(), AppError>
where
    P: PackageManager,
    B: Bundler,
    H: HostFramework,
{
    prepare(ctx, host, options)?.run()
}

/// The hosted map application, from `--vcm` or `vcm` in `vcs.config.json`.
pub fn hosted_instance<P: PackageManager, B: Bundler>(
    ctx: &AppContext<P, B>,
    options: &PreviewOptions,
) -> Result<Option<Url>, AppError> {
    let vcm = match &options.vcm {
        Some(vcm) => Some(vcm.clone()),
        None => ctx.user_config()?.vcm,
    };
    vcm.map(|vcm| {
        Url::parse(&vcm)
            .map_err(|err| AppError::user_input(format!("Invalid URL {}: {}", vcm, err)))
    })
    .transpose()
}

/// Prepare the host framework if needed, start the watch build and set up the
/// front server. Without a hosted instance `host` is required.
pub fn prepare<P, B, H>(
    ctx: &AppContext<P, B>,
    host: Option<&H>,
    options: &PreviewOptions,
) -> Result<ServerSession, AppError>
where
    P: PackageManager,
    B: Bundler,
    H: HostFramework,
{
    let plugin_name = ctx.plugin_name()?;
    let entry = ctx.manifest()?.resolve_plugin_entry(true).to_string();
    let user = ctx.user_config()?;
    let server = &options.server;
    let credentials = server.credentials(&user);
    let hosted = hosted_instance(ctx, options)?;

    let mut mounts = vec![
        StaticMount::new(format!("/{}", BUILD_OUT_DIR), ctx.resolve(BUILD_OUT_DIR)),
        StaticMount::new(format!("/{}", PLUGIN_ASSETS_DIR), ctx.resolve(PLUGIN_ASSETS_DIR)),
    ];
    let mut proxies = ProxyRouteTable::new();

    let (default_base, index, config_root, local_host) = match (&hosted, host) {
        (Some(url), _) => {
            info!("previewing {} against {}", plugin_name, url);
            proxies = hosted_routes(url)?;
            let app_config = url.join("app.config.json").map_err(|err| {
                AppError::user_input(format!("Invalid URL {}: {}", url, err))
            })?;
            let index = IndexSource::Remote { url: url.clone(), credentials: credentials.clone() };
            (ConfigSource::Remote(app_config), index, None, None)
        }
        (None, Some(host)) => {
            info!("previewing {} against @vcmap/ui {}", plugin_name, host.version()?);
            if !host.resolve(&["dist", "index.html"]).is_file() {
                host.build_library()?;
            }
            let path = host.resolve(&["dist", "index.html"]);
            let index = IndexSource::File { path, inject_client: false };
            let base = ConfigSource::File(default_base_config(host, true));
            (base, index, Some(host.root().to_path_buf()), Some(host))
        }
        (None, None) => return Err(AppError::HostFrameworkMissing(ctx.root().to_path_buf())),
    };

    proxies.extend(user.custom_proxy()?);
    proxies.remove_where(|key| targets_plugin(key, &plugin_name));

    let plugin = server.plugin_config(&user, ctx.root());
    let watch_file = plugin.file().map(Path::to_path_buf);
    let resolver = ConfigResolver::new(
        ResolverOptions {
            base: server.base_config(&user, ctx.root(), default_base)?,
            plugin,
            plugin_name: plugin_name.clone(),
            entry: entry.clone(),
            credentials,
        },
        HttpConfigSource::new()?,
        ConfigCache::new(),
    );

    // The initial build clears dist/ before the host plugins are built into dist/plugins.
    let initial = BuildOptions { development: false, watch: false };
    ctx.bundler().build(&library_request(ctx, &plugin_name, BUILD_OUT_DIR, initial)?)?;
    if let Some(host) = local_host {
        build_preview_plugins(host)?;
        mounts.push(StaticMount::new("/assets", host.resolve(&["dist", "assets"])));
        mounts.push(StaticMount::new("/plugins", ctx.resolve(PREVIEW_PLUGINS_DIR)));
    }

    let watch = BuildOptions { development: false, watch: true };
    let mut request = library_request(ctx, &plugin_name, BUILD_OUT_DIR, watch)?;
    request.empty_out_dir = false;
    let process = ctx.bundler().spawn_watch(&request)?;

    let state = ServerState {
        resolver,
        proxies: Arc::new(proxies),
        forwarder: Forwarder::new()?,
        http: HttpConfigSource::new()?,
        index,
        config_root,
        mounts: Arc::new(mounts),
        asset_redirect: entry_assets_path(&entry),
        fallback: None,
    };

    Ok(ServerSession {
        state,
        port: server.port(&user, DEFAULT_PREVIEW_PORT),
        processes: vec![process],
        watch_file,
    })
}

/// Install the host framework's plugins unless already set up, then build them
/// into the plugin's `dist/plugins`.
fn build_preview_plugins<H: HostFramework>(host: &H) -> Result<(), AppError> {
    if !host.resolve(&["plugins", "node_modules"]).is_dir() {
        info!("no node_modules in @vcmap/ui plugins, installing them");
        host.install_plugins()?;
    }
    host.build_plugins_for_preview()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeBundler, FakeHostFramework, FakePackageManager};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn plugin(dir: &Path) -> AppContext<FakePackageManager, FakeBundler> {
        fs::write(dir.join("package.json"), r#"{"name":"demo"}"#).unwrap();
        AppContext::new(dir, None, FakePackageManager::new(), FakeBundler::new())
    }

    #[test]
    fn local_preview_builds_missing_host_dist() {
        let dir = TempDir::new().unwrap();
        let ctx = plugin(dir.path());
        let host = FakeHostFramework::new(dir.path().join("host"));

        let session = prepare(&ctx, Some(&host), &PreviewOptions::default()).unwrap();

        assert_eq!(
            host.calls(),
            vec!["build_library", "install_plugins", "build_plugins_for_preview"]
        );
        assert_eq!(session.port, DEFAULT_PREVIEW_PORT);
        assert_eq!(session.state.config_root, Some(dir.path().join("host")));
        let mounts: Vec<(&str, PathBuf)> = session
            .state
            .mounts
            .iter()
            .map(|mount| (mount.prefix.as_str(), mount.dir.clone()))
            .collect();
        assert_eq!(
            mounts,
            vec![
                ("/dist", dir.path().join("dist")),
                ("/plugin-assets", dir.path().join("plugin-assets")),
                ("/assets", dir.path().join("host/dist/assets")),
                ("/plugins", dir.path().join("dist/plugins")),
            ]
        );
        assert_eq!(session.state.asset_redirect.as_deref(), Some("/dist/plugin-assets"));
    }

    #[test]
    fn watch_build_keeps_preview_plugins() {
        let dir = TempDir::new().unwrap();
        let ctx = plugin(dir.path());
        let host = FakeHostFramework::new(dir.path().join("host"));

        prepare(&ctx, Some(&host), &PreviewOptions::default()).unwrap();

        let builds = ctx.bundler().builds();
        assert_eq!(builds.len(), 2);
        assert!(!builds[0].watch && builds[0].empty_out_dir);
        assert!(builds[1].watch && !builds[1].development);
        assert!(!builds[1].empty_out_dir);
    }

    #[test]
    fn set_up_host_only_rebuilds_preview_plugins() {
        let dir = TempDir::new().unwrap();
        let ctx = plugin(dir.path());
        let host = FakeHostFramework::new(dir.path().join("host"));
        fs::create_dir_all(dir.path().join("host/plugins/node_modules")).unwrap();
        fs::create_dir_all(dir.path().join("host/dist")).unwrap();
        fs::write(dir.path().join("host/dist/index.html"), "<html></html>").unwrap();

        prepare(&ctx, Some(&host), &PreviewOptions::default()).unwrap();

        assert_eq!(host.calls(), vec!["build_plugins_for_preview"]);
    }

    #[test]
    fn hosted_preview_proxies_the_instance() {
        let dir = TempDir::new().unwrap();
        let ctx = plugin(dir.path());
        let options = PreviewOptions {
            vcm: Some("https://map.example.com/".to_string()),
            ..Default::default()
        };

        let session = prepare(&ctx, None::<&FakeHostFramework>, &options).unwrap();

        assert!(session.state.config_root.is_none());
        assert_eq!(session.state.proxies.len(), 3);
        assert!(session.state.proxies.resolve("/style.css").unwrap().route.strip_csp);
        assert!(matches!(
            &session.state.index,
            IndexSource::Remote { url, .. } if url.as_str() == "https://map.example.com/"
        ));
    }

    #[test]
    fn local_preview_needs_host() {
        let dir = TempDir::new().unwrap();
        let ctx = plugin(dir.path());
        let options = PreviewOptions::default();
        let err = prepare(&ctx, None::<&FakeHostFramework>, &options).unwrap_err();
        assert!(matches!(err, AppError::HostFrameworkMissing(_)));
        assert!(ctx.bundler().builds().is_empty());
    }
}
