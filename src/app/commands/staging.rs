//! Self-contained map application with the plugin built in, for deployment to a staging host.

use std::fs;
use std::path::PathBuf;

use dircpy::copy_dir;
use tracing::{debug, info};

use super::build::{BUILD_OUT_DIR, BuildOptions, library_request};
use super::{default_base_config, runtime};
use crate::adapters::{Credentials, HttpConfigSource};
use crate::app::AppContext;
use crate::app::config::{ConfigSource, PluginConfigSource, load_base_config};
use crate::domain::{AppError, PluginDescriptor, merge_plugin_into_config};
use crate::ports::{Bundler, HostFramework, PackageManager};

/// Host framework files copied into the staging app, as path below the host root
/// and name inside `dist`.
const HOST_ENTRIES: [(&[&str], &str); 3] = [
    (&["dist", "index.html"], "index.html"),
    (&["dist", "assets"], "assets"),
    (&["config"], "config"),
];

pub fn execute<P, B, H>(ctx: &AppContext<P, B>, host: &H) -> Result<PathBuf, AppError>
where
    P: PackageManager,
    B: Bundler,
    H: HostFramework,
{
    let plugin_name = ctx.plugin_name()?;
    let user = ctx.user_config()?;
    let dist = ctx.resolve(BUILD_OUT_DIR);
    if dist.exists() {
        fs::remove_dir_all(&dist)?;
    }
    fs::create_dir_all(&dist)?;

    host.install_plugins()?;
    host.build_plugins_for_preview()?;
    if !host.resolve(&["dist", "index.html"]).is_file() {
        host.build_library()?;
    }

    let plugin_dir = format!("{}/plugins/{}", BUILD_OUT_DIR, plugin_name);
    let mut request = library_request(ctx, &plugin_name, &plugin_dir, BuildOptions::default())?;
    request.empty_out_dir = false;
    ctx.bundler().build(&request)?;

    for (segments, entry) in HOST_ENTRIES {
        let source = host.resolve(segments);
        let target = dist.join(entry);
        if source.is_dir() {
            copy_dir(&source, &target)?;
        } else if source.is_file() {
            fs::copy(&source, &target)?;
        } else {
            debug!("host framework has no {}", source.display());
        }
    }

    let base = match &user.app_config {
        Some(config) => ConfigSource::from_ref(config, ctx.root())?,
        None => ConfigSource::File(default_base_config(host, true)),
    };
    let plugin = PluginConfigSource::select(None, user.config.as_ref(), ctx.root());
    let credentials = user.auth.as_deref().map(Credentials::parse);
    let entry = format!("plugins/{}/index.js", plugin_name);

    let config = runtime()?.block_on(async {
        let http = HttpConfigSource::new()?;
        let base = load_base_config(&base, &http, credentials.as_ref()).await?;
        let plugin_config = plugin.load().await?;
        let descriptor = PluginDescriptor::from_plugin_config(plugin_config, &plugin_name, &entry)?;
        Ok::<_, AppError>(merge_plugin_into_config(base, descriptor))
    })?;

    let app_config = dist.join("app.config.json");
    fs::write(&app_config, serde_json::to_string_pretty(&config)?)?;
    info!("staging app for {} written to {}", plugin_name, dist.display());
    Ok(dist)
}
