//! Production build packaged as a distributable archive.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Map;

use super::build::{self, BUILD_OUT_DIR, BuildOptions};
use crate::adapters::archive_writer::build_archive;
use crate::app::AppContext;
use crate::domain::archive::default_archive_files;
use crate::domain::plugin_config::{complete_plugin_config, parse_plugin_config};
use crate::domain::{AppError, ArchiveFormat, PLUGIN_ASSETS_DIR, PLUGIN_CONFIG_FILE};
use crate::ports::{Bundler, HostFramework, PackageManager};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackOptions {
    pub format: ArchiveFormat,
}

pub fn execute<P, B, H>(
    ctx: &AppContext<P, B>,
    host: Option<&H>,
    options: PackOptions,
) -> Result<PathBuf, AppError>
where
    P: PackageManager,
    B: Bundler,
    H: HostFramework,
{
    let outcome = build::execute(ctx, host, BuildOptions::default())?;
    ensure_manifest(ctx, &outcome.plugin_name)?;
    build_archive(
        ctx.root(),
        &outcome.plugin_name,
        &default_archive_files(),
        Some(Path::new(PLUGIN_ASSETS_DIR)),
        options.format,
    )
}

/// Write `dist/config.json`: the plugin's `config.json` with `version` backfilled
/// from the package manifest and `name` from `plugin_name`.
pub fn ensure_manifest<P: PackageManager, B: Bundler>(
    ctx: &AppContext<P, B>,
    plugin_name: &str,
) -> Result<PathBuf, AppError> {
    let source = ctx.resolve(PLUGIN_CONFIG_FILE);
    let config = if source.is_file() {
        parse_plugin_config(&fs::read_to_string(&source)?, PLUGIN_CONFIG_FILE)?
    } else {
        Map::new()
    };
    let completed = complete_plugin_config(config, ctx.manifest()?, plugin_name);

    let target = ctx.resolve(BUILD_OUT_DIR).join(PLUGIN_CONFIG_FILE);
    fs::create_dir_all(ctx.resolve(BUILD_OUT_DIR))?;
    fs::write(&target, serde_json::to_string_pretty(&completed)?)?;
    Ok(target)
}
