use std::path::PathBuf;

use tracing::info;

use crate::app::AppContext;
use crate::domain::AppError;
use crate::ports::{BundleRequest, Bundler, HostFramework, PackageManager};

/// Output directory of the library build.
pub const BUILD_OUT_DIR: &str = "dist";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    pub development: bool,
    pub watch: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    pub plugin_name: String,
    pub out_dir: PathBuf,
}

/// Library build of the plugin into `dist/index.js`.
///
/// TypeScript plugins need the host framework's type declarations, so `host`
/// must be given for them.
pub fn execute<P, B, H>(
    ctx: &AppContext<P, B>,
    host: Option<&H>,
    options: BuildOptions,
) -> Result<BuildOutcome, AppError>
where
    P: PackageManager,
    B: Bundler,
    H: HostFramework,
{
    let plugin_name = ctx.plugin_name()?;
    let request = library_request(ctx, &plugin_name, BUILD_OUT_DIR, options)?;

    if ctx.manifest()?.uses_typescript() {
        let host = host.ok_or_else(|| AppError::HostFrameworkMissing(ctx.root().to_path_buf()))?;
        host.ensure_types()?;
    }

    ctx.bundler().build(&request)?;
    info!("{} built into {}", plugin_name, BUILD_OUT_DIR);
    Ok(BuildOutcome { plugin_name, out_dir: ctx.resolve(BUILD_OUT_DIR) })
}

/// Bundle request for a library build into `out_dir`, emptied first.
pub(crate) fn library_request<P: PackageManager, B: Bundler>(
    ctx: &AppContext<P, B>,
    plugin_name: &str,
    out_dir: &str,
    options: BuildOptions,
) -> Result<BundleRequest, AppError> {
    let manifest = ctx.manifest()?;
    Ok(BundleRequest {
        root: ctx.root().to_path_buf(),
        plugin_name: plugin_name.to_string(),
        entry: manifest.source_entry().to_string(),
        out_dir: out_dir.to_string(),
        externals: manifest.external_dependencies(),
        development: options.development,
        watch: options.watch,
        empty_out_dir: true,
    })
}
