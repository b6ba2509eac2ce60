//! API Facade for the application.
//!
//! Wires the npm and vite adapters into a context for the plugin at
//! `context` and runs a command against it.

use std::path::{Path, PathBuf};

use crate::adapters::{NodeModulesHostFramework, NpmCommandAdapter, ViteCommandAdapter};
use crate::app::AppContext;
use crate::app::commands::{build, create, pack, preview, serve, setup_map_ui, staging, update};

pub use crate::app::commands::build::{BuildOptions, BuildOutcome};
pub use crate::app::commands::create::CreateOutcome;
pub use crate::app::commands::pack::PackOptions;
pub use crate::app::commands::preview::PreviewOptions;
pub use crate::app::commands::serve::{ServeOptions, ServerOptions};
pub use crate::app::commands::update::{UpdateOptions, UpdateOutcome};
pub use crate::domain::{AppError, ArchiveFormat, LicenseType, ScaffoldOptions};

type Context = AppContext<NpmCommandAdapter, ViteCommandAdapter>;
type LocalHost = NodeModulesHostFramework<NpmCommandAdapter>;

fn create_context(context: &Path, plugin_name: Option<String>) -> Context {
    AppContext::new(context, plugin_name, NpmCommandAdapter::new(), ViteCommandAdapter::new())
}

fn locate_host(context: &Path) -> Result<LocalHost, AppError> {
    NodeModulesHostFramework::locate(context, NpmCommandAdapter::new())
}

/// The host framework, only when a TypeScript plugin needs its declarations.
fn host_for_types(ctx: &Context) -> Result<Option<LocalHost>, AppError> {
    if ctx.manifest()?.uses_typescript() { locate_host(ctx.root()).map(Some) } else { Ok(None) }
}

/// Scaffold a new plugin below `parent`.
pub fn create(
    parent: &Path,
    options: &ScaffoldOptions,
    skip_install: bool,
) -> Result<CreateOutcome, AppError> {
    create::execute(&NpmCommandAdapter::new(), parent, options, skip_install)
}

/// Library build into `dist/`.
pub fn build(
    context: &Path,
    plugin_name: Option<String>,
    options: BuildOptions,
) -> Result<BuildOutcome, AppError> {
    let ctx = create_context(context, plugin_name);
    let host = host_for_types(&ctx)?;
    build::execute(&ctx, host.as_ref(), options)
}

/// Production build packaged into `dist/<name>.<ext>`. Returns the archive path.
pub fn pack(
    context: &Path,
    plugin_name: Option<String>,
    options: PackOptions,
) -> Result<PathBuf, AppError> {
    let ctx = create_context(context, plugin_name);
    let host = host_for_types(&ctx)?;
    pack::execute(&ctx, host.as_ref(), options)
}

/// Run the dev server until interrupted.
pub fn serve(
    context: &Path,
    plugin_name: Option<String>,
    options: &ServeOptions,
) -> Result<(), AppError> {
    let ctx = create_context(context, plugin_name);
    let host = locate_host(context)?;
    serve::execute(&ctx, &host, options)
}

/// Run the preview server until interrupted.
pub fn preview(
    context: &Path,
    plugin_name: Option<String>,
    options: &PreviewOptions,
) -> Result<(), AppError> {
    let ctx = create_context(context, plugin_name);
    let host = match preview::hosted_instance(&ctx, options)? {
        Some(_) => None,
        None => Some(locate_host(context)?),
    };
    preview::execute(&ctx, host.as_ref(), options)
}

/// Build the staging app into `dist/`.
pub fn build_staging_app(context: &Path, plugin_name: Option<String>) -> Result<PathBuf, AppError> {
    let ctx = create_context(context, plugin_name);
    let host = locate_host(context)?;
    staging::execute(&ctx, &host)
}

/// Align peer dependencies with a host framework release.
pub fn update(
    context: &Path,
    plugin_name: Option<String>,
    options: &UpdateOptions,
) -> Result<UpdateOutcome, AppError> {
    let ctx = create_context(context, plugin_name);
    update::execute(&ctx, options)
}

/// Install the host framework's development plugins.
pub fn setup_map_ui(context: &Path) -> Result<(), AppError> {
    setup_map_ui::execute(&locate_host(context)?)
}
