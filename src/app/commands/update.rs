//! Align the plugin's peer dependencies with a host framework release.

use tracing::info;

use crate::app::AppContext;
use crate::domain::peer_deps::peer_dependency_updates;
use crate::domain::{AppError, DepType, HOST_FRAMEWORK_PACKAGE, HostRelease};
use crate::ports::{Bundler, PackageManager};

/// Range used when `--mapVersion` is not given.
pub const DEFAULT_MAP_RANGE: &str = "latest";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    pub map_version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Version the requested range resolved to.
    pub host_version: String,
    /// Install specs passed to the package manager.
    pub installed: Vec<String>,
}

pub fn execute<P: PackageManager, B: Bundler>(
    ctx: &AppContext<P, B>,
    options: &UpdateOptions,
) -> Result<UpdateOutcome, AppError> {
    let range = options.map_version.as_deref().unwrap_or(DEFAULT_MAP_RANGE);
    let manifest = ctx.manifest()?;

    let metadata = ctx.npm().view(&format!("{}@{}", HOST_FRAMEWORK_PACKAGE, range), ctx.root())?;
    let release = HostRelease::parse(&metadata)?;
    info!("updating to {} {}", release.name, release.version);

    let specs = peer_dependency_updates(&manifest.peer_dependencies, &release, range);
    ctx.npm().install(&specs, DepType::Peer, ctx.root())?;

    Ok(UpdateOutcome { host_version: release.version, installed: specs })
}
