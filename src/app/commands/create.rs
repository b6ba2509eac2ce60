//! Scaffold a new plugin directory.

use std::path::{Path, PathBuf};

use chrono::{Datelike, Utc};
use futures::future::try_join_all;
use tracing::info;

use super::runtime;
use crate::adapters::embedded_assets::render_plugin_scaffold;
use crate::domain::plugin_name::plugin_directory_name;
use crate::domain::scaffold::host_framework_spec;
use crate::domain::{AppError, DepType, ScaffoldFile, ScaffoldOptions, validate_plugin_name};
use crate::ports::PackageManager;

/// Result of `create`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOutcome {
    pub name: String,
    pub path: PathBuf,
    pub files: Vec<PathBuf>,
    pub installed: bool,
}

/// Create the plugin described by `options` below `parent`.
pub fn execute<P: PackageManager>(
    npm: &P,
    parent: &Path,
    options: &ScaffoldOptions,
    skip_install: bool,
) -> Result<CreateOutcome, AppError> {
    validate_plugin_name(&options.name)?;
    let path = parent.join(plugin_directory_name(&options.name));
    if path.exists() {
        return Err(AppError::PluginExists(options.name.clone()));
    }

    let files = render_plugin_scaffold(options, Utc::now().year())?;
    runtime()?.block_on(write_files(&path, &files))?;
    info!("created {} files in {}", files.len(), path.display());

    if !skip_install {
        let spec = host_framework_spec(&options.map_version);
        npm.install(&[spec], DepType::Peer, &path)?;
    }

    Ok(CreateOutcome {
        name: options.name.clone(),
        files: files.into_iter().map(|file| file.path).collect(),
        path,
        installed: !skip_install,
    })
}

/// Write every file concurrently; the first failure aborts the join.
async fn write_files(root: &Path, files: &[ScaffoldFile]) -> Result<(), AppError> {
    tokio::fs::create_dir_all(root).await?;
    try_join_all(files.iter().map(|file| async move {
        let target = root.join(&file.path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, &file.content).await
    }))
    .await?;
    Ok(())
}
