//! Writes the distributable plugin archive.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::domain::archive::{archive_file_name, entry_name};
use crate::domain::{AppError, ArchiveFile, ArchiveFormat, PLUGIN_ASSETS_DIR};

/// A file on disk and its name inside the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ArchiveEntry {
    source: PathBuf,
    name: String,
}

/// Package `files` (relative to `root`) and the optional asset directory into
/// `dist/<plugin name>.<ext>`. Every entry sits below a directory named after the plugin.
pub fn build_archive(
    root: &Path,
    plugin_name: &str,
    files: &[ArchiveFile],
    asset_dir: Option<&Path>,
    format: ArchiveFormat,
) -> Result<PathBuf, AppError> {
    let entries = collect_entries(root, plugin_name, files, asset_dir)?;

    let dist = root.join("dist");
    fs::create_dir_all(&dist)?;
    let output = dist.join(archive_file_name(plugin_name, format));

    match format {
        ArchiveFormat::Zip => write_zip(&output, &entries)?,
        ArchiveFormat::TarGz => write_tar_gz(&output, &entries)?,
    }
    info!("wrote {} ({} entries)", output.display(), entries.len());
    Ok(output)
}

fn collect_entries(
    root: &Path,
    plugin_name: &str,
    files: &[ArchiveFile],
    asset_dir: Option<&Path>,
) -> Result<Vec<ArchiveEntry>, AppError> {
    let mut entries = Vec::new();
    for file in files {
        let source = root.join(&file.path);
        if !source.is_file() {
            if file.required {
                return Err(AppError::BuildArtifactMissing(file.path.clone()));
            }
            debug!("skipping missing optional file {}", file.path.display());
            continue;
        }
        entries.push(ArchiveEntry { source, name: entry_name(plugin_name, &file.path) });
    }

    if let Some(asset_dir) = asset_dir.map(|dir| root.join(dir))
        && asset_dir.is_dir()
    {
        for entry in WalkDir::new(&asset_dir).sort_by_file_name() {
            let entry = entry.map_err(AppError::archive)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(&asset_dir).map_err(AppError::archive)?;
            let segments: Vec<String> = relative
                .components()
                .map(|component| component.as_os_str().to_string_lossy().into_owned())
                .collect();
            entries.push(ArchiveEntry {
                source: entry.path().to_path_buf(),
                name: format!("{}/{}/{}", plugin_name, PLUGIN_ASSETS_DIR, segments.join("/")),
            });
        }
    }
    Ok(entries)
}

fn write_zip(output: &Path, entries: &[ArchiveEntry]) -> Result<(), AppError> {
    let mut writer = ZipWriter::new(File::create(output)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in entries {
        writer.start_file(entry.name.as_str(), options).map_err(AppError::archive)?;
        io::copy(&mut File::open(&entry.source)?, &mut writer)?;
    }
    writer.finish().map_err(AppError::archive)?;
    Ok(())
}

fn write_tar_gz(output: &Path, entries: &[ArchiveEntry]) -> Result<(), AppError> {
    let encoder = GzEncoder::new(File::create(output)?, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for entry in entries {
        builder.append_path_with_name(&entry.source, &entry.name)?;
    }
    builder.into_inner()?.finish()?;
    Ok(())
}
