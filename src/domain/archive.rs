//! Distributable archive layout.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::domain::AppError;

/// Directory holding static plugin assets, copied verbatim into the package.
pub const PLUGIN_ASSETS_DIR: &str = "plugin-assets";

/// Archive encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArchiveFormat {
    #[default]
    Zip,
    TarGz,
}

impl ArchiveFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::TarGz => "tar.gz",
        }
    }
}

impl FromStr for ArchiveFormat {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "zip" => Ok(ArchiveFormat::Zip),
            "tar" | "tgz" | "tar.gz" => Ok(ArchiveFormat::TarGz),
            other => Err(AppError::user_input(format!(
                "Unknown archive format '{}': expected zip or tar",
                other
            ))),
        }
    }
}

/// A file to include in the archive, relative to the plugin root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFile {
    pub path: PathBuf,
    pub required: bool,
}

impl ArchiveFile {
    pub fn required(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), required: true }
    }

    pub fn optional(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), required: false }
    }
}

/// The default package contents of a plugin.
pub fn default_archive_files() -> Vec<ArchiveFile> {
    vec![
        ArchiveFile::required("package.json"),
        ArchiveFile::optional("README.md"),
        ArchiveFile::optional("CHANGELOG.md"),
        ArchiveFile::optional("LICENSE.md"),
        ArchiveFile::required(Path::new("dist").join("config.json")),
        ArchiveFile::required(Path::new("dist").join("index.js")),
    ]
}

/// Archive file name for a (possibly namespaced) plugin name.
pub fn archive_file_name(plugin_name: &str, format: ArchiveFormat) -> String {
    let sanitized: String =
        plugin_name.chars().map(|c| if c == '/' || c == '\\' { '-' } else { c }).collect();
    format!("{}.{}", sanitized, format.extension())
}

/// Path of a file inside the archive: `<plugin name>/<file name>`.
pub fn entry_name(plugin_name: &str, file: &Path) -> String {
    let file_name = file.file_name().map(|name| name.to_string_lossy()).unwrap_or_default();
    format!("{}/{}", plugin_name, file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_file_name_replaces_separators() {
        assert_eq!(archive_file_name("@vcmap/hello", ArchiveFormat::Zip), "@vcmap-hello.zip");
        assert_eq!(archive_file_name("demo", ArchiveFormat::TarGz), "demo.tar.gz");
    }

    #[test]
    fn entry_name_flattens_into_plugin_directory() {
        assert_eq!(entry_name("demo", Path::new("dist/index.js")), "demo/index.js");
        assert_eq!(entry_name("@scope/demo", Path::new("README.md")), "@scope/demo/README.md");
    }

    #[test]
    fn parses_formats() {
        assert_eq!("zip".parse::<ArchiveFormat>().unwrap(), ArchiveFormat::Zip);
        assert_eq!("TAR".parse::<ArchiveFormat>().unwrap(), ArchiveFormat::TarGz);
        assert!("rar".parse::<ArchiveFormat>().is_err());
    }

    #[test]
    fn bundle_output_is_required() {
        let files = default_archive_files();
        let bundle = files.iter().find(|f| f.path == Path::new("dist").join("index.js")).unwrap();
        assert!(bundle.required);
        assert!(files.iter().filter(|f| !f.required).count() >= 3);
    }
}
