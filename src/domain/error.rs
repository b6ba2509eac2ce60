use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Library-wide error type for vcmplugin operations.
#[derive(Debug, Error)]
pub enum AppError {
    /// Underlying I/O failure.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Invalid or missing input supplied by the user.
    #[error("{0}")]
    UserInput(String),

    /// A directory for the plugin to be created already exists.
    #[error("plugin with the name '{0}' already exists")]
    PluginExists(String),

    /// No package.json found in the plugin context.
    #[error("no package.json found in context {0}")]
    ManifestMissing(PathBuf),

    /// A configuration document could not be parsed.
    #[error("Failed to parse {what}: {details}")]
    ConfigParse { what: String, details: String },

    /// A remote configuration responded with an error status.
    #[error("Config {url} is unreachable (status {status})")]
    ConfigUnreachable { url: String, status: u16 },

    /// The host framework package is not installed in the plugin context.
    #[error("Cannot find the @vcmap/ui package in {0}. Are you sure you installed it?")]
    HostFrameworkMissing(PathBuf),

    /// A required build output is missing when packaging.
    #[error("Missing build artifact {0}. Did the build succeed?")]
    BuildArtifactMissing(PathBuf),

    /// An external tool (npm, vite, node) failed.
    #[error("{tool} failed: {error}")]
    ExternalToolError { tool: String, error: String },

    /// Template rendering failed.
    #[error("Template error in {template}: {details}")]
    Template { template: String, details: String },

    /// A proxy route pattern is not a valid regular expression.
    #[error("Invalid proxy pattern '{pattern}': {details}")]
    InvalidProxyPattern { pattern: String, details: String },

    /// Archive encoding failed.
    #[error("Failed to write archive: {0}")]
    Archive(String),

    /// HTTP transport failure.
    #[error("HTTP request to {url} failed: {details}")]
    Http { url: String, details: String },

    /// JSON (de)serialization failure outside of config parsing.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl AppError {
    pub fn user_input<S: Into<String>>(message: S) -> Self {
        AppError::UserInput(message.into())
    }

    pub fn config_parse(what: impl Into<String>, details: impl ToString) -> Self {
        AppError::ConfigParse { what: what.into(), details: details.to_string() }
    }

    pub fn external_tool(tool: impl Into<String>, error: impl Into<String>) -> Self {
        AppError::ExternalToolError { tool: tool.into(), error: error.into() }
    }

    pub fn template(template: impl Into<String>, details: impl ToString) -> Self {
        AppError::Template { template: template.into(), details: details.to_string() }
    }

    pub fn http(url: impl Into<String>, details: impl ToString) -> Self {
        AppError::Http { url: url.into(), details: details.to_string() }
    }

    pub fn archive(details: impl ToString) -> Self {
        AppError::Archive(details.to_string())
    }

    /// Provide an `io::ErrorKind`-like view for callers that only need a coarse category.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            AppError::Io(err) => err.kind(),
            AppError::UserInput(_)
            | AppError::ConfigParse { .. }
            | AppError::InvalidProxyPattern { .. }
            | AppError::Template { .. }
            | AppError::Json(_) => io::ErrorKind::InvalidInput,
            AppError::ManifestMissing(_)
            | AppError::HostFrameworkMissing(_)
            | AppError::BuildArtifactMissing(_)
            | AppError::ConfigUnreachable { .. } => io::ErrorKind::NotFound,
            AppError::PluginExists(_) => io::ErrorKind::AlreadyExists,
            AppError::ExternalToolError { .. } | AppError::Archive(_) | AppError::Http { .. } => {
                io::ErrorKind::Other
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_maps_missing_inputs_to_not_found() {
        assert_eq!(
            AppError::BuildArtifactMissing(PathBuf::from("dist/index.js")).kind(),
            io::ErrorKind::NotFound
        );
        assert_eq!(
            AppError::ConfigUnreachable { url: "http://x".into(), status: 404 }.kind(),
            io::ErrorKind::NotFound
        );
        assert_eq!(AppError::PluginExists("demo".into()).kind(), io::ErrorKind::AlreadyExists);
    }

    #[test]
    fn host_framework_missing_mentions_package() {
        let err = AppError::HostFrameworkMissing(PathBuf::from("/tmp/plugin"));
        assert!(err.to_string().contains("@vcmap/ui"));
    }
}
