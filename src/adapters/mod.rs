pub mod archive_writer;
pub mod config_source_http;
pub mod embedded_assets;
pub mod host_framework_fs;
pub mod npm_command;
pub mod vite_command;

pub use config_source_http::{Credentials, HttpConfigSource};
pub use host_framework_fs::NodeModulesHostFramework;
pub use npm_command::NpmCommandAdapter;
pub use vite_command::ViteCommandAdapter;
