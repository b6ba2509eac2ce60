pub mod app_config;
pub mod archive;
pub mod error;
pub mod license;
pub mod manifest;
pub mod peer_deps;
pub mod plugin_config;
pub mod plugin_name;
pub mod proxy;
pub mod scaffold;
pub mod user_config;

pub use app_config::{
    ApplicationConfig, ModuleConfig, ModuleEntry, PLUGIN_CLI_MODULE_ID, PluginDescriptor,
    merge_plugin_into_config,
};
pub use archive::{ArchiveFile, ArchiveFormat, PLUGIN_ASSETS_DIR};
pub use error::AppError;
pub use license::LicenseType;
pub use manifest::{DepType, HOST_FRAMEWORK_PACKAGE, PackageManifest};
pub use peer_deps::HostRelease;
pub use plugin_config::PLUGIN_CONFIG_FILE;
pub use plugin_name::validate_plugin_name;
pub use proxy::{InlinePlugin, ProxyAssembly, ProxyRoute, ProxyRouteTable, assemble_proxy_routes};
pub use scaffold::{ScaffoldFile, ScaffoldOptions};
pub use user_config::{ConfigRef, USER_CONFIG_FILE, UserConfig};
