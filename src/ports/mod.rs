mod bundler;
mod host_framework;
mod package_manager;

pub use bundler::{BundleRequest, Bundler, BundlerProcess, DevServerRequest};
pub use host_framework::HostFramework;
pub use package_manager::PackageManager;
