mod fake_bundler;
mod fake_host_framework;
mod fake_package_manager;

pub use fake_bundler::FakeBundler;
pub use fake_host_framework::FakeHostFramework;
pub use fake_package_manager::FakePackageManager;
