//! Configuration served by the dev and preview servers.

mod cache;
mod resolver;

pub use cache::{BASE_CONFIG_KEY, ConfigCache, MERGED_CONFIG_KEY};
pub use resolver::{
    ConfigResolver, ConfigSource, PluginConfigSource, ResolverOptions, load_base_config,
};
