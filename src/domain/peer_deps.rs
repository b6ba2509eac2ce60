//! Peer dependency alignment with a host framework release.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::domain::AppError;

/// Release metadata of the host framework as reported by the registry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostRelease {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub peer_dependencies: BTreeMap<String, String>,
}

impl HostRelease {
    /// Parse `npm view <pkg> --json` output. A range query yields an array; the last entry wins.
    pub fn parse(json: &str) -> Result<Self, AppError> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|err| AppError::config_parse("registry metadata", err))?;
        let value = match value {
            serde_json::Value::Array(mut releases) => releases
                .pop()
                .ok_or_else(|| AppError::user_input("No release matches the requested version"))?,
            other => other,
        };
        serde_json::from_value(value).map_err(|err| AppError::config_parse("registry metadata", err))
    }
}

/// Install specs (`name@range`) aligning a plugin's peer dependencies with `release`.
///
/// The host framework itself is always included; other peers are only listed when
/// the release declares them and the plugin's range differs.
pub fn peer_dependency_updates(
    plugin_peers: &BTreeMap<String, String>,
    release: &HostRelease,
    requested_range: &str,
) -> Vec<String> {
    let mut specs = vec![format!("{}@{}", release.name, requested_range)];
    specs.extend(
        plugin_peers
            .iter()
            .filter(|(name, _)| **name != release.name)
            .filter_map(|(name, range)| {
                release
                    .peer_dependencies
                    .get(name)
                    .filter(|host_range| *host_range != range)
                    .map(|host_range| format!("{}@{}", name, host_range))
            }),
    );
    specs
}
