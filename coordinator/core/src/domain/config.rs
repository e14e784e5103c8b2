// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Coordinator Configuration Types
//
// Defines the YAML-loadable settings for the fleet coordinator's RPC
// layer: how long a single-target call waits, whether a fan-out round is
// capped, and how patient outbound transports are when connecting.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// RPC-layer settings for the fleet coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// How long a bounded single-target call waits for its answer.
    #[serde(default = "default_call_deadline", with = "humantime_serde")]
    pub call_deadline: Duration,

    /// Optional ceiling on a whole fan-out round. Absent, a round runs as
    /// long as the slowest cluster takes; its result would be dropped by
    /// the failure filter anyway if it never resolves.
    #[serde(
        default,
        with = "humantime_serde::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub fanout_ceiling: Option<Duration>,

    /// Connect timeout for outbound cluster transports.
    #[serde(default = "default_connect_timeout", with = "humantime_serde")]
    pub connect_timeout: Duration,
}

fn default_call_deadline() -> Duration {
    Duration::from_secs(30)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            call_deadline: default_call_deadline(),
            fanout_ceiling: None,
            connect_timeout: default_connect_timeout(),
        }
    }
}

impl CoordinatorConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CoordinatorConfig::default();

        assert_eq!(config.call_deadline, Duration::from_secs(30));
        assert_eq!(config.fanout_ceiling, None);
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_parse_yaml() {
        let config = CoordinatorConfig::from_yaml_str(
            "call_deadline: 45s\nfanout_ceiling: 2m\n",
        )
        .unwrap();

        assert_eq!(config.call_deadline, Duration::from_secs(45));
        assert_eq!(config.fanout_ceiling, Some(Duration::from_secs(120)));
        // Unspecified fields fall back to defaults.
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_empty_yaml_is_all_defaults() {
        let config = CoordinatorConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config.call_deadline, Duration::from_secs(30));
    }

    #[test]
    fn test_yaml_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coordinator.yaml");

        let mut config = CoordinatorConfig::default();
        config.fanout_ceiling = Some(Duration::from_secs(90));
        config.to_yaml_file(&path).unwrap();

        let loaded = CoordinatorConfig::from_yaml_file(&path).unwrap();
        assert_eq!(loaded.call_deadline, config.call_deadline);
        assert_eq!(loaded.fanout_ceiling, config.fanout_ceiling);
    }
}
