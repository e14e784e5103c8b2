// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Operating System Listings
//
// Typed form of the `osystems` value cluster controllers return from
// ListOperatingSystems, plus the locally-known title overrides applied to
// uploaded ("custom") releases. Unrecognized fields travel along
// untouched so controllers can grow their answers without breaking the
// coordinator.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name under which clusters report locally uploaded images.
pub const CUSTOM_OSYSTEM: &str = "custom";

/// One release of an operating system, as a cluster reported it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsRelease {
    pub name: String,

    /// Human-readable display title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Fields this coordinator does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// One operating system a cluster claims to support.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatingSystem {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default)]
    pub releases: Vec<OsRelease>,

    /// Fields this coordinator does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Locally-known display titles for uploaded releases.
///
/// Fed from the coordinator's own image store; clusters reporting a
/// `custom` release only know the upload's name, the coordinator knows
/// the title the operator gave it.
pub trait ReleaseTitleOverrides: Send + Sync {
    /// Display title override for the named release, if one is known.
    fn title_for(&self, release_name: &str) -> Option<String>;
}

/// Overrides that never match; for callers with no local image store.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOverrides;

impl ReleaseTitleOverrides for NoOverrides {
    fn title_for(&self, _release_name: &str) -> Option<String> {
        None
    }
}
