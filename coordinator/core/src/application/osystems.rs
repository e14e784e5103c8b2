// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Fleet Operating-System Queries
//
// The coordinator-level answers about what the fleet's clusters can
// deploy: which operating systems exist anywhere, what a release is
// called, what preseed data a node should boot with, and whether a
// license key is acceptable somewhere. Whole-fleet questions go through
// the fan-out path and degrade gracefully as clusters drop out;
// node-scoped questions go through the bounded single-target path and
// fail loudly.

use crate::application::fanout::ClusterRpc;
use crate::domain::cluster::ClusterId;
use crate::domain::config::CoordinatorConfig;
use crate::domain::connection::ConnectionRegistry;
use crate::domain::osystem::{OperatingSystem, ReleaseTitleOverrides};
use crate::domain::reduce::{any_true, last_non_empty, merge_operating_systems};
use crate::domain::rpc::{CallDescriptor, CallError, Payload};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

pub const LIST_OPERATING_SYSTEMS: &str = "ListOperatingSystems";
pub const GET_OS_RELEASE_TITLE: &str = "GetOSReleaseTitle";
pub const GET_PRESEED_DATA: &str = "GetPreseedData";
pub const COMPOSE_CURTIN_NETWORK_PRESEED: &str = "ComposeCurtinNetworkPreseed";
pub const VALIDATE_LICENSE_KEY: &str = "ValidateLicenseKey";

/// Everything a cluster needs to compose preseed data for one node.
#[derive(Debug, Clone)]
pub struct PreseedRequest {
    /// The cluster controlling the node.
    pub cluster: ClusterId,
    pub osystem: String,
    pub preseed_type: String,
    pub node_system_id: String,
    pub node_hostname: String,
    pub consumer_key: String,
    pub token_key: String,
    pub token_secret: String,
    /// Where the node's metadata will be made available.
    pub metadata_url: Url,
}

/// Operating-system query service over the fleet.
pub struct OsystemsService {
    rpc: ClusterRpc,
    overrides: Arc<dyn ReleaseTitleOverrides>,
    config: CoordinatorConfig,
}

impl OsystemsService {
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        overrides: Arc<dyn ReleaseTitleOverrides>,
        config: CoordinatorConfig,
    ) -> Self {
        let rpc = match config.fanout_ceiling {
            Some(ceiling) => ClusterRpc::with_ceiling(registry, ceiling),
            None => ClusterRpc::new(registry),
        };
        Self {
            rpc,
            overrides,
            config,
        }
    }

    /// Details on every operating system supported by any connected
    /// cluster, exactly matching duplicates suppressed. Clusters that are
    /// unreachable or answer with something unparseable simply contribute
    /// nothing; coverage narrows silently rather than the whole answer
    /// failing.
    pub async fn all_known_operating_systems(&self) -> Vec<OperatingSystem> {
        let call = CallDescriptor::new(LIST_OPERATING_SYSTEMS);
        let outcomes = self.rpc.broadcast(&call).await;
        let listings: Vec<Vec<OperatingSystem>> = outcomes
            .successes_reporting(|err| {
                debug!(error = %err, "cluster dropped from operating system listing")
            })
            .into_iter()
            .filter_map(parse_osystems)
            .collect();
        merge_operating_systems(listings, self.overrides.as_ref()).collect()
    }

    /// The display title for an operating system release, from whichever
    /// cluster answered last with something non-empty. `None` when no
    /// reachable cluster had a title.
    pub async fn os_release_title(&self, osystem: &str, release: &str) -> Option<String> {
        let call = CallDescriptor::new(GET_OS_RELEASE_TITLE)
            .arg("osystem", osystem)
            .arg("release", release);
        let outcomes = self.rpc.broadcast(&call).await;
        let titles = outcomes.successes().into_iter().map(|payload| {
            payload
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        });
        last_non_empty(titles)
    }

    /// OS-specific preseed data for one node, composed by the node's own
    /// cluster. `None` when the cluster answered but supplied no data;
    /// the node's OS may simply define none.
    pub async fn preseed_data(
        &self,
        request: &PreseedRequest,
    ) -> Result<Option<Value>, CallError> {
        let call = CallDescriptor::new(GET_PRESEED_DATA)
            .arg("osystem", request.osystem.as_str())
            .arg("preseed_type", request.preseed_type.as_str())
            .arg("node_system_id", request.node_system_id.as_str())
            .arg("node_hostname", request.node_hostname.as_str())
            .arg("consumer_key", request.consumer_key.as_str())
            .arg("token_key", request.token_key.as_str())
            .arg("token_secret", request.token_secret.as_str())
            .arg("metadata_url", request.metadata_url.as_str());
        let payload = self
            .rpc
            .call_one(request.cluster, &call, self.config.call_deadline)
            .await?;
        Ok(payload.get("data").cloned())
    }

    /// A Curtin network preseed for a node, composed by its cluster from
    /// the given interface/address configuration.
    pub async fn compose_network_preseed(
        &self,
        cluster: ClusterId,
        osystem: &str,
        config: Value,
        disable_ipv4: bool,
    ) -> Result<Option<Value>, CallError> {
        let call = CallDescriptor::new(COMPOSE_CURTIN_NETWORK_PRESEED)
            .arg("osystem", osystem)
            .arg("config", config)
            .arg("disable_ipv4", disable_ipv4);
        let payload = self
            .rpc
            .call_one(cluster, &call, self.config.call_deadline)
            .await?;
        Ok(payload.get("data").cloned())
    }

    /// Validate a license key against one specific cluster. A payload
    /// without an `is_valid` verdict counts as invalid.
    pub async fn validate_license_key_for(
        &self,
        cluster: ClusterId,
        osystem: &str,
        release: &str,
        key: &str,
    ) -> Result<bool, CallError> {
        let call = license_key_call(osystem, release, key);
        let payload = self
            .rpc
            .call_one(cluster, &call, self.config.call_deadline)
            .await?;
        Ok(is_valid_verdict(&payload))
    }

    /// Validate a license key against the whole fleet: one cluster
    /// vouching for it is enough. Every response is consumed so all
    /// underlying calls are observed to completion.
    pub async fn validate_license_key(&self, osystem: &str, release: &str, key: &str) -> bool {
        let call = license_key_call(osystem, release, key);
        let outcomes = self.rpc.broadcast(&call).await;
        let verdicts = outcomes
            .successes()
            .into_iter()
            .map(|payload| is_valid_verdict(payload));
        any_true(verdicts)
    }
}

fn license_key_call(osystem: &str, release: &str, key: &str) -> CallDescriptor {
    CallDescriptor::new(VALIDATE_LICENSE_KEY)
        .arg("osystem", osystem)
        .arg("release", release)
        .arg("key", key)
}

fn is_valid_verdict(payload: &Payload) -> bool {
    payload
        .get("is_valid")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Pull the typed `osystems` listing out of one cluster's payload,
/// discarding the payload with a warning when it does not parse.
fn parse_osystems(payload: &Payload) -> Option<Vec<OperatingSystem>> {
    let listing = payload.get("osystems")?;
    match serde_json::from_value(listing.clone()) {
        Ok(osystems) => Some(osystems),
        Err(err) => {
            warn!(error = %err, "discarding malformed operating system listing");
            None
        }
    }
}
