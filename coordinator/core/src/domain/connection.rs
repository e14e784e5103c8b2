// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Cluster Connection Seams (Anti-Corruption Layer)
//
// Domain interfaces for the two collaborators the aggregation core
// depends on: a live channel to one cluster controller, and the registry
// that resolves cluster identities to live channels.
//
// Implementations in infrastructure/ directory. The registry is always
// passed in explicitly so the core stays unit-testable with fakes.

use crate::domain::cluster::ClusterId;
use crate::domain::rpc::{CallDescriptor, CallError, Payload};
use async_trait::async_trait;
use std::sync::Arc;

/// A live channel to one cluster controller.
///
/// The aggregation core borrows a connection for the duration of one call
/// and never retains it; connection lifecycle belongs to the registry.
#[async_trait]
pub trait ClusterConnection: Send + Sync {
    /// Identity of the cluster controller on the far end.
    fn cluster_id(&self) -> ClusterId;

    /// Issue the described call over this connection and wait for the
    /// controller's answer.
    async fn invoke(&self, call: &CallDescriptor) -> Result<Payload, CallError>;
}

/// Tracks which cluster controllers are currently connected.
pub trait ConnectionRegistry: Send + Sync {
    /// Snapshot of every live connection at the time of the call.
    fn all_connections(&self) -> Vec<Arc<dyn ClusterConnection>>;

    /// Resolve a live connection to the named cluster, failing with
    /// [`CallError::NoConnectionsAvailable`] when there is none.
    fn connection_for(
        &self,
        cluster: ClusterId,
    ) -> Result<Arc<dyn ClusterConnection>, CallError>;
}
