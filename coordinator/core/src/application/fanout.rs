// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Fan-Out Executor and Bounded Single-Target Call
//
// The concurrency core of the coordinator's RPC layer. `dispatch` asks
// many clusters the same question at once and waits for every answer to
// settle; `call_one` asks exactly one cluster and gives up loudly at a
// deadline. The two paths have opposite failure contracts: fan-out
// captures every failure as an outcome for a later filter, the bounded
// call suppresses nothing.

use crate::domain::cluster::ClusterId;
use crate::domain::connection::{ClusterConnection, ConnectionRegistry};
use crate::domain::rpc::{CallDescriptor, CallError, Outcome, OutcomeSet, Payload};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Fan-out RPC service over the fleet's live connections.
///
/// Holds the registry as an explicit dependency; swap in a fake registry
/// to test callers without a single real connection.
pub struct ClusterRpc {
    registry: Arc<dyn ConnectionRegistry>,
    fanout_ceiling: Option<Duration>,
}

impl ClusterRpc {
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self {
            registry,
            fanout_ceiling: None,
        }
    }

    /// Cap every fan-out round at `ceiling`; calls still outstanding when
    /// it expires settle as [`CallError::Timeout`] failures.
    pub fn with_ceiling(registry: Arc<dyn ConnectionRegistry>, ceiling: Duration) -> Self {
        Self {
            registry,
            fanout_ceiling: Some(ceiling),
        }
    }

    /// Issue `call` once per connection, concurrently, and return once
    /// every call has settled. This is a join, not a race.
    ///
    /// The result is never partial: its length equals the number of
    /// connections, position i holds connection i's outcome regardless of
    /// completion order, and one connection's failure never cancels its
    /// siblings. Zero connections yield an empty set without blocking.
    /// No retry is imposed; calls at this layer are read-mostly.
    pub async fn dispatch(
        call: &CallDescriptor,
        connections: &[Arc<dyn ClusterConnection>],
        ceiling: Option<Duration>,
    ) -> OutcomeSet {
        if connections.is_empty() {
            return OutcomeSet::default();
        }
        let calls = connections
            .iter()
            .map(|connection| Self::settle(connection.as_ref(), call, ceiling));
        OutcomeSet::new(join_all(calls).await)
    }

    /// Run one call to its own completion or failure, capturing whatever
    /// happens as a settled outcome.
    async fn settle(
        connection: &dyn ClusterConnection,
        call: &CallDescriptor,
        ceiling: Option<Duration>,
    ) -> Outcome {
        let result = match ceiling {
            Some(limit) => match tokio::time::timeout(limit, connection.invoke(call)).await {
                Ok(result) => result,
                // The abandoned call may still run to completion on the
                // cluster side; only the waiting stops here.
                Err(_) => Err(CallError::Timeout(limit)),
            },
            None => connection.invoke(call).await,
        };

        match result {
            Ok(payload) => Outcome::Success(payload),
            Err(err) => {
                debug!(
                    cluster = %connection.cluster_id(),
                    operation = %call.operation,
                    error = %err,
                    "cluster call failed"
                );
                Outcome::Failure(err)
            }
        }
    }

    /// Ask every connected cluster.
    pub async fn broadcast(&self, call: &CallDescriptor) -> OutcomeSet {
        let connections = self.registry.all_connections();
        debug!(
            operation = %call.operation,
            connections = connections.len(),
            "starting fan-out round"
        );
        Self::dispatch(call, &connections, self.fanout_ceiling).await
    }

    /// Ask exactly one cluster and wait up to `deadline`.
    ///
    /// Every failure reaches the caller: missing connection, remote
    /// rejection, transport fault, or deadline expiry. On expiry the
    /// underlying call is abandoned (at-most-once delivery to the
    /// caller, not exactly-once to the cluster). A zero or already-elapsed
    /// deadline fails immediately without invoking anything.
    pub async fn call_one(
        &self,
        cluster: ClusterId,
        call: &CallDescriptor,
        deadline: Duration,
    ) -> Result<Payload, CallError> {
        let connection = self.registry.connection_for(cluster)?;
        if deadline.is_zero() {
            return Err(CallError::Timeout(deadline));
        }
        match tokio::time::timeout(deadline, connection.invoke(call)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    cluster = %cluster,
                    operation = %call.operation,
                    ?deadline,
                    "single-target call timed out"
                );
                Err(CallError::Timeout(deadline))
            }
        }
    }
}
