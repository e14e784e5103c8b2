// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// In-Memory Connection Registry
//
// Tracks which cluster controllers currently have live connections to
// the coordinator. A cluster may hold several connections at once;
// single-target resolution rotates across them so no one channel carries
// every call. Connection establishment and retry live outside this
// layer; the registry only records what exists right now.

use crate::domain::cluster::ClusterId;
use crate::domain::connection::{ClusterConnection, ConnectionRegistry};
use crate::domain::rpc::CallError;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::info;

struct RegisteredConnection {
    connection: Arc<dyn ClusterConnection>,
    registered_at: DateTime<Utc>,
}

/// Live-connection table keyed by cluster identity.
#[derive(Default)]
pub struct InMemoryConnectionRegistry {
    connections: DashMap<ClusterId, Vec<RegisteredConnection>>,
    next: AtomicUsize,
}

impl InMemoryConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a freshly established connection.
    pub fn register(&self, connection: Arc<dyn ClusterConnection>) {
        let cluster = connection.cluster_id();
        self.connections
            .entry(cluster)
            .or_default()
            .push(RegisteredConnection {
                connection,
                registered_at: Utc::now(),
            });
        info!(cluster = %cluster, "cluster connection registered");
    }

    /// Drop every connection to `cluster`, returning how many went away.
    pub fn unregister(&self, cluster: ClusterId) -> usize {
        let removed = self
            .connections
            .remove(&cluster)
            .map(|(_, connections)| connections.len())
            .unwrap_or(0);
        if removed > 0 {
            info!(cluster = %cluster, connections = removed, "cluster unregistered");
        }
        removed
    }

    /// Clusters with at least one live connection.
    pub fn connected_clusters(&self) -> Vec<ClusterId> {
        self.connections.iter().map(|entry| *entry.key()).collect()
    }

    /// When the oldest surviving connection to `cluster` was registered.
    pub fn registered_since(&self, cluster: ClusterId) -> Option<DateTime<Utc>> {
        self.connections
            .get(&cluster)
            .and_then(|entry| entry.iter().map(|r| r.registered_at).min())
    }
}

impl ConnectionRegistry for InMemoryConnectionRegistry {
    fn all_connections(&self) -> Vec<Arc<dyn ClusterConnection>> {
        self.connections
            .iter()
            .flat_map(|entry| {
                entry
                    .value()
                    .iter()
                    .map(|registered| Arc::clone(&registered.connection))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    fn connection_for(
        &self,
        cluster: ClusterId,
    ) -> Result<Arc<dyn ClusterConnection>, CallError> {
        let entry = self
            .connections
            .get(&cluster)
            .ok_or(CallError::NoConnectionsAvailable(cluster))?;
        if entry.is_empty() {
            return Err(CallError::NoConnectionsAvailable(cluster));
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed) % entry.len();
        Ok(Arc::clone(&entry.value()[index].connection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rpc::{CallDescriptor, Payload};
    use async_trait::async_trait;

    struct StubConnection {
        cluster: ClusterId,
        label: &'static str,
    }

    #[async_trait]
    impl ClusterConnection for StubConnection {
        fn cluster_id(&self) -> ClusterId {
            self.cluster
        }

        async fn invoke(&self, _call: &CallDescriptor) -> Result<Payload, CallError> {
            let mut payload = Payload::new();
            payload.insert("label".into(), self.label.into());
            Ok(payload)
        }
    }

    #[test]
    fn test_connection_for_unknown_cluster() {
        let registry = InMemoryConnectionRegistry::new();
        let cluster = ClusterId::new();

        let err = registry.connection_for(cluster).err().unwrap();
        assert_eq!(err, CallError::NoConnectionsAvailable(cluster));
    }

    #[tokio::test]
    async fn test_connection_for_rotates() {
        let registry = InMemoryConnectionRegistry::new();
        let cluster = ClusterId::new();
        registry.register(Arc::new(StubConnection { cluster, label: "a" }));
        registry.register(Arc::new(StubConnection { cluster, label: "b" }));

        let call = CallDescriptor::new("Ping");
        let mut labels = Vec::new();
        for _ in 0..4 {
            let connection = registry.connection_for(cluster).unwrap();
            let payload = connection.invoke(&call).await.unwrap();
            labels.push(payload.get("label").unwrap().as_str().unwrap().to_string());
        }

        assert_eq!(labels, ["a", "b", "a", "b"]);
    }

    #[test]
    fn test_all_connections_spans_clusters() {
        let registry = InMemoryConnectionRegistry::new();
        let first = ClusterId::new();
        let second = ClusterId::new();
        registry.register(Arc::new(StubConnection { cluster: first, label: "a" }));
        registry.register(Arc::new(StubConnection { cluster: first, label: "b" }));
        registry.register(Arc::new(StubConnection { cluster: second, label: "c" }));

        assert_eq!(registry.all_connections().len(), 3);
        assert_eq!(registry.connected_clusters().len(), 2);
    }

    #[test]
    fn test_unregister_removes_every_connection() {
        let registry = InMemoryConnectionRegistry::new();
        let cluster = ClusterId::new();
        registry.register(Arc::new(StubConnection { cluster, label: "a" }));
        registry.register(Arc::new(StubConnection { cluster, label: "b" }));

        assert_eq!(registry.unregister(cluster), 2);
        assert!(registry.all_connections().is_empty());
        assert!(registry.connection_for(cluster).is_err());
        // A second unregister is a no-op.
        assert_eq!(registry.unregister(cluster), 0);
    }

    #[test]
    fn test_registered_since_tracks_oldest() {
        let registry = InMemoryConnectionRegistry::new();
        let cluster = ClusterId::new();
        assert!(registry.registered_since(cluster).is_none());

        registry.register(Arc::new(StubConnection { cluster, label: "a" }));
        let first = registry.registered_since(cluster).unwrap();

        registry.register(Arc::new(StubConnection { cluster, label: "b" }));
        assert_eq!(registry.registered_since(cluster).unwrap(), first);
    }
}
