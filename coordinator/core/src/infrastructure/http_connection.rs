// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP Cluster Connection Adapter
//!
//! Implements the ClusterConnection trait over the cluster controllers'
//! HTTP RPC endpoint.
//!
//! # Wire Format
//!
//! - Request: `POST <endpoint>` with `{"operation": "...", "arguments": {...}}`
//! - Response: `200` with `{"result": {...}}` on success, or
//!   `{"error": {"kind": "...", "detail": "..."}}` when the controller
//!   rejects the call
//! - Any non-2xx status is a transport failure

use crate::domain::cluster::ClusterId;
use crate::domain::connection::ClusterConnection;
use crate::domain::rpc::{CallDescriptor, CallError, Payload};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    operation: &'a str,
    arguments: &'a Payload,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Payload>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    kind: String,
    #[serde(default)]
    detail: String,
}

impl RpcErrorBody {
    fn into_call_error(self) -> CallError {
        match self.kind.as_str() {
            "unknown-operating-system" => CallError::UnknownOperatingSystem(self.detail),
            "unsupported-operation" => CallError::Unsupported(self.detail),
            other => CallError::Transport(format!("{}: {}", other, self.detail)),
        }
    }
}

/// One cluster controller's RPC endpoint, spoken to over HTTP.
pub struct HttpClusterConnection {
    cluster: ClusterId,
    client: Client,
    endpoint: Url,
}

impl HttpClusterConnection {
    pub fn new(cluster: ClusterId, endpoint: Url) -> Self {
        Self::with_connect_timeout(cluster, endpoint, Duration::from_secs(10))
    }

    pub fn with_connect_timeout(
        cluster: ClusterId,
        endpoint: Url,
        connect_timeout: Duration,
    ) -> Self {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            cluster,
            client,
            endpoint,
        }
    }
}

#[async_trait]
impl ClusterConnection for HttpClusterConnection {
    fn cluster_id(&self) -> ClusterId {
        self.cluster
    }

    async fn invoke(&self, call: &CallDescriptor) -> Result<Payload, CallError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&RpcRequest {
                operation: &call.operation,
                arguments: &call.arguments,
            })
            .send()
            .await
            .map_err(|err| CallError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| format!("HTTP {}", status));
            return Err(CallError::Transport(format!(
                "cluster returned {}: {}",
                status, detail
            )));
        }

        let envelope: RpcResponse = response
            .json()
            .await
            .map_err(|err| CallError::Transport(err.to_string()))?;

        if let Some(error) = envelope.error {
            return Err(error.into_call_error());
        }
        envelope.result.ok_or_else(|| {
            CallError::Transport("response carried neither result nor error".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn connection_to(server: &mockito::ServerGuard) -> HttpClusterConnection {
        let endpoint = Url::parse(&format!("{}/rpc", server.url())).unwrap();
        HttpClusterConnection::new(ClusterId::new(), endpoint)
    }

    #[tokio::test]
    async fn test_invoke_returns_result_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/rpc")
            .match_body(mockito::Matcher::Json(json!({
                "operation": "GetOSReleaseTitle",
                "arguments": {"osystem": "ubuntu", "release": "focal"}
            })))
            .with_status(200)
            .with_body(r#"{"result": {"title": "Ubuntu 20.04 LTS"}}"#)
            .create_async()
            .await;

        let connection = connection_to(&server);
        let call = CallDescriptor::new("GetOSReleaseTitle")
            .arg("osystem", "ubuntu")
            .arg("release", "focal");

        let payload = connection.invoke(&call).await.unwrap();
        assert_eq!(payload.get("title"), Some(&json!("Ubuntu 20.04 LTS")));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_invoke_maps_error_envelope() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/rpc")
            .with_status(200)
            .with_body(
                r#"{"error": {"kind": "unknown-operating-system", "detail": "no such OS: plan9"}}"#,
            )
            .create_async()
            .await;

        let connection = connection_to(&server);
        let err = connection
            .invoke(&CallDescriptor::new("GetPreseedData"))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            CallError::UnknownOperatingSystem("no such OS: plan9".to_string())
        );
    }

    #[tokio::test]
    async fn test_invoke_maps_unsupported_operation() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/rpc")
            .with_status(200)
            .with_body(r#"{"error": {"kind": "unsupported-operation", "detail": "no preseed"}}"#)
            .create_async()
            .await;

        let connection = connection_to(&server);
        let err = connection
            .invoke(&CallDescriptor::new("GetPreseedData"))
            .await
            .unwrap_err();

        assert_eq!(err, CallError::Unsupported("no preseed".to_string()));
    }

    #[tokio::test]
    async fn test_invoke_treats_http_error_as_transport() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/rpc")
            .with_status(503)
            .with_body("controller restarting")
            .create_async()
            .await;

        let connection = connection_to(&server);
        let err = connection
            .invoke(&CallDescriptor::new("ListOperatingSystems"))
            .await
            .unwrap_err();

        assert!(matches!(err, CallError::Transport(_)));
    }

    #[tokio::test]
    async fn test_invoke_rejects_empty_envelope() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/rpc")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let connection = connection_to(&server);
        let err = connection
            .invoke(&CallDescriptor::new("ListOperatingSystems"))
            .await
            .unwrap_err();

        assert!(matches!(err, CallError::Transport(_)));
    }
}
