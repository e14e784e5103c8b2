// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Fan-Out RPC Vocabulary - Call Descriptors and Settled Outcomes
//
// Defines the value types shared by the fan-out executor, the bounded
// single-target call, and the transport adapters: what to invoke, what
// came back, and the failure taxonomy in between.
//
// Failure suppression on the fan-out path is an explicit filter over an
// `OutcomeSet`, not a control-flow side effect; see `OutcomeSet::successes`.

use crate::domain::cluster::ClusterId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Result object of one remote call, as the cluster controller returned it.
/// Callers interpret missing keys; this layer does not.
pub type Payload = serde_json::Map<String, Value>;

/// Immutable description of one remote operation and its arguments.
///
/// A single descriptor is shared read-only across every concurrent
/// invocation of a fan-out round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallDescriptor {
    /// Remote operation name, e.g. `ListOperatingSystems`.
    pub operation: String,

    /// Named arguments for the operation.
    pub arguments: Payload,
}

impl CallDescriptor {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            arguments: Payload::new(),
        }
    }

    /// Attach one named argument, consuming and returning the descriptor
    /// so call sites read as a literal.
    pub fn arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }
}

/// Errors that can come out of a cluster call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CallError {
    /// The registry has no live connection for the requested cluster.
    #[error("no connections available for cluster {0}")]
    NoConnectionsAvailable(ClusterId),

    /// The cluster has no knowledge of the named operating system or release.
    #[error("cluster reports unknown operating system: {0}")]
    UnknownOperatingSystem(String),

    /// The cluster understands the call but declines to produce data for it.
    #[error("cluster does not support this operation: {0}")]
    Unsupported(String),

    /// A bounded single-target call exceeded its deadline, or a fan-out
    /// round's ceiling expired with the call still outstanding. Carries
    /// the elapsed bound.
    #[error("call did not complete within {0:?}")]
    Timeout(Duration),

    /// Opaque lower-layer failure, e.g. connection reset.
    #[error("transport failure: {0}")]
    Transport(String),
}

/// The settled result of one dispatched call: the payload the cluster
/// returned, or the failure that took its place. A failure here never
/// aborts sibling calls in the same round.
#[derive(Debug, Clone)]
pub enum Outcome {
    Success(Payload),
    Failure(CallError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn payload(&self) -> Option<&Payload> {
        match self {
            Outcome::Success(payload) => Some(payload),
            Outcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&CallError> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(err) => Some(err),
        }
    }
}

/// One fan-out round's settled outcomes, frozen once the last call lands.
///
/// Length equals the number of connections dispatched to, and each
/// position corresponds to the connection at the same input position;
/// completion order is not observable here.
#[derive(Debug, Clone, Default)]
pub struct OutcomeSet {
    outcomes: Vec<Outcome>,
}

impl OutcomeSet {
    pub fn new(outcomes: Vec<Outcome>) -> Self {
        Self { outcomes }
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes.iter()
    }

    /// Drop every failure, keeping the successful payloads in input
    /// order. Silently absorbing partial unreachability is deliberate for
    /// whole-fleet queries: one unreachable cluster must never deny an
    /// answer the others can supply. Pure; calling it twice yields the
    /// same sequence both times.
    pub fn successes(&self) -> Vec<&Payload> {
        self.outcomes
            .iter()
            .filter_map(Outcome::payload)
            .collect()
    }

    /// Like [`successes`](Self::successes), but hands each dropped
    /// failure to `on_failure` first. Fully silent drops make fleet-wide
    /// outages invisible, so production callers get a hook.
    pub fn successes_reporting<F>(&self, mut on_failure: F) -> Vec<&Payload>
    where
        F: FnMut(&CallError),
    {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                Outcome::Success(payload) => Some(payload),
                Outcome::Failure(err) => {
                    on_failure(err);
                    None
                }
            })
            .collect()
    }

    /// Consuming variant for callers that own the round.
    pub fn into_successes(self) -> Vec<Payload> {
        self.outcomes
            .into_iter()
            .filter_map(|outcome| match outcome {
                Outcome::Success(payload) => Some(payload),
                Outcome::Failure(_) => None,
            })
            .collect()
    }
}

impl IntoIterator for OutcomeSet {
    type Item = Outcome;
    type IntoIter = std::vec::IntoIter<Outcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(key: &str, value: Value) -> Payload {
        let mut map = Payload::new();
        map.insert(key.to_string(), value);
        map
    }

    #[test]
    fn test_call_descriptor_arguments() {
        let call = CallDescriptor::new("GetOSReleaseTitle")
            .arg("osystem", "ubuntu")
            .arg("release", "focal");

        assert_eq!(call.operation, "GetOSReleaseTitle");
        assert_eq!(call.arguments.get("osystem"), Some(&json!("ubuntu")));
        assert_eq!(call.arguments.get("release"), Some(&json!("focal")));
    }

    #[test]
    fn test_successes_preserves_input_order() {
        let set = OutcomeSet::new(vec![
            Outcome::Success(payload("n", json!(1))),
            Outcome::Failure(CallError::Transport("reset".into())),
            Outcome::Success(payload("n", json!(3))),
        ]);

        let survivors = set.successes();
        assert_eq!(survivors.len(), 2);
        assert_eq!(survivors[0].get("n"), Some(&json!(1)));
        assert_eq!(survivors[1].get("n"), Some(&json!(3)));
    }

    #[test]
    fn test_successes_is_idempotent() {
        let set = OutcomeSet::new(vec![
            Outcome::Success(payload("n", json!(1))),
            Outcome::Failure(CallError::Timeout(Duration::from_secs(30))),
        ]);

        assert_eq!(set.successes(), set.successes());
    }

    #[test]
    fn test_successes_reporting_sees_every_failure() {
        let set = OutcomeSet::new(vec![
            Outcome::Failure(CallError::Transport("reset".into())),
            Outcome::Success(payload("n", json!(2))),
            Outcome::Failure(CallError::Unsupported("no preseed".into())),
        ]);

        let mut dropped = Vec::new();
        let survivors = set.successes_reporting(|err| dropped.push(err.clone()));

        assert_eq!(survivors.len(), 1);
        assert_eq!(
            dropped,
            vec![
                CallError::Transport("reset".into()),
                CallError::Unsupported("no preseed".into()),
            ]
        );
    }

    #[test]
    fn test_filter_never_grows_the_set() {
        let set = OutcomeSet::new(vec![
            Outcome::Success(payload("n", json!(1))),
            Outcome::Failure(CallError::Transport("reset".into())),
        ]);

        assert!(set.successes().len() <= set.len());
    }
}
