// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod fanout;
pub mod osystems;

// Re-export the services for convenience
pub use fanout::ClusterRpc;
pub use osystems::{OsystemsService, PreseedRequest};
