//! Shared fixtures for integration tests

#![allow(dead_code)]

use nodeflow::runtime::{ExecutionEngine, NodeExecutor};
use nodeflow::services::ServiceClients;
use nodeflow::workflow::{Connection, Node, NodeCategory};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Engine with no credentials configured and no pacing delay
pub fn offline_engine() -> ExecutionEngine {
    let executor = Arc::new(NodeExecutor::new(Arc::new(ServiceClients::unconfigured())));
    ExecutionEngine::new(executor, Duration::ZERO)
}

pub fn node(id: &str, category: NodeCategory, node_type: &str, config: Value) -> Node {
    Node::new(id, category, node_type, id).with_config(config)
}

pub fn connect(from: &str, to: &str) -> Connection {
    Connection::new(format!("{from}-{to}"), from, to)
}
