/// Core workflow type definitions
///
/// Defines workflows, nodes, connections and execution records. These are the
/// shapes storage hands to the engine and the HTTP layer hands to clients.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Opaque per-node configuration, interpreted only by the matching handler
pub type NodeConfig = Map<String, Value>;

/// Node identifier -> produced output, in insertion order
///
/// Used both for the accumulated result of a run and for the predecessor
/// results handed to a single node.
pub type ResultMap = Map<String, Value>;

/// A named, user-owned container of nodes and connections
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub last_run_at: Option<String>,
}

/// A workflow together with its graph, as served to the canvas
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDetail {
    #[serde(flatten)]
    pub workflow: Workflow,
    pub nodes: Vec<Node>,
    pub connections: Vec<Connection>,
}

/// Broad node category
///
/// Only `Trigger` matters to the engine: trigger nodes seed the traversal.
/// The category is never checked against the node's type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    Trigger,
    Action,
    Data,
    Logic,
}

impl NodeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeCategory::Trigger => "trigger",
            NodeCategory::Action => "action",
            NodeCategory::Data => "data",
            NodeCategory::Logic => "logic",
        }
    }
}

impl fmt::Display for NodeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NodeCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trigger" => Ok(NodeCategory::Trigger),
            "action" => Ok(NodeCategory::Action),
            "data" => Ok(NodeCategory::Data),
            "logic" => Ok(NodeCategory::Logic),
            other => Err(format!("unknown node category: {}", other)),
        }
    }
}

/// A single node in the workflow graph
///
/// `node_type` is the free-form tag (e.g. "weather", "email", "condition") that
/// selects the handler. Position is canvas-only and ignored by execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique node identifier within the workflow
    pub id: String,
    #[serde(default)]
    pub workflow_id: String,
    /// Node category, serialized as `type` for canvas compatibility
    #[serde(rename = "type")]
    pub category: NodeCategory,
    pub node_type: String,
    pub label: String,
    #[serde(default)]
    pub position_x: f64,
    #[serde(default)]
    pub position_y: f64,
    #[serde(default)]
    pub config: NodeConfig,
}

impl Node {
    pub fn new(
        id: impl Into<String>,
        category: NodeCategory,
        node_type: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            workflow_id: String::new(),
            category,
            node_type: node_type.into(),
            label: label.into(),
            position_x: 0.0,
            position_y: 0.0,
            config: NodeConfig::new(),
        }
    }

    /// Replace the configuration; non-object values yield an empty config
    pub fn with_config(mut self, config: Value) -> Self {
        self.config = match config {
            Value::Object(map) => map,
            _ => NodeConfig::new(),
        };
        self
    }

    pub fn is_trigger(&self) -> bool {
        self.category == NodeCategory::Trigger
    }
}

/// Directed connection between two nodes of the same workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub id: String,
    #[serde(default)]
    pub workflow_id: String,
    pub source_node_id: String,
    pub target_node_id: String,
}

impl Connection {
    pub fn new(
        id: impl Into<String>,
        source_node_id: impl Into<String>,
        target_node_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            workflow_id: String::new(),
            source_node_id: source_node_id.into(),
            target_node_id: target_node_id.into(),
        }
    }
}

/// Lifecycle state of an execution record
///
/// `Running` transitions exactly once to `Completed` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Running,
    Completed,
    Failed,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Running => "running",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExecutionStatus::Running)
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExecutionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(ExecutionStatus::Running),
            "completed" => Ok(ExecutionStatus::Completed),
            "failed" => Ok(ExecutionStatus::Failed),
            other => Err(format!("unknown execution status: {}", other)),
        }
    }
}

/// Persisted audit entry for one engine run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub id: String,
    pub workflow_id: String,
    pub status: ExecutionStatus,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub error_message: Option<String>,
    /// Serialized result map, present once completed
    pub execution_data: Option<Value>,
}
