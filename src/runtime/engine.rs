/// Breadth-first workflow execution engine
///
/// Seeds a FIFO queue with every trigger node (in supply order) and walks the
/// graph one node at a time. Each dequeued node runs once, with whatever
/// predecessor results exist at that moment, and its successors are enqueued
/// afterwards. A visited-set makes revisits (diamonds, cycles) no-ops, so the
/// walk always terminates.
///
/// Execution is strictly sequential: a fixed pause precedes every handler and
/// the handler (including any external call) is awaited in place before the
/// next node is dequeued.

use crate::runtime::error::{EngineError, EngineResult, HandlerError};
use crate::runtime::executor::NodeExecutor;
use crate::runtime::graph::WorkflowGraph;
use crate::workflow::types::{Connection, Node, ResultMap};
use serde_json::Value;
use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Runs a single node for the engine
pub trait NodeDispatcher: Send + Sync {
    fn dispatch(
        &self,
        node: &Node,
        previous: &ResultMap,
    ) -> impl Future<Output = Result<Value, HandlerError>> + Send;
}

impl NodeDispatcher for NodeExecutor {
    fn dispatch(
        &self,
        node: &Node,
        previous: &ResultMap,
    ) -> impl Future<Output = Result<Value, HandlerError>> + Send {
        self.execute_node(node, previous)
    }
}

/// Graph traversal engine
#[derive(Debug)]
pub struct ExecutionEngine<D = NodeExecutor> {
    dispatcher: Arc<D>,
    /// Pause injected before every node handler
    node_delay: Duration,
}

impl<D: NodeDispatcher> ExecutionEngine<D> {
    pub fn new(dispatcher: Arc<D>, node_delay: Duration) -> Self {
        Self {
            dispatcher,
            node_delay,
        }
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Execute one workflow run and return the result of every reached node
    ///
    /// Fails before any handler runs if a connection is dangling or there is no
    /// trigger node. A handler failure aborts the rest of the traversal and no
    /// partial results are returned.
    pub async fn execute_workflow(&self, nodes: &[Node], connections: &[Connection]) -> EngineResult<ResultMap> {
        let run_start = Instant::now();

        let graph = WorkflowGraph::build(nodes, connections)?;
        let triggers = graph.triggers();
        if triggers.is_empty() {
            tracing::warn!("Workflow has no trigger node, refusing to run");
            return Err(EngineError::NoTrigger);
        }

        tracing::info!(
            "Starting workflow run: {} nodes, {} connections, {} triggers",
            graph.node_count(),
            graph.edge_count(),
            triggers.len()
        );

        let mut queue: VecDeque<&Node> = triggers.into_iter().collect();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut results = ResultMap::new();

        while let Some(node) = queue.pop_front() {
            if !visited.insert(node.id.as_str()) {
                tracing::debug!("Node '{}' already executed, skipping", node.id);
                continue;
            }

            // Predecessors that have not run yet are simply absent
            let previous: ResultMap = graph
                .predecessors(&node.id)
                .into_iter()
                .filter_map(|id| results.get(id).map(|result| (id.to_string(), result.clone())))
                .collect();
            tracing::debug!(
                "Node '{}' sees {} predecessor result(s)",
                node.id,
                previous.len()
            );

            if !self.node_delay.is_zero() {
                tokio::time::sleep(self.node_delay).await;
            }

            let node_start = Instant::now();
            let output = self
                .dispatcher
                .dispatch(node, &previous)
                .await
                .map_err(|source| EngineError::Handler {
                    node_id: node.id.clone(),
                    source,
                })?;
            tracing::info!("Node '{}' completed in {:?}", node.id, node_start.elapsed());

            results.insert(node.id.clone(), output);

            for successor in graph.successors(&node.id) {
                if visited.contains(successor) {
                    continue;
                }
                if let Some(next) = graph.node(successor) {
                    queue.push_back(next);
                }
            }
        }

        tracing::info!(
            "Workflow run finished: {} node(s) executed in {:?}",
            results.len(),
            run_start.elapsed()
        );

        Ok(results)
    }
}
