use crate::model::{Edge, EdgeId, Node, NodeData, NodeId, NodeType, TradeMode};
use crate::variables::{accepts_input_handle, exposed_handles};
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;

/// The node/edge model. Owned by [`StrategyGraph`](super::StrategyGraph); every other
/// component reads it through `&GraphState` and recomputes derived views on demand.
#[derive(Debug, Clone, Default)]
pub struct GraphState {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    revisions: AHashMap<NodeId, u64>,
    next_revision: u64,
    mode: TradeMode,
    chart_config: serde_json::Value,
}

impl GraphState {
    pub fn new(mode: TradeMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> TradeMode {
        self.mode
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn chart_config(&self) -> &serde_json::Value {
        &self.chart_config
    }

    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    pub fn edge(&self, edge_id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == edge_id)
    }

    /// Inbound edges of a node, in insertion order.
    pub fn inbound_edges(&self, node_id: &str) -> Vec<&Edge> {
        self.edges.iter().filter(|e| e.target == node_id).collect()
    }

    pub fn inbound_on_handle(&self, node_id: &str, target_handle: &str) -> Vec<&Edge> {
        self.edges
            .iter()
            .filter(|e| e.target == node_id && e.target_handle == target_handle)
            .collect()
    }

    pub fn outbound_edges(&self, node_id: &str) -> Vec<&Edge> {
        self.edges.iter().filter(|e| e.source == node_id).collect()
    }

    pub fn children<'a>(&'a self, parent_id: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.nodes
            .iter()
            .filter(move |n| n.parent_id.as_deref() == Some(parent_id))
    }

    /// The epoch stamped on the node's current configuration.
    pub fn revision(&self, node_id: &str) -> Option<u64> {
        self.revisions.get(node_id).copied()
    }

    /// True when `to` can be reached from `from` by following data downstream: along
    /// edges, from an end node into its group, and from a group into the consumers of
    /// its start node.
    pub fn reaches(&self, from: &str, to: &str) -> bool {
        let mut visited: AHashSet<NodeId> = AHashSet::new();
        let mut stack = vec![from.to_string()];
        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if !visited.insert(current.clone()) {
                continue;
            }
            stack.extend(self.dependents(&current));
        }
        false
    }

    /// Nodes whose references may read from `node_id`: its edge consumers, the enclosing
    /// group of an end node and, for an operation group, the consumers of the group's
    /// start node.
    pub fn dependents(&self, node_id: &str) -> Vec<NodeId> {
        let mut readers: Vec<&NodeId> = self
            .edges
            .iter()
            .filter(|e| e.source == node_id)
            .map(|e| &e.target)
            .collect();
        if let Some(node) = self.node(node_id) {
            match node.node_type() {
                NodeType::OperationEnd => readers.extend(node.parent_id.as_ref()),
                NodeType::OperationGroup => {
                    for start in self
                        .children(node_id)
                        .filter(|n| n.node_type() == NodeType::OperationStart)
                    {
                        readers.extend(
                            self.edges
                                .iter()
                                .filter(|e| e.source == start.id)
                                .map(|e| &e.target),
                        );
                    }
                }
                _ => {}
            }
        }
        readers.into_iter().unique().cloned().collect()
    }

    /// Applies `update` to a node's payload. The node's revision is bumped when the
    /// closure reports a change. Returns whether the node was changed.
    pub fn modify_node<F>(&mut self, node_id: &str, update: F) -> bool
    where
        F: FnOnce(&mut NodeData) -> bool,
    {
        let changed = match self.nodes.iter_mut().find(|n| n.id == node_id) {
            Some(node) => update(&mut node.data),
            None => false,
        };
        if changed {
            self.touch(node_id);
        }
        changed
    }

    pub(crate) fn set_mode(&mut self, mode: TradeMode) {
        self.mode = mode;
    }

    pub(crate) fn set_chart_config(&mut self, chart_config: serde_json::Value) {
        self.chart_config = chart_config;
    }

    fn touch(&mut self, node_id: &str) {
        self.next_revision += 1;
        self.revisions
            .insert(node_id.to_string(), self.next_revision);
    }

    pub(crate) fn insert_node(&mut self, node: Node) {
        let id = node.id.clone();
        self.nodes.push(node);
        self.touch(&id);
    }

    pub(crate) fn remove_node(&mut self, node_id: &str) -> Option<Node> {
        let index = self.nodes.iter().position(|n| n.id == node_id)?;
        self.revisions.remove(node_id);
        Some(self.nodes.remove(index))
    }

    pub(crate) fn push_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    pub(crate) fn remove_edge(&mut self, edge_id: &str) -> Option<Edge> {
        let index = self.edges.iter().position(|e| e.id == edge_id)?;
        Some(self.edges.remove(index))
    }

    /// Removes the edges whose source no longer exposes their source handle or whose
    /// target no longer accepts their target handle, and returns them. With `scope`, only
    /// edges touching that node are considered.
    pub(crate) fn prune_stale_edges(&mut self, scope: Option<&str>) -> Vec<Edge> {
        let stale: Vec<EdgeId> = self
            .edges
            .iter()
            .filter(|e| scope.is_none_or(|node_id| e.involves(node_id)))
            .filter(|e| !self.handles_match(e))
            .map(|e| e.id.clone())
            .collect();
        stale.iter().filter_map(|id| self.remove_edge(id)).collect()
    }

    fn handles_match(&self, edge: &Edge) -> bool {
        let (Some(source), Some(target)) = (self.node(&edge.source), self.node(&edge.target)) else {
            return false;
        };
        exposed_handles(source, self, self.mode).contains(&edge.source_handle)
            && accepts_input_handle(target, &edge.target_handle)
    }

    /// Removes every edge touching `node_id` and returns them.
    pub(crate) fn remove_edges_of(&mut self, node_id: &str) -> Vec<Edge> {
        let (removed, kept): (Vec<Edge>, Vec<Edge>) =
            self.edges.drain(..).partition(|e| e.involves(node_id));
        self.edges = kept;
        removed
    }
}
