//! The graph-state manager. [`StrategyGraph`] owns the node/edge model and is the only
//! place it is mutated; every command is applied in full before observers run.

use crate::error::GraphError;
use crate::model::{Edge, EdgeId, Node, NodeData, NodeId, NodeType, TradeMode, VariableItem};
use crate::operation::{OperationRegistry, OperationTypeResolver};
use crate::sync::ReferenceSynchronizer;
use crate::topology::{CompatibilityTables, check_connection};
use crate::variables::resolve_for_node;
use ahash::AHashMap;
use itertools::Itertools;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, warn};

pub mod events;
pub mod patch;
pub mod state;

pub use events::{GraphEvent, GraphObserver, ObserverOutcome, SyncNotice};
pub use patch::{NodePatch, merge_patch};
pub use state::GraphState;

/// How many times one node may be re-announced within a single dispatch.
const MAX_ANNOUNCEMENTS_PER_NODE: usize = 16;

/// The result of a successful command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandReport {
    /// The id of the edge a `connect` added.
    pub edge_id: Option<EdgeId>,
    /// Warnings raised while synchronizing, in the order they were found.
    pub notices: Vec<SyncNotice>,
    /// Edges dropped because an endpoint stopped exposing or accepting their handle.
    pub removed_edges: Vec<EdgeId>,
}

pub struct StrategyGraph {
    state: GraphState,
    tables: Arc<CompatibilityTables>,
    registry: Arc<OperationRegistry>,
    observers: Vec<Box<dyn GraphObserver>>,
    load_report: CommandReport,
}

pub struct StrategyGraphBuilder {
    mode: TradeMode,
    tables: Arc<CompatibilityTables>,
    registry: Arc<OperationRegistry>,
    observers: Vec<Box<dyn GraphObserver>>,
    synchronize: bool,
}

impl Default for StrategyGraphBuilder {
    fn default() -> Self {
        Self {
            mode: TradeMode::default(),
            tables: CompatibilityTables::standard(),
            registry: OperationRegistry::standard(),
            observers: Vec::new(),
            synchronize: true,
        }
    }
}

impl StrategyGraphBuilder {
    pub fn with_mode(mut self, mode: TradeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_tables(mut self, tables: Arc<CompatibilityTables>) -> Self {
        self.tables = tables;
        self
    }

    pub fn with_registry(mut self, registry: Arc<OperationRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Registers an extra observer. Observers run in registration order, after the
    /// built-in reference synchronizer.
    pub fn with_observer(mut self, observer: Box<dyn GraphObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Leaves out the built-in reference synchronizer.
    pub fn without_synchronizer(mut self) -> Self {
        self.synchronize = false;
        self
    }

    pub fn build(self) -> StrategyGraph {
        let mut observers: Vec<Box<dyn GraphObserver>> = Vec::new();
        if self.synchronize {
            observers.push(Box::new(ReferenceSynchronizer::new(Arc::clone(
                &self.registry,
            ))));
        }
        observers.extend(self.observers);
        StrategyGraph {
            state: GraphState::new(self.mode),
            tables: self.tables,
            registry: self.registry,
            observers,
            load_report: CommandReport::default(),
        }
    }
}

impl Default for StrategyGraph {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl StrategyGraph {
    pub fn builder() -> StrategyGraphBuilder {
        StrategyGraphBuilder::default()
    }

    pub fn state(&self) -> &GraphState {
        &self.state
    }

    pub fn mode(&self) -> TradeMode {
        self.state.mode()
    }

    pub fn tables(&self) -> &CompatibilityTables {
        &self.tables
    }

    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.state.node(node_id)
    }

    pub fn nodes(&self) -> &[Node] {
        self.state.nodes()
    }

    pub fn edges(&self) -> &[Edge] {
        self.state.edges()
    }

    /// What reconciling the loaded document changed: edges that were dropped and the
    /// notices raised. Empty for a graph that was not loaded from a document.
    pub fn load_report(&self) -> &CommandReport {
        &self.load_report
    }

    pub fn observer_names(&self) -> Vec<&str> {
        self.observers.iter().map(|o| o.name()).collect()
    }

    pub fn operation_resolver(&self) -> OperationTypeResolver<'_> {
        OperationTypeResolver::new(&self.registry)
    }

    /// Whether `proposal` could be added right now.
    pub fn is_valid_connection(&self, proposal: &Edge) -> bool {
        check_connection(proposal, &self.state, &self.tables).is_ok()
    }

    /// The variables reachable through every inbound edge of `node_id`.
    pub fn resolve_variables(&self, node_id: &str) -> Vec<VariableItem> {
        resolve_for_node(&self.state, node_id)
    }

    // --- Commands ---

    pub fn add_node(&mut self, mut node: Node) -> Result<CommandReport, GraphError> {
        if self.state.node(&node.id).is_some() {
            return Err(GraphError::DuplicateNode(node.id));
        }
        if let Some(parent_id) = &node.parent_id {
            self.check_parent(&node, parent_id)?;
        }
        if let NodeData::Operation(op) = &mut node.data {
            self.operation_resolver().refresh_output(op);
        }

        debug!(node_id = %node.id, node_type = %node.node_type(), "Adding node");
        let id = node.id.clone();
        let parent = node.parent_id.clone();
        self.state.insert_node(node);

        let mut targets = vec![id];
        targets.extend(parent);
        Ok(self.dispatch([GraphEvent::TopologyChanged { targets }]))
    }

    pub fn connect(&mut self, mut edge: Edge) -> Result<CommandReport, GraphError> {
        edge.ensure_id();
        if let Err(reason) = check_connection(&edge, &self.state, &self.tables) {
            debug!(edge_id = %edge.id, %reason, "Connection rejected");
            return Err(GraphError::ConnectionRejected {
                source_node_id: edge.source,
                source_handle: edge.source_handle,
                target_node_id: edge.target,
                target_handle: edge.target_handle,
                reason,
            });
        }

        debug!(edge_id = %edge.id, "Connecting");
        let edge_id = edge.id.clone();
        let target = edge.target.clone();
        self.state.push_edge(edge);

        let mut report = self.dispatch([GraphEvent::TopologyChanged {
            targets: vec![target],
        }]);
        report.edge_id = Some(edge_id);
        Ok(report)
    }

    pub fn disconnect(&mut self, edge_id: &str) -> Result<CommandReport, GraphError> {
        let edge = self
            .state
            .remove_edge(edge_id)
            .ok_or_else(|| GraphError::EdgeNotFound(edge_id.to_string()))?;
        debug!(edge_id, "Disconnected");
        Ok(self.dispatch([GraphEvent::TopologyChanged {
            targets: vec![edge.target],
        }]))
    }

    /// Deletes a node together with its edges and, for a group, everything inside it.
    pub fn delete_node(&mut self, node_id: &str) -> Result<CommandReport, GraphError> {
        let node = self
            .state
            .node(node_id)
            .ok_or_else(|| GraphError::NodeNotFound(node_id.to_string()))?;
        let parent = node.parent_id.clone();

        let doomed = self.subtree(node_id);
        let mut targets: Vec<NodeId> = Vec::new();
        for id in &doomed {
            for edge in self.state.remove_edges_of(id) {
                targets.push(edge.target);
            }
            self.state.remove_node(id);
        }
        targets.extend(parent);
        let targets: Vec<NodeId> = targets
            .into_iter()
            .filter(|id| !doomed.contains(id))
            .unique()
            .collect();

        debug!(node_id, removed = doomed.len(), "Deleted node");
        Ok(self.dispatch([GraphEvent::TopologyChanged { targets }]))
    }

    pub fn update_node_config(
        &mut self,
        node_id: &str,
        patch: NodePatch,
    ) -> Result<CommandReport, GraphError> {
        let node = self
            .state
            .node(node_id)
            .ok_or_else(|| GraphError::NodeNotFound(node_id.to_string()))?;
        let mut data = node.data.clone();
        let changed = patch.apply(node_id, &mut data, &self.operation_resolver())?;
        if !changed {
            return Ok(CommandReport::default());
        }

        self.state.modify_node(node_id, |current| {
            *current = data;
            true
        });
        debug!(node_id, "Node configuration updated");
        // The edited node's own references are re-checked too: a replaced payload may
        // point at producers it is not connected to.
        Ok(self.dispatch([
            GraphEvent::ProducerChanged {
                node_id: node_id.to_string(),
            },
            GraphEvent::TopologyChanged {
                targets: vec![node_id.to_string()],
            },
        ]))
    }

    /// Switches the trade mode and re-synchronizes every node against it.
    pub fn set_mode(&mut self, mode: TradeMode) -> CommandReport {
        if self.state.mode() == mode {
            return CommandReport::default();
        }
        self.state.set_mode(mode);
        debug!(?mode, "Trade mode changed");
        self.dispatch([GraphEvent::ModeChanged])
    }

    pub(crate) fn state_mut(&mut self) -> &mut GraphState {
        &mut self.state
    }

    pub(crate) fn set_load_report(&mut self, report: CommandReport) {
        self.load_report = report;
    }

    /// Runs every observer on each event in turn, then re-announces each node they
    /// modified until nothing changes.
    ///
    /// Before observers see a producer or mode change, edges whose handles the changed
    /// node no longer exposes or accepts are removed and their targets re-synchronized.
    pub(crate) fn dispatch(&mut self, events: impl IntoIterator<Item = GraphEvent>) -> CommandReport {
        let mut notices: Vec<SyncNotice> = Vec::new();
        let mut removed_edges: Vec<EdgeId> = Vec::new();
        let mut announced: AHashMap<NodeId, usize> = AHashMap::new();
        let mut queue: VecDeque<GraphEvent> = events.into_iter().collect();

        while let Some(event) = queue.pop_front() {
            let stale = match &event {
                GraphEvent::ProducerChanged { node_id } => {
                    self.state.prune_stale_edges(Some(node_id.as_str()))
                }
                GraphEvent::ModeChanged => self.state.prune_stale_edges(None),
                GraphEvent::TopologyChanged { .. } | GraphEvent::Loaded => Vec::new(),
            };
            if !stale.is_empty() {
                for edge in &stale {
                    warn!(edge_id = %edge.id, "Connection no longer matches its endpoints; removed");
                }
                let targets: Vec<NodeId> = stale.iter().map(|e| e.target.clone()).unique().collect();
                removed_edges.extend(stale.into_iter().map(|e| e.id));
                queue.push_back(GraphEvent::TopologyChanged { targets });
            }

            for observer in &self.observers {
                let outcome = observer.on_event(&event, &mut self.state);
                notices.extend(outcome.notices);
                for node_id in outcome.modified {
                    let count = announced.entry(node_id.clone()).or_insert(0);
                    *count += 1;
                    if *count > MAX_ANNOUNCEMENTS_PER_NODE {
                        warn!(
                            node_id = %node_id,
                            observer = observer.name(),
                            "Node keeps changing; propagation stopped"
                        );
                        continue;
                    }
                    queue.push_back(GraphEvent::ProducerChanged { node_id });
                }
            }
        }

        let notices: Vec<SyncNotice> = notices.into_iter().unique().collect();
        for notice in &notices {
            warn!(node_id = notice.node_id(), "{}", notice);
        }
        CommandReport {
            edge_id: None,
            notices,
            removed_edges,
        }
    }

    fn check_parent(&self, node: &Node, parent_id: &str) -> Result<(), GraphError> {
        let invalid = |message: &str| GraphError::InvalidParent {
            node_id: node.id.clone(),
            parent_id: parent_id.to_string(),
            message: message.to_string(),
        };
        match self.state.node(parent_id).map(Node::node_type) {
            None => Err(invalid("the parent does not exist")),
            Some(NodeType::OperationGroup) => match node.node_type() {
                NodeType::Operation
                | NodeType::OperationGroup
                | NodeType::OperationStart
                | NodeType::OperationEnd => Ok(()),
                _ => Err(invalid("only operation nodes can be placed inside a group")),
            },
            Some(_) => Err(invalid("only operation groups can hold other nodes")),
        }
    }

    /// `node_id` followed by every node nested inside it, depth first.
    fn subtree(&self, node_id: &str) -> Vec<NodeId> {
        let mut ids = vec![node_id.to_string()];
        let mut index = 0;
        while index < ids.len() {
            let children: Vec<NodeId> = self
                .state
                .children(&ids[index])
                .map(|child| child.id.clone())
                .collect();
            ids.extend(children);
            index += 1;
        }
        ids
    }
}
