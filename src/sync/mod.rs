//! Reference integrity: keeps every consumer's cached copy of an upstream reference
//! consistent with what its producer exposes now.
//!
//! Each reference is either bound to a `(producer, config id)` pair or unbound. A bound
//! reference is refreshed in place when the producer's attributes change, and cleared
//! when the producer, its variable or the connection disappears. References that take a
//! single producer are never rewritten while several connections compete for them; a
//! [`SyncNotice`] is raised instead.

use crate::graph::{GraphEvent, GraphObserver, GraphState, ObserverOutcome};
use crate::model::NodeData;
use crate::operation::{OperationRegistry, OperationTypeResolver};
use std::sync::Arc;
use tracing::debug;

pub mod reconcile;

mod operation;
mod sources;

pub use crate::graph::SyncNotice;
pub use reconcile::{Reconcile, SingleSource};

/// The observer that re-synchronizes references after topology and producer changes.
#[derive(Debug, Clone)]
pub struct ReferenceSynchronizer {
    registry: Arc<OperationRegistry>,
}

impl Default for ReferenceSynchronizer {
    fn default() -> Self {
        Self::new(OperationRegistry::standard())
    }
}

impl ReferenceSynchronizer {
    pub const NAME: &'static str = "reference-synchronizer";

    /// The registry is needed to recompute operation output kinds after an input moves.
    pub fn new(registry: Arc<OperationRegistry>) -> Self {
        Self { registry }
    }

    /// Re-validates every reference held by one node.
    pub fn sync_node(&self, state: &mut GraphState, node_id: &str) -> ObserverOutcome {
        let Some(node) = state.node(node_id) else {
            return ObserverOutcome::default();
        };
        let resolver = OperationTypeResolver::new(&self.registry);
        let mut data = node.data.clone();
        let mut notices = Vec::new();

        match &mut data {
            NodeData::Kline(d) => sources::sync_kline(state, node_id, d, &mut notices),
            NodeData::Indicator(d) => sources::sync_indicator(state, node_id, d, &mut notices),
            NodeData::IfElse(d) => sources::sync_if_else(state, node_id, d, &mut notices),
            NodeData::Operation(d) => {
                operation::sync_operation(state, node_id, d, &resolver, &mut notices)
            }
            NodeData::OperationGroup(d) => operation::sync_group(state, node_id, d, &mut notices),
            NodeData::OperationEnd(d) => operation::sync_end(state, node_id, d, &mut notices),
            NodeData::Start(_)
            | NodeData::Variable(_)
            | NodeData::FuturesOrder(_)
            | NodeData::PositionManagement(_)
            | NodeData::OperationStart(_) => {}
        }

        let changed = data != node.data;
        let mut outcome = ObserverOutcome {
            modified: Vec::new(),
            notices,
        };
        if changed {
            state.modify_node(node_id, |current| {
                *current = data;
                true
            });
            debug!(node_id, "References refreshed");
            outcome.modified.push(node_id.to_string());
        }
        outcome
    }

    /// Re-validates every node, in insertion order.
    pub fn sync_all(&self, state: &mut GraphState) -> ObserverOutcome {
        let ids: Vec<String> = state.nodes().iter().map(|n| n.id.clone()).collect();
        let mut outcome = ObserverOutcome::default();
        for id in ids {
            outcome.merge(self.sync_node(state, &id));
        }
        outcome
    }
}

impl GraphObserver for ReferenceSynchronizer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn on_event(&self, event: &GraphEvent, state: &mut GraphState) -> ObserverOutcome {
        let mut outcome = ObserverOutcome::default();
        match event {
            GraphEvent::TopologyChanged { targets } => {
                for target in targets {
                    outcome.merge(self.sync_node(state, target));
                }
            }
            GraphEvent::ProducerChanged { node_id } => {
                for dependent in state.dependents(node_id) {
                    outcome.merge(self.sync_node(state, &dependent));
                }
            }
            GraphEvent::ModeChanged | GraphEvent::Loaded => outcome = self.sync_all(state),
        }
        outcome
    }
}
