use super::{EdgeId, HandleId, NodeId, handle};
use serde::{Deserialize, Serialize};

/// A directed connection from one node's output handle to another node's input handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    #[serde(default)]
    pub id: EdgeId,
    pub source: NodeId,
    pub source_handle: HandleId,
    pub target: NodeId,
    pub target_handle: HandleId,
}

impl Edge {
    pub fn new(
        source: impl Into<NodeId>,
        source_handle: impl Into<HandleId>,
        target: impl Into<NodeId>,
        target_handle: impl Into<HandleId>,
    ) -> Self {
        let source = source.into();
        let source_handle = source_handle.into();
        let target = target.into();
        let target_handle = target_handle.into();
        Self {
            id: handle::edge_id(&source, &source_handle, &target, &target_handle),
            source,
            source_handle,
            target,
            target_handle,
        }
    }

    /// Fills in the conventional id when the edge was loaded without one.
    pub(crate) fn ensure_id(&mut self) {
        if self.id.is_empty() {
            self.id = handle::edge_id(
                &self.source,
                &self.source_handle,
                &self.target,
                &self.target_handle,
            );
        }
    }

    /// True when both edges connect the same pair of handles, regardless of id.
    pub fn same_endpoints(&self, other: &Edge) -> bool {
        self.source == other.source
            && self.source_handle == other.source_handle
            && self.target == other.target
            && self.target_handle == other.target_handle
    }

    pub fn involves(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}
