use super::GraphState;
use crate::model::{HandleId, NodeId};
use serde::Serialize;
use std::fmt;

/// A change announced to observers after a command has been fully applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphEvent {
    /// The inbound edge set of each target changed.
    TopologyChanged { targets: Vec<NodeId> },
    /// The node's own configuration changed; its dependents may hold stale copies.
    ProducerChanged { node_id: NodeId },
    /// The trade mode switched, so every mode-specific view changed at once.
    ModeChanged,
    /// A whole document was loaded; nothing has been reconciled yet.
    Loaded,
}

/// A user-facing warning produced while keeping references consistent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SyncNotice {
    /// More than one connection feeds a reference that takes a single producer. The
    /// reference is left untouched until the user resolves it.
    #[serde(rename_all = "camelCase")]
    AmbiguousConnections {
        node_id: NodeId,
        handle: Option<HandleId>,
        count: usize,
    },
    /// A reference lost its producer or the producer's variable and was cleared.
    #[serde(rename_all = "camelCase")]
    Unbound { node_id: NodeId, reference: String },
}

impl SyncNotice {
    pub fn node_id(&self) -> &str {
        match self {
            SyncNotice::AmbiguousConnections { node_id, .. } | SyncNotice::Unbound { node_id, .. } => {
                node_id
            }
        }
    }
}

impl fmt::Display for SyncNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncNotice::AmbiguousConnections {
                node_id,
                handle: Some(handle),
                count,
            } => write!(
                f,
                "node '{}' has {} connections on '{}' but takes only one",
                node_id, count, handle
            ),
            SyncNotice::AmbiguousConnections {
                node_id,
                handle: None,
                count,
            } => write!(
                f,
                "node '{}' has {} upstream connections but takes only one",
                node_id, count
            ),
            SyncNotice::Unbound { node_id, reference } => {
                write!(f, "node '{}' is not configured: {} was cleared", node_id, reference)
            }
        }
    }
}

/// What an observer did in response to one event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObserverOutcome {
    /// Nodes whose configuration the observer changed. Each is re-announced as a
    /// [`GraphEvent::ProducerChanged`].
    pub modified: Vec<NodeId>,
    pub notices: Vec<SyncNotice>,
}

impl ObserverOutcome {
    pub fn merge(&mut self, other: ObserverOutcome) {
        for id in other.modified {
            if !self.modified.contains(&id) {
                self.modified.push(id);
            }
        }
        self.notices.extend(other.notices);
    }
}

/// A named subscriber to graph events. Observers run synchronously, after the command
/// that raised the event has been applied, with scoped write access to the state.
pub trait GraphObserver: Send + Sync {
    fn name(&self) -> &str;

    fn on_event(&self, event: &GraphEvent, state: &mut GraphState) -> ObserverOutcome;
}
