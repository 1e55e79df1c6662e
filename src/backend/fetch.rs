use super::{CacheKey, HistoryRequest, SeriesBackend, SeriesRecord, SeriesStore, node_cache_keys};
use crate::error::BackendError;
use crate::graph::GraphState;
use crate::model::NodeId;
use ahash::AHashSet;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

type InFlightKey = (NodeId, String);

/// Permission to run one fetch, stamped with the node's revision when it was issued.
///
/// The ticket holds the `(node, series)` claim: dropping it, or the outcome carrying it,
/// lets the next fetch for the same pair begin.
#[derive(Debug)]
pub struct FetchTicket {
    pub node_id: NodeId,
    pub cache_key: CacheKey,
    pub revision: u64,
    _claim: InFlightGuard,
}

/// A settled fetch, not yet merged.
#[derive(Debug)]
pub struct FetchOutcome {
    pub ticket: FetchTicket,
    pub result: Result<Vec<SeriesRecord>, BackendError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    NodeRemoved,
    /// The node's configuration changed while the fetch was outstanding.
    Reconfigured,
    /// The node no longer asks for this series.
    KeyNotProduced,
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscardReason::NodeRemoved => write!(f, "node was removed"),
            DiscardReason::Reconfigured => write!(f, "node was reconfigured"),
            DiscardReason::KeyNotProduced => write!(f, "node no longer requests this series"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MergeStatus {
    Applied(usize),
    Discarded(DiscardReason),
    /// The backend call failed; treated as no data.
    Failed(BackendError),
}

/// Issues backend fetches without blocking graph edits, and guards against both
/// duplicate in-flight requests and late results for nodes that changed meanwhile.
#[derive(Debug, Clone, Default)]
pub struct FetchCoordinator {
    in_flight: Arc<Mutex<AHashSet<InFlightKey>>>,
}

/// Clears the in-flight entry when the ticket holding it is dropped.
#[derive(Debug)]
struct InFlightGuard {
    in_flight: Arc<Mutex<AHashSet<InFlightKey>>>,
    key: InFlightKey,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

impl FetchCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the `(node, series)` pair for a new fetch. Returns `None` when the node does
    /// not exist, does not request `cache_key`, or already has a fetch for it in flight.
    pub fn begin(&self, state: &GraphState, node_id: &str, cache_key: &CacheKey) -> Option<FetchTicket> {
        let node = state.node(node_id)?;
        let revision = state.revision(node_id)?;
        let produced = node_cache_keys(node, state.mode()).unwrap_or_default();
        if !produced.contains(cache_key) {
            debug!(node_id, %cache_key, "Node does not request this series");
            return None;
        }

        let claimed = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((node_id.to_string(), cache_key.to_string()));
        if !claimed {
            debug!(node_id, %cache_key, "Fetch already in flight");
            return None;
        }
        Some(FetchTicket {
            node_id: node_id.to_string(),
            cache_key: cache_key.clone(),
            revision,
            _claim: InFlightGuard {
                in_flight: Arc::clone(&self.in_flight),
                key: (node_id.to_string(), cache_key.to_string()),
            },
        })
    }

    pub fn is_in_flight(&self, node_id: &str, cache_key: &CacheKey) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(node_id.to_string(), cache_key.to_string()))
    }

    /// Runs the backend call for `ticket`. The claim travels with the outcome, so it is
    /// released once the outcome is merged, or as soon as this future is dropped.
    pub async fn fetch<B>(&self, backend: &B, ticket: FetchTicket, request: HistoryRequest) -> FetchOutcome
    where
        B: SeriesBackend + ?Sized,
    {
        debug!(
            backend = backend.name(),
            node_id = %ticket.node_id,
            cache_key = %ticket.cache_key,
            "Fetching history"
        );
        let result = backend.fetch_history(&request).await;
        FetchOutcome { ticket, result }
    }

    /// Applies a settled fetch to `store`, after re-checking that the node still exists,
    /// has the same revision, and still requests the series. Releases the claim.
    pub fn merge(&self, outcome: FetchOutcome, state: &GraphState, store: &mut SeriesStore) -> MergeStatus {
        let FetchOutcome { ticket, result } = outcome;
        let records = match result {
            Ok(records) => records,
            Err(error) => {
                warn!(node_id = %ticket.node_id, cache_key = %ticket.cache_key, %error, "History fetch failed");
                return MergeStatus::Failed(error);
            }
        };

        let discard = |reason: DiscardReason| {
            warn!(node_id = %ticket.node_id, cache_key = %ticket.cache_key, %reason, "Discarding fetched history");
            MergeStatus::Discarded(reason)
        };
        let Some(node) = state.node(&ticket.node_id) else {
            return discard(DiscardReason::NodeRemoved);
        };
        if state.revision(&ticket.node_id) != Some(ticket.revision) {
            return discard(DiscardReason::Reconfigured);
        }
        let produced = node_cache_keys(node, state.mode()).unwrap_or_default();
        if !produced.contains(&ticket.cache_key) {
            return discard(DiscardReason::KeyNotProduced);
        }

        let written = store.merge(&ticket.cache_key, records);
        debug!(node_id = %ticket.node_id, cache_key = %ticket.cache_key, written, "Merged history");
        MergeStatus::Applied(written)
    }
}
