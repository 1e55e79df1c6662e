use super::compatibility::{CompatibilityTables, LimitScope};
use crate::graph::GraphState;
use crate::model::Edge;
use crate::variables::{accepts_input_handle, exposed_handles};
use std::fmt;

/// Why a proposed connection was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingNode,
    SelfLoop,
    IncompatibleTypes,
    HandleNotExposed,
    HandleNotAccepted,
    Duplicate,
    NoLimitDefined,
    LimitReached,
    WouldCycle,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Rejection::MissingNode => "source or target node does not exist",
            Rejection::SelfLoop => "a node cannot feed itself",
            Rejection::IncompatibleTypes => "node types cannot be connected",
            Rejection::HandleNotExposed => "source handle is not exposed by the source node",
            Rejection::HandleNotAccepted => "target handle is not an input of the target node",
            Rejection::Duplicate => "an identical connection already exists",
            Rejection::NoLimitDefined => "target type has no connection limit defined",
            Rejection::LimitReached => "target accepts no further connections",
            Rejection::WouldCycle => "connection would create a cycle",
        };
        f.write_str(text)
    }
}

/// Checks a proposed edge against the graph and the compatibility tables.
///
/// Returns `Ok(())` when the edge may be added. Never mutates anything; unresolved
/// references are reported as a rejection rather than an error.
pub fn check_connection(
    proposal: &Edge,
    state: &GraphState,
    tables: &CompatibilityTables,
) -> Result<(), Rejection> {
    check_structure(proposal, state, tables)?;

    // Both nodes exist once the structural checks pass.
    let Some(target) = state.node(&proposal.target) else {
        return Err(Rejection::MissingNode);
    };
    let Some(rule) = tables.limit(target.node_type()) else {
        return Err(Rejection::NoLimitDefined);
    };
    let current_count = match rule.scope {
        LimitScope::Node => state.inbound_edges(&target.id).len(),
        LimitScope::Handle => state.inbound_on_handle(&target.id, &proposal.target_handle).len(),
    };
    if !rule.limit.allows(current_count) {
        return Err(Rejection::LimitReached);
    }

    check_acyclic(proposal, state)
}

/// Everything [`check_connection`] enforces except the cardinality limits: endpoints,
/// types, handles on both sides, duplicates and cycles. Used to vet saved edges, which
/// may legitimately exceed a limit.
pub fn check_saved_connection(
    proposal: &Edge,
    state: &GraphState,
    tables: &CompatibilityTables,
) -> Result<(), Rejection> {
    check_structure(proposal, state, tables)?;
    check_acyclic(proposal, state)
}

fn check_structure(
    proposal: &Edge,
    state: &GraphState,
    tables: &CompatibilityTables,
) -> Result<(), Rejection> {
    let (Some(source), Some(target)) = (state.node(&proposal.source), state.node(&proposal.target))
    else {
        return Err(Rejection::MissingNode);
    };

    if source.id == target.id {
        return Err(Rejection::SelfLoop);
    }

    if !tables.allows(source.node_type(), target.node_type()) {
        return Err(Rejection::IncompatibleTypes);
    }

    if !exposed_handles(source, state, state.mode()).contains(&proposal.source_handle) {
        return Err(Rejection::HandleNotExposed);
    }

    if !accepts_input_handle(target, &proposal.target_handle) {
        return Err(Rejection::HandleNotAccepted);
    }

    if state.edges().iter().any(|e| e.same_endpoints(proposal)) {
        return Err(Rejection::Duplicate);
    }

    Ok(())
}

fn check_acyclic(proposal: &Edge, state: &GraphState) -> Result<(), Rejection> {
    if state.reaches(&proposal.target, &proposal.source) {
        return Err(Rejection::WouldCycle);
    }
    Ok(())
}

/// Pure predicate form of [`check_connection`].
pub fn is_valid_connection(proposal: &Edge, state: &GraphState, tables: &CompatibilityTables) -> bool {
    check_connection(proposal, state, tables).is_ok()
}
