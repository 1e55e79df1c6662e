//! The building blocks shared by every reference rule: how many producers feed a
//! reference, and what to do with the cached copy once the producer has been looked up.

use crate::graph::GraphState;
use crate::model::{ConfigId, Edge, NodeType, Variable};
use crate::variables::resolve_variables;

/// The connections feeding a reference that takes exactly one producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingleSource<'a> {
    None,
    Ambiguous(usize),
    One(&'a Edge),
}

impl<'a> SingleSource<'a> {
    pub fn of(edges: &[&'a Edge]) -> Self {
        match edges {
            [] => SingleSource::None,
            [edge] => SingleSource::One(edge),
            many => SingleSource::Ambiguous(many.len()),
        }
    }
}

/// The transition a bound reference takes after its producer was re-read.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconcile<T> {
    Keep,
    Refresh(T),
    Unbind,
}

impl<T: PartialEq> Reconcile<T> {
    /// Compares the cached copy with what the producer exposes now. `desired` is `None`
    /// when the bound identity no longer exists. Unbound references stay unbound.
    pub fn between(current: &Option<T>, desired: Option<T>) -> Self {
        match (current, desired) {
            (None, _) => Reconcile::Keep,
            (Some(_), None) => Reconcile::Unbind,
            (Some(cached), Some(fresh)) if *cached == fresh => Reconcile::Keep,
            (Some(_), Some(fresh)) => Reconcile::Refresh(fresh),
        }
    }

    /// Writes the transition into `slot`. Returns whether the slot changed.
    pub fn apply(self, slot: &mut Option<T>) -> bool {
        match self {
            Reconcile::Keep => false,
            Reconcile::Refresh(fresh) => {
                *slot = Some(fresh);
                true
            }
            Reconcile::Unbind => {
                *slot = None;
                true
            }
        }
    }
}

/// The variable with `config_id` that flows through `edge`, with its producer's type.
pub fn variable_through(
    state: &GraphState,
    edge: &Edge,
    config_id: ConfigId,
) -> Option<(NodeType, Variable)> {
    let item = resolve_variables(state, &[edge], state.mode())
        .into_iter()
        .find(|item| item.node_id == edge.source)?;
    let node_type = item.node_type;
    item.variables
        .into_iter()
        .find(|v| v.config_id() == config_id)
        .map(|v| (node_type, v))
}
