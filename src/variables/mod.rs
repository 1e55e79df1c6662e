//! Variable propagation: lets a consumer discover the named values its upstream
//! producers expose.

use crate::graph::GraphState;
use crate::model::{ConfigId, Edge, TradeMode, Variable, VariableItem, handle};
use ahash::AHashMap;

pub mod exposure;

pub use exposure::{
    OPERATION_OUTPUT_CONFIG_ID, accepts_input_handle, exposed_handles, exposed_input_handles,
    exposed_variables,
};

/// Resolves the variables reachable through `inbound`, in the order the connections are
/// given.
///
/// A connection on the producer's default handle yields everything the producer exposes
/// under `mode`; a connection on a specific handle yields only the variable with that
/// output handle, or nothing when it no longer exists. Results are merged per producer in
/// first-seen order and deduplicated by output handle, so resolving the same graph twice
/// yields identical lists.
pub fn resolve_variables(state: &GraphState, inbound: &[&Edge], mode: TradeMode) -> Vec<VariableItem> {
    let mut items: Vec<VariableItem> = Vec::new();
    let mut index: AHashMap<&str, usize> = AHashMap::new();

    for edge in inbound {
        let Some(producer) = state.node(&edge.source) else {
            continue;
        };
        let exposed = exposed_variables(producer, state, mode);
        let selected: Vec<Variable> = if handle::is_default_output(&producer.id, &edge.source_handle) {
            exposed
        } else {
            exposed
                .into_iter()
                .filter(|v| v.output_handle_id() == edge.source_handle)
                .collect()
        };
        if selected.is_empty() {
            continue;
        }

        let slot = *index.entry(producer.id.as_str()).or_insert_with(|| {
            items.push(VariableItem::new(
                producer.id.clone(),
                producer.name().to_string(),
                producer.node_type(),
            ));
            items.len() - 1
        });
        for variable in selected {
            items[slot].push_unique(variable);
        }
    }

    items
}

/// Resolves every inbound connection of `node_id` under the graph's current mode.
pub fn resolve_for_node(state: &GraphState, node_id: &str) -> Vec<VariableItem> {
    let inbound = state.inbound_edges(node_id);
    resolve_variables(state, &inbound, state.mode())
}

/// Looks up the variable a reference points at, by producer and stable config id.
pub fn find_variable<'a>(
    items: &'a [VariableItem],
    node_id: &str,
    config_id: ConfigId,
) -> Option<&'a Variable> {
    items
        .iter()
        .find(|item| item.node_id == node_id)
        .and_then(|item| item.find(config_id))
}
