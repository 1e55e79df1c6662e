//! Naming conventions for node handles and edge ids.
//!
//! A node exposes one default (aggregate) output handle plus one indexed output handle
//! per exposed variable or control branch. Input handles follow the same pattern.

use super::{ConfigId, HandleId, NodeId};

const DEFAULT_OUTPUT_SUFFIX: &str = "_default_output";
const DEFAULT_INPUT_SUFFIX: &str = "_default_input";
const ELSE_OUTPUT_SUFFIX: &str = "_else_output";

pub fn default_output(node_id: &str) -> HandleId {
    format!("{}{}", node_id, DEFAULT_OUTPUT_SUFFIX)
}

pub fn default_input(node_id: &str) -> HandleId {
    format!("{}{}", node_id, DEFAULT_INPUT_SUFFIX)
}

/// The output handle tied to one exposed variable (or one IfElse case).
pub fn output(node_id: &str, config_id: ConfigId) -> HandleId {
    format!("{}_output_{}", node_id, config_id)
}

pub fn else_output(node_id: &str) -> HandleId {
    format!("{}{}", node_id, ELSE_OUTPUT_SUFFIX)
}

/// The input handle of an indexed slot (operation inputs, group inputs).
pub fn input(node_id: &str, slot_id: ConfigId) -> HandleId {
    format!("{}_input_{}", node_id, slot_id)
}

/// The slot id of an indexed input handle of `node_id`, if `handle` is one.
pub fn input_slot(node_id: &str, handle: &str) -> Option<ConfigId> {
    handle
        .strip_prefix(node_id)?
        .strip_prefix("_input_")?
        .parse()
        .ok()
}

/// Returns true when `handle` is the aggregate output handle of `node_id`.
pub fn is_default_output(node_id: &str, handle: &str) -> bool {
    handle
        .strip_prefix(node_id)
        .is_some_and(|rest| rest == DEFAULT_OUTPUT_SUFFIX)
}

pub fn edge_id(source: &NodeId, source_handle: &str, target: &NodeId, target_handle: &str) -> String {
    format!("{}:{}->{}:{}", source, source_handle, target, target_handle)
}
