use crate::model::{Edge, NodeId, NodeType};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The saved form of a strategy: `{ nodes, edges, chartConfig }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyDocument {
    #[serde(default)]
    pub nodes: Vec<RawNode>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    /// Opaque to the core; carried through load and save untouched.
    #[serde(default)]
    pub chart_config: Value,
}

/// A node as saved by the editor. The payload is parsed according to `node_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNode {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub position: Value,
    pub data: Value,
}
