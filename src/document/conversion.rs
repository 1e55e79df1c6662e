use super::definition::{RawNode, StrategyDocument};
use crate::error::DocumentError;
use crate::model::{Node, NodeData};

/// A saved strategy format that can be turned into a [`StrategyDocument`].
///
/// This is the extension point for loading strategies saved by other tools: implement it
/// on your own top-level struct and pass it to
/// [`StrategyGraphBuilder::load`](crate::graph::StrategyGraphBuilder::load).
///
/// ```rust
/// use stratflow::document::{IntoDocument, StrategyDocument};
/// use stratflow::error::DocumentError;
///
/// struct Legacy {
///     json: String,
/// }
///
/// impl IntoDocument for Legacy {
///     fn into_document(self) -> Result<StrategyDocument, DocumentError> {
///         StrategyDocument::from_json(&self.json)
///     }
/// }
///
/// let document = Legacy { json: r#"{ "nodes": [], "edges": [] }"#.to_string() }
///     .into_document()
///     .unwrap();
/// assert!(document.nodes.is_empty());
/// ```
pub trait IntoDocument {
    fn into_document(self) -> Result<StrategyDocument, DocumentError>;
}

impl IntoDocument for StrategyDocument {
    fn into_document(self) -> Result<StrategyDocument, DocumentError> {
        Ok(self)
    }
}

impl TryFrom<RawNode> for Node {
    type Error = DocumentError;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        let data = NodeData::from_json(raw.node_type, raw.data).map_err(|e| {
            DocumentError::InvalidNodeData {
                node_id: raw.id.clone(),
                node_type: raw.node_type,
                message: e.to_string(),
            }
        })?;
        Ok(Node {
            id: raw.id,
            parent_id: raw.parent_id,
            position: raw.position,
            data,
        })
    }
}

impl TryFrom<&Node> for RawNode {
    type Error = DocumentError;

    fn try_from(node: &Node) -> Result<Self, Self::Error> {
        let data = node
            .data
            .to_json()
            .map_err(|e| DocumentError::SerializeError(e.to_string()))?;
        Ok(RawNode {
            id: node.id.clone(),
            node_type: node.node_type(),
            parent_id: node.parent_id.clone(),
            position: node.position.clone(),
            data,
        })
    }
}
