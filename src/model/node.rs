use super::NodeId;
use super::payload::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The type tag of a node, using the editor's wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeType {
    #[serde(rename = "startNode")]
    Start,
    #[serde(rename = "klineNode")]
    Kline,
    #[serde(rename = "indicatorNode")]
    Indicator,
    #[serde(rename = "variableNode")]
    Variable,
    #[serde(rename = "ifElseNode")]
    IfElse,
    #[serde(rename = "futuresOrderNode")]
    FuturesOrder,
    #[serde(rename = "positionManagementNode")]
    PositionManagement,
    #[serde(rename = "operationGroup")]
    OperationGroup,
    #[serde(rename = "operationStartNode")]
    OperationStart,
    #[serde(rename = "operationNode")]
    Operation,
    #[serde(rename = "operationEndNode")]
    OperationEnd,
}

impl NodeType {
    pub const ALL: [NodeType; 11] = [
        NodeType::Start,
        NodeType::Kline,
        NodeType::Indicator,
        NodeType::Variable,
        NodeType::IfElse,
        NodeType::FuturesOrder,
        NodeType::PositionManagement,
        NodeType::OperationGroup,
        NodeType::OperationStart,
        NodeType::Operation,
        NodeType::OperationEnd,
    ];

    pub fn wire_name(&self) -> &'static str {
        match self {
            NodeType::Start => "startNode",
            NodeType::Kline => "klineNode",
            NodeType::Indicator => "indicatorNode",
            NodeType::Variable => "variableNode",
            NodeType::IfElse => "ifElseNode",
            NodeType::FuturesOrder => "futuresOrderNode",
            NodeType::PositionManagement => "positionManagementNode",
            NodeType::OperationGroup => "operationGroup",
            NodeType::OperationStart => "operationStartNode",
            NodeType::Operation => "operationNode",
            NodeType::OperationEnd => "operationEndNode",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// The global evaluation context selecting which mode-specific config a node exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TradeMode {
    Live,
    #[default]
    Backtest,
}

/// A node's type-specific payload. The variant determines the node's type.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Start(StartNodeData),
    Kline(KlineNodeData),
    Indicator(IndicatorNodeData),
    Variable(VariableNodeData),
    IfElse(IfElseNodeData),
    FuturesOrder(FuturesOrderNodeData),
    PositionManagement(PositionManagementNodeData),
    OperationGroup(OperationGroupData),
    OperationStart(OperationStartData),
    Operation(OperationNodeData),
    OperationEnd(OperationEndData),
}

impl NodeData {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeData::Start(_) => NodeType::Start,
            NodeData::Kline(_) => NodeType::Kline,
            NodeData::Indicator(_) => NodeType::Indicator,
            NodeData::Variable(_) => NodeType::Variable,
            NodeData::IfElse(_) => NodeType::IfElse,
            NodeData::FuturesOrder(_) => NodeType::FuturesOrder,
            NodeData::PositionManagement(_) => NodeType::PositionManagement,
            NodeData::OperationGroup(_) => NodeType::OperationGroup,
            NodeData::OperationStart(_) => NodeType::OperationStart,
            NodeData::Operation(_) => NodeType::Operation,
            NodeData::OperationEnd(_) => NodeType::OperationEnd,
        }
    }

    pub fn node_name(&self) -> &str {
        match self {
            NodeData::Start(d) => &d.node_name,
            NodeData::Kline(d) => &d.node_name,
            NodeData::Indicator(d) => &d.node_name,
            NodeData::Variable(d) => &d.node_name,
            NodeData::IfElse(d) => &d.node_name,
            NodeData::FuturesOrder(d) => &d.node_name,
            NodeData::PositionManagement(d) => &d.node_name,
            NodeData::OperationGroup(d) => &d.node_name,
            NodeData::OperationStart(d) => &d.node_name,
            NodeData::Operation(d) => &d.node_name,
            NodeData::OperationEnd(d) => &d.node_name,
        }
    }

    pub fn set_node_name(&mut self, name: String) {
        let slot = match self {
            NodeData::Start(d) => &mut d.node_name,
            NodeData::Kline(d) => &mut d.node_name,
            NodeData::Indicator(d) => &mut d.node_name,
            NodeData::Variable(d) => &mut d.node_name,
            NodeData::IfElse(d) => &mut d.node_name,
            NodeData::FuturesOrder(d) => &mut d.node_name,
            NodeData::PositionManagement(d) => &mut d.node_name,
            NodeData::OperationGroup(d) => &mut d.node_name,
            NodeData::OperationStart(d) => &mut d.node_name,
            NodeData::Operation(d) => &mut d.node_name,
            NodeData::OperationEnd(d) => &mut d.node_name,
        };
        *slot = name;
    }

    /// Serializes the payload alone, without the type tag.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            NodeData::Start(d) => serde_json::to_value(d),
            NodeData::Kline(d) => serde_json::to_value(d),
            NodeData::Indicator(d) => serde_json::to_value(d),
            NodeData::Variable(d) => serde_json::to_value(d),
            NodeData::IfElse(d) => serde_json::to_value(d),
            NodeData::FuturesOrder(d) => serde_json::to_value(d),
            NodeData::PositionManagement(d) => serde_json::to_value(d),
            NodeData::OperationGroup(d) => serde_json::to_value(d),
            NodeData::OperationStart(d) => serde_json::to_value(d),
            NodeData::Operation(d) => serde_json::to_value(d),
            NodeData::OperationEnd(d) => serde_json::to_value(d),
        }
    }

    /// Parses a payload whose type is carried separately, as in the saved document.
    pub fn from_json(
        node_type: NodeType,
        value: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        Ok(match node_type {
            NodeType::Start => NodeData::Start(serde_json::from_value(value)?),
            NodeType::Kline => NodeData::Kline(serde_json::from_value(value)?),
            NodeType::Indicator => NodeData::Indicator(serde_json::from_value(value)?),
            NodeType::Variable => NodeData::Variable(serde_json::from_value(value)?),
            NodeType::IfElse => NodeData::IfElse(serde_json::from_value(value)?),
            NodeType::FuturesOrder => NodeData::FuturesOrder(serde_json::from_value(value)?),
            NodeType::PositionManagement => {
                NodeData::PositionManagement(serde_json::from_value(value)?)
            }
            NodeType::OperationGroup => NodeData::OperationGroup(serde_json::from_value(value)?),
            NodeType::OperationStart => NodeData::OperationStart(serde_json::from_value(value)?),
            NodeType::Operation => NodeData::Operation(serde_json::from_value(value)?),
            NodeType::OperationEnd => NodeData::OperationEnd(serde_json::from_value(value)?),
        })
    }
}

/// A typed unit of the strategy graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    /// The enclosing operation group, for nodes placed inside one.
    pub parent_id: Option<NodeId>,
    /// Editor-only layout state, carried through untouched.
    pub position: serde_json::Value,
    pub data: NodeData,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, data: NodeData) -> Self {
        Self {
            id: id.into(),
            parent_id: None,
            position: serde_json::Value::Null,
            data,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<NodeId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn node_type(&self) -> NodeType {
        self.data.node_type()
    }

    pub fn name(&self) -> &str {
        self.data.node_name()
    }
}
