use super::io::ValueKind;
use super::payload::VariableValueType;
use super::{ConfigId, HandleId, NodeId, NodeType};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolVariable {
    pub config_id: ConfigId,
    pub symbol: String,
    pub interval: String,
    pub output_handle_id: HandleId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorVariable {
    pub config_id: ConfigId,
    pub indicator_type: String,
    pub fields: Vec<String>,
    pub symbol: Option<String>,
    pub interval: Option<String>,
    pub output_handle_id: HandleId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomVariable {
    pub config_id: ConfigId,
    pub name: String,
    pub display_name: String,
    pub value_type: VariableValueType,
    pub output_handle_id: HandleId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationVariable {
    pub config_id: ConfigId,
    pub output_name: String,
    pub kind: ValueKind,
    pub output_handle_id: HandleId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupInputVariable {
    pub config_id: ConfigId,
    pub name: String,
    pub kind: ValueKind,
    pub value: Option<f64>,
    pub output_handle_id: HandleId,
}

/// A named value a node exposes to downstream consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "variableType", rename_all = "camelCase")]
pub enum Variable {
    Symbol(SymbolVariable),
    Indicator(IndicatorVariable),
    Custom(CustomVariable),
    Operation(OperationVariable),
    GroupInput(GroupInputVariable),
}

impl Variable {
    pub fn config_id(&self) -> ConfigId {
        match self {
            Variable::Symbol(v) => v.config_id,
            Variable::Indicator(v) => v.config_id,
            Variable::Custom(v) => v.config_id,
            Variable::Operation(v) => v.config_id,
            Variable::GroupInput(v) => v.config_id,
        }
    }

    pub fn output_handle_id(&self) -> &str {
        match self {
            Variable::Symbol(v) => &v.output_handle_id,
            Variable::Indicator(v) => &v.output_handle_id,
            Variable::Custom(v) => &v.output_handle_id,
            Variable::Operation(v) => &v.output_handle_id,
            Variable::GroupInput(v) => &v.output_handle_id,
        }
    }

    pub fn value_kind(&self) -> ValueKind {
        match self {
            Variable::Symbol(_) | Variable::Indicator(_) => ValueKind::Series,
            Variable::Custom(_) => ValueKind::Scalar,
            Variable::Operation(v) => v.kind,
            Variable::GroupInput(v) => v.kind,
        }
    }

    /// The label a consumer caches for this variable.
    pub fn display_name(&self) -> String {
        match self {
            Variable::Symbol(v) => format!("{} {}", v.symbol, v.interval),
            Variable::Indicator(v) => match (&v.symbol, &v.interval) {
                (Some(symbol), Some(interval)) => {
                    format!("{} ({} {})", v.indicator_type, symbol, interval)
                }
                _ => v.indicator_type.clone(),
            },
            Variable::Custom(v) => v.display_name.clone(),
            Variable::Operation(v) => v.output_name.clone(),
            Variable::GroupInput(v) => v.name.clone(),
        }
    }
}

/// Everything one upstream node currently exposes, built on demand.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableItem {
    pub node_id: NodeId,
    pub node_name: String,
    pub node_type: NodeType,
    pub variables: Vec<Variable>,
}

impl VariableItem {
    pub fn new(node_id: NodeId, node_name: String, node_type: NodeType) -> Self {
        Self {
            node_id,
            node_name,
            node_type,
            variables: Vec::new(),
        }
    }

    /// Adds the variable unless one with the same output handle is already present.
    pub fn push_unique(&mut self, variable: Variable) -> bool {
        if self
            .variables
            .iter()
            .any(|v| v.output_handle_id() == variable.output_handle_id())
        {
            return false;
        }
        self.variables.push(variable);
        true
    }

    pub fn find(&self, config_id: ConfigId) -> Option<&Variable> {
        self.variables.iter().find(|v| v.config_id() == config_id)
    }
}
