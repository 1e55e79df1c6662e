//! Typed inputs and outputs of computation nodes.

use super::{ConfigId, HandleId, NodeId, NodeType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a value flows as a time series or as a single number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Series,
    Scalar,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Series => write!(f, "Series"),
            ValueKind::Scalar => write!(f, "Scalar"),
        }
    }
}

/// The input cardinality shape of an operation node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputArity {
    Unary,
    Binary,
    Nary,
}

impl fmt::Display for InputArity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputArity::Unary => write!(f, "Unary"),
            InputArity::Binary => write!(f, "Binary"),
            InputArity::Nary => write!(f, "Nary"),
        }
    }
}

/// An input slot bound to a producer's series variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesInput {
    pub config_id: ConfigId,
    pub from_node_id: NodeId,
    pub from_node_type: NodeType,
    pub from_handle_id: HandleId,
    pub from_config_id: ConfigId,
    pub display_name: String,
}

/// An input slot bound to a producer's scalar variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalarInput {
    pub config_id: ConfigId,
    pub from_node_id: NodeId,
    pub from_node_type: NodeType,
    pub from_handle_id: HandleId,
    pub from_config_id: ConfigId,
    pub display_name: String,
}

/// A literal typed in by the user; it has no producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalarValueInput {
    pub config_id: ConfigId,
    pub value: f64,
}

/// A scalar forwarded from the enclosing group's own input through its start node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentGroupScalarValueInput {
    pub config_id: ConfigId,
    pub from_node_id: NodeId,
    pub from_handle_id: HandleId,
    pub from_config_id: ConfigId,
    pub display_name: String,
    #[serde(default)]
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InputConfig {
    Series(SeriesInput),
    Scalar(ScalarInput),
    ScalarValue(ScalarValueInput),
    ParentGroupScalarValue(ParentGroupScalarValueInput),
}

/// Where a bound input reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSource<'a> {
    pub node_id: &'a str,
    pub handle_id: &'a str,
    pub config_id: ConfigId,
}

impl InputConfig {
    pub fn slot_id(&self) -> ConfigId {
        match self {
            InputConfig::Series(i) => i.config_id,
            InputConfig::Scalar(i) => i.config_id,
            InputConfig::ScalarValue(i) => i.config_id,
            InputConfig::ParentGroupScalarValue(i) => i.config_id,
        }
    }

    /// Anything that is not a bound series counts as scalar-like.
    pub fn is_scalar_like(&self) -> bool {
        match self {
            InputConfig::Series(_) => false,
            InputConfig::Scalar(_)
            | InputConfig::ScalarValue(_)
            | InputConfig::ParentGroupScalarValue(_) => true,
        }
    }

    pub fn kind(&self) -> ValueKind {
        if self.is_scalar_like() {
            ValueKind::Scalar
        } else {
            ValueKind::Series
        }
    }

    /// The producer this input is bound to. Literals have none.
    pub fn source(&self) -> Option<InputSource<'_>> {
        match self {
            InputConfig::Series(i) => Some(InputSource {
                node_id: &i.from_node_id,
                handle_id: &i.from_handle_id,
                config_id: i.from_config_id,
            }),
            InputConfig::Scalar(i) => Some(InputSource {
                node_id: &i.from_node_id,
                handle_id: &i.from_handle_id,
                config_id: i.from_config_id,
            }),
            InputConfig::ParentGroupScalarValue(i) => Some(InputSource {
                node_id: &i.from_node_id,
                handle_id: &i.from_handle_id,
                config_id: i.from_config_id,
            }),
            InputConfig::ScalarValue(_) => None,
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            InputConfig::Series(i) => i.display_name.clone(),
            InputConfig::Scalar(i) => i.display_name.clone(),
            InputConfig::ParentGroupScalarValue(i) => i.display_name.clone(),
            InputConfig::ScalarValue(i) => format!("{}", i.value),
        }
    }
}

/// Inputs of an operation node. The variant is the node's arity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "arity")]
pub enum OperationInputs {
    Unary {
        #[serde(default)]
        input: Option<SeriesInput>,
    },
    Binary {
        #[serde(default)]
        input1: Option<InputConfig>,
        #[serde(default)]
        input2: Option<InputConfig>,
    },
    Nary {
        #[serde(default)]
        inputs: Vec<SeriesInput>,
    },
}

impl OperationInputs {
    pub fn empty(arity: InputArity) -> Self {
        match arity {
            InputArity::Unary => OperationInputs::Unary { input: None },
            InputArity::Binary => OperationInputs::Binary {
                input1: None,
                input2: None,
            },
            InputArity::Nary => OperationInputs::Nary { inputs: Vec::new() },
        }
    }

    pub fn arity(&self) -> InputArity {
        match self {
            OperationInputs::Unary { .. } => InputArity::Unary,
            OperationInputs::Binary { .. } => InputArity::Binary,
            OperationInputs::Nary { .. } => InputArity::Nary,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            OperationInputs::Unary { input } => input.is_none(),
            OperationInputs::Binary { input1, input2 } => input1.is_none() && input2.is_none(),
            OperationInputs::Nary { inputs } => inputs.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutputConfig {
    #[serde(rename_all = "camelCase")]
    Series {
        output_name: String,
        output_handle_id: HandleId,
    },
    #[serde(rename_all = "camelCase")]
    Scalar {
        output_name: String,
        output_handle_id: HandleId,
    },
}

impl OutputConfig {
    pub fn new(kind: ValueKind, output_name: impl Into<String>, output_handle_id: HandleId) -> Self {
        let output_name = output_name.into();
        match kind {
            ValueKind::Series => OutputConfig::Series {
                output_name,
                output_handle_id,
            },
            ValueKind::Scalar => OutputConfig::Scalar {
                output_name,
                output_handle_id,
            },
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            OutputConfig::Series { .. } => ValueKind::Series,
            OutputConfig::Scalar { .. } => ValueKind::Scalar,
        }
    }

    pub fn output_name(&self) -> &str {
        match self {
            OutputConfig::Series { output_name, .. } | OutputConfig::Scalar { output_name, .. } => {
                output_name
            }
        }
    }

    pub fn output_handle_id(&self) -> &str {
        match self {
            OutputConfig::Series {
                output_handle_id, ..
            }
            | OutputConfig::Scalar {
                output_handle_id, ..
            } => output_handle_id,
        }
    }

    /// Same name and handle, different kind.
    pub fn with_kind(&self, kind: ValueKind) -> Self {
        OutputConfig::new(kind, self.output_name(), self.output_handle_id().to_string())
    }

    pub fn with_name(&self, output_name: impl Into<String>) -> Self {
        OutputConfig::new(self.kind(), output_name, self.output_handle_id().to_string())
    }
}

/// A cached copy of an upstream operation output, held by a group's end node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputBinding {
    pub from_node_id: NodeId,
    pub from_handle_id: HandleId,
    pub from_config_id: ConfigId,
    pub output_name: String,
    pub kind: ValueKind,
}
