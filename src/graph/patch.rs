use crate::error::GraphError;
use crate::model::*;
use crate::operation::{InputSlot, OperationTypeResolver};
use serde_json::Value;

/// An edit to one node's configuration, as issued by `update_node_config`.
#[derive(Debug, Clone, PartialEq)]
pub enum NodePatch {
    Rename(String),
    /// Swaps the whole payload. The node type cannot change.
    Replace(NodeData),
    /// An RFC 7386 JSON merge patch applied to the payload's wire form.
    Merge(Value),
    SetOperationArity(InputArity),
    SetOperation(Operation),
    SetOperationInput {
        slot: InputSlot,
        input: Option<InputConfig>,
    },
    SetNaryInputs(Vec<SeriesInput>),
    /// Renames the output of an operation node or an operation group.
    SetOutputName(String),
}

impl NodePatch {
    /// Applies the patch to `data`. Operation payloads are re-typed afterwards, so the
    /// output kind never disagrees with the inputs. Returns whether anything changed.
    pub(crate) fn apply(
        self,
        node_id: &str,
        data: &mut NodeData,
        resolver: &OperationTypeResolver<'_>,
    ) -> Result<bool, GraphError> {
        let before = data.clone();
        match self {
            NodePatch::Rename(name) => data.set_node_name(name),
            NodePatch::Replace(next) => {
                if next.node_type() != data.node_type() {
                    return Err(GraphError::PatchMismatch {
                        node_id: node_id.to_string(),
                        expected: next.node_type().to_string(),
                        found: data.node_type(),
                    });
                }
                *data = next;
            }
            NodePatch::Merge(patch) => {
                let mut wire = data.to_json().map_err(|e| invalid(node_id, e))?;
                merge_patch(&mut wire, &patch);
                *data = NodeData::from_json(data.node_type(), wire).map_err(|e| invalid(node_id, e))?;
            }
            NodePatch::SetOperationArity(arity) => {
                resolver.change_arity(operation_mut(node_id, data)?, arity);
            }
            NodePatch::SetOperation(operation) => {
                resolver.change_operation(operation_mut(node_id, data)?, operation);
            }
            NodePatch::SetOperationInput { slot, input } => {
                resolver
                    .set_input(operation_mut(node_id, data)?, slot, input)
                    .map_err(|e| invalid(node_id, e))?;
            }
            NodePatch::SetNaryInputs(inputs) => {
                resolver
                    .set_nary_inputs(operation_mut(node_id, data)?, inputs)
                    .map_err(|e| invalid(node_id, e))?;
            }
            NodePatch::SetOutputName(name) => match data {
                NodeData::Operation(op) => op.output = op.output.with_name(name),
                NodeData::OperationGroup(group) => {
                    let Some(output) = group.output.as_mut() else {
                        return Err(GraphError::InvalidPatch {
                            node_id: node_id.to_string(),
                            message: "the group has no output yet".to_string(),
                        });
                    };
                    *output = output.with_name(name);
                }
                other => {
                    return Err(GraphError::PatchMismatch {
                        node_id: node_id.to_string(),
                        expected: NodeType::Operation.to_string(),
                        found: other.node_type(),
                    });
                }
            },
        }

        if let NodeData::Operation(op) = data {
            resolver.refresh_output(op);
        }
        Ok(*data != before)
    }
}

fn operation_mut<'a>(
    node_id: &str,
    data: &'a mut NodeData,
) -> Result<&'a mut OperationNodeData, GraphError> {
    match data {
        NodeData::Operation(op) => Ok(op),
        other => Err(GraphError::PatchMismatch {
            node_id: node_id.to_string(),
            expected: NodeType::Operation.to_string(),
            found: other.node_type(),
        }),
    }
}

fn invalid(node_id: &str, error: impl std::fmt::Display) -> GraphError {
    GraphError::InvalidPatch {
        node_id: node_id.to_string(),
        message: error.to_string(),
    }
}

/// RFC 7386: objects merge recursively, `null` removes a member, anything else replaces.
pub fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(members) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(serde_json::Map::new());
    }
    if let Value::Object(existing) = target {
        for (key, value) in members {
            if value.is_null() {
                existing.remove(key);
            } else {
                merge_patch(
                    existing.entry(key.clone()).or_insert(Value::Null),
                    value,
                );
            }
        }
    }
}
