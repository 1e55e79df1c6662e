use super::registry::OperationRegistry;
use crate::model::*;
use crate::variables::OPERATION_OUTPUT_CONFIG_ID;
use std::fmt;

/// Addresses one input slot of an operation node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSlot {
    /// The single input of a unary operation.
    Unary,
    First,
    Second,
}

impl InputSlot {
    pub fn slot_id(&self) -> ConfigId {
        match self {
            InputSlot::Unary | InputSlot::First => 1,
            InputSlot::Second => 2,
        }
    }

    /// The target handle an edge feeding this slot connects to.
    pub fn handle(&self, node_id: &str) -> HandleId {
        handle::input(node_id, self.slot_id())
    }
}

impl fmt::Display for InputSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputSlot::Unary => write!(f, "unary input"),
            InputSlot::First => write!(f, "first input"),
            InputSlot::Second => write!(f, "second input"),
        }
    }
}

/// A slot edit that does not fit the node's current arity.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotMismatch {
    pub arity: InputArity,
    pub message: String,
}

impl fmt::Display for SlotMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} operation: {}", self.arity, self.message)
    }
}

/// Derives an operation node's effective output kind and applies the side effects of
/// arity, operation and input edits.
#[derive(Debug, Clone, Copy)]
pub struct OperationTypeResolver<'a> {
    registry: &'a OperationRegistry,
}

impl<'a> OperationTypeResolver<'a> {
    pub fn new(registry: &'a OperationRegistry) -> Self {
        Self { registry }
    }

    /// The effective output kind of `operation` over `inputs`.
    ///
    /// Outside the binary case the declared kind wins. A binary operation that accepts
    /// scalar input yields a scalar only when both slots are bound and scalar-like, and a
    /// series otherwise.
    pub fn output_kind(&self, operation: &str, inputs: &OperationInputs) -> ValueKind {
        let (declared, supports_scalar) = self.registry.typing(operation, inputs.arity());
        match inputs {
            OperationInputs::Binary { input1, input2 } if supports_scalar => {
                let both_scalar = [input1, input2]
                    .iter()
                    .all(|slot| slot.as_ref().is_some_and(InputConfig::is_scalar_like));
                if both_scalar {
                    ValueKind::Scalar
                } else {
                    ValueKind::Series
                }
            }
            _ => declared,
        }
    }

    /// A fresh operation payload running the default operation for `arity`.
    pub fn new_node_data(&self, node_id: &str, arity: InputArity) -> OperationNodeData {
        let operation = self.default_operation(arity);
        let inputs = OperationInputs::empty(arity);
        let label = self.registry.default_label(&operation.name, arity);
        let kind = self.output_kind(&operation.name, &inputs);
        OperationNodeData {
            node_name: label.clone(),
            output: OutputConfig::new(
                kind,
                label,
                handle::output(node_id, OPERATION_OUTPUT_CONFIG_ID),
            ),
            operation,
            inputs,
        }
    }

    /// Switches arity: clears the inputs, resets the operation to the arity default and
    /// renames the output after it.
    pub fn change_arity(&self, data: &mut OperationNodeData, arity: InputArity) -> bool {
        if data.inputs.arity() == arity {
            return false;
        }
        data.inputs = OperationInputs::empty(arity);
        data.operation = self.default_operation(arity);
        let label = self.registry.default_label(&data.operation.name, arity);
        let kind = self.output_kind(&data.operation.name, &data.inputs);
        data.output = OutputConfig::new(kind, label, data.output.output_handle_id().to_string());
        true
    }

    /// Switches operation within the current arity. A user-entered output name is kept;
    /// a name still equal to the previous operation's default label follows the new one.
    pub fn change_operation(&self, data: &mut OperationNodeData, operation: Operation) -> bool {
        if data.operation == operation {
            return false;
        }
        let arity = data.inputs.arity();
        let previous_label = self.registry.default_label(&data.operation.name, arity);
        if data.output.output_name() == previous_label {
            data.output = data
                .output
                .with_name(self.registry.default_label(&operation.name, arity));
        }
        data.operation = operation;
        self.refresh_output(data);
        true
    }

    /// Binds or clears one slot. Unary slots only accept series inputs.
    pub fn set_input(
        &self,
        data: &mut OperationNodeData,
        slot: InputSlot,
        input: Option<InputConfig>,
    ) -> Result<bool, SlotMismatch> {
        let arity = data.inputs.arity();
        let changed = match (&mut data.inputs, slot) {
            (OperationInputs::Unary { input: current }, InputSlot::Unary) => {
                let next = match input {
                    None => None,
                    Some(InputConfig::Series(series)) => Some(series),
                    Some(other) => {
                        return Err(SlotMismatch {
                            arity,
                            message: format!("the {} only accepts a series, got {}", slot, other.kind()),
                        });
                    }
                };
                replace_if_changed(current, next)
            }
            (OperationInputs::Binary { input1, .. }, InputSlot::First) => {
                replace_if_changed(input1, input)
            }
            (OperationInputs::Binary { input2, .. }, InputSlot::Second) => {
                replace_if_changed(input2, input)
            }
            _ => {
                return Err(SlotMismatch {
                    arity,
                    message: format!("there is no {}", slot),
                });
            }
        };
        if changed {
            self.refresh_output(data);
        }
        Ok(changed)
    }

    /// Replaces the ordered input list of an n-ary operation.
    pub fn set_nary_inputs(
        &self,
        data: &mut OperationNodeData,
        next: Vec<SeriesInput>,
    ) -> Result<bool, SlotMismatch> {
        let OperationInputs::Nary { inputs } = &mut data.inputs else {
            return Err(SlotMismatch {
                arity: data.inputs.arity(),
                message: "only n-ary operations take an input list".to_string(),
            });
        };
        if *inputs == next {
            return Ok(false);
        }
        *inputs = next;
        self.refresh_output(data);
        Ok(true)
    }

    /// Recomputes the output kind from the current operation and inputs.
    pub fn refresh_output(&self, data: &mut OperationNodeData) -> bool {
        let kind = self.output_kind(&data.operation.name, &data.inputs);
        if data.output.kind() == kind {
            return false;
        }
        data.output = data.output.with_kind(kind);
        true
    }

    fn default_operation(&self, arity: InputArity) -> Operation {
        self.registry
            .default_for(arity)
            .map(|spec| spec.default_operation())
            .unwrap_or_else(|| Operation::named(""))
    }
}

fn replace_if_changed<T: PartialEq>(slot: &mut T, next: T) -> bool {
    if *slot == next {
        return false;
    }
    *slot = next;
    true
}
