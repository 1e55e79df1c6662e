//! What each producer node type exposes to its consumers.

use crate::graph::GraphState;
use crate::model::*;

/// Config id under which operation nodes and groups expose their single output.
pub const OPERATION_OUTPUT_CONFIG_ID: ConfigId = 1;

/// Every variable `node` currently exposes under `mode`. Node types without
/// variable-exposing capability return an empty list.
pub fn exposed_variables(node: &Node, state: &GraphState, mode: TradeMode) -> Vec<Variable> {
    match &node.data {
        NodeData::Start(data) => data
            .configs
            .get(mode)
            .map(|config| {
                config
                    .custom_variables
                    .iter()
                    .map(|v| {
                        Variable::Custom(CustomVariable {
                            config_id: v.config_id,
                            name: v.var_name.clone(),
                            display_name: v.var_display_name.clone(),
                            value_type: v.var_value_type,
                            output_handle_id: handle::output(&node.id, v.config_id),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default(),
        NodeData::Kline(data) => data
            .configs
            .get(mode)
            .map(|config| {
                config
                    .selected_symbols
                    .iter()
                    .map(|s| {
                        Variable::Symbol(SymbolVariable {
                            config_id: s.config_id,
                            symbol: s.symbol.clone(),
                            interval: s.interval.clone(),
                            output_handle_id: handle::output(&node.id, s.config_id),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default(),
        NodeData::Indicator(data) => data
            .configs
            .get(mode)
            .map(|config| {
                config
                    .selected_indicators
                    .iter()
                    .map(|i| {
                        Variable::Indicator(IndicatorVariable {
                            config_id: i.config_id,
                            indicator_type: i.indicator_type.clone(),
                            fields: i.output_fields.clone(),
                            symbol: config.source.as_ref().map(|s| s.symbol.clone()),
                            interval: config.source.as_ref().map(|s| s.interval.clone()),
                            output_handle_id: handle::output(&node.id, i.config_id),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default(),
        NodeData::Variable(data) => data
            .configs
            .get(mode)
            .map(|config| {
                config
                    .variables
                    .iter()
                    .map(|v| {
                        Variable::Custom(CustomVariable {
                            config_id: v.config_id,
                            name: v.var_name.clone(),
                            display_name: v.var_display_name.clone(),
                            value_type: v.var_value_type,
                            output_handle_id: handle::output(&node.id, v.config_id),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default(),
        NodeData::Operation(data) => vec![operation_output(&data.output)],
        NodeData::OperationGroup(data) => data.output.iter().map(operation_output).collect(),
        NodeData::OperationStart(_) => group_inputs(node, state),
        NodeData::IfElse(_)
        | NodeData::FuturesOrder(_)
        | NodeData::PositionManagement(_)
        | NodeData::OperationEnd(_) => Vec::new(),
    }
}

/// Every output handle of `node`: the default handle, one per exposed variable, and the
/// branch handles of an IfElse node.
pub fn exposed_handles(node: &Node, state: &GraphState, mode: TradeMode) -> Vec<HandleId> {
    let mut handles = vec![handle::default_output(&node.id)];
    handles.extend(
        exposed_variables(node, state, mode)
            .iter()
            .map(|v| v.output_handle_id().to_string()),
    );
    if let NodeData::IfElse(data) = &node.data {
        if let Some(config) = data.configs.get(mode) {
            handles.extend(
                config
                    .cases
                    .iter()
                    .map(|case| handle::output(&node.id, case.case_id)),
            );
        }
        handles.push(handle::else_output(&node.id));
    }
    handles
}

/// The input handles `node` accepts connections on, or `None` for an n-ary operation,
/// which takes any indexed slot.
pub fn exposed_input_handles(node: &Node) -> Option<Vec<HandleId>> {
    let handles = match &node.data {
        NodeData::Operation(data) => match data.inputs.arity() {
            InputArity::Unary => vec![handle::input(&node.id, 1)],
            InputArity::Binary => vec![handle::input(&node.id, 1), handle::input(&node.id, 2)],
            InputArity::Nary => return None,
        },
        NodeData::OperationGroup(data) => data
            .inputs
            .iter()
            .map(|input| handle::input(&node.id, input.config_id))
            .collect(),
        _ => vec![handle::default_input(&node.id)],
    };
    Some(handles)
}

/// Whether `node` accepts a connection on `target_handle`.
pub fn accepts_input_handle(node: &Node, target_handle: &str) -> bool {
    match exposed_input_handles(node) {
        Some(handles) => handles.iter().any(|h| h == target_handle),
        None => handle::input_slot(&node.id, target_handle).is_some(),
    }
}

fn operation_output(output: &OutputConfig) -> Variable {
    Variable::Operation(OperationVariable {
        config_id: OPERATION_OUTPUT_CONFIG_ID,
        output_name: output.output_name().to_string(),
        kind: output.kind(),
        output_handle_id: output.output_handle_id().to_string(),
    })
}

/// A group's start node re-exposes the group's bound inputs to the nodes inside it.
fn group_inputs(start: &Node, state: &GraphState) -> Vec<Variable> {
    let Some(NodeData::OperationGroup(group)) = start
        .parent_id
        .as_deref()
        .and_then(|parent| state.node(parent))
        .map(|parent| &parent.data)
    else {
        return Vec::new();
    };

    group
        .inputs
        .iter()
        .filter_map(|input| {
            let binding = input.binding.as_ref()?;
            let value = match binding {
                InputConfig::ScalarValue(literal) => Some(literal.value),
                InputConfig::ParentGroupScalarValue(forwarded) => forwarded.value,
                InputConfig::Series(_) | InputConfig::Scalar(_) => None,
            };
            Some(Variable::GroupInput(GroupInputVariable {
                config_id: input.config_id,
                name: input.name.clone(),
                kind: binding.kind(),
                value,
                output_handle_id: handle::output(&start.id, input.config_id),
            }))
        })
        .collect()
}
