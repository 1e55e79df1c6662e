//! Rules for operation nodes, operation groups and their end nodes.

use super::reconcile::{Reconcile, SingleSource, variable_through};
use crate::graph::{GraphState, SyncNotice};
use crate::model::*;
use crate::operation::OperationTypeResolver;
use crate::variables::{OPERATION_OUTPUT_CONFIG_ID, resolve_variables};

/// The binding a slot gets when it reads `variable` through `edge`.
fn input_from(slot_id: ConfigId, edge: &Edge, producer_type: NodeType, variable: &Variable) -> InputConfig {
    if let Variable::GroupInput(forwarded) = variable {
        if forwarded.kind == ValueKind::Scalar {
            return InputConfig::ParentGroupScalarValue(ParentGroupScalarValueInput {
                config_id: slot_id,
                from_node_id: edge.source.clone(),
                from_handle_id: forwarded.output_handle_id.clone(),
                from_config_id: forwarded.config_id,
                display_name: forwarded.name.clone(),
                value: forwarded.value,
            });
        }
    }
    match variable.value_kind() {
        ValueKind::Series => InputConfig::Series(SeriesInput {
            config_id: slot_id,
            from_node_id: edge.source.clone(),
            from_node_type: producer_type,
            from_handle_id: variable.output_handle_id().to_string(),
            from_config_id: variable.config_id(),
            display_name: variable.display_name(),
        }),
        ValueKind::Scalar => InputConfig::Scalar(ScalarInput {
            config_id: slot_id,
            from_node_id: edge.source.clone(),
            from_node_type: producer_type,
            from_handle_id: variable.output_handle_id().to_string(),
            from_config_id: variable.config_id(),
            display_name: variable.display_name(),
        }),
    }
}

/// Reconciles one input slot against the edges on its handle. Literals have no
/// producer and are left alone. Returns whether the slot changed.
fn sync_slot(
    state: &GraphState,
    node_id: &str,
    target_handle: &str,
    slot: &mut Option<InputConfig>,
    series_only: bool,
    notices: &mut Vec<SyncNotice>,
) -> bool {
    let Some(current) = slot.as_ref() else {
        return false;
    };
    let Some(source) = current.source() else {
        return false;
    };
    let edges = state.inbound_on_handle(node_id, target_handle);
    let desired = match SingleSource::of(&edges) {
        SingleSource::Ambiguous(count) => {
            notices.push(SyncNotice::AmbiguousConnections {
                node_id: node_id.to_string(),
                handle: Some(target_handle.to_string()),
                count,
            });
            return false;
        }
        SingleSource::None => None,
        SingleSource::One(edge) if edge.source != source.node_id => None,
        SingleSource::One(edge) => variable_through(state, edge, source.config_id)
            .map(|(producer_type, variable)| {
                input_from(current.slot_id(), edge, producer_type, &variable)
            })
            .filter(|input| !series_only || !input.is_scalar_like()),
    };

    let reference = current.display_name();
    let transition = Reconcile::between(slot, desired);
    if matches!(transition, Reconcile::Unbind) {
        notices.push(SyncNotice::Unbound {
            node_id: node_id.to_string(),
            reference: format!("input '{}'", reference),
        });
    }
    transition.apply(slot)
}

pub(super) fn sync_operation(
    state: &GraphState,
    node_id: &str,
    data: &mut OperationNodeData,
    resolver: &OperationTypeResolver<'_>,
    notices: &mut Vec<SyncNotice>,
) {
    match &mut data.inputs {
        OperationInputs::Unary { input } => {
            let target_handle = handle::input(node_id, 1);
            let mut slot = input.take().map(InputConfig::Series);
            sync_slot(state, node_id, &target_handle, &mut slot, true, notices);
            *input = match slot {
                Some(InputConfig::Series(series)) => Some(series),
                _ => None,
            };
        }
        OperationInputs::Binary { input1, input2 } => {
            for (slot_id, slot) in [(1, input1), (2, input2)] {
                let target_handle = handle::input(node_id, slot_id);
                sync_slot(state, node_id, &target_handle, slot, false, notices);
            }
        }
        OperationInputs::Nary { inputs } => {
            let mut kept = Vec::with_capacity(inputs.len());
            for item in inputs.drain(..) {
                let target_handle = handle::input(node_id, item.config_id);
                let mut slot = Some(InputConfig::Series(item));
                sync_slot(state, node_id, &target_handle, &mut slot, true, notices);
                if let Some(InputConfig::Series(series)) = slot {
                    kept.push(series);
                }
            }
            *inputs = kept;
        }
    }
    resolver.refresh_output(data);
}

/// Group inputs are reconciled like binary slots; the group output mirrors whatever its
/// end node is bound to.
pub(super) fn sync_group(
    state: &GraphState,
    node_id: &str,
    data: &mut OperationGroupData,
    notices: &mut Vec<SyncNotice>,
) {
    for input in &mut data.inputs {
        let target_handle = handle::input(node_id, input.config_id);
        sync_slot(state, node_id, &target_handle, &mut input.binding, false, notices);
    }

    let Some(end) = state.children(node_id).find_map(|child| match &child.data {
        NodeData::OperationEnd(end) => Some(end),
        _ => None,
    }) else {
        return;
    };
    let output = end.source.as_ref().map(|bound| {
        let name = data
            .output
            .as_ref()
            .map(|output| output.output_name().to_string())
            .unwrap_or_else(|| bound.output_name.clone());
        OutputConfig::new(
            bound.kind,
            name,
            handle::output(node_id, OPERATION_OUTPUT_CONFIG_ID),
        )
    });
    data.output = output;
}

/// An end node binds the output of the single operation feeding it.
pub(super) fn sync_end(
    state: &GraphState,
    node_id: &str,
    data: &mut OperationEndData,
    notices: &mut Vec<SyncNotice>,
) {
    let edges = state.inbound_edges(node_id);
    let desired = match SingleSource::of(&edges) {
        SingleSource::Ambiguous(count) => {
            notices.push(SyncNotice::AmbiguousConnections {
                node_id: node_id.to_string(),
                handle: None,
                count,
            });
            return;
        }
        SingleSource::None => None,
        SingleSource::One(edge) => resolve_variables(state, &[edge], state.mode())
            .into_iter()
            .flat_map(|item| item.variables)
            .find_map(|variable| match variable {
                Variable::Operation(output) => Some(OutputBinding {
                    from_node_id: edge.source.clone(),
                    from_handle_id: output.output_handle_id,
                    from_config_id: output.config_id,
                    output_name: output.output_name,
                    kind: output.kind,
                }),
                _ => None,
            }),
    };

    if data.source.is_some() && desired.is_none() {
        notices.push(SyncNotice::Unbound {
            node_id: node_id.to_string(),
            reference: "group output".to_string(),
        });
    }
    data.source = desired;
}
