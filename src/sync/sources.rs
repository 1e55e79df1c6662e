//! Rules for the market-data chain and for condition references.

use super::reconcile::{Reconcile, SingleSource, variable_through};
use crate::graph::{GraphState, SyncNotice};
use crate::model::*;
use crate::variables::resolve_for_node;

fn inbound_from<'a>(state: &'a GraphState, node_id: &str, producer: NodeType) -> Vec<&'a Edge> {
    state
        .inbound_edges(node_id)
        .into_iter()
        .filter(|e| state.node(&e.source).is_some_and(|n| n.node_type() == producer))
        .collect()
}

fn ambiguous(node_id: &str, count: usize) -> SyncNotice {
    SyncNotice::AmbiguousConnections {
        node_id: node_id.to_string(),
        handle: None,
        count,
    }
}

/// A kline node caches the backtest time range of the start node feeding it.
pub(super) fn sync_kline(
    state: &GraphState,
    node_id: &str,
    data: &mut KlineNodeData,
    notices: &mut Vec<SyncNotice>,
) {
    let starts = inbound_from(state, node_id, NodeType::Start);
    let range = match SingleSource::of(&starts) {
        SingleSource::Ambiguous(count) => {
            notices.push(ambiguous(node_id, count));
            return;
        }
        SingleSource::None => None,
        SingleSource::One(edge) => match state.node(&edge.source).map(|n| &n.data) {
            Some(NodeData::Start(start)) => start
                .configs
                .backtest_config
                .as_ref()
                .and_then(|config| config.time_range.clone()),
            _ => None,
        },
    };

    let Some(config) = data.configs.backtest_config.as_mut() else {
        return;
    };
    if config.time_range == range {
        return;
    }
    if range.is_none() {
        notices.push(SyncNotice::Unbound {
            node_id: node_id.to_string(),
            reference: "backtest time range".to_string(),
        });
    }
    config.time_range = range;
}

/// An indicator node keeps a copy of the kline symbol it is computed on.
pub(super) fn sync_indicator(
    state: &GraphState,
    node_id: &str,
    data: &mut IndicatorNodeData,
    notices: &mut Vec<SyncNotice>,
) {
    let Some(config) = data.configs.get_mut(state.mode()) else {
        return;
    };
    let klines = inbound_from(state, node_id, NodeType::Kline);
    let desired = match SingleSource::of(&klines) {
        SingleSource::Ambiguous(count) => {
            notices.push(ambiguous(node_id, count));
            return;
        }
        SingleSource::None => None,
        SingleSource::One(edge) => config.source.as_ref().and_then(|bound| {
            if bound.from_node_id != edge.source {
                return None;
            }
            match variable_through(state, edge, bound.config_id)? {
                (_, Variable::Symbol(symbol)) => Some(SymbolBinding {
                    from_node_id: edge.source.clone(),
                    from_handle_id: symbol.output_handle_id,
                    config_id: symbol.config_id,
                    symbol: symbol.symbol,
                    interval: symbol.interval,
                }),
                _ => None,
            }
        }),
    };

    let transition = Reconcile::between(&config.source, desired);
    if let (Reconcile::Unbind, Some(bound)) = (&transition, &config.source) {
        notices.push(SyncNotice::Unbound {
            node_id: node_id.to_string(),
            reference: format!("source symbol {} {}", bound.symbol, bound.interval),
        });
    }
    transition.apply(&mut config.source);
}

/// Condition operands are re-validated against everything the node's inbound edges
/// expose. A reference may point at any of several producers.
pub(super) fn sync_if_else(
    state: &GraphState,
    node_id: &str,
    data: &mut IfElseNodeData,
    notices: &mut Vec<SyncNotice>,
) {
    let items = resolve_for_node(state, node_id);
    let Some(config) = data.configs.get_mut(state.mode()) else {
        return;
    };
    for reference in config.references_mut() {
        let desired = reference.as_ref().and_then(|bound| {
            let item = items.iter().find(|i| i.node_id == bound.from_node_id)?;
            let variable = item.find(bound.config_id)?;
            Some(VariableRef {
                from_node_id: bound.from_node_id.clone(),
                from_node_type: item.node_type,
                from_handle_id: variable.output_handle_id().to_string(),
                config_id: bound.config_id,
                var_name: variable.display_name(),
                value_kind: variable.value_kind(),
            })
        });
        let transition = Reconcile::between(reference, desired);
        if let (Reconcile::Unbind, Some(bound)) = (&transition, reference.as_ref()) {
            notices.push(SyncNotice::Unbound {
                node_id: node_id.to_string(),
                reference: format!("condition variable '{}'", bound.var_name),
            });
        }
        transition.apply(reference);
    }
}
