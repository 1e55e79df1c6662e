//! Common test utilities for building strategy graphs.
use std::collections::BTreeMap;
use stratflow::prelude::*;

/// A kline node with one backtest symbol row per `(config_id, symbol, interval)`.
#[allow(dead_code)]
pub fn kline_node(id: &str, symbols: &[(ConfigId, &str, &str)]) -> Node {
    let mut data = KlineNodeData {
        node_name: format!("Kline {}", id),
        ..Default::default()
    };
    data.configs.set(TradeMode::Backtest, kline_config(symbols));
    Node::new(id, NodeData::Kline(data))
}

#[allow(dead_code)]
pub fn kline_config(symbols: &[(ConfigId, &str, &str)]) -> KlineConfig {
    KlineConfig {
        selected_symbols: symbols
            .iter()
            .map(|(config_id, symbol, interval)| SelectedSymbol {
                config_id: *config_id,
                symbol: symbol.to_string(),
                interval: interval.to_string(),
            })
            .collect(),
        ..Default::default()
    }
}

/// A start node whose backtest config spans `range`.
#[allow(dead_code)]
pub fn start_node(id: &str, range: Option<(&str, &str)>) -> Node {
    let mut data = StartNodeData {
        node_name: "Start".to_string(),
        ..Default::default()
    };
    data.configs.set(
        TradeMode::Backtest,
        StartConfig {
            time_range: range.map(|(start, end)| TimeRange {
                start_date: start.to_string(),
                end_date: end.to_string(),
            }),
            custom_variables: vec![CustomVariableConfig {
                config_id: 1,
                var_name: "risk".to_string(),
                var_display_name: "Risk".to_string(),
                var_value_type: VariableValueType::Number,
                initial_value: serde_json::json!(0.02),
            }],
        },
    );
    Node::new(id, NodeData::Start(data))
}

/// An indicator node computing a 14-period MA, optionally already bound to a symbol.
#[allow(dead_code)]
pub fn indicator_node(id: &str, source: Option<SymbolBinding>) -> Node {
    let mut data = IndicatorNodeData {
        node_name: "MA".to_string(),
        ..Default::default()
    };
    data.configs.set(
        TradeMode::Backtest,
        IndicatorConfig {
            exchange: None,
            source,
            selected_indicators: vec![SelectedIndicator {
                config_id: 1,
                indicator_type: "MA".to_string(),
                params: BTreeMap::from([("period".to_string(), 14.0)]),
                output_fields: vec!["ma".to_string()],
            }],
        },
    );
    Node::new(id, NodeData::Indicator(data))
}

#[allow(dead_code)]
pub fn symbol_binding(kline_id: &str, config_id: ConfigId, symbol: &str, interval: &str) -> SymbolBinding {
    SymbolBinding {
        from_node_id: kline_id.to_string(),
        from_handle_id: handle::output(kline_id, config_id),
        config_id,
        symbol: symbol.to_string(),
        interval: interval.to_string(),
    }
}

/// Binds an indicator that is already connected. References added before their producer
/// is connected are unbound straight away, so tests bind after connecting.
#[allow(dead_code)]
pub fn bind_indicator(graph: &mut StrategyGraph, id: &str, binding: SymbolBinding) {
    let data = indicator_node(id, Some(binding)).data;
    graph
        .update_node_config(id, NodePatch::Replace(data))
        .unwrap();
}

/// A variable node exposing scalar variables named after `names`, numbered from 1.
#[allow(dead_code)]
pub fn variable_node(id: &str, names: &[&str]) -> Node {
    let mut data = VariableNodeData {
        node_name: format!("Variables {}", id),
        ..Default::default()
    };
    data.configs.set(
        TradeMode::Backtest,
        VariableNodeConfig {
            variables: names
                .iter()
                .zip(1..)
                .map(|(name, config_id)| VariableConfig {
                    config_id,
                    var_name: name.to_lowercase(),
                    var_display_name: name.to_string(),
                    var_value_type: VariableValueType::Number,
                })
                .collect(),
        },
    );
    Node::new(id, NodeData::Variable(data))
}

/// An IfElse node with one case comparing `left` against a constant.
#[allow(dead_code)]
pub fn if_else_node(id: &str, left: Option<VariableRef>) -> Node {
    let mut data = IfElseNodeData {
        node_name: "Condition".to_string(),
        ..Default::default()
    };
    data.configs.set(
        TradeMode::Backtest,
        IfElseConfig {
            cases: vec![CaseItem {
                case_id: 1,
                logical_symbol: LogicalSymbol::And,
                conditions: vec![Condition {
                    condition_id: 1,
                    left,
                    comparison: ComparisonSymbol::GreaterThan,
                    right: ConditionOperand::Constant { value: 1.0 },
                }],
            }],
        },
    );
    Node::new(id, NodeData::IfElse(data))
}

#[allow(dead_code)]
pub fn if_else_left(graph: &StrategyGraph, id: &str) -> Option<VariableRef> {
    match &graph.node(id)?.data {
        NodeData::IfElse(data) => data.configs.backtest_config.as_ref()?.cases[0].conditions[0]
            .left
            .clone(),
        _ => None,
    }
}

/// An operation node running the default operation of `arity`.
#[allow(dead_code)]
pub fn operation_node(graph: &StrategyGraph, id: &str, arity: InputArity) -> Node {
    Node::new(
        id,
        NodeData::Operation(graph.operation_resolver().new_node_data(id, arity)),
    )
}

#[allow(dead_code)]
pub fn operation_data(graph: &StrategyGraph, id: &str) -> OperationNodeData {
    match &graph.node(id).expect("node exists").data {
        NodeData::Operation(data) => data.clone(),
        other => panic!("expected an operation node, got {}", other.node_type()),
    }
}

#[allow(dead_code)]
pub fn series_input(slot: ConfigId, kline_id: &str, config_id: ConfigId, display_name: &str) -> SeriesInput {
    SeriesInput {
        config_id: slot,
        from_node_id: kline_id.to_string(),
        from_node_type: NodeType::Kline,
        from_handle_id: handle::output(kline_id, config_id),
        from_config_id: config_id,
        display_name: display_name.to_string(),
    }
}

#[allow(dead_code)]
pub fn literal(slot: ConfigId, value: f64) -> InputConfig {
    InputConfig::ScalarValue(ScalarValueInput {
        config_id: slot,
        value,
    })
}

/// Connects the output handle `config_id` of `source` to `target_handle`.
#[allow(dead_code)]
pub fn link(source: &str, config_id: ConfigId, target: &str, target_handle: HandleId) -> Edge {
    Edge::new(source, handle::output(source, config_id), target, target_handle)
}

/// Connects the aggregate output of `source` to the default input of `target`.
#[allow(dead_code)]
pub fn link_default(source: &str, target: &str) -> Edge {
    Edge::new(
        source,
        handle::default_output(source),
        target,
        handle::default_input(target),
    )
}

/// The reason a connect was refused, or `None` when it succeeded.
#[allow(dead_code)]
pub fn rejection(result: Result<CommandReport, GraphError>) -> Option<stratflow::topology::Rejection> {
    match result {
        Err(GraphError::ConnectionRejected { reason, .. }) => Some(reason),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => None,
    }
}
