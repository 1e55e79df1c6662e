//! Variable propagation from producers to consumers.
mod common;
use common::*;
use stratflow::prelude::*;
use stratflow::variables::{
    accepts_input_handle, exposed_handles, exposed_input_handles, exposed_variables,
};

fn symbol_names(item: &VariableItem) -> Vec<String> {
    item.variables.iter().map(Variable::display_name).collect()
}

#[test]
fn test_default_handle_yields_everything() {
    let mut graph = StrategyGraph::default();
    graph
        .add_node(kline_node("kline", &[(1, "BTCUSDT", "1h"), (2, "ETHUSDT", "4h")]))
        .unwrap();
    graph.add_node(if_else_node("cond", None)).unwrap();
    graph.connect(link_default("kline", "cond")).unwrap();

    let items = graph.resolve_variables("cond");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].node_id, "kline");
    assert_eq!(items[0].node_type, NodeType::Kline);
    assert_eq!(symbol_names(&items[0]), vec!["BTCUSDT 1h", "ETHUSDT 4h"]);
}

#[test]
fn test_specific_handle_yields_one_variable() {
    let mut graph = StrategyGraph::default();
    graph
        .add_node(kline_node("kline", &[(1, "BTCUSDT", "1h"), (2, "ETHUSDT", "4h")]))
        .unwrap();
    graph.add_node(if_else_node("cond", None)).unwrap();
    graph
        .connect(link("kline", 2, "cond", handle::default_input("cond")))
        .unwrap();

    let items = graph.resolve_variables("cond");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].variables.len(), 1);
    assert_eq!(items[0].variables[0].config_id(), 2);
    assert_eq!(items[0].variables[0].value_kind(), ValueKind::Series);
}

#[test]
fn test_stale_handle_yields_nothing() {
    let mut graph = StrategyGraph::default();
    graph.add_node(kline_node("kline", &[(1, "BTCUSDT", "1h")])).unwrap();

    // An edge on a symbol row the kline does not have.
    let stale = link("kline", 2, "cond", handle::default_input("cond"));
    assert!(resolve_variables(graph.state(), &[&stale], graph.mode()).is_empty());
}

#[test]
fn test_input_handles_per_node_type() {
    let mut graph = StrategyGraph::default();
    graph.add_node(operation_node(&graph, "unary", InputArity::Unary)).unwrap();
    graph.add_node(operation_node(&graph, "binary", InputArity::Binary)).unwrap();
    graph.add_node(operation_node(&graph, "nary", InputArity::Nary)).unwrap();
    graph.add_node(variable_node("vars", &["Value"])).unwrap();

    let inputs = |id: &str| exposed_input_handles(graph.node(id).unwrap());
    assert_eq!(inputs("unary"), Some(vec![handle::input("unary", 1)]));
    assert_eq!(
        inputs("binary"),
        Some(vec![handle::input("binary", 1), handle::input("binary", 2)])
    );
    assert_eq!(inputs("nary"), None);
    assert_eq!(inputs("vars"), Some(vec![handle::default_input("vars")]));

    let nary = graph.node("nary").unwrap();
    assert!(accepts_input_handle(nary, &handle::input("nary", 12)));
    assert!(!accepts_input_handle(nary, "nary_input_x"));
    assert!(!accepts_input_handle(nary, &handle::default_input("nary")));
}

#[test]
fn test_items_merge_per_producer_without_duplicates() {
    let mut graph = StrategyGraph::default();
    graph
        .add_node(kline_node("kline", &[(1, "BTCUSDT", "1h"), (2, "ETHUSDT", "4h")]))
        .unwrap();
    graph.add_node(if_else_node("cond", None)).unwrap();
    graph
        .connect(link("kline", 2, "cond", handle::default_input("cond")))
        .unwrap();
    graph.connect(link_default("kline", "cond")).unwrap();

    let items = graph.resolve_variables("cond");
    assert_eq!(items.len(), 1);
    // First seen through the specific handle, then the rest from the aggregate one.
    assert_eq!(symbol_names(&items[0]), vec!["ETHUSDT 4h", "BTCUSDT 1h"]);
}

#[test]
fn test_items_follow_connection_order() {
    let mut graph = StrategyGraph::default();
    graph.add_node(variable_node("vars", &["Threshold"])).unwrap();
    graph.add_node(kline_node("kline", &[(1, "BTCUSDT", "1h")])).unwrap();
    graph.add_node(if_else_node("cond", None)).unwrap();
    graph.connect(link_default("vars", "cond")).unwrap();
    graph.connect(link_default("kline", "cond")).unwrap();

    let ids: Vec<String> = graph
        .resolve_variables("cond")
        .into_iter()
        .map(|item| item.node_id)
        .collect();
    assert_eq!(ids, vec!["vars", "kline"]);

    // An explicit inbound order is honoured as given.
    let state = graph.state();
    let mut inbound = state.inbound_edges("cond");
    inbound.reverse();
    let items = stratflow::variables::resolve_variables(state, &inbound, state.mode());
    assert_eq!(items[0].node_id, "kline");
}

#[test]
fn test_resolution_is_idempotent() {
    let mut graph = StrategyGraph::default();
    graph
        .add_node(kline_node("kline", &[(1, "BTCUSDT", "1h"), (2, "ETHUSDT", "4h")]))
        .unwrap();
    graph.add_node(variable_node("vars", &["Threshold", "Stop"])).unwrap();
    graph.add_node(if_else_node("cond", None)).unwrap();
    graph.connect(link_default("kline", "cond")).unwrap();
    graph.connect(link("vars", 2, "cond", handle::default_input("cond"))).unwrap();

    assert_eq!(graph.resolve_variables("cond"), graph.resolve_variables("cond"));
}

#[test]
fn test_non_exposing_producer_contributes_nothing() {
    let mut graph = StrategyGraph::default();
    graph.add_node(if_else_node("cond", None)).unwrap();
    graph.add_node(variable_node("vars", &["Counter"])).unwrap();
    graph.connect(link_default("cond", "vars")).unwrap();

    assert!(graph.resolve_variables("vars").is_empty());
}

#[test]
fn test_mode_selects_config() {
    let mut graph = StrategyGraph::default();
    graph.add_node(kline_node("kline", &[(1, "BTCUSDT", "1h")])).unwrap();
    graph.add_node(if_else_node("cond", None)).unwrap();
    graph.connect(link_default("kline", "cond")).unwrap();
    assert_eq!(graph.resolve_variables("cond").len(), 1);

    graph.set_mode(TradeMode::Live);
    assert!(graph.resolve_variables("cond").is_empty());
}

#[test]
fn test_indicator_variables_carry_source_symbol() {
    let mut graph = StrategyGraph::default();
    graph.add_node(kline_node("kline", &[(1, "BTCUSDT", "1h")])).unwrap();
    graph.add_node(indicator_node("ma", None)).unwrap();
    graph.add_node(if_else_node("cond", None)).unwrap();
    graph.connect(link("kline", 1, "ma", handle::default_input("ma"))).unwrap();
    bind_indicator(&mut graph, "ma", symbol_binding("kline", 1, "BTCUSDT", "1h"));
    graph.connect(link_default("ma", "cond")).unwrap();

    let items = graph.resolve_variables("cond");
    let Variable::Indicator(ma) = &items[0].variables[0] else {
        panic!("expected an indicator variable");
    };
    assert_eq!(ma.indicator_type, "MA");
    assert_eq!(ma.symbol.as_deref(), Some("BTCUSDT"));
    assert_eq!(ma.fields, vec!["ma"]);
    assert_eq!(items[0].variables[0].display_name(), "MA (BTCUSDT 1h)");
}

#[test]
fn test_operation_exposes_its_output() {
    let mut graph = StrategyGraph::default();
    graph.add_node(operation_node(&graph, "op", InputArity::Unary)).unwrap();
    let node = graph.node("op").unwrap();

    let exposed = exposed_variables(node, graph.state(), graph.mode());
    assert_eq!(exposed.len(), 1);
    assert_eq!(exposed[0].output_handle_id(), handle::output("op", 1));
    assert_eq!(exposed[0].display_name(), "Absolute");

    let handles = exposed_handles(node, graph.state(), graph.mode());
    assert_eq!(handles, vec![handle::default_output("op"), handle::output("op", 1)]);
}

#[test]
fn test_group_start_exposes_bound_inputs() {
    let mut graph = StrategyGraph::default();
    let group = OperationGroupData {
        node_name: "Group".to_string(),
        inputs: vec![
            GroupInput {
                config_id: 1,
                name: "threshold".to_string(),
                binding: Some(literal(1, 5.0)),
            },
            GroupInput {
                config_id: 2,
                name: "unbound".to_string(),
                binding: None,
            },
        ],
        output: None,
    };
    graph.add_node(Node::new("group", NodeData::OperationGroup(group))).unwrap();
    graph
        .add_node(
            Node::new(
                "group_start",
                NodeData::OperationStart(OperationStartData::default()),
            )
            .with_parent("group"),
        )
        .unwrap();
    graph
        .add_node(operation_node(&graph, "inner", InputArity::Binary).with_parent("group"))
        .unwrap();
    graph
        .connect(link("group_start", 1, "inner", handle::input("inner", 1)))
        .unwrap();

    let items = graph.resolve_variables("inner");
    assert_eq!(items.len(), 1);
    let Variable::GroupInput(forwarded) = &items[0].variables[0] else {
        panic!("expected a forwarded group input");
    };
    assert_eq!(forwarded.name, "threshold");
    assert_eq!(forwarded.kind, ValueKind::Scalar);
    assert_eq!(forwarded.value, Some(5.0));

    // The unbound group input exposes no handle.
    let unbound = link("group_start", 2, "inner", handle::input("inner", 2));
    assert!(!graph.is_valid_connection(&unbound));
}
