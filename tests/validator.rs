//! Connection compatibility and cardinality checks.
mod common;
use common::*;
use std::sync::Arc;
use stratflow::prelude::*;
use stratflow::topology::{LimitScope, Rejection};

fn market_graph() -> StrategyGraph {
    let mut graph = StrategyGraph::default();
    graph
        .add_node(kline_node("kline", &[(1, "BTCUSDT", "1h"), (2, "ETHUSDT", "1h")]))
        .unwrap();
    graph
}

#[test]
fn test_compatible_connection_accepted() {
    let mut graph = market_graph();
    graph.add_node(indicator_node("ma", None)).unwrap();

    let edge = link("kline", 1, "ma", handle::default_input("ma"));
    assert!(graph.is_valid_connection(&edge));

    let report = graph.connect(edge).unwrap();
    assert_eq!(
        report.edge_id.as_deref(),
        Some("kline:kline_output_1->ma:ma_default_input")
    );
    assert_eq!(graph.edges().len(), 1);
}

#[test]
fn test_incompatible_types_rejected() {
    let mut graph = market_graph();
    graph.add_node(indicator_node("ma", None)).unwrap();

    // indicator -> kline is not in the connection map
    let edge = Edge::new(
        "ma",
        handle::default_output("ma"),
        "kline",
        handle::default_input("kline"),
    );
    assert!(!graph.is_valid_connection(&edge));
    assert_eq!(rejection(graph.connect(edge)), Some(Rejection::IncompatibleTypes));
}

#[test]
fn test_terminal_nodes_feed_nothing() {
    let mut graph = StrategyGraph::default();
    let order = Node::new(
        "order",
        NodeData::FuturesOrder(FuturesOrderNodeData {
            node_name: "Order".to_string(),
            config: serde_json::Value::Null,
        }),
    );
    graph.add_node(order).unwrap();
    graph.add_node(variable_node("vars", &["Threshold"])).unwrap();

    assert!(!graph.is_valid_connection(&link_default("order", "vars")));
}

#[test]
fn test_missing_endpoint_is_invalid() {
    let graph = market_graph();
    let edge = link("kline", 1, "ghost", handle::default_input("ghost"));
    assert!(!graph.is_valid_connection(&edge));
}

#[test]
fn test_self_loop_rejected() {
    let mut graph = StrategyGraph::default();
    graph.add_node(variable_node("vars", &["Threshold"])).unwrap();

    // variable -> variable is allowed between distinct nodes
    let edge = link_default("vars", "vars");
    assert_eq!(rejection(graph.connect(edge)), Some(Rejection::SelfLoop));
    assert!(graph.edges().is_empty());
}

#[test]
fn test_cycle_rejected() {
    let mut graph = StrategyGraph::default();
    for id in ["a", "b", "c"] {
        graph.add_node(variable_node(id, &["Value"])).unwrap();
    }
    graph.connect(link_default("a", "b")).unwrap();
    graph.connect(link_default("b", "c")).unwrap();

    assert_eq!(
        rejection(graph.connect(link_default("c", "a"))),
        Some(Rejection::WouldCycle)
    );
    assert_eq!(
        rejection(graph.connect(link_default("b", "a"))),
        Some(Rejection::WouldCycle)
    );
    // A shortcut in the same direction is not a cycle.
    assert!(graph.connect(link_default("a", "c")).is_ok());
}

#[test]
fn test_cycle_through_group_rejected() {
    let mut graph = StrategyGraph::default();
    let group = OperationGroupData {
        node_name: "Group".to_string(),
        inputs: vec![GroupInput {
            config_id: 1,
            name: "threshold".to_string(),
            binding: Some(literal(1, 5.0)),
        }],
        ..Default::default()
    };
    graph.add_node(Node::new("group", NodeData::OperationGroup(group))).unwrap();
    for (id, data) in [
        ("group_start", NodeData::OperationStart(OperationStartData::default())),
        ("group_end", NodeData::OperationEnd(OperationEndData::default())),
    ] {
        graph.add_node(Node::new(id, data).with_parent("group")).unwrap();
    }
    graph
        .add_node(operation_node(&graph, "op", InputArity::Binary).with_parent("group"))
        .unwrap();
    graph
        .connect(link("group_start", 1, "op", handle::input("op", 1)))
        .unwrap();
    graph
        .connect(link("op", 1, "group_end", handle::default_input("group_end")))
        .unwrap();

    // The group feeds `op` through its start node.
    let into_group = link("op", 1, "group", handle::input("group", 1));
    assert_eq!(rejection(graph.connect(into_group)), Some(Rejection::WouldCycle));

    // `op` feeds the group through its end node.
    let out_of_group = link("group", 1, "op", handle::input("op", 2));
    assert_eq!(rejection(graph.connect(out_of_group)), Some(Rejection::WouldCycle));

    graph.add_node(variable_node("vars", &["Out"])).unwrap();
    assert!(graph.is_valid_connection(&link("group", 1, "vars", handle::default_input("vars"))));
}

#[test]
fn test_node_scoped_limit() {
    let mut graph = StrategyGraph::default();
    graph.add_node(start_node("start1", None)).unwrap();
    graph.add_node(start_node("start2", None)).unwrap();
    graph.add_node(kline_node("kline", &[(1, "BTCUSDT", "1h")])).unwrap();

    graph.connect(link_default("start1", "kline")).unwrap();
    let second = link_default("start2", "kline");
    assert!(!graph.is_valid_connection(&second));
    assert_eq!(rejection(graph.connect(second)), Some(Rejection::LimitReached));
}

#[test]
fn test_handle_scoped_limit() {
    let mut graph = market_graph();
    graph.add_node(kline_node("kline2", &[(1, "SOLUSDT", "1h")])).unwrap();
    let op = operation_node(&graph, "op", InputArity::Binary);
    graph.add_node(op).unwrap();

    graph
        .connect(link("kline", 1, "op", handle::input("op", 1)))
        .unwrap();

    // The first slot is taken, even by a different producer.
    let same_slot = link("kline2", 1, "op", handle::input("op", 1));
    assert_eq!(rejection(graph.connect(same_slot)), Some(Rejection::LimitReached));

    // The second slot is counted on its own.
    let other_slot = link("kline2", 1, "op", handle::input("op", 2));
    assert!(graph.connect(other_slot).is_ok());
    assert_eq!(graph.state().inbound_edges("op").len(), 2);
}

#[test]
fn test_unbounded_limit() {
    let mut graph = StrategyGraph::default();
    graph.add_node(if_else_node("cond", None)).unwrap();
    for id in ["v1", "v2", "v3", "v4"] {
        graph.add_node(variable_node(id, &["Value"])).unwrap();
        graph.connect(link_default(id, "cond")).unwrap();
    }
    assert_eq!(graph.state().inbound_edges("cond").len(), 4);
}

#[test]
fn test_duplicate_edge_rejected() {
    let mut graph = StrategyGraph::default();
    graph.add_node(variable_node("a", &["Value"])).unwrap();
    graph.add_node(if_else_node("cond", None)).unwrap();

    graph.connect(link("a", 1, "cond", handle::default_input("cond"))).unwrap();
    assert_eq!(
        rejection(graph.connect(link("a", 1, "cond", handle::default_input("cond")))),
        Some(Rejection::Duplicate)
    );
}

#[test]
fn test_unexposed_handle_rejected() {
    let mut graph = market_graph();
    graph.add_node(indicator_node("ma", None)).unwrap();

    // The kline exposes configs 1 and 2 only.
    let edge = link("kline", 3, "ma", handle::default_input("ma"));
    assert_eq!(rejection(graph.connect(edge)), Some(Rejection::HandleNotExposed));
}

#[test]
fn test_target_handle_must_be_an_input() {
    let mut graph = market_graph();
    graph.add_node(operation_node(&graph, "op", InputArity::Unary)).unwrap();
    graph.add_node(operation_node(&graph, "sum", InputArity::Nary)).unwrap();

    let unknown = link("kline", 1, "op", "op_bogus_handle".to_string());
    assert_eq!(rejection(graph.connect(unknown)), Some(Rejection::HandleNotAccepted));
    let missing_slot = link("kline", 1, "op", handle::input("op", 7));
    assert_eq!(rejection(graph.connect(missing_slot)), Some(Rejection::HandleNotAccepted));
    assert!(!graph.is_valid_connection(&link("kline", 1, "op", handle::default_input("op"))));
    assert!(graph.connect(link("kline", 1, "op", handle::input("op", 1))).is_ok());

    // N-ary operations take any indexed slot.
    assert!(graph.connect(link("kline", 2, "sum", handle::input("sum", 7))).is_ok());
}

#[test]
fn test_handles_follow_trade_mode() {
    let mut graph = market_graph();
    graph.add_node(indicator_node("ma", None)).unwrap();
    graph.set_mode(TradeMode::Live);

    // Without a live config the kline exposes only its aggregate handle.
    assert!(!graph.is_valid_connection(&link("kline", 1, "ma", handle::default_input("ma"))));
    assert!(graph.is_valid_connection(&link_default("kline", "ma")));
}

#[test]
fn test_if_else_branch_handles_are_exposed() {
    let mut graph = StrategyGraph::default();
    graph.add_node(if_else_node("cond", None)).unwrap();
    graph.add_node(variable_node("vars", &["Value"])).unwrap();

    let case = Edge::new("cond", handle::output("cond", 1), "vars", handle::default_input("vars"));
    let otherwise = Edge::new("cond", handle::else_output("cond"), "vars", handle::default_input("vars"));
    let missing_case = Edge::new("cond", handle::output("cond", 2), "vars", handle::default_input("vars"));

    assert!(graph.is_valid_connection(&case));
    assert!(graph.is_valid_connection(&otherwise));
    assert!(!graph.is_valid_connection(&missing_case));
}

#[test]
fn test_rejected_connect_leaves_graph_untouched() {
    let mut graph = market_graph();
    graph.add_node(indicator_node("ma", None)).unwrap();
    graph.connect(link("kline", 1, "ma", handle::default_input("ma"))).unwrap();
    bind_indicator(&mut graph, "ma", symbol_binding("kline", 1, "BTCUSDT", "1h"));
    let before: Vec<Node> = graph.nodes().to_vec();
    let revision = graph.state().revision("ma");

    let result = graph.connect(link("kline", 2, "ma", handle::default_input("ma")));
    assert!(result.is_err());
    assert_eq!(graph.nodes(), before.as_slice());
    assert_eq!(graph.edges().len(), 1);
    assert_eq!(graph.state().revision("ma"), revision);
}

#[test]
fn test_custom_tables() {
    let tables = CompatibilityTables::builder()
        .allow(NodeType::Kline, &[NodeType::Variable])
        .limit(NodeType::Variable, 1, LimitScope::Node)
        .build();
    let mut graph = StrategyGraph::builder().with_tables(Arc::new(tables)).build();
    graph.add_node(kline_node("k1", &[(1, "BTCUSDT", "1h")])).unwrap();
    graph.add_node(kline_node("k2", &[(1, "ETHUSDT", "1h")])).unwrap();
    graph.add_node(variable_node("vars", &["Value"])).unwrap();
    graph.add_node(indicator_node("ma", None)).unwrap();

    // Absent from the custom map, so closed.
    assert!(!graph.is_valid_connection(&link_default("k1", "ma")));
    assert!(graph.connect(link_default("k1", "vars")).is_ok());
    assert_eq!(
        rejection(graph.connect(link_default("k2", "vars"))),
        Some(Rejection::LimitReached)
    );
}

#[test]
fn test_target_without_limit_rejected() {
    let tables = CompatibilityTables::builder()
        .allow(NodeType::Kline, &[NodeType::Variable])
        .build();
    let mut graph = StrategyGraph::builder().with_tables(Arc::new(tables)).build();
    graph.add_node(kline_node("kline", &[(1, "BTCUSDT", "1h")])).unwrap();
    graph.add_node(variable_node("vars", &["Value"])).unwrap();

    let result = graph.connect(link_default("kline", "vars"));
    assert_eq!(rejection(result), Some(Rejection::NoLimitDefined));
    assert_eq!(
        Rejection::NoLimitDefined.to_string(),
        "target type has no connection limit defined"
    );
}

#[test]
fn test_tables_from_json() {
    let json = r#"{
        "connectionMap": { "klineNode": ["indicatorNode"] },
        "connectionLimit": { "indicatorNode": 1, "operationNode": 1 },
        "handleScoped": ["operationNode"]
    }"#;
    let tables = CompatibilityTables::from_json(json).unwrap();

    assert!(tables.allows(NodeType::Kline, NodeType::Indicator));
    assert!(!tables.allows(NodeType::Indicator, NodeType::Kline));
    assert_eq!(tables.limit(NodeType::Operation).unwrap().scope, LimitScope::Handle);
    assert_eq!(tables.limit(NodeType::Indicator).unwrap().scope, LimitScope::Node);
    assert!(tables.limit(NodeType::Start).is_none());
}

#[test]
fn test_standard_limits() {
    use stratflow::topology::ConnectionLimit;

    let tables = CompatibilityTables::standard();
    assert_eq!(
        tables.limit(NodeType::Start).unwrap().limit,
        ConnectionLimit::AtMost(0)
    );
    assert_eq!(
        tables.limit(NodeType::Variable).unwrap().limit,
        ConnectionLimit::Unbounded
    );
    assert!(!ConnectionLimit::AtMost(1).allows(1));
    assert!(ConnectionLimit::from_raw(-1).allows(usize::MAX));
}
