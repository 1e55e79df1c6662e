//! Loading and saving strategy documents, plus engine configuration.
mod common;
use common::*;
use stratflow::error::{ConfigError, DocumentError};
use stratflow::prelude::*;

const STRATEGY: &str = r#"{
    "nodes": [
        {
            "id": "start",
            "type": "startNode",
            "position": { "x": 0, "y": 0 },
            "data": {
                "nodeName": "Start",
                "backtestConfig": {
                    "timeRange": { "startDate": "2024-01-01", "endDate": "2024-03-31" },
                    "customVariables": []
                }
            }
        },
        {
            "id": "kline",
            "type": "klineNode",
            "position": { "x": 200, "y": 0 },
            "data": {
                "nodeName": "BTC",
                "backtestConfig": {
                    "exchange": "binance",
                    "selectedSymbols": [{ "configId": 1, "symbol": "BTCUSDT", "interval": "1h" }]
                }
            }
        },
        {
            "id": "ma",
            "type": "indicatorNode",
            "data": {
                "nodeName": "MA",
                "backtestConfig": {
                    "source": {
                        "fromNodeId": "kline",
                        "fromHandleId": "kline_output_1",
                        "configId": 1,
                        "symbol": "BTCUSDT",
                        "interval": "1h"
                    },
                    "selectedIndicators": [
                        { "configId": 1, "indicatorType": "MA", "params": { "period": 14 }, "outputFields": ["ma"] }
                    ]
                }
            }
        }
    ],
    "edges": [
        { "source": "start", "sourceHandle": "start_default_output", "target": "kline", "targetHandle": "kline_default_input" },
        { "id": "k-ma", "source": "kline", "sourceHandle": "kline_output_1", "target": "ma", "targetHandle": "ma_default_input" },
        { "source": "ghost", "sourceHandle": "ghost_default_output", "target": "ma", "targetHandle": "ma_default_input" }
    ],
    "chartConfig": { "layout": "grid", "panes": 2 }
}"#;

#[test]
fn test_load_document() {
    let graph = StrategyGraph::from_document(StrategyDocument::from_json(STRATEGY).unwrap()).unwrap();

    assert_eq!(graph.nodes().len(), 3);
    // The edge to the missing node is dropped.
    assert_eq!(graph.edges().len(), 2);
    assert_eq!(graph.load_report().removed_edges.len(), 1);
    // Edges saved without an id get the conventional one.
    assert_eq!(
        graph.edges()[0].id,
        "start:start_default_output->kline:kline_default_input"
    );
    assert_eq!(graph.edges()[1].id, "k-ma");
    assert_eq!(graph.state().chart_config()["panes"], 2);
    assert_eq!(graph.node("kline").unwrap().position["x"], 200);
}

#[test]
fn test_load_reconciles_references() {
    let graph = StrategyGraph::from_document(StrategyDocument::from_json(STRATEGY).unwrap()).unwrap();

    // The kline picks up the start node's time range on load.
    let NodeData::Kline(kline) = &graph.node("kline").unwrap().data else {
        panic!("expected a kline node");
    };
    let range = kline.configs.backtest_config.as_ref().unwrap().time_range.as_ref().unwrap();
    assert_eq!(range.end_date, "2024-03-31");

    // The indicator binding is consistent and kept.
    let NodeData::Indicator(ma) = &graph.node("ma").unwrap().data else {
        panic!("expected an indicator node");
    };
    assert!(ma.configs.backtest_config.as_ref().unwrap().source.is_some());
}

#[test]
fn test_load_report_lists_repairs() {
    // The indicator is bound to a kline it is not connected to, and the only edge runs
    // the wrong way.
    let json = r#"{
        "nodes": [
            { "id": "kline", "type": "klineNode", "data": { "nodeName": "BTC",
              "backtestConfig": { "selectedSymbols": [{ "configId": 1, "symbol": "BTCUSDT", "interval": "1h" }] } } },
            { "id": "ma", "type": "indicatorNode", "data": { "nodeName": "MA",
              "backtestConfig": {
                "source": { "fromNodeId": "kline", "fromHandleId": "kline_output_1", "configId": 1,
                            "symbol": "BTCUSDT", "interval": "1h" },
                "selectedIndicators": [] } } }
        ],
        "edges": [
            { "source": "ma", "sourceHandle": "ma_default_output", "target": "kline", "targetHandle": "kline_default_input" }
        ]
    }"#;
    let graph = StrategyGraph::from_document(StrategyDocument::from_json(json).unwrap()).unwrap();

    assert!(graph.edges().is_empty());
    let report = graph.load_report();
    assert_eq!(
        report.removed_edges,
        vec!["ma:ma_default_output->kline:kline_default_input".to_string()]
    );
    assert_eq!(report.notices.len(), 1);
    assert!(matches!(
        &report.notices[0],
        SyncNotice::Unbound { node_id, .. } if node_id == "ma"
    ));

    // A graph built in place has nothing to report.
    assert_eq!(StrategyGraph::default().load_report(), &CommandReport::default());
}

#[test]
fn test_save_round_trip() {
    let graph = StrategyGraph::from_document(StrategyDocument::from_json(STRATEGY).unwrap()).unwrap();
    let saved = graph.to_document().unwrap();

    let reloaded = StrategyGraph::from_document(
        StrategyDocument::from_json(&saved.to_json().unwrap()).unwrap(),
    )
    .unwrap();

    assert_eq!(reloaded.to_document().unwrap(), saved);
    assert_eq!(saved.nodes[0].node_type, NodeType::Start);
    assert!(saved.nodes[2].position.is_null());
    assert_eq!(saved.chart_config["layout"], "grid");
}

#[test]
fn test_save_and_load_file() {
    let mut graph = StrategyGraph::default();
    graph.add_node(kline_node("kline", &[(1, "BTCUSDT", "1h")])).unwrap();
    graph.add_node(if_else_node("cond", None)).unwrap();
    graph.connect(link_default("kline", "cond")).unwrap();

    let path = std::env::temp_dir().join(format!("stratflow-{}.json", std::process::id()));
    graph.save(&path).unwrap();
    let loaded = StrategyGraph::from_document(StrategyDocument::from_file(&path).unwrap()).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(loaded.nodes(), graph.nodes());
    assert_eq!(loaded.edges(), graph.edges());
}

#[test]
fn test_invalid_payload_is_reported() {
    let json = r#"{
        "nodes": [{ "id": "kline", "type": "klineNode", "data": { "nodeName": 7 } }],
        "edges": []
    }"#;
    let result = StrategyGraph::from_document(StrategyDocument::from_json(json).unwrap());

    match result {
        Err(DocumentError::InvalidNodeData { node_id, node_type, .. }) => {
            assert_eq!(node_id, "kline");
            assert_eq!(node_type, NodeType::Kline);
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("expected the payload to be rejected"),
    }
}

#[test]
fn test_unknown_node_type_is_a_parse_error() {
    let json = r#"{ "nodes": [{ "id": "x", "type": "chartNode", "data": {} }] }"#;
    assert!(matches!(
        StrategyDocument::from_json(json),
        Err(DocumentError::JsonParseError(_))
    ));
}

#[test]
fn test_duplicate_node_ids_keep_the_first() {
    let json = r#"{
        "nodes": [
            { "id": "vars", "type": "variableNode", "data": { "nodeName": "First" } },
            { "id": "vars", "type": "variableNode", "data": { "nodeName": "Second" } }
        ]
    }"#;
    let graph = StrategyGraph::from_document(StrategyDocument::from_json(json).unwrap()).unwrap();

    assert_eq!(graph.nodes().len(), 1);
    assert_eq!(graph.node("vars").unwrap().name(), "First");
}

#[test]
fn test_missing_file() {
    let result = StrategyDocument::from_file("/nonexistent/strategy.json");
    assert!(matches!(result, Err(DocumentError::Io { .. })));
}

struct WrappedExport {
    strategy: serde_json::Value,
}

impl IntoDocument for WrappedExport {
    fn into_document(self) -> Result<StrategyDocument, DocumentError> {
        serde_json::from_value(self.strategy).map_err(|e| DocumentError::JsonParseError(e.to_string()))
    }
}

#[test]
fn test_custom_document_source() {
    let export = WrappedExport {
        strategy: serde_json::from_str(STRATEGY).unwrap(),
    };
    let graph = StrategyGraph::builder()
        .with_mode(TradeMode::Backtest)
        .load(export)
        .unwrap();
    assert_eq!(graph.nodes().len(), 3);
}

#[test]
fn test_engine_config_defaults() {
    let config = EngineConfig::from_json("{}").unwrap();
    assert_eq!(config.mode, TradeMode::Backtest);
    assert_eq!(config.logging.level, "info");
    assert!(!config.logging.json);
    assert!(config.backend.is_none());
}

#[test]
fn test_engine_config_sections() {
    let config = EngineConfig::from_json(
        r#"{
            "mode": "live",
            "logging": { "level": "stratflow=debug", "json": true },
            "backend": { "baseUrl": "http://localhost:8080" }
        }"#,
    )
    .unwrap();

    assert_eq!(config.mode, TradeMode::Live);
    assert_eq!(config.logging.level, "stratflow=debug");
    assert!(config.logging.json);
    let backend = config.backend.unwrap();
    assert_eq!(backend.base_url, "http://localhost:8080");
    assert_eq!(backend.timeout_secs, 30);
}

#[test]
fn test_engine_config_errors() {
    assert!(matches!(
        EngineConfig::from_json("{ \"mode\": \"paper\" }"),
        Err(ConfigError::Parse(_))
    ));
    assert!(matches!(
        EngineConfig::from_file("/nonexistent/stratflow.json"),
        Err(ConfigError::Io { .. })
    ));
}
