//! # Stratflow - Strategy Graph Engine
//!
//! **Stratflow** keeps a visually composed trading strategy consistent while it is being
//! edited. A strategy is a directed graph of typed nodes (market data, indicators,
//! operations, conditions, position actions) whose connections carry named variables.
//! The engine decides which connections are legal, computes what each node can see
//! upstream, repairs downstream references when producers change, and derives the output
//! type of every operation node.
//!
//! ## Core Workflow
//!
//! 1.  **Build or load a graph**: Use `StrategyGraph::builder()` or load a saved
//!     `{ nodes, edges, chartConfig }` document with `StrategyGraph::from_document`.
//! 2.  **Edit it through commands**: `add_node`, `connect`, `disconnect`, `delete_node` and
//!     `update_node_config` are applied atomically. Rejected edits return an error and
//!     leave the graph untouched.
//! 3.  **Read derived views**: `resolve_variables` lists what a node can reference;
//!     synchronization notices are returned with every command.
//! 4.  **Fetch series**: `node_cache_keys` names the series a node needs and
//!     `FetchCoordinator` runs backend fetches without blocking further edits.
//!
//! ## Quick Start
//!
//! ```rust
//! use stratflow::prelude::*;
//!
//! fn main() -> Result<(), GraphError> {
//!     let mut graph = StrategyGraph::builder().with_mode(TradeMode::Backtest).build();
//!
//!     let mut kline = KlineNodeData {
//!         node_name: "Market".to_string(),
//!         ..Default::default()
//!     };
//!     kline.configs.set(
//!         TradeMode::Backtest,
//!         KlineConfig {
//!             selected_symbols: vec![SelectedSymbol {
//!                 config_id: 1,
//!                 symbol: "BTCUSDT".to_string(),
//!                 interval: "1h".to_string(),
//!             }],
//!             ..Default::default()
//!         },
//!     );
//!     graph.add_node(Node::new("kline", NodeData::Kline(kline)))?;
//!
//!     let resolver = graph.operation_resolver();
//!     let data = resolver.new_node_data("op", InputArity::Unary);
//!     graph.add_node(Node::new("op", NodeData::Operation(data)))?;
//!
//!     let report = graph.connect(Edge::new(
//!         "kline",
//!         handle::output("kline", 1),
//!         "op",
//!         handle::input("op", 1),
//!     ))?;
//!     assert!(report.edge_id.is_some());
//!
//!     let upstream = graph.resolve_variables("op");
//!     assert_eq!(upstream[0].variables.len(), 1);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod document;
pub mod error;
pub mod graph;
pub mod model;
pub mod operation;
pub mod prelude;
pub mod sync;
pub mod topology;
pub mod variables;
