//! Prelude module for convenient imports
//!
//! Re-exports the types needed to build, edit, load and save a strategy graph.
//!
//! ```rust,no_run
//! use stratflow::prelude::*;
//!
//! # fn run_example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut graph = StrategyGraph::from_document(StrategyDocument::from_file("strategy.json")?)?;
//! let report = graph.set_mode(TradeMode::Live);
//! for notice in &report.notices {
//!     println!("{}", notice);
//! }
//! graph.save("strategy.json")?;
//! # Ok(())
//! # }
//! ```

// Graph state and commands
pub use crate::graph::{
    CommandReport, GraphEvent, GraphObserver, GraphState, NodePatch, ObserverOutcome,
    StrategyGraph, StrategyGraphBuilder, SyncNotice,
};

// Node and edge model
pub use crate::model::handle;
pub use crate::model::*;

// Derived views and typing
pub use crate::operation::{InputSlot, OperationRegistry, OperationTypeResolver};
pub use crate::topology::{CompatibilityTables, is_valid_connection};
pub use crate::variables::resolve_variables;

// Persistence and configuration
pub use crate::config::EngineConfig;
pub use crate::document::{IntoDocument, StrategyDocument};

// Backend boundary
pub use crate::backend::{
    CacheKey, FetchCoordinator, HistoryRequest, SeriesBackend, SeriesRecord, SeriesStore,
    node_cache_keys,
};

// Error types
pub use crate::error::{BackendError, CacheKeyError, ConfigError, DocumentError, GraphError};
