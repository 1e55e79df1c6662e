//! Loading and saving strategies.
//!
//! The document shape is not versioned; a document is accepted as long as every node
//! payload parses for its declared type. Edges the connection validator would refuse are
//! dropped, except that saved edges may exceed a connection limit.

use crate::error::DocumentError;
use crate::graph::{GraphEvent, StrategyGraph, StrategyGraphBuilder};
use crate::model::{EdgeId, Node};
use crate::topology::check_saved_connection;
use ahash::AHashSet;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub mod conversion;
pub mod definition;

pub use conversion::IntoDocument;
pub use definition::{RawNode, StrategyDocument};

impl StrategyDocument {
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        serde_json::from_str(json).map_err(|e| DocumentError::JsonParseError(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        serde_json::to_string_pretty(self).map_err(|e| DocumentError::SerializeError(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DocumentError> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?).map_err(|source| DocumentError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

impl StrategyGraphBuilder {
    /// Builds the graph and fills it from a saved document, then reconciles every
    /// reference once.
    pub fn load(self, source: impl IntoDocument) -> Result<StrategyGraph, DocumentError> {
        let document = source.into_document()?;
        let mut graph = self.build();

        let mut seen: AHashSet<String> = AHashSet::new();
        for raw in document.nodes {
            if !seen.insert(raw.id.clone()) {
                warn!(node_id = %raw.id, "Duplicate node id in document; keeping the first");
                continue;
            }
            let node = Node::try_from(raw)?;
            graph.state_mut().insert_node(node);
        }

        let mut edge_ids: AHashSet<String> = AHashSet::new();
        let mut dropped: Vec<EdgeId> = Vec::new();
        for mut edge in document.edges {
            edge.ensure_id();
            if !edge_ids.insert(edge.id.clone()) {
                warn!(edge_id = %edge.id, "Dropping duplicate edge");
                continue;
            }
            if let Err(reason) = check_saved_connection(&edge, graph.state(), graph.tables()) {
                warn!(edge_id = %edge.id, %reason, "Dropping invalid edge");
                dropped.push(edge.id);
                continue;
            }
            graph.state_mut().push_edge(edge);
        }
        graph.state_mut().set_chart_config(document.chart_config);

        info!(
            nodes = graph.nodes().len(),
            edges = graph.edges().len(),
            dropped = dropped.len(),
            "Strategy loaded"
        );
        let mut report = graph.dispatch([GraphEvent::Loaded]);
        dropped.append(&mut report.removed_edges);
        report.removed_edges = dropped;
        graph.set_load_report(report);
        Ok(graph)
    }
}

impl StrategyGraph {
    /// Loads a document with the standard tables and registry.
    pub fn from_document(source: impl IntoDocument) -> Result<Self, DocumentError> {
        Self::builder().load(source)
    }

    pub fn to_document(&self) -> Result<StrategyDocument, DocumentError> {
        let nodes = self
            .nodes()
            .iter()
            .map(RawNode::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(StrategyDocument {
            nodes,
            edges: self.edges().to_vec(),
            chart_config: self.state().chart_config().clone(),
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DocumentError> {
        self.to_document()?.save(path.as_ref())?;
        info!(path = %path.as_ref().display(), "Strategy saved");
        Ok(())
    }
}
