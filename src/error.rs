use crate::model::{NodeId, NodeType};
use crate::topology::Rejection;
use thiserror::Error;

/// Errors returned by graph commands. A failed command leaves the graph untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Node '{0}' not found")]
    NodeNotFound(NodeId),

    #[error("A node with id '{0}' already exists")]
    DuplicateNode(NodeId),

    #[error("Edge '{0}' not found")]
    EdgeNotFound(String),

    #[error(
        "Connection from '{source_node_id}' ({source_handle}) to '{target_node_id}' ({target_handle}) was rejected: {reason}"
    )]
    ConnectionRejected {
        source_node_id: NodeId,
        source_handle: String,
        target_node_id: NodeId,
        target_handle: String,
        reason: Rejection,
    },

    #[error("Node '{node_id}' cannot be placed inside '{parent_id}': {message}")]
    InvalidParent {
        node_id: NodeId,
        parent_id: NodeId,
        message: String,
    },

    #[error("Patch for node '{node_id}' expects a {expected} node, but it is a {found} node")]
    PatchMismatch {
        node_id: NodeId,
        expected: String,
        found: NodeType,
    },

    #[error("Invalid patch for node '{node_id}': {message}")]
    InvalidPatch { node_id: NodeId, message: String },
}

/// Errors that can occur while loading or saving a strategy document.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Failed to parse strategy JSON: {0}")]
    JsonParseError(String),

    #[error("Failed to serialize strategy: {0}")]
    SerializeError(String),

    #[error("Node '{node_id}' has an invalid {node_type} payload: {message}")]
    InvalidNodeData {
        node_id: NodeId,
        node_type: NodeType,
        message: String,
    },

    #[error("Could not access '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised at the execution-backend boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("Request to backend failed: {0}")]
    Transport(String),

    #[error("Backend responded with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Could not decode backend response: {0}")]
    Decode(String),

    #[error("Backend response has no series for key '{0}'")]
    MissingKey(String),
}

/// Errors from building or parsing a series cache key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheKeyError {
    #[error("Cache key component '{component}' is invalid: {message}")]
    InvalidComponent { component: String, message: String },

    #[error("Malformed cache key '{0}'")]
    Malformed(String),
}

/// Errors from loading the engine configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(String),
}
