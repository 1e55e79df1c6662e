use crate::error::DocumentError;
use crate::model::NodeType;
use ahash::{AHashMap, AHashSet};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

/// How many inbound connections a consumer tolerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionLimit {
    Unbounded,
    AtMost(usize),
}

impl ConnectionLimit {
    /// Maps the table encoding: `-1` is unbounded, `n >= 0` is a hard cap.
    pub fn from_raw(raw: i64) -> Self {
        if raw < 0 {
            ConnectionLimit::Unbounded
        } else {
            ConnectionLimit::AtMost(raw as usize)
        }
    }

    pub fn allows(&self, current_count: usize) -> bool {
        match self {
            ConnectionLimit::Unbounded => true,
            ConnectionLimit::AtMost(limit) => current_count < *limit,
        }
    }
}

/// What the limit counts: every inbound edge of the node, or only those on the
/// proposed target handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LimitScope {
    Node,
    Handle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitRule {
    pub limit: ConnectionLimit,
    pub scope: LimitScope,
}

/// The two static tables consulted by the connection validator. Node types absent from
/// either table accept no connections.
#[derive(Debug, Clone, Default)]
pub struct CompatibilityTables {
    connections: AHashMap<NodeType, AHashSet<NodeType>>,
    limits: AHashMap<NodeType, LimitRule>,
}

static STANDARD_TABLES: LazyLock<Arc<CompatibilityTables>> =
    LazyLock::new(|| Arc::new(build_standard_tables()));

impl CompatibilityTables {
    /// The built-in tables, initialised once per process and shared.
    pub fn standard() -> Arc<CompatibilityTables> {
        Arc::clone(&STANDARD_TABLES)
    }

    pub fn builder() -> CompatibilityTablesBuilder {
        CompatibilityTablesBuilder::default()
    }

    /// Loads tables from JSON shaped as
    /// `{ "connectionMap": { producer: [consumer, ..] }, "connectionLimit": { consumer: n },
    ///    "handleScoped": [consumer, ..] }`.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let raw: RawTables =
            serde_json::from_str(json).map_err(|e| DocumentError::JsonParseError(e.to_string()))?;
        let mut builder = CompatibilityTables::builder();
        for (producer, consumers) in raw.connection_map {
            builder = builder.allow(producer, &consumers);
        }
        for (consumer, raw_limit) in raw.connection_limit {
            let scope = if raw.handle_scoped.contains(&consumer) {
                LimitScope::Handle
            } else {
                LimitScope::Node
            };
            builder = builder.limit(consumer, raw_limit, scope);
        }
        Ok(builder.build())
    }

    pub fn allows(&self, producer: NodeType, consumer: NodeType) -> bool {
        self.connections
            .get(&producer)
            .is_some_and(|consumers| consumers.contains(&consumer))
    }

    pub fn limit(&self, consumer: NodeType) -> Option<LimitRule> {
        self.limits.get(&consumer).copied()
    }

    pub fn consumers_of(&self, producer: NodeType) -> Option<&AHashSet<NodeType>> {
        self.connections.get(&producer)
    }
}

#[derive(Debug, Default)]
pub struct CompatibilityTablesBuilder {
    tables: CompatibilityTables,
}

impl CompatibilityTablesBuilder {
    pub fn allow(mut self, producer: NodeType, consumers: &[NodeType]) -> Self {
        self.tables
            .connections
            .entry(producer)
            .or_default()
            .extend(consumers.iter().copied());
        self
    }

    pub fn limit(mut self, consumer: NodeType, raw_limit: i64, scope: LimitScope) -> Self {
        self.tables.limits.insert(
            consumer,
            LimitRule {
                limit: ConnectionLimit::from_raw(raw_limit),
                scope,
            },
        );
        self
    }

    pub fn build(self) -> CompatibilityTables {
        self.tables
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTables {
    connection_map: BTreeMap<NodeType, Vec<NodeType>>,
    connection_limit: BTreeMap<NodeType, i64>,
    #[serde(default)]
    handle_scoped: Vec<NodeType>,
}

fn build_standard_tables() -> CompatibilityTables {
    use NodeType::*;

    CompatibilityTables::builder()
        .allow(Start, &[Kline, Variable, IfElse, Operation, OperationGroup])
        .allow(Kline, &[Indicator, IfElse, Variable, Operation, OperationGroup])
        .allow(Indicator, &[IfElse, Variable, Operation, OperationGroup])
        .allow(Variable, &[IfElse, Variable, Operation, OperationGroup])
        .allow(IfElse, &[FuturesOrder, PositionManagement, Variable, IfElse])
        .allow(Operation, &[Operation, OperationEnd, IfElse, Variable, OperationGroup])
        .allow(OperationStart, &[Operation])
        .allow(OperationGroup, &[Operation, OperationGroup, IfElse, Variable])
        .limit(Start, 0, LimitScope::Node)
        .limit(Kline, 1, LimitScope::Node)
        .limit(Indicator, 1, LimitScope::Node)
        .limit(Variable, -1, LimitScope::Node)
        .limit(IfElse, -1, LimitScope::Node)
        .limit(FuturesOrder, -1, LimitScope::Node)
        .limit(PositionManagement, -1, LimitScope::Node)
        .limit(Operation, 1, LimitScope::Handle)
        .limit(OperationGroup, 1, LimitScope::Handle)
        .limit(OperationStart, 0, LimitScope::Node)
        .limit(OperationEnd, 1, LimitScope::Node)
        .build()
}
