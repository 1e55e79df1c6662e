//! Type-specific node payloads, in the camelCase wire shape the editor saves.

use super::io::{InputConfig, OperationInputs, OutputBinding, OutputConfig, ValueKind};
use super::{ConfigId, HandleId, NodeId, NodeType, TradeMode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A pair of configurations, one per trading mode. Only the one matching the current
/// mode is read by the resolver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeConfigs<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_config: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backtest_config: Option<T>,
}

impl<T> ModeConfigs<T> {
    pub fn get(&self, mode: TradeMode) -> Option<&T> {
        match mode {
            TradeMode::Live => self.live_config.as_ref(),
            TradeMode::Backtest => self.backtest_config.as_ref(),
        }
    }

    pub fn get_mut(&mut self, mode: TradeMode) -> Option<&mut T> {
        match mode {
            TradeMode::Live => self.live_config.as_mut(),
            TradeMode::Backtest => self.backtest_config.as_mut(),
        }
    }

    pub fn set(&mut self, mode: TradeMode, config: T) {
        match mode {
            TradeMode::Live => self.live_config = Some(config),
            TradeMode::Backtest => self.backtest_config = Some(config),
        }
    }
}

// --- Start ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VariableValueType {
    Number,
    Boolean,
    String,
    Percentage,
    Time,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomVariableConfig {
    pub config_id: ConfigId,
    pub var_name: String,
    pub var_display_name: String,
    pub var_value_type: VariableValueType,
    #[serde(default)]
    pub initial_value: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartConfig {
    #[serde(default)]
    pub time_range: Option<TimeRange>,
    #[serde(default)]
    pub custom_variables: Vec<CustomVariableConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartNodeData {
    pub node_name: String,
    #[serde(flatten)]
    pub configs: ModeConfigs<StartConfig>,
}

// --- Kline ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedSymbol {
    pub config_id: ConfigId,
    pub symbol: String,
    pub interval: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KlineConfig {
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default)]
    pub selected_symbols: Vec<SelectedSymbol>,
    /// Cached from the connected start node.
    #[serde(default)]
    pub time_range: Option<TimeRange>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KlineNodeData {
    pub node_name: String,
    #[serde(flatten)]
    pub configs: ModeConfigs<KlineConfig>,
}

// --- Indicator ---

/// The indicator's local copy of the kline symbol it is computed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolBinding {
    pub from_node_id: NodeId,
    pub from_handle_id: HandleId,
    pub config_id: ConfigId,
    pub symbol: String,
    pub interval: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedIndicator {
    pub config_id: ConfigId,
    pub indicator_type: String,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
    #[serde(default)]
    pub output_fields: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorConfig {
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default)]
    pub source: Option<SymbolBinding>,
    #[serde(default)]
    pub selected_indicators: Vec<SelectedIndicator>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorNodeData {
    pub node_name: String,
    #[serde(flatten)]
    pub configs: ModeConfigs<IndicatorConfig>,
}

// --- Variable ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableConfig {
    pub config_id: ConfigId,
    pub var_name: String,
    pub var_display_name: String,
    pub var_value_type: VariableValueType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableNodeConfig {
    #[serde(default)]
    pub variables: Vec<VariableConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableNodeData {
    pub node_name: String,
    #[serde(flatten)]
    pub configs: ModeConfigs<VariableNodeConfig>,
}

// --- IfElse ---

/// A condition operand's reference to an upstream variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableRef {
    pub from_node_id: NodeId,
    pub from_node_type: NodeType,
    pub from_handle_id: HandleId,
    pub config_id: ConfigId,
    pub var_name: String,
    pub value_kind: ValueKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LogicalSymbol {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComparisonSymbol {
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Equal,
    NotEqual,
    CrossAbove,
    CrossBelow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ConditionOperand {
    Variable {
        #[serde(default)]
        reference: Option<VariableRef>,
    },
    Constant {
        value: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub condition_id: ConfigId,
    #[serde(default)]
    pub left: Option<VariableRef>,
    pub comparison: ComparisonSymbol,
    pub right: ConditionOperand,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseItem {
    pub case_id: ConfigId,
    pub logical_symbol: LogicalSymbol,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IfElseConfig {
    #[serde(default)]
    pub cases: Vec<CaseItem>,
}

impl IfElseConfig {
    /// Every variable reference held by the conditions, left operands first.
    pub fn references_mut(&mut self) -> impl Iterator<Item = &mut Option<VariableRef>> {
        self.cases
            .iter_mut()
            .flat_map(|case| case.conditions.iter_mut())
            .flat_map(|condition| {
                let right = match &mut condition.right {
                    ConditionOperand::Variable { reference } => Some(reference),
                    ConditionOperand::Constant { .. } => None,
                };
                std::iter::once(&mut condition.left).chain(right)
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IfElseNodeData {
    pub node_name: String,
    #[serde(flatten)]
    pub configs: ModeConfigs<IfElseConfig>,
}

// --- Position actions (opaque to the core) ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuturesOrderNodeData {
    pub node_name: String,
    #[serde(default)]
    pub config: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionManagementNodeData {
    pub node_name: String,
    #[serde(default)]
    pub config: serde_json::Value,
}

// --- Operations ---

/// An operation name plus its operation-specific parameters, e.g. `EMA { span: 20 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

impl Operation {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: f64) -> Self {
        self.params.insert(name.into(), value);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationNodeData {
    pub node_name: String,
    pub operation: Operation,
    pub inputs: OperationInputs,
    pub output: OutputConfig,
}

/// One input of an operation group, bound from outside the group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupInput {
    pub config_id: ConfigId,
    pub name: String,
    #[serde(default)]
    pub binding: Option<InputConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationGroupData {
    pub node_name: String,
    #[serde(default)]
    pub inputs: Vec<GroupInput>,
    #[serde(default)]
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationStartData {
    pub node_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationEndData {
    pub node_name: String,
    #[serde(default)]
    pub source: Option<OutputBinding>,
}
