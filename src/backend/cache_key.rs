//! Composite keys naming one series at the execution backend:
//! `{kind}|{symbol}|{interval}|{name=value}...`, where `kind` is `kline` or
//! `indicator:{type}` and parameters are sorted by name.

use crate::error::CacheKeyError;
use crate::model::{Node, NodeData, TradeMode};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

const SEPARATOR: char = '|';
const ASSIGN: char = '=';
const INDICATOR_PREFIX: &str = "indicator:";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SeriesKind {
    Kline,
    Indicator(String),
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesKind::Kline => f.write_str("kline"),
            SeriesKind::Indicator(indicator) => write!(f, "{}{}", INDICATOR_PREFIX, indicator),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    kind: SeriesKind,
    symbol: String,
    interval: String,
    params: BTreeMap<String, String>,
}

fn check_component(component: &str, what: &str) -> Result<(), CacheKeyError> {
    let message = if component.is_empty() {
        format!("{} must not be empty", what)
    } else if component.contains(SEPARATOR) || component.contains(ASSIGN) {
        format!("{} must not contain '{}' or '{}'", what, SEPARATOR, ASSIGN)
    } else {
        return Ok(());
    };
    Err(CacheKeyError::InvalidComponent {
        component: component.to_string(),
        message,
    })
}

impl CacheKey {
    pub fn kline(symbol: impl Into<String>, interval: impl Into<String>) -> Result<Self, CacheKeyError> {
        Self::build(SeriesKind::Kline, symbol.into(), interval.into(), BTreeMap::new())
    }

    /// Numeric parameters are rendered with `f64`'s shortest form, so `20.0` becomes `20`.
    pub fn indicator(
        indicator_type: impl Into<String>,
        symbol: impl Into<String>,
        interval: impl Into<String>,
        params: &BTreeMap<String, f64>,
    ) -> Result<Self, CacheKeyError> {
        let params = params
            .iter()
            .map(|(name, value)| (name.clone(), value.to_string()))
            .collect();
        Self::build(
            SeriesKind::Indicator(indicator_type.into()),
            symbol.into(),
            interval.into(),
            params,
        )
    }

    fn build(
        kind: SeriesKind,
        symbol: String,
        interval: String,
        params: BTreeMap<String, String>,
    ) -> Result<Self, CacheKeyError> {
        if let SeriesKind::Indicator(indicator) = &kind {
            check_component(indicator, "indicator type")?;
        }
        check_component(&symbol, "symbol")?;
        check_component(&interval, "interval")?;
        for (name, value) in &params {
            check_component(name, "parameter name")?;
            check_component(value, "parameter value")?;
        }
        Ok(Self {
            kind,
            symbol,
            interval,
            params,
        })
    }

    pub fn kind(&self) -> &SeriesKind {
        &self.kind
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn interval(&self) -> &str {
        &self.interval
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}{}{}", self.kind, SEPARATOR, self.symbol, SEPARATOR, self.interval)?;
        for (name, value) in &self.params {
            write!(f, "{}{}{}{}", SEPARATOR, name, ASSIGN, value)?;
        }
        Ok(())
    }
}

impl FromStr for CacheKey {
    type Err = CacheKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || CacheKeyError::Malformed(s.to_string());
        let mut parts = s.split(SEPARATOR);
        let (Some(kind), Some(symbol), Some(interval)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };
        let kind = match kind {
            "kline" => SeriesKind::Kline,
            other => SeriesKind::Indicator(
                other
                    .strip_prefix(INDICATOR_PREFIX)
                    .ok_or_else(malformed)?
                    .to_string(),
            ),
        };
        let params = parts
            .map(|pair| {
                pair.split_once(ASSIGN)
                    .map(|(name, value)| (name.to_string(), value.to_string()))
                    .ok_or_else(malformed)
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Self::build(kind, symbol.to_string(), interval.to_string(), params)
    }
}

impl Serialize for CacheKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CacheKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The keys of every series `node` asks the backend for under `mode`: one per selected
/// symbol of a kline node, one per selected indicator of an indicator node whose source
/// symbol is bound. Other node types request nothing.
pub fn node_cache_keys(node: &Node, mode: TradeMode) -> Result<Vec<CacheKey>, CacheKeyError> {
    match &node.data {
        NodeData::Kline(data) => data
            .configs
            .get(mode)
            .map(|config| {
                config
                    .selected_symbols
                    .iter()
                    .map(|s| CacheKey::kline(s.symbol.clone(), s.interval.clone()))
                    .collect::<Result<Vec<_>, _>>()
            })
            .unwrap_or_else(|| Ok(Vec::new())),
        NodeData::Indicator(data) => match data.configs.get(mode) {
            Some(config) => match &config.source {
                Some(source) => config
                    .selected_indicators
                    .iter()
                    .map(|i| {
                        CacheKey::indicator(
                            i.indicator_type.clone(),
                            source.symbol.clone(),
                            source.interval.clone(),
                            &i.params,
                        )
                    })
                    .collect::<Result<Vec<_>, _>>(),
                None => Ok(Vec::new()),
            },
            None => Ok(Vec::new()),
        },
        _ => Ok(Vec::new()),
    }
}
