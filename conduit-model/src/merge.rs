use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How an exporter combines the outputs of several branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// No merging requested.
    None,
    /// Concatenate every branch's text payload, in branch order.
    #[default]
    Concatenate,
    /// Combine records sharing a key.
    MergeByKey,
    /// Combine records at the same position.
    MergeByPosition,
    /// Keep the first branch's payload.
    UseFirst,
    /// Keep the last branch's payload.
    UseLast,
    /// Binding-defined merge.
    Custom,
}

/// What merging an exporter supports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeCapabilities {
    pub supports_merging: bool,
    pub supported_strategies: Vec<MergeStrategy>,
    pub default_strategy: MergeStrategy,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub additional: HashMap<String, serde_json::Value>,
}

impl MergeCapabilities {
    /// The "no merging" sentinel.
    pub fn none() -> Self {
        Self {
            supports_merging: false,
            supported_strategies: Vec::new(),
            default_strategy: MergeStrategy::None,
            additional: HashMap::new(),
        }
    }

    /// Declares merge support for `strategies` (duplicates dropped, order kept).
    pub fn new(strategies: impl IntoIterator<Item = MergeStrategy>, default_strategy: MergeStrategy) -> Self {
        let mut supported_strategies = Vec::new();
        for strategy in strategies {
            if !supported_strategies.contains(&strategy) {
                supported_strategies.push(strategy);
            }
        }
        Self {
            supports_merging: !supported_strategies.is_empty(),
            supported_strategies,
            default_strategy,
            additional: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_additional(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.additional.insert(key.into(), value.into());
        self
    }

    /// Whether `strategy` is declared as supported.
    pub fn supports(&self, strategy: MergeStrategy) -> bool {
        self.supports_merging && self.supported_strategies.contains(&strategy)
    }
}

impl Default for MergeCapabilities {
    fn default() -> Self {
        Self::none()
    }
}
