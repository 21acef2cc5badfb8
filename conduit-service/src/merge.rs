//! Branch merge for exporters.

use conduit_model::MergeStrategy;
use serde_json::Value;
use std::collections::BTreeMap;

/// Combines branch outputs, visiting branches in key order.
///
/// Only text payloads take part; other values are skipped. An empty branch
/// set merges to the empty string under every strategy. Strategies other
/// than `UseFirst` and `UseLast` concatenate.
pub fn merge_branches(branches: &BTreeMap<String, Value>, strategy: MergeStrategy) -> String {
    let mut texts = branches.values().filter_map(Value::as_str);
    match strategy {
        MergeStrategy::UseFirst => texts.next().unwrap_or_default().to_string(),
        MergeStrategy::UseLast => texts.last().unwrap_or_default().to_string(),
        _ => texts.collect(),
    }
}
