//! Flattening nested report data into line items.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::aggregate::{count_from_json, decimal_from_json};

/// Key marking a terminal grouping node.
pub const VALUES_KEY: &str = "values";

/// One leaf record from a report's `values` list.
///
/// The record is kept exactly as the server sent it. Dimension fields such as
/// `date`, `account` or `instance_type` are reachable through [`LineItem::get`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineItem(Value);

impl LineItem {
    /// Wrap a raw record.
    #[must_use]
    pub const fn new(value: Value) -> Self {
        Self(value)
    }

    /// The `total` field (cost or storage usage). `None` when null, missing or
    /// not numeric.
    #[must_use]
    pub fn total(&self) -> Option<Decimal> {
        self.0.get("total").and_then(decimal_from_json)
    }

    /// The `count` field of instance reports.
    #[must_use]
    pub fn count(&self) -> Option<i64> {
        self.0.get("count").and_then(count_from_json)
    }

    /// Look up any other field of the record.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Borrow the raw record.
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consume the item, returning the raw record.
    #[must_use]
    pub fn into_inner(self) -> Value {
        self.0
    }
}

impl From<Value> for LineItem {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Collect every line item reachable from `data`, depth first, in document
/// order.
///
/// A mapping holding a `values` key is a leaf: the contents of `values` are
/// the line items for that branch and its sibling keys are not visited.
/// Scalars, `null` and empty containers contribute nothing.
#[must_use]
pub fn line_items(data: &Value) -> Vec<LineItem> {
    let mut items = Vec::new();
    let mut stack = vec![data];

    while let Some(node) = stack.pop() {
        match node {
            Value::Array(elements) => {
                stack.extend(elements.iter().rev().filter(|v| is_container(v)));
            }
            Value::Object(map) => {
                if let Some(values) = map.get(VALUES_KEY) {
                    match values {
                        Value::Array(entries) => {
                            items.extend(entries.iter().cloned().map(LineItem));
                        }
                        Value::Null => {}
                        other => {
                            warn!(kind = json_kind(other), "Ignoring non-list 'values' entry");
                        }
                    }
                    continue;
                }
                stack.extend(map.values().rev().filter(|v| is_container(v)));
            }
            _ => {}
        }
    }

    items
}

/// Whether a node has nothing to traverse or sum: `null`, `false`, zero, an
/// empty string or an empty container.
#[must_use]
pub fn is_empty_node(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

fn is_container(value: &Value) -> bool {
    matches!(value, Value::Array(_) | Value::Object(_))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn totals(items: &[LineItem]) -> Vec<Option<Decimal>> {
        items.iter().map(LineItem::total).collect()
    }

    #[test]
    fn scalars_and_empty_nodes_yield_nothing() {
        for data in [json!(null), json!([]), json!({}), json!(3), json!("x"), json!(true)] {
            assert!(line_items(&data).is_empty(), "{data}");
        }
    }

    #[test]
    fn flat_cost_report() {
        let data = json!([
            {"date": "2018-07-01", "values": [{"date": "2018-07-01", "total": 1.5}]},
            {"date": "2018-07-02", "values": [{"date": "2018-07-02", "total": 2.25}]}
        ]);

        let items = line_items(&data);
        assert_eq!(totals(&items), vec![Some(dec!(1.5)), Some(dec!(2.25))]);
    }

    #[test]
    fn nested_groups_preserve_document_order() {
        let data = json!([
            {"date": "2018-07-01", "accounts": [
                {"account": "a1", "services": [
                    {"service": "EC2", "values": [{"total": 1}]},
                    {"service": "S3", "values": [{"total": 2}]}
                ]},
                {"account": "a2", "services": [
                    {"service": "EC2", "values": [{"total": 3}]}
                ]}
            ]},
            {"date": "2018-07-02", "accounts": [
                {"account": "a1", "values": [{"total": 4}, {"total": 5}]}
            ]}
        ]);

        let items = line_items(&data);
        assert_eq!(
            totals(&items),
            vec![
                Some(dec!(1)),
                Some(dec!(2)),
                Some(dec!(3)),
                Some(dec!(4)),
                Some(dec!(5))
            ]
        );
    }

    #[test]
    fn values_short_circuits_sibling_branches() {
        let data = json!({
            "values": [{"total": 7}, {"total": 8}],
            "other_branch": {"values": [{"total": 1000}]}
        });

        let items = line_items(&data);
        assert_eq!(totals(&items), vec![Some(dec!(7)), Some(dec!(8))]);
    }

    #[test]
    fn values_entries_are_not_traversed() {
        let data = json!([{"values": [{"total": 1, "values": [{"total": 99}]}]}]);

        let items = line_items(&data);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].total(), Some(dec!(1)));
    }

    #[test]
    fn scalar_siblings_are_skipped() {
        let data = json!([1, "two", null, {"values": [{"total": 3}]}, false]);
        assert_eq!(totals(&line_items(&data)), vec![Some(dec!(3))]);
    }

    #[test]
    fn malformed_values_entry_contributes_nothing() {
        let data = json!([
            {"values": "oops", "nested": {"values": [{"total": 5}]}},
            {"values": null},
            {"values": [{"total": 1}]}
        ]);

        assert_eq!(totals(&line_items(&data)), vec![Some(dec!(1))]);
    }

    #[test]
    fn data_without_values_has_no_items() {
        let data = json!([{"date": "2020-01-01"}]);
        assert!(line_items(&data).is_empty());
    }

    #[test]
    fn deep_nesting_does_not_recurse() {
        let mut data = json!({"values": [{"total": 1}]});
        for _ in 0..5_000 {
            let mut group = serde_json::Map::new();
            group.insert("group".to_string(), data);
            data = Value::Array(vec![Value::Object(group)]);
        }

        assert_eq!(line_items(&data).len(), 1);

        // Unwind iteratively; dropping the nested value recursively would
        // overflow the test thread's stack.
        let mut node = data;
        while let Value::Array(mut elements) = node {
            node = elements
                .pop()
                .and_then(|mut group| group.get_mut("group").map(Value::take))
                .unwrap_or(Value::Null);
        }
    }

    #[test]
    fn line_item_accessors() {
        let item = LineItem::new(json!({
            "instance_type": "t2.micro",
            "total": null,
            "count": 4
        }));

        assert_eq!(item.total(), None);
        assert_eq!(item.count(), Some(4));
        assert_eq!(item.get("instance_type"), Some(&json!("t2.micro")));
    }

    #[test]
    fn empty_node_detection() {
        assert!(is_empty_node(&json!(null)));
        assert!(is_empty_node(&json!([])));
        assert!(is_empty_node(&json!({})));
        assert!(is_empty_node(&json!(0)));
        assert!(is_empty_node(&json!("")));
        assert!(!is_empty_node(&json!([{"date": "2020-01-01"}])));
        assert!(!is_empty_node(&json!(1)));
    }
}
