//! Condition tree model.
//!
//! Wire format (rules are authored and stored as JSON):
//!
//! ```json
//! { "logic": "and", "conditions": [
//!     { "field": "status", "operator": "eq", "value": "draft" },
//!     { "field": "amount", "operator": "gte", "value": 100 }
//! ] }
//! ```
//!
//! A leaf is `{field, operator, value}` or `{field, operator, values}` for
//! the set operators. Trees nest arbitrarily.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison operator of a leaf condition.
///
/// Operators arriving from a misconfigured rule that this engine does not
/// know deserialize to [`Operator::Unknown`] and evaluate to `false` rather
/// than failing the whole rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Ne,
    In,
    NotIn,
    Gt,
    Lt,
    Gte,
    Lte,
    Contains,
    #[serde(other)]
    Unknown,
}

/// Boolean connective of a composite node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Logic {
    And,
    Or,
}

/// A single field comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub field: String,
    pub operator: Operator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Value>>,
}

impl Comparison {
    pub fn new(field: impl Into<String>, operator: Operator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value: Some(value),
            values: None,
        }
    }

    pub fn with_values(
        field: impl Into<String>,
        operator: Operator,
        values: Vec<Value>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: None,
            values: Some(values),
        }
    }

    /// Scalar expectation: `value`, falling back to the first of `values`.
    pub fn expected(&self) -> Option<&Value> {
        self.value
            .as_ref()
            .or_else(|| self.values.as_ref().and_then(|v| v.first()))
    }

    /// Set expectation: `values`, falling back to `value` as a singleton.
    pub fn expected_set(&self) -> Vec<&Value> {
        match (&self.values, &self.value) {
            (Some(values), _) => values.iter().collect(),
            (None, Some(value)) => vec![value],
            (None, None) => Vec::new(),
        }
    }
}

/// A condition: a leaf comparison or an AND/OR tree of sub-conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    Composite {
        logic: Logic,
        conditions: Vec<Condition>,
    },
    Leaf(Comparison),
}

impl Condition {
    pub fn leaf(field: impl Into<String>, operator: Operator, value: Value) -> Self {
        Self::Leaf(Comparison::new(field, operator, value))
    }

    pub fn all(conditions: Vec<Condition>) -> Self {
        Self::Composite {
            logic: Logic::And,
            conditions,
        }
    }

    pub fn any(conditions: Vec<Condition>) -> Self {
        Self::Composite {
            logic: Logic::Or,
            conditions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn leaf_round_trips() {
        let raw = json!({ "field": "status", "operator": "eq", "value": "draft" });
        let parsed: Condition = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(
            parsed,
            Condition::leaf("status", Operator::Eq, json!("draft"))
        );
        assert_eq!(serde_json::to_value(&parsed).unwrap(), raw);
    }

    #[test]
    fn composite_parses_nested() {
        let raw = json!({
            "logic": "or",
            "conditions": [
                { "field": "status", "operator": "eq", "value": "draft" },
                { "logic": "and", "conditions": [
                    { "field": "amount", "operator": "gt", "value": 10 },
                    { "field": "kind", "operator": "in", "values": ["a", "b"] }
                ] }
            ]
        });
        let parsed: Condition = serde_json::from_value(raw).unwrap();
        match parsed {
            Condition::Composite { logic, conditions } => {
                assert_eq!(logic, Logic::Or);
                assert_eq!(conditions.len(), 2);
                assert!(matches!(conditions[1], Condition::Composite { .. }));
            }
            other => panic!("expected composite, got {other:?}"),
        }
    }

    #[test]
    fn unknown_operator_deserializes() {
        let raw = json!({ "field": "x", "operator": "matches_regex", "value": ".*" });
        let parsed: Condition = serde_json::from_value(raw).unwrap();
        assert_eq!(
            parsed,
            Condition::Leaf(Comparison::new("x", Operator::Unknown, json!(".*")))
        );
    }
}
