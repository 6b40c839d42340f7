//! Condition evaluation.
//!
//! - No IO
//! - No panics
//! - Fail closed: unknown operators and non-numeric operands of numeric
//!   comparisons yield `false`, never an error.

use serde_json::Value;

use recordflow_core::Record;

use crate::tree::{Comparison, Condition, Logic, Operator};

/// Evaluate an optional condition against a record.
///
/// An absent condition is an unconditional rule and evaluates to `true`.
pub fn evaluate(condition: Option<&Condition>, record: &Record) -> bool {
    match condition {
        None => true,
        Some(node) => eval_node(node, record),
    }
}

fn eval_node(node: &Condition, record: &Record) -> bool {
    match node {
        Condition::Composite {
            logic: Logic::And,
            conditions,
        } => conditions.iter().all(|c| eval_node(c, record)),
        Condition::Composite {
            logic: Logic::Or,
            conditions,
        } => conditions.iter().any(|c| eval_node(c, record)),
        Condition::Leaf(cmp) => eval_comparison(cmp, record),
    }
}

fn eval_comparison(cmp: &Comparison, record: &Record) -> bool {
    let actual = record.field(&cmp.field).unwrap_or(&Value::Null);

    match cmp.operator {
        Operator::Eq => cmp.expected().is_some_and(|e| loose_eq(actual, e)),
        Operator::Ne => cmp.expected().is_some_and(|e| !loose_eq(actual, e)),
        Operator::In => cmp.expected_set().iter().any(|e| loose_eq(actual, e)),
        Operator::NotIn => !cmp.expected_set().iter().any(|e| loose_eq(actual, e)),
        Operator::Gt => numeric_cmp(actual, cmp.expected()).is_some_and(|o| o > 0.0),
        Operator::Lt => numeric_cmp(actual, cmp.expected()).is_some_and(|o| o < 0.0),
        Operator::Gte => numeric_cmp(actual, cmp.expected()).is_some_and(|o| o >= 0.0),
        Operator::Lte => numeric_cmp(actual, cmp.expected()).is_some_and(|o| o <= 0.0),
        Operator::Contains => cmp
            .expected()
            .is_some_and(|e| stringify(actual).contains(&stringify(e))),
        Operator::Unknown => false,
    }
}

/// Loose equality: strict JSON equality, or equal canonical string forms.
///
/// Record stores routinely hold numbers as strings ("5" vs 5); treating
/// those as equal matches how rules are authored in practice.
fn loose_eq(a: &Value, b: &Value) -> bool {
    a == b || stringify(a) == stringify(b)
}

/// `actual - expected` when both sides coerce to f64, else `None`.
fn numeric_cmp(actual: &Value, expected: Option<&Value>) -> Option<f64> {
    let a = as_f64(actual)?;
    let b = as_f64(expected?)?;
    Some(a - b)
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Canonical string form used by `contains` and loose equality.
///
/// Strings render without quotes, null as empty, everything else as its
/// compact JSON form.
fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => Record::from_map(map),
            _ => panic!("test record must be an object"),
        }
    }

    fn sample() -> Record {
        record(json!({
            "status": "draft",
            "created_by": "u1",
            "data": {
                "amount": 150,
                "amount_str": "150",
                "category": "hardware",
                "tags": ["red", "blue"]
            }
        }))
    }

    #[test]
    fn absent_condition_is_true() {
        assert!(evaluate(None, &sample()));
    }

    #[test]
    fn eq_and_ne() {
        let r = sample();
        assert!(evaluate(
            Some(&Condition::leaf("status", Operator::Eq, json!("draft"))),
            &r
        ));
        assert!(!evaluate(
            Some(&Condition::leaf("status", Operator::Eq, json!("done"))),
            &r
        ));
        assert!(evaluate(
            Some(&Condition::leaf("status", Operator::Ne, json!("done"))),
            &r
        ));
    }

    #[test]
    fn eq_is_loose_across_number_and_string() {
        let r = sample();
        assert!(evaluate(
            Some(&Condition::leaf("amount", Operator::Eq, json!("150"))),
            &r
        ));
        assert!(evaluate(
            Some(&Condition::leaf("amount_str", Operator::Eq, json!(150))),
            &r
        ));
    }

    #[test]
    fn in_and_not_in() {
        let r = sample();
        let cond = Condition::Leaf(Comparison::with_values(
            "category",
            Operator::In,
            vec![json!("hardware"), json!("software")],
        ));
        assert!(evaluate(Some(&cond), &r));

        let cond = Condition::Leaf(Comparison::with_values(
            "category",
            Operator::NotIn,
            vec![json!("services")],
        ));
        assert!(evaluate(Some(&cond), &r));
    }

    #[test]
    fn numeric_comparisons() {
        let r = sample();
        assert!(evaluate(
            Some(&Condition::leaf("amount", Operator::Gt, json!(100))),
            &r
        ));
        assert!(evaluate(
            Some(&Condition::leaf("amount", Operator::Gte, json!(150))),
            &r
        ));
        assert!(!evaluate(
            Some(&Condition::leaf("amount", Operator::Lt, json!(150))),
            &r
        ));
        assert!(evaluate(
            Some(&Condition::leaf("amount", Operator::Lte, json!(150))),
            &r
        ));
        // String operand that parses as a number still compares.
        assert!(evaluate(
            Some(&Condition::leaf("amount_str", Operator::Gt, json!(100))),
            &r
        ));
    }

    #[test]
    fn numeric_comparison_on_non_numeric_is_false_not_error() {
        let r = sample();
        assert!(!evaluate(
            Some(&Condition::leaf("status", Operator::Gt, json!(1))),
            &r
        ));
        assert!(!evaluate(
            Some(&Condition::leaf("tags", Operator::Lte, json!(5))),
            &r
        ));
    }

    #[test]
    fn contains_stringifies_both_sides() {
        let r = sample();
        assert!(evaluate(
            Some(&Condition::leaf("category", Operator::Contains, json!("hard"))),
            &r
        ));
        assert!(evaluate(
            Some(&Condition::leaf("tags", Operator::Contains, json!("blue"))),
            &r
        ));
        assert!(!evaluate(
            Some(&Condition::leaf("category", Operator::Contains, json!("soft"))),
            &r
        ));
    }

    #[test]
    fn missing_field_fails_comparisons() {
        let r = sample();
        assert!(!evaluate(
            Some(&Condition::leaf("missing", Operator::Eq, json!("x"))),
            &r
        ));
        assert!(!evaluate(
            Some(&Condition::leaf("missing", Operator::Gt, json!(0))),
            &r
        ));
    }

    #[test]
    fn and_or_composition() {
        let r = sample();
        let both = Condition::all(vec![
            Condition::leaf("status", Operator::Eq, json!("draft")),
            Condition::leaf("amount", Operator::Gt, json!(100)),
        ]);
        assert!(evaluate(Some(&both), &r));

        let one_bad = Condition::all(vec![
            Condition::leaf("status", Operator::Eq, json!("draft")),
            Condition::leaf("amount", Operator::Gt, json!(1000)),
        ]);
        assert!(!evaluate(Some(&one_bad), &r));

        let either = Condition::any(vec![
            Condition::leaf("status", Operator::Eq, json!("done")),
            Condition::leaf("amount", Operator::Gt, json!(100)),
        ]);
        assert!(evaluate(Some(&either), &r));
    }

    #[test]
    fn empty_composites() {
        let r = sample();
        assert!(evaluate(Some(&Condition::all(vec![])), &r));
        assert!(!evaluate(Some(&Condition::any(vec![])), &r));
    }

    #[test]
    fn unknown_operator_is_false() {
        let r = sample();
        assert!(!evaluate(
            Some(&Condition::leaf("status", Operator::Unknown, json!("draft"))),
            &r
        ));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_value() -> impl Strategy<Value = Value> {
            prop_oneof![
                Just(Value::Null),
                any::<bool>().prop_map(Value::from),
                any::<i64>().prop_map(Value::from),
                any::<f64>().prop_filter("finite", |f| f.is_finite()).prop_map(Value::from),
                "[a-z0-9 ]{0,16}".prop_map(Value::from),
            ]
        }

        fn arb_operator() -> impl Strategy<Value = Operator> {
            prop_oneof![
                Just(Operator::Eq),
                Just(Operator::Ne),
                Just(Operator::In),
                Just(Operator::NotIn),
                Just(Operator::Gt),
                Just(Operator::Lt),
                Just(Operator::Gte),
                Just(Operator::Lte),
                Just(Operator::Contains),
                Just(Operator::Unknown),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 512,
                ..ProptestConfig::default()
            })]

            /// Evaluation is total: arbitrary operands never panic.
            #[test]
            fn evaluation_never_panics(
                field_value in arb_value(),
                expected in arb_value(),
                operator in arb_operator()
            ) {
                let mut r = Record::new();
                r.set_data_field("f", field_value);
                let cond = Condition::leaf("f", operator, expected);
                let _ = evaluate(Some(&cond), &r);
            }

            /// `eq` and `ne` are complements for present expectations.
            #[test]
            fn eq_ne_complement(
                field_value in arb_value(),
                expected in arb_value()
            ) {
                let mut r = Record::new();
                r.set_data_field("f", field_value);
                let eq = evaluate(Some(&Condition::leaf("f", Operator::Eq, expected.clone())), &r);
                let ne = evaluate(Some(&Condition::leaf("f", Operator::Ne, expected)), &r);
                prop_assert_ne!(eq, ne);
            }
        }
    }
}
