//! Join/merge evaluation over two record streams.
//!
//! A join node combines its `A` and `B` inputs under a strategy:
//! - `concat`: ordered concatenation, no keys involved
//! - `mergeByKey`: relational join on a configured key, inner or outer
//!
//! Evaluation never mutates its inputs. Multiple matches on the same key
//! value produce the cross-product of matches, not a collapsed result.

use crate::error::FieldError;
use crate::record::RecordSet;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// How two record streams are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JoinStrategy {
    /// Output is `A` then `B`, in order.
    #[default]
    Concat,
    /// Records are matched on a join key and merged.
    MergeByKey,
}

/// Which records survive a keyed merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinType {
    /// Only matched pairs appear in the output.
    #[default]
    Inner,
    /// Every record from both sides is represented at least once;
    /// unmatched records keep only their own fields.
    Outer,
}

/// Combines two record sets under the given strategy.
///
/// For `MergeByKey` without a usable key this degrades to concatenation,
/// mirroring how the execution backend treats the same configuration.
/// Configuration-time validation ([`validate_params`]) blocks that state
/// from being saved in the first place.
#[must_use]
pub fn evaluate(
    a: &RecordSet,
    b: &RecordSet,
    strategy: JoinStrategy,
    join_type: JoinType,
    join_key: Option<&str>,
) -> RecordSet {
    match (strategy, join_key) {
        (JoinStrategy::MergeByKey, Some(key)) if !key.is_empty() => {
            merge_by_key(a, b, join_type, key)
        }
        _ => concat(a, b),
    }
}

fn concat(a: &RecordSet, b: &RecordSet) -> RecordSet {
    a.iter().chain(b.iter()).cloned().collect()
}

fn merge_by_key(a: &RecordSet, b: &RecordSet, join_type: JoinType, key: &str) -> RecordSet {
    let mut output = RecordSet::new();
    let mut b_matched = vec![false; b.len()];

    for a_record in a {
        let a_key = a_record.get(key);
        let mut a_matched = false;

        // Records lacking the key never match anything.
        if let Some(a_key) = a_key {
            for (b_index, b_record) in b.iter().enumerate() {
                if b_record.get(key) == Some(a_key) {
                    output.push(merge_pair(a_record, b_record, key));
                    a_matched = true;
                    b_matched[b_index] = true;
                }
            }
        }

        if !a_matched && join_type == JoinType::Outer {
            output.push(a_record.clone());
        }
    }

    if join_type == JoinType::Outer {
        for (b_index, b_record) in b.iter().enumerate() {
            if !b_matched[b_index] {
                output.push(b_record.clone());
            }
        }
    }

    output
}

/// Merges one matched pair: `b`'s fields overwrite `a`'s, except the join
/// key itself, which is taken from whichever side has it.
fn merge_pair(a: &JsonValue, b: &JsonValue, key: &str) -> JsonValue {
    let mut merged = a.clone();
    let (Some(merged_map), Some(b_map)) = (merged.as_object_mut(), b.as_object()) else {
        return merged;
    };
    for (field, value) in b_map {
        if field == key && merged_map.contains_key(key) {
            continue;
        }
        merged_map.insert(field.clone(), value.clone());
    }
    merged
}

/// Validates a join node's configuration payload.
///
/// `mergeByKey` with an empty `joinKey` blocks the save. Zero common
/// fields between the inputs is *not* an error: the user may type a key
/// manually before the workflow has ever run.
#[must_use]
pub fn validate_params(params: &JsonValue) -> Vec<FieldError> {
    let mut errors = Vec::new();

    let strategy = params.get("joinStrategy").and_then(JsonValue::as_str);
    match strategy {
        None | Some("concat") => {}
        Some("mergeByKey") => {
            let key = params.get("joinKey").and_then(JsonValue::as_str);
            if key.is_none_or(str::is_empty) {
                errors.push(FieldError::new(
                    "joinKey",
                    "a join key is required when merging by key",
                ));
            }
        }
        Some(other) => {
            errors.push(FieldError::new(
                "joinStrategy",
                format!("unknown join strategy '{other}'"),
            ));
        }
    }

    if let Some(join_type) = params.get("joinType").and_then(JsonValue::as_str)
        && !matches!(join_type, "inner" | "outer")
    {
        errors.push(FieldError::new(
            "joinType",
            format!("unknown join type '{join_type}'"),
        ));
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set(records: Vec<serde_json::Value>) -> RecordSet {
        RecordSet::from_records(records)
    }

    #[test]
    fn concat_preserves_length_and_order() {
        let a = set(vec![json!({"id": 1}), json!({"id": 2})]);
        let b = set(vec![json!({"id": 3})]);

        let out = evaluate(&a, &b, JoinStrategy::Concat, JoinType::Inner, Some("id"));
        assert_eq!(out.len(), a.len() + b.len());
        assert_eq!(out.records()[0], json!({"id": 1}));
        assert_eq!(out.records()[2], json!({"id": 3}));
        // Inputs are untouched.
        assert_eq!(a.len(), 2);
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn inner_join_drops_unmatched() {
        let a = set(vec![
            json!({"id": "m-1", "amount": 120}),
            json!({"id": "m-2", "amount": 80}),
            json!({"id": "m-3", "amount": 40}),
        ]);
        let b = set(vec![
            json!({"id": "m-2", "region": "north"}),
            json!({"id": "m-9", "region": "south"}),
        ]);

        let out = evaluate(&a, &b, JoinStrategy::MergeByKey, JoinType::Inner, Some("id"));
        assert_eq!(out.len(), 1);
        assert_eq!(
            out.records()[0],
            json!({"id": "m-2", "amount": 80, "region": "north"})
        );
    }

    #[test]
    fn inner_join_produces_cross_product_of_matches() {
        let a = set(vec![
            json!({"id": 1, "a": "x"}),
            json!({"id": 1, "a": "y"}),
        ]);
        let b = set(vec![
            json!({"id": 1, "b": "p"}),
            json!({"id": 1, "b": "q"}),
        ]);

        let out = evaluate(&a, &b, JoinStrategy::MergeByKey, JoinType::Inner, Some("id"));
        // 2 x 2 pairs, one merged record each.
        assert_eq!(out.len(), 4);
        for record in &out {
            assert_eq!(record["id"], 1);
            assert!(record.get("a").is_some());
            assert!(record.get("b").is_some());
        }
    }

    #[test]
    fn outer_join_represents_every_record() {
        let a = set(vec![
            json!({"id": 1, "amount": 10}),
            json!({"id": 2, "amount": 20}),
        ]);
        let b = set(vec![
            json!({"id": 2, "region": "north"}),
            json!({"id": 3, "region": "south"}),
        ]);

        let out = evaluate(&a, &b, JoinStrategy::MergeByKey, JoinType::Outer, Some("id"));
        assert!(out.len() >= a.len().max(b.len()));
        assert_eq!(out.len(), 3);

        // Unmatched records keep only their own fields; the missing side
        // stays absent rather than defaulted.
        let unmatched_a = out.iter().find(|r| r["id"] == 1).unwrap();
        assert!(unmatched_a.get("region").is_none());
        let unmatched_b = out.iter().find(|r| r["id"] == 3).unwrap();
        assert!(unmatched_b.get("amount").is_none());

        let matched = out.iter().find(|r| r["id"] == 2).unwrap();
        assert_eq!(matched["amount"], 20);
        assert_eq!(matched["region"], "north");
    }

    #[test]
    fn records_without_the_key_never_match() {
        let a = set(vec![json!({"amount": 10}), json!({"id": 1, "amount": 20})]);
        let b = set(vec![json!({"id": 1, "region": "east"})]);

        let inner = evaluate(&a, &b, JoinStrategy::MergeByKey, JoinType::Inner, Some("id"));
        assert_eq!(inner.len(), 1);
        assert_eq!(inner.records()[0]["amount"], 20);

        let outer = evaluate(&a, &b, JoinStrategy::MergeByKey, JoinType::Outer, Some("id"));
        assert_eq!(outer.len(), 2);
    }

    #[test]
    fn b_fields_overwrite_a_fields_except_key() {
        let a = set(vec![json!({"id": 1, "status": "draft", "amount": 10})]);
        let b = set(vec![json!({"id": 1, "status": "approved"})]);

        let out = evaluate(&a, &b, JoinStrategy::MergeByKey, JoinType::Inner, Some("id"));
        assert_eq!(
            out.records()[0],
            json!({"id": 1, "status": "approved", "amount": 10})
        );
    }

    #[test]
    fn missing_key_degrades_to_concat() {
        let a = set(vec![json!({"id": 1})]);
        let b = set(vec![json!({"id": 2})]);

        let out = evaluate(&a, &b, JoinStrategy::MergeByKey, JoinType::Inner, None);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn validate_blocks_merge_without_key() {
        let errors = validate_params(&json!({"joinStrategy": "mergeByKey"}));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "joinKey");

        let errors = validate_params(&json!({"joinStrategy": "mergeByKey", "joinKey": ""}));
        assert_eq!(errors.len(), 1);

        let errors =
            validate_params(&json!({"joinStrategy": "mergeByKey", "joinKey": "serial_no"}));
        assert!(errors.is_empty());
    }

    #[test]
    fn validate_accepts_concat_without_key() {
        assert!(validate_params(&json!({"joinStrategy": "concat"})).is_empty());
        assert!(validate_params(&json!({})).is_empty());
    }

    #[test]
    fn validate_rejects_unknown_strategy_and_type() {
        let errors = validate_params(&json!({"joinStrategy": "zip"}));
        assert_eq!(errors[0].field, "joinStrategy");

        let errors = validate_params(&json!({"joinType": "left"}));
        assert_eq!(errors[0].field, "joinType");
    }

    #[test]
    fn single_match_merges_both_sides() {
        let s1 = set(vec![
            json!({"id": "wo-1", "amount": 100}),
            json!({"id": "wo-2", "amount": 200}),
            json!({"id": "wo-3", "amount": 300}),
        ]);
        let s2 = set(vec![
            json!({"id": "wo-2", "region": "plant-b"}),
            json!({"id": "wo-9", "region": "plant-c"}),
        ]);

        let out = evaluate(&s1, &s2, JoinStrategy::MergeByKey, JoinType::Inner, Some("id"));
        assert_eq!(out.len(), 1);
        assert_eq!(
            out.records()[0],
            json!({"id": "wo-2", "amount": 200, "region": "plant-b"})
        );
    }
}
