//! Field inference over record sets.
//!
//! Derives the field names visible at a node so configuration surfaces can
//! offer key/field choices without the user knowing the upstream schema.
//! The first record's fields stand in for the whole set; this is a
//! deliberate approximation, not schema validation. Fields that appear
//! only in later records stay invisible here (the free-text fallback in
//! the configuration protocol covers them).

use crate::record::RecordSet;

/// Returns the field names of a record set, in the order they appear on
/// the first record. Empty if the set is empty or the first record is not
/// an object.
#[must_use]
pub fn fields(set: &RecordSet) -> Vec<String> {
    set.first()
        .and_then(|record| record.as_object())
        .map(|object| object.keys().cloned().collect())
        .unwrap_or_default()
}

/// Returns the fields present in both sets, preserving `a`'s order.
///
/// Surfaced as recommended join keys but never auto-selected: a
/// coincidental name match must not silently become a join.
#[must_use]
pub fn common_fields(a: &RecordSet, b: &RecordSet) -> Vec<String> {
    let b_fields = fields(b);
    fields(a)
        .into_iter()
        .filter(|field| b_fields.contains(field))
        .collect()
}

/// Returns the union of both sets' fields: `a`'s order first, then fields
/// only `b` has, appended in `b`'s order.
#[must_use]
pub fn all_fields(a: &RecordSet, b: &RecordSet) -> Vec<String> {
    let mut combined = fields(a);
    for field in fields(b) {
        if !combined.contains(&field) {
            combined.push(field);
        }
    }
    combined
}
