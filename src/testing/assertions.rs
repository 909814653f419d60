//! Assertion functions for typed outputs.

use crate::converter::Converter;
use crate::datum::Datum;
use crate::type_token::OutputShape;
use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;

/// Assert that every value converts to a runtime record and back unchanged.
///
/// Value-shaped converters must also leave the key slot `Datum::Null`.
///
/// # Panics
///
/// Panics if a value fails to convert either way or comes back different.
///
/// # Example
///
/// ```
/// use ironbeam_types::*;
/// use ironbeam_types::testing::assert_round_trip;
///
/// let table = table_of(&Native.strings(), &Native.longs())?;
/// assert_round_trip(table.converter().as_ref(), &[("a".to_string(), 1)]);
/// # Ok::<(), TypeError>(())
/// ```
pub fn assert_round_trip<T: Debug + PartialEq>(converter: &dyn Converter<T>, values: &[T]) {
    for (i, value) in values.iter().enumerate() {
        let record = match converter.to_runtime(value) {
            Ok(record) => record,
            Err(e) => panic!("value #{i} {value:?} failed to encode: {e}"),
        };
        if converter.output_shape() == OutputShape::Value {
            assert_eq!(
                record.key,
                Datum::Null,
                "value #{i} {value:?} wrote into the key slot"
            );
        }
        match converter.from_runtime(record.key, record.value) {
            Ok(back) => assert_eq!(
                &back, value,
                "Round trip mismatch at index {i}:\n  Expected: {value:?}\n  Actual: {back:?}"
            ),
            Err(e) => panic!("value #{i} {value:?} failed to decode: {e}"),
        }
    }
}

/// Assert that two collections of key-value pairs are equal, ignoring order.
///
/// Both sides are sorted by key before comparison.
///
/// # Panics
///
/// Panics if the collections differ in length or content.
///
/// # Example
///
/// ```
/// use ironbeam_types::testing::assert_kv_collections_equal;
///
/// let actual = vec![("b", 2), ("a", 1)];
/// let expected = vec![("a", 1), ("b", 2)];
/// assert_kv_collections_equal(actual, expected);
/// ```
pub fn assert_kv_collections_equal<K, V>(mut actual: Vec<(K, V)>, mut expected: Vec<(K, V)>)
where
    K: Debug + Ord,
    V: Debug + PartialEq,
{
    actual.sort_by(|a, b| a.0.cmp(&b.0));
    expected.sort_by(|a, b| a.0.cmp(&b.0));

    assert_eq!(
        actual.len(),
        expected.len(),
        "Collection length mismatch:\n  Expected: {expected:?}\n  Actual: {actual:?}"
    );

    for (i, ((ak, av), (ek, ev))) in actual.iter().zip(expected.iter()).enumerate() {
        assert!(
            ak == ek && av == ev,
            "Collection mismatch at index {i} after sorting:\n  Expected: ({ek:?}, {ev:?})\n  Actual: ({ak:?}, {av:?})"
        );
    }
}

/// Assert that grouped outputs match: keys in sorted order, each key's values
/// compared as a set.
///
/// # Panics
///
/// Panics if the collections differ in keys or values.
pub fn assert_grouped_kv_equal<K, V>(mut actual: Vec<(K, Vec<V>)>, mut expected: Vec<(K, Vec<V>)>)
where
    K: Debug + Ord,
    V: Debug + Eq + Hash,
{
    actual.sort_by(|a, b| a.0.cmp(&b.0));
    expected.sort_by(|a, b| a.0.cmp(&b.0));

    assert_eq!(
        actual.len(),
        expected.len(),
        "Group count mismatch:\n  Expected: {expected:?}\n  Actual: {actual:?}"
    );

    for ((ak, av), (ek, ev)) in actual.iter().zip(expected.iter()) {
        assert_eq!(ak, ek, "Key mismatch");
        let av_set: HashSet<_> = av.iter().collect();
        let ev_set: HashSet<_> = ev.iter().collect();
        assert_eq!(av_set, ev_set, "Value mismatch for key {ak:?}");
    }
}
