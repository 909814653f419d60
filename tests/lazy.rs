use ironbeam_types::lazy::BufferCursor;
use ironbeam_types::testing::*;
use ironbeam_types::*;
use std::sync::Arc;

fn ints(values: impl IntoIterator<Item = i64>) -> Vec<Datum> {
    values.into_iter().map(Datum::Int).collect()
}

#[test]
fn exhausted_sequence_stays_exhausted() {
    let cursor = ResumingCursor::new(ints([1, 2]), ints([3, 4]));
    let mut values = LazyValues::new(cursor, Native.longs().input_fn());

    assert_eq!(values.next(), Some(Ok(1)));
    assert_eq!(values.next(), Some(Ok(2)));
    assert_eq!(values.next(), None);
    // the cursor would resume here; the sequence must not
    assert_eq!(values.next(), None);
    assert_eq!(values.next(), None);
    assert_eq!(values.size_hint(), (0, Some(0)));
}

#[test]
fn one_pull_per_value_and_one_initialization() {
    let cursor = CountingCursor::new(ints(1..=100));
    let pulls = cursor.pulls();
    let counting = Arc::new(CountingMapFn::new(Native.longs().input_fn()));
    let map_fn: SharedMapFn<Datum, i64> = counting.clone();
    let mut values = LazyValues::new(cursor, map_fn);

    // nothing happens until the first pull
    assert_eq!(pulls.get(), 0);
    assert_eq!(counting.initializations(), 0);

    for consumed in 1..=10 {
        assert!(matches!(values.next(), Some(Ok(_))));
        assert_eq!(pulls.get(), consumed);
        assert_eq!(counting.calls(), consumed);
    }
    assert_eq!(counting.initializations(), 1);

    let rest = values.by_ref().count();
    assert_eq!(rest, 90);
    assert_eq!(pulls.get(), 100);
    assert_eq!(counting.initializations(), 1);
}

#[test]
fn abandoned_sequence_reads_no_further() {
    let cursor = CountingCursor::new(ints(0..1_000));
    let pulls = cursor.pulls();
    let first_three: Vec<i64> = LazyValues::new(cursor, Native.longs().input_fn())
        .take(3)
        .collect::<Result<_, _>>()
        .unwrap_or_default();
    assert_eq!(first_three, vec![0, 1, 2]);
    assert_eq!(pulls.get(), 3);
}

#[test]
fn removal_is_forwarded_to_capable_cursors() -> anyhow::Result<()> {
    let mut group = ints([10, 20, 30, 40]);
    let mut values = LazyValues::new(BufferCursor::new(&mut group), Native.longs().input_fn());
    while let Some(v) = values.next() {
        if v? % 20 == 0 {
            values.remove()?;
        }
    }
    drop(values);
    assert_eq!(group, ints([10, 30]));
    Ok(())
}

#[test]
fn postcard_values_decode_lazily() -> anyhow::Result<()> {
    let strings = Postcard.strings();
    let raw = ["x", "y"]
        .iter()
        .map(|s| strings.encode(&(*s).to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    let decoded = LazyValues::new(raw.into_iter(), strings.input_fn())
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(decoded, vec!["x".to_string(), "y".to_string()]);
    Ok(())
}
