use ironbeam_types::job::{SHUFFLE_FAMILY, SHUFFLE_PARTITIONS, SHUFFLE_SORT_COMPARATOR};
use ironbeam_types::*;
use std::path::Path;
use std::sync::Arc;

fn words() -> anyhow::Result<TableType<String, i64>> {
    Ok(table_of(&Native.strings(), &Native.longs())?)
}

#[test]
fn grouped_default_target_always_fails() -> anyhow::Result<()> {
    let grouped = words()?.grouped();
    for path in ["out.jsonl", "", "/tmp/deep/nested/file", "s3://bucket/key"] {
        let err = grouped.default_target(Path::new(path)).err();
        assert!(
            matches!(err, Some(TypeError::UnsupportedShape { .. })),
            "path {path:?} gave {err:?}"
        );
    }
    // the table itself still has one
    assert!(words()?.default_target(Path::new("out.jsonl")).is_ok());
    Ok(())
}

#[test]
fn grouped_delegates_to_table() -> anyhow::Result<()> {
    let table = words()?;
    let grouped = GroupedType::new(&table);
    assert_eq!(grouped.family(), table.family());
    assert_eq!(grouped.sub_types(), table.sub_types());
    assert!(Arc::ptr_eq(&grouped.converter(), &table.converter()));
    assert!(Arc::ptr_eq(&grouped.grouping_converter(), &table.converter()));
    Ok(())
}

#[test]
fn configure_shuffle_twice_equals_once() -> anyhow::Result<()> {
    let grouped = words()?.grouped();
    let options = GroupingOptions::builder()
        .num_partitions(8)
        .sort_comparator(ReverseOrder)
        .build();

    let mut once = JobConf::default();
    grouped.configure_shuffle(&mut once, &options)?;
    let mut twice = JobConf::default();
    grouped.configure_shuffle(&mut twice, &options)?;
    grouped.configure_shuffle(&mut twice, &options)?;

    assert_eq!(once, twice);
    assert_eq!(once.fingerprint(), twice.fingerprint());
    assert_eq!(once.get(SHUFFLE_PARTITIONS), Some("8"));
    assert_eq!(once.get(SHUFFLE_SORT_COMPARATOR), Some("reverse"));
    assert_eq!(once.get(SHUFFLE_FAMILY), Some("native"));
    Ok(())
}

#[test]
fn unset_options_fall_back_to_natural_order() -> anyhow::Result<()> {
    let mut job = JobConf::default();
    words()?.grouped().configure_shuffle(&mut job, &GroupingOptions::default())?;
    let policies = job.shuffle().cloned().unwrap_or_default();
    assert_eq!(policies.names(), ("hash", "natural", "natural"));
    assert_eq!(job.num_partitions(), None);
    Ok(())
}

#[test]
fn later_group_by_clears_an_earlier_partition_count() -> anyhow::Result<()> {
    let first = words()?;
    let second = table_of(&Native.longs(), &Native.strings())?;

    let p = Pipeline::default();
    p.group_by_key(&first, &GroupingOptions::builder().num_partitions(4).build())?;
    assert_eq!(p.job().num_partitions(), Some(4));
    p.group_by_key(&second, &GroupingOptions::default())?;
    assert_eq!(p.job().num_partitions(), None);

    let mut fresh = JobConf::default();
    second
        .grouped()
        .configure_shuffle(&mut fresh, &GroupingOptions::default())?;
    assert_eq!(p.job(), fresh);
    assert_eq!(p.job().fingerprint(), fresh.fingerprint());
    Ok(())
}

#[test]
fn failed_configuration_leaves_job_untouched() -> anyhow::Result<()> {
    let grouped = words()?.grouped();

    let mut job = JobConf::default();
    let before = job.clone();
    let zero = GroupingOptions::builder().num_partitions(0).build();
    assert!(matches!(
        grouped.configure_shuffle(&mut job, &zero),
        Err(TypeError::Configuration { .. })
    ));
    assert_eq!(job, before);

    let mut bare = JobConf::empty("no-codecs");
    let before = bare.clone();
    let err = grouped
        .configure_shuffle(&mut bare, &GroupingOptions::default())
        .err()
        .map(|e| e.to_string())
        .unwrap_or_default();
    assert!(err.contains("configuration failed"), "got: {err}");
    assert_eq!(bare, before);
    assert!(bare.shuffle().is_none());
    Ok(())
}

#[test]
fn value_shaped_grouping_converter_is_rejected() -> anyhow::Result<()> {
    struct ValueOnly;

    impl Converter<(String, i64)> for ValueOnly {
        fn output_shape(&self) -> OutputShape {
            OutputShape::Value
        }

        fn to_runtime(&self, (k, _): &(String, i64)) -> Result<RuntimeRecord, ConversionError> {
            Ok(RuntimeRecord::value(Datum::from(k.as_str())))
        }

        fn from_runtime(&self, _: Datum, _: Datum) -> Result<(String, i64), ConversionError> {
            Err(ConversionError::new("(String, i64)", "pair", "value"))
        }
    }

    let table = words()?.with_grouping_converter(Arc::new(ValueOnly));
    let mut job = JobConf::default();
    let before = job.clone();
    assert!(table
        .grouped()
        .configure_shuffle(&mut job, &GroupingOptions::default())
        .is_err());
    assert_eq!(job, before);
    Ok(())
}

#[test]
fn input_fn_decodes_key_and_initializes_both_functions() -> anyhow::Result<()> {
    let grouped = words()?.grouped();
    let input_fn = grouped.input_fn();
    MapFn::<(Datum, Vec<Datum>), (String, Group<i64>)>::initialize(&input_fn);

    let (key, values): (String, Group<i64>) =
        input_fn.map((Datum::from("a"), vec![Datum::Int(1), Datum::Int(2)]))?;
    assert_eq!(key, "a");
    assert_eq!(values.collect::<Result<Vec<_>, _>>()?, vec![1, 2]);

    let bad_key: Result<(String, Group<i64>), _> = input_fn.map((Datum::Int(9), Vec::new()));
    assert!(bad_key.is_err());
    Ok(())
}
