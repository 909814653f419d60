use ironbeam_types::testing::*;
use ironbeam_types::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Click {
    user: String,
    page: u32,
    dwell_ms: Option<u64>,
}

fn atomics_round_trip(family: impl PTypeFamily) {
    assert_round_trip(
        family.strings().converter().as_ref(),
        &[String::new(), "héllo".to_string()],
    );
    assert_round_trip(family.longs().converter().as_ref(), &[i64::MIN, -1, 0, i64::MAX]);
    assert_round_trip(family.ints().converter().as_ref(), &[i32::MIN, 0, i32::MAX]);
    assert_round_trip(family.doubles().converter().as_ref(), &[-0.5, 0.0, 1e300]);
    assert_round_trip(family.booleans().converter().as_ref(), &[true, false]);
    assert_round_trip(family.bytes().converter().as_ref(), &[vec![], vec![0, 255, 7]]);
}

fn composites_round_trip(family: impl PTypeFamily) -> anyhow::Result<()> {
    let pair = family.pairs(&family.strings(), &family.longs())?;
    assert_round_trip(pair.converter().as_ref(), &[("x".to_string(), 3)]);

    let list = family.collections(&family.doubles())?;
    assert_round_trip(list.converter().as_ref(), &[vec![], vec![1.0, 2.5]]);

    let nested = family.collections(&pair)?;
    assert_round_trip(
        nested.converter().as_ref(),
        &[vec![("a".to_string(), 1), ("b".to_string(), 2)]],
    );

    let table = family.table_of(&family.strings(), &list)?;
    assert_round_trip(table.converter().as_ref(), &[("k".to_string(), vec![0.25])]);
    Ok(())
}

#[test]
fn native_atomics_round_trip() {
    atomics_round_trip(Native);
}

#[test]
fn postcard_atomics_round_trip() {
    atomics_round_trip(Postcard);
}

#[test]
fn native_composites_round_trip() -> anyhow::Result<()> {
    composites_round_trip(Native)
}

#[test]
fn postcard_composites_round_trip() -> anyhow::Result<()> {
    composites_round_trip(Postcard)
}

#[test]
fn postcard_records_round_trip_user_structs() -> anyhow::Result<()> {
    let clicks = Postcard.records::<Click>();
    assert_round_trip(
        clicks.converter().as_ref(),
        &[Click {
            user: "u1".to_string(),
            page: 4,
            dwell_ms: None,
        }],
    );

    let by_user = Postcard.table_of(&Postcard.strings(), &clicks)?;
    assert_eq!(by_user.sub_types()[1], clicks.descriptor().clone());
    Ok(())
}

#[test]
fn pair_sub_types_and_family_propagate() -> anyhow::Result<()> {
    for family in [Family::Native, Family::Postcard] {
        let (a, b) = match family {
            Family::Native => (Native.strings(), Native.longs()),
            Family::Postcard => (Postcard.strings(), Postcard.longs()),
        };
        let p = pairs(&a, &b)?;
        assert_eq!(p.sub_types(), &[a.descriptor().clone(), b.descriptor().clone()]);
        assert_eq!(p.family(), family);
        assert_eq!(p.family(), a.family());
    }
    Ok(())
}

#[test]
fn table_sub_types_survive_grouping() -> anyhow::Result<()> {
    let k = Native.strings();
    let v = Native.longs();
    let table = table_of(&k, &v)?;
    let grouped = table.grouped();
    assert_eq!(grouped.sub_types(), &[k.descriptor().clone(), v.descriptor().clone()]);
    assert_eq!(grouped.family(), Family::Native);
    assert_eq!(grouped.descriptor().kind(), DescriptorKind::Grouped);
    Ok(())
}

#[test]
fn families_refuse_foreign_sub_types() {
    let foreign = Postcard.longs();
    assert!(matches!(
        Native.collections(&foreign),
        Err(TypeError::FamilyMismatch {
            left: Family::Native,
            right: Family::Postcard
        })
    ));
    assert!(table_of(&Native.strings(), &foreign).is_err());
}

#[test]
fn decoding_the_wrong_shape_names_the_type() {
    let err = Native
        .longs()
        .decode(Datum::from("seven"))
        .err()
        .map(|e| e.in_stage("parse-counts").to_string())
        .unwrap_or_default();
    assert!(err.contains("i64"), "got: {err}");
    assert!(err.contains("text"), "got: {err}");
    assert!(err.contains("parse-counts"), "got: {err}");
}

#[test]
fn value_records_leave_the_key_slot_empty() -> anyhow::Result<()> {
    let record = Native.strings().converter().to_runtime(&"v".to_string())?;
    assert_eq!(record, RuntimeRecord::value(Datum::from("v")));
    assert_eq!(Native.strings().converter().output_shape(), OutputShape::Value);
    Ok(())
}
