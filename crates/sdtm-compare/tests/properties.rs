//! Comparator properties over generated datasets.

use polars::prelude::*;
use proptest::prelude::*;
use sdtm_compare::{CompareOptions, compare_frames};
use sdtm_model::SchemaPolicy;

type Row = (String, Option<i64>, String);

fn build(rows: &[Row]) -> DataFrame {
    let ids: Vec<&str> = rows.iter().map(|r| r.0.as_str()).collect();
    let ages: Vec<Option<i64>> = rows.iter().map(|r| r.1).collect();
    let sexes: Vec<&str> = rows.iter().map(|r| r.2.as_str()).collect();
    DataFrame::new(vec![
        Series::new("USUBJID".into(), ids).into(),
        Series::new("AGE".into(), ages).into(),
        Series::new("SEX".into(), sexes).into(),
    ])
    .unwrap()
}

fn rows_strategy() -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec(
        (
            "XYZ-[0-9]{3}",
            prop::option::of(18i64..90),
            prop::sample::select(vec!["M".to_string(), "F".to_string(), "U".to_string()]),
        ),
        0..12,
    )
}

fn options() -> CompareOptions {
    CompareOptions::new(SchemaPolicy::Intersection).with_key("USUBJID")
}

proptest! {
    #[test]
    fn identical_copies_match(rows in rows_strategy()) {
        let df = build(&rows);
        let copy = df.clone();
        prop_assert!(compare_frames(&df, &copy, &options()).is_match);
    }

    #[test]
    fn verdict_and_flags_are_symmetric(a in rows_strategy(), b in rows_strategy()) {
        let left = build(&a);
        let right = build(&b);
        let forward = compare_frames(&left, &right, &options());
        let backward = compare_frames(&right, &left, &options());

        prop_assert_eq!(forward.is_match, backward.is_match);
        let mut f = forward.flagged_columns();
        let mut r = backward.flagged_columns();
        f.sort_unstable();
        r.sort_unstable();
        prop_assert_eq!(f, r);
    }

    #[test]
    fn row_order_does_not_change_verdict(
        (rows, shuffled) in rows_strategy().prop_flat_map(|rows| {
            let shuffled = Just(rows.clone()).prop_shuffle();
            (Just(rows), shuffled)
        }),
        other in rows_strategy(),
    ) {
        let original = build(&rows);
        let permuted = build(&shuffled);
        let reference = build(&other);

        prop_assert!(compare_frames(&original, &permuted, &options()).is_match);
        prop_assert_eq!(
            compare_frames(&original, &reference, &options()).is_match,
            compare_frames(&permuted, &reference, &options()).is_match
        );
    }
}
