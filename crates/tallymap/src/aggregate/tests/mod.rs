
use crate::{
    aggregate::{Aggregator, Direction, FieldCardinality, ValueOrder},
    key,
    key::Key,
    schema::FieldSchema,
    total::Total,
    value::Value,
};
use std::collections::BTreeMap;

// ---- helpers -----------------------------------------------------------

fn schema(fields: &[&str]) -> FieldSchema {
    FieldSchema::new(fields.iter().copied()).expect("valid schema")
}

/// The ccy/country fixture: ("EUR","de") twice, ("USD","fr") once.
fn ccy_country() -> Aggregator {
    let mut agg = Aggregator::new(schema(&["ccy", "country"]));
    agg.accumulate(key!["EUR", "de"], 10).expect("accumulate");
    agg.accumulate(key!["EUR", "de"], 5).expect("accumulate");
    agg.accumulate(key!["USD", "fr"], 2.5).expect("accumulate");

    agg
}

/// Entries re-keyed by field name, totals made bit-exact comparable.
/// Lets aggregators with different field orders compare by content.
fn named_entries(agg: &Aggregator) -> BTreeMap<BTreeMap<String, Value>, (u64, u64)> {
    agg.entries()
        .map(|(key, total)| {
            let named = agg
                .schema()
                .fields()
                .iter()
                .cloned()
                .zip(key.parts().iter().cloned())
                .collect();

            (named, (total.count, total.amount.to_bits()))
        })
        .collect()
}

// ---- construction ------------------------------------------------------

#[test]
fn seeded_inserts_zero_totals() {
    let agg = Aggregator::seeded(
        schema(&["ccy", "country"]),
        vec![key!["EUR", "de"], key!["GBP", "uk"]],
    )
    .expect("seeded");

    assert_eq!(agg.len(), 2);
    assert_eq!(agg.get(&key!["EUR", "de"]), Some(Total::ZERO));
    assert_eq!(agg.get(&key!["GBP", "uk"]), Some(Total::ZERO));
}

#[test]
fn seeded_rejects_wrong_arity() {
    let err = Aggregator::seeded(
        schema(&["ccy", "country"]),
        vec![key!["EUR", "de"], key!["GBP"]],
    )
    .unwrap_err();

    assert!(err.is_schema_mismatch());
}

// ---- accumulation ------------------------------------------------------

#[test]
fn accumulate_sums_elementwise_per_key() {
    let agg = ccy_country();
    assert_eq!(agg.get(&key!["EUR", "de"]), Some(Total::new(2, 15.0)));
    assert_eq!(agg.get(&key!["USD", "fr"]), Some(Total::new(1, 2.5)));
}

#[test]
fn accumulate_accepts_explicit_pairs() {
    let mut agg = Aggregator::new(schema(&["ccy"]));
    agg.accumulate(key!["EUR"], (3u64, 7.5)).expect("pair");
    agg.accumulate(key!["EUR"], Total::new(1, 0.5)).expect("total");

    assert_eq!(agg.get(&key!["EUR"]), Some(Total::new(4, 8.0)));
}

#[test]
fn accumulate_is_order_independent() {
    let mut forward = Aggregator::new(schema(&["ccy"]));
    forward.accumulate(key!["EUR"], 10).expect("accumulate");
    forward.accumulate(key!["EUR"], 2.5).expect("accumulate");

    let mut reversed = Aggregator::new(schema(&["ccy"]));
    reversed.accumulate(key!["EUR"], 2.5).expect("accumulate");
    reversed.accumulate(key!["EUR"], 10).expect("accumulate");

    assert_eq!(forward, reversed);
}

#[test]
fn accumulate_rejects_wrong_arity_without_mutating() {
    let mut agg = ccy_country();
    let before = agg.clone();

    let err = agg.accumulate(key!["EUR"], 1).unwrap_err();
    assert!(err.is_schema_mismatch());
    assert_eq!(agg, before);
}

#[test]
fn accumulate_rejects_non_finite_without_mutating() {
    let mut agg = ccy_country();
    let before = agg.clone();

    let err = agg.accumulate(key!["EUR", "de"], f64::NAN).unwrap_err();
    assert!(err.is_value_format());
    assert_eq!(agg, before);
}

#[test]
fn accumulate_value_reads_raw_values() {
    let mut agg = Aggregator::new(schema(&["ccy"]));
    agg.accumulate_value(key!["EUR"], &Value::from(10u64))
        .expect("bare");
    agg.accumulate_value(key!["EUR"], &Value::from_list(vec![2u64, 5u64]))
        .expect("pair");

    assert_eq!(agg.get(&key!["EUR"]), Some(Total::new(3, 15.0)));
}

#[test]
fn extend_entries_is_all_or_nothing() {
    let mut agg = ccy_country();
    let before = agg.clone();

    let err = agg
        .extend_entries(vec![
            (key!["GBP", "uk"], Value::from(1u64)),
            (key!["PLN", "pl"], Value::from("oops")),
        ])
        .unwrap_err();
    assert!(err.is_value_format());
    assert_eq!(agg, before);

    agg.extend_entries(vec![
        (key!["GBP", "uk"], Value::from(1u64)),
        (key!["GBP", "uk"], Value::from_list(vec![2u64, 4u64])),
    ])
    .expect("clean batch");
    assert_eq!(agg.get(&key!["GBP", "uk"]), Some(Total::new(3, 5.0)));
}

// ---- merge / combine ---------------------------------------------------

#[test]
fn merge_sums_shared_keys() {
    let mut left = Aggregator::new(schema(&["ccy", "country"]));
    left.accumulate(key!["EUR", "de"], 10).expect("accumulate");

    let mut right = Aggregator::new(schema(&["ccy", "country"]));
    right.accumulate(key!["EUR", "de"], 10).expect("accumulate");

    left.merge(&right).expect("merge");
    assert_eq!(left.get(&key!["EUR", "de"]), Some(Total::new(2, 20.0)));
    // the source is untouched
    assert_eq!(right.get(&key!["EUR", "de"]), Some(Total::new(1, 10.0)));
}

#[test]
fn merge_requires_identical_field_order() {
    let mut left = ccy_country();
    let before = left.clone();

    let mut swapped = Aggregator::new(schema(&["country", "ccy"]));
    swapped.accumulate(key!["de", "EUR"], 1).expect("accumulate");

    let err = left.merge(&swapped).unwrap_err();
    assert!(err.is_schema_mismatch());
    assert_eq!(left, before);
}

#[test]
fn combine_projects_into_union_schema() {
    let mut left = Aggregator::new(schema(&["ccy", "country"]));
    left.accumulate(key!["EUR", "de"], 10).expect("accumulate");

    let mut right = Aggregator::new(schema(&["country", "method"]));
    right.accumulate(key!["de", "pos"], 5).expect("accumulate");

    let combined = Aggregator::combine(&left, &right);
    assert_eq!(
        combined.schema().fields(),
        [
            "ccy".to_string(),
            "country".to_string(),
            "method".to_string()
        ]
    );
    assert_eq!(
        combined.get(&key!["EUR", "de", ()]),
        Some(Total::new(1, 10.0))
    );
    assert_eq!(
        combined.get(&key![(), "de", "pos"]),
        Some(Total::new(1, 5.0))
    );
}

#[test]
fn combine_with_same_schema_acts_like_merge() {
    let a = ccy_country();
    let b = ccy_country();

    let combined = Aggregator::combine(&a, &b);
    let mut merged = a.clone();
    merged.merge(&b).expect("merge");

    assert_eq!(combined, merged);
}

#[test]
fn combine_content_is_commutative_modulo_field_order() {
    let mut left = Aggregator::new(schema(&["ccy", "country"]));
    left.accumulate(key!["EUR", "de"], 10).expect("accumulate");
    left.accumulate(key!["USD", "fr"], 2.5).expect("accumulate");

    let mut right = Aggregator::new(schema(&["country", "method"]));
    right.accumulate(key!["de", "pos"], 5).expect("accumulate");
    right.accumulate(key!["nl", "atm"], 1.5).expect("accumulate");

    let ab = Aggregator::combine(&left, &right);
    let ba = Aggregator::combine(&right, &left);

    assert_ne!(ab.schema(), ba.schema());
    assert_eq!(named_entries(&ab), named_entries(&ba));
}

// ---- filter / collapse / field_values ----------------------------------

#[test]
fn filter_matches_any_position() {
    let mut agg = ccy_country();
    agg.accumulate(key!["GBP", "de"], 1).expect("accumulate");

    // "de" appears in the country slot of two keys
    let filtered = agg.filter(&[Value::from("de")]);
    assert_eq!(filtered.len(), 2);
    assert!(filtered.get(&key!["EUR", "de"]).is_some());
    assert!(filtered.get(&key!["GBP", "de"]).is_some());
    assert!(filtered.get(&key!["USD", "fr"]).is_none());
    assert_eq!(filtered.schema(), agg.schema());
}

#[test]
fn filter_is_positional_membership_not_per_field() {
    // "EUR" stored in the *country* slot still matches a filter on "EUR"
    let mut agg = Aggregator::new(schema(&["ccy", "country"]));
    agg.accumulate(key!["GBP", "EUR"], 1).expect("accumulate");

    let filtered = agg.filter(&[Value::from("EUR")]);
    assert_eq!(filtered.len(), 1);
}

#[test]
fn filter_with_no_values_is_empty() {
    let filtered = ccy_country().filter(&[]);
    assert!(filtered.is_empty());
}

#[test]
fn collapse_drops_one_dimension_and_sums_collisions() {
    let agg = ccy_country();
    let collapsed = agg.collapse("country").expect("collapse");

    assert_eq!(collapsed.schema().fields(), ["ccy".to_string()]);
    assert_eq!(collapsed.len(), 2);
    assert_eq!(collapsed.get(&key!["EUR"]), Some(Total::new(2, 15.0)));
    assert_eq!(collapsed.get(&key!["USD"]), Some(Total::new(1, 2.5)));
}

#[test]
fn collapse_last_field_leaves_grand_total() {
    let collapsed = ccy_country()
        .collapse("country")
        .and_then(|agg| agg.collapse("ccy"))
        .expect("collapse twice");

    assert_eq!(collapsed.schema().arity(), 0);
    assert_eq!(collapsed.len(), 1);
    assert_eq!(collapsed.get(&Key::new(vec![])), Some(Total::new(3, 17.5)));
}

#[test]
fn collapse_unknown_field_fails() {
    let err = ccy_country().collapse("method").unwrap_err();
    assert!(err.is_unknown_field());
}

#[test]
fn field_values_collects_distinct_values() {
    let agg = ccy_country();

    let ccys = agg.field_values("ccy").expect("known field");
    assert_eq!(
        ccys.into_iter().collect::<Vec<_>>(),
        vec![Value::from("EUR"), Value::from("USD")]
    );

    assert!(agg.field_values("method").unwrap_err().is_unknown_field());
}

// ---- copy --------------------------------------------------------------

#[test]
fn clone_is_independent_of_source() {
    let source = ccy_country();
    let mut copy = source.clone();
    assert_eq!(copy, source);

    copy.accumulate(key!["EUR", "de"], 5).expect("accumulate");
    assert_eq!(source.get(&key!["EUR", "de"]), Some(Total::new(2, 15.0)));
    assert_eq!(copy.get(&key!["EUR", "de"]), Some(Total::new(3, 20.0)));
}

// ---- sorted views ------------------------------------------------------

#[test]
fn value_sorted_descending_leads_with_largest_amount() {
    let rows = ccy_country().value_sorted(ValueOrder::Amount, Direction::Desc);

    assert_eq!(
        rows,
        vec![
            (key!["EUR", "de"], Total::new(2, 15.0)),
            (key!["USD", "fr"], Total::new(1, 2.5)),
        ]
    );
}

#[test]
fn value_sorted_by_count_breaks_ties_on_amount() {
    let mut agg = Aggregator::new(schema(&["ccy"]));
    agg.accumulate(key!["EUR"], 9.0).expect("accumulate");
    agg.accumulate(key!["GBP"], (2u64, 1.0)).expect("accumulate");
    agg.accumulate(key!["USD"], 3.0).expect("accumulate");

    let rows = agg.value_sorted(ValueOrder::Count, Direction::Asc);
    assert_eq!(
        rows,
        vec![
            (key!["USD"], Total::new(1, 3.0)),
            (key!["EUR"], Total::new(1, 9.0)),
            (key!["GBP"], Total::new(2, 1.0)),
        ]
    );
}

#[test]
fn field_sorted_walks_named_positions() {
    let mut agg = Aggregator::new(schema(&["ccy", "country"]));
    agg.accumulate(key!["EUR", "de"], 1).expect("accumulate");
    agg.accumulate(key!["EUR", "at"], 1).expect("accumulate");
    agg.accumulate(key!["GBP", "uk"], 1).expect("accumulate");

    let by_country = agg
        .field_sorted(&["country"], Direction::Asc)
        .expect("sort");
    let countries = by_country
        .iter()
        .map(|(key, _)| key[1].clone())
        .collect::<Vec<_>>();
    assert_eq!(
        countries,
        vec![Value::from("at"), Value::from("de"), Value::from("uk")]
    );

    let desc = agg
        .field_sorted(&["ccy", "country"], Direction::Desc)
        .expect("sort");
    assert_eq!(desc[0].0, key!["GBP", "uk"]);
    assert_eq!(desc[1].0, key!["EUR", "de"]);
    assert_eq!(desc[2].0, key!["EUR", "at"]);
}

#[test]
fn field_sorted_unknown_field_fails() {
    let err = ccy_country()
        .field_sorted(&["ccy", "method"], Direction::Asc)
        .unwrap_err();
    assert!(err.is_unknown_field());
}

#[test]
fn field_sorted_empty_list_is_canonical_order() {
    let rows = ccy_country().field_sorted(&[], Direction::Asc).expect("sort");
    assert_eq!(rows[0].0, key!["EUR", "de"]);
    assert_eq!(rows[1].0, key!["USD", "fr"]);
}

// ---- csv ---------------------------------------------------------------

#[test]
fn csv_rows_have_header_and_matching_row_lengths() {
    let agg = ccy_country();
    let rows = agg.csv_rows(&["ccy"], Direction::Asc).expect("rows");

    assert_eq!(rows[0], vec!["ccy", "country", "count", "amount"]);
    assert_eq!(rows.len(), agg.len() + 1);
    for row in &rows {
        assert_eq!(row.len(), agg.schema().arity() + 2);
    }
}

#[test]
fn csv_rows_follow_field_sort() {
    let rows = ccy_country().csv_rows(&["ccy"], Direction::Desc).expect("rows");

    assert_eq!(rows[1], vec!["USD", "fr", "1", "2.5"]);
    assert_eq!(rows[2], vec!["EUR", "de", "2", "15"]);
}

#[test]
fn write_csv_serializes_through_the_sink() {
    let mut sink = Vec::new();
    ccy_country()
        .write_csv(&mut sink, &["ccy"], Direction::Asc)
        .expect("write");

    let text = String::from_utf8(sink).expect("utf8");
    let lines = text.lines().collect::<Vec<_>>();
    assert_eq!(lines[0], "ccy,country,count,amount");
    assert_eq!(lines[1], "EUR,de,2,15");
    assert_eq!(lines[2], "USD,fr,1,2.5");
}

// ---- diagnostics -------------------------------------------------------

#[test]
fn report_snapshots_totals_and_cardinality() {
    let report = ccy_country().report();

    assert_eq!(report.fields, vec!["ccy".to_string(), "country".to_string()]);
    assert_eq!(report.buckets, 2);
    assert_eq!(report.observations, 3);
    assert!((report.amount - 17.5).abs() < f64::EPSILON);
    assert_eq!(
        report.field_cardinality,
        vec![
            FieldCardinality {
                field: "ccy".to_string(),
                distinct: 2
            },
            FieldCardinality {
                field: "country".to_string(),
                distinct: 2
            },
        ]
    );
}

#[test]
fn display_lists_buckets_in_canonical_order() {
    let agg = ccy_country();
    assert_eq!(
        agg.to_string(),
        "Aggregate:\n(EUR, de): (2, 15)\n(USD, fr): (1, 2.5)"
    );

    let empty = Aggregator::new(schema(&["ccy"]));
    assert_eq!(empty.to_string(), "Aggregate:");
}
