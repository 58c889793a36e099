//! Behavior-driven tests for normalization, growth, windowing and breakdowns.

use tradelens_core::{
    filter_from, normalize, normalize_records, summarize, yoy_growth, TimeSeries, TradeRecord,
};
use tradelens_tests::*;

fn consecutive(start: &str, values: impl IntoIterator<Item = f64>) -> TimeSeries {
    let start = ym(start);
    values
        .into_iter()
        .enumerate()
        .map(|(offset, value)| (start.add_months(offset as i32), value))
        .collect()
}

// =============================================================================
// Year-over-year growth
// =============================================================================

#[test]
fn yoy_has_twelve_fewer_points_than_a_consecutive_series() {
    for length in [13_usize, 24, 37] {
        // Given: `length` consecutive months of positive values
        let series = consecutive("2019-06", (0..length).map(|i| 50.0 + i as f64));

        // When: Growth is computed
        let yoy = yoy_growth(&series);

        // Then: One point per month that has a year-earlier value, all inside the input range
        assert_eq!(yoy.len(), length - 12);
        assert!(yoy.dates().all(|date| series.get(date).is_some()));
        assert_eq!(yoy.first_date(), Some(ym("2019-06").add_months(12)));
    }
}

#[test]
fn yoy_skips_months_with_zero_trade_a_year_earlier() {
    // Given: Zero trade in 2020-03 only
    let series = consecutive(
        "2020-01",
        (0..15).map(|i| if i == 2 { 0.0 } else { 100.0 }),
    );

    // When: Growth is computed
    let yoy = yoy_growth(&series);

    // Then: 2021-03 is omitted; neighbours are present
    assert_eq!(yoy.len(), 2);
    assert!(yoy.get(ym("2021-03")).is_none());
    assert_eq!(yoy.get(ym("2021-01")), Some(0.0));
    assert_eq!(yoy.get(ym("2021-02")), Some(0.0));
}

#[test]
fn yoy_values_are_rounded_percentages() {
    // Given: 2020-01 = 3, 2021-01 = 2
    let series = [(ym("2020-01"), 3.0), (ym("2021-01"), 2.0)].into_iter().collect::<TimeSeries>();

    // Then: (2/3 - 1) * 100 rounded to two decimals
    assert_eq!(yoy_growth(&series).get(ym("2021-01")), Some(-33.33));
}

// =============================================================================
// Window filter
// =============================================================================

#[test]
fn window_filter_keeps_the_bound_and_drops_the_month_before() {
    // Given: A series fetched with a look-back window
    let series = consecutive("2020-01", (0..25).map(f64::from));

    // When: It is trimmed to start at 2021-01
    let trimmed = filter_from(&series, ym("2021-01"));

    // Then: 2021-01 stays, 2020-12 goes
    assert_eq!(trimmed.len(), 13);
    assert!(trimmed.get(ym("2021-01")).is_some());
    assert!(trimmed.get(ym("2020-12")).is_none());
}

#[test]
fn filtering_before_growth_loses_early_yoy_points() {
    // Given: Two years of data
    let series = consecutive("2020-01", (0..25).map(|i| 100.0 + f64::from(i)));

    // When: Growth is computed before vs after trimming
    let right_order = filter_from(&yoy_growth(&series), ym("2021-01"));
    let wrong_order = yoy_growth(&filter_from(&series, ym("2021-01")));

    // Then: Only the fetch-then-filter order keeps growth at the first displayed month
    assert_eq!(right_order.len(), 13);
    assert_eq!(right_order.first_date(), Some(ym("2021-01")));
    assert_eq!(wrong_order.len(), 1);
}

// =============================================================================
// Normalization
// =============================================================================

#[test]
fn normalizing_a_normalized_series_changes_nothing() {
    // Given: Raw export rows with day-level dates
    let rows = vec![
        RawRecord::new().with("date", "2021-01-01").with("export_value", 5.0),
        RawRecord::new().with("date", "2021-02-01").with("export_value", 7.5),
    ];

    // When: Normalized twice
    let once = normalize(&rows, Flow::Exports).expect("first pass");
    let twice = normalize(&once.to_records(), Flow::Exports).expect("second pass");

    // Then: Same series both times, indexed by month
    assert_eq!(once, twice);
    assert_eq!(once.get(ym("2021-02")), Some(7.5));
}

#[test]
fn import_rows_are_rejected_when_reading_exports() {
    // Given: Rows carrying only the import value column
    let rows = vec![RawRecord::new().with("date", "2021-01").with("import_value", 5.0)];

    // Then: Reading them as exports fails loudly
    assert!(normalize(&rows, Flow::Exports).is_err());
}

// =============================================================================
// Category breakdown
// =============================================================================

#[test]
fn breakdown_sums_values_per_product_name() {
    // Given: Child records for two products
    let rows = vec![
        RawRecord::new().with("date", "2021-01").with("import_value", 10.0).with("product_name", "A"),
        RawRecord::new().with("date", "2021-02").with("import_value", 5.0).with("product_name", "A"),
        RawRecord::new().with("date", "2021-01").with("import_value", 3.0).with("product_name", "B"),
    ];
    let records: Vec<TradeRecord> = normalize_records(&rows, Flow::Imports).expect("records");

    // When: Summarized
    let summary = summarize(&records);

    // Then: A = 15, B = 3
    assert_eq!(summary.len(), 2);
    assert_eq!(summary.get("A"), Some(15.0));
    assert_eq!(summary.get("B"), Some(3.0));
}
