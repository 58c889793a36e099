//! Year-over-year growth and display-window trimming.

use crate::{TimeSeries, YearMonth};

const YOY_LAG_MONTHS: i32 = 12;

/// Percentage change against the same month one year earlier, rounded to
/// two decimals.
///
/// Months without a value twelve months prior are omitted, as are months
/// whose prior value is zero (no meaningful growth rate exists).
pub fn yoy_growth(series: &TimeSeries) -> TimeSeries {
    series
        .iter()
        .filter_map(|(date, value)| {
            let prior_date = date.add_months(-YOY_LAG_MONTHS);
            let prior = series.get(prior_date)?;
            if prior == 0.0 {
                tracing::debug!(%date, %prior_date, "skipping yoy point with zero base");
                return None;
            }
            Some((date, round2((value / prior - 1.0) * 100.0)))
        })
        .collect()
}

/// Keeps points dated at or after `start`.
pub fn filter_from(series: &TimeSeries, start: YearMonth) -> TimeSeries {
    series.iter().filter(|(date, _)| *date >= start).collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
