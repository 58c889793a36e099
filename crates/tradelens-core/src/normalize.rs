//! Raw trade rows → canonical records and date-indexed series.
//!
//! The trade client names its value column after the flow (`import_value`,
//! `export_value`). Normalization renames it to `value`, parses `date` to
//! month granularity and indexes the rows by month. Shape violations are
//! contract breaks with the client and fail the run instead of being
//! coerced.

use serde_json::Value;
use thiserror::Error;

use crate::{Flow, RawRecord, TimeSeries, TradeRecord, ValidationError, YearMonth};

pub const DATE_FIELD: &str = "date";
pub const VALUE_FIELD: &str = "value";
pub const PRODUCT_NAME_FIELD: &str = "product_name";
pub const PRODUCT_CODE_FIELD: &str = "product_code";

/// Fetched data does not have the shape the pipeline expects.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NormalizationError {
    #[error("record {index} has no 'date' field")]
    MissingDate { index: usize },
    #[error("record {index} has an unparseable date: {value}")]
    InvalidDate { index: usize, value: String },
    #[error("record {index} has neither '{field}' nor 'value' for {flow}")]
    MissingValue {
        index: usize,
        field: &'static str,
        flow: Flow,
    },
    #[error("record {index} field '{field}' is not numeric: {value}")]
    InvalidValue {
        index: usize,
        field: &'static str,
        value: String,
    },
    #[error("record {index} is invalid: {source}")]
    InvalidRecord {
        index: usize,
        #[source]
        source: ValidationError,
    },
    #[error("month {date} appears more than once in the series")]
    DuplicateDate { date: YearMonth },
}

/// Converts raw rows into validated [`TradeRecord`]s, preserving order.
///
/// Rows that already use the canonical `value` field are accepted as-is, so
/// normalizing normalized data is a no-op.
pub fn normalize_records(
    records: &[RawRecord],
    flow: Flow,
) -> Result<Vec<TradeRecord>, NormalizationError> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| normalize_record(index, record, flow))
        .collect()
}

/// Builds the month-indexed series for a single-code query.
pub fn normalize(records: &[RawRecord], flow: Flow) -> Result<TimeSeries, NormalizationError> {
    let mut series = TimeSeries::new();
    for record in normalize_records(records, flow)? {
        if series.insert(record.date, record.value).is_some() {
            return Err(NormalizationError::DuplicateDate { date: record.date });
        }
    }
    Ok(series)
}

fn normalize_record(
    index: usize,
    record: &RawRecord,
    flow: Flow,
) -> Result<TradeRecord, NormalizationError> {
    let date = match record.get(DATE_FIELD) {
        None | Some(Value::Null) => return Err(NormalizationError::MissingDate { index }),
        Some(Value::String(text)) => {
            YearMonth::parse(text).map_err(|_| NormalizationError::InvalidDate {
                index,
                value: text.clone(),
            })?
        }
        Some(other) => {
            return Err(NormalizationError::InvalidDate {
                index,
                value: other.to_string(),
            })
        }
    };

    let flow_field = flow.value_field();
    let (field, raw_value) = match record.get(flow_field) {
        Some(value) => (flow_field, value),
        None => match record.get(VALUE_FIELD) {
            Some(value) => (VALUE_FIELD, value),
            None => {
                return Err(NormalizationError::MissingValue {
                    index,
                    field: flow_field,
                    flow,
                })
            }
        },
    };
    let value = numeric(raw_value).ok_or_else(|| NormalizationError::InvalidValue {
        index,
        field,
        value: raw_value.to_string(),
    })?;

    TradeRecord::new(
        date,
        value,
        optional_text(record, PRODUCT_NAME_FIELD),
        optional_text(record, PRODUCT_CODE_FIELD),
    )
    .map_err(|source| NormalizationError::InvalidRecord { index, source })
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn optional_text(record: &RawRecord, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(value: &str) -> YearMonth {
        YearMonth::parse(value).expect("month")
    }

    fn import_row(date: &str, value: f64) -> RawRecord {
        RawRecord::new()
            .with("date", date)
            .with("import_value", value)
            .with("country_name", "MEXICO")
    }

    #[test]
    fn renames_flow_field_and_indexes_by_month() {
        let rows = vec![import_row("2021-02", 20.0), import_row("2021-01-01", 10.0)];

        let series = normalize(&rows, Flow::Imports).expect("valid rows");
        assert_eq!(series.len(), 2);
        assert_eq!(series.first_date(), Some(ym("2021-01")));
        assert_eq!(series.get(ym("2021-02")), Some(20.0));
    }

    #[test]
    fn accepts_numeric_strings() {
        let rows = vec![RawRecord::new()
            .with("date", "2021-01")
            .with("export_value", " 1250 ")];
        let series = normalize(&rows, Flow::Exports).expect("numeric string");
        assert_eq!(series.get(ym("2021-01")), Some(1250.0));
    }

    #[test]
    fn renormalizing_is_a_no_op() {
        let rows = vec![import_row("2021-01", 10.0), import_row("2021-02", 12.5)];
        let once = normalize(&rows, Flow::Imports).expect("first pass");
        let twice = normalize(&once.to_records(), Flow::Imports).expect("second pass");
        assert_eq!(once, twice);
    }

    #[test]
    fn missing_date_fails_loudly() {
        let rows = vec![RawRecord::new().with("import_value", 1.0)];
        let err = normalize(&rows, Flow::Imports).expect_err("no date");
        assert_eq!(err, NormalizationError::MissingDate { index: 0 });
    }

    #[test]
    fn unparseable_date_fails_loudly() {
        let rows = vec![import_row("January 2021", 1.0)];
        let err = normalize(&rows, Flow::Imports).expect_err("bad date");
        assert!(matches!(err, NormalizationError::InvalidDate { index: 0, .. }));
    }

    #[test]
    fn other_flows_value_field_is_not_accepted() {
        let rows = vec![import_row("2021-01", 1.0)];
        let err = normalize(&rows, Flow::Exports).expect_err("wrong flow field");
        assert!(matches!(
            err,
            NormalizationError::MissingValue {
                field: "export_value",
                ..
            }
        ));
    }

    #[test]
    fn non_numeric_and_negative_values_are_rejected() {
        let rows = vec![RawRecord::new()
            .with("date", "2021-01")
            .with("import_value", "n/a")];
        assert!(matches!(
            normalize(&rows, Flow::Imports).expect_err("text value"),
            NormalizationError::InvalidValue { .. }
        ));

        let rows = vec![import_row("2021-01", -3.0)];
        assert!(matches!(
            normalize(&rows, Flow::Imports).expect_err("negative value"),
            NormalizationError::InvalidRecord { .. }
        ));
    }

    #[test]
    fn duplicate_months_are_rejected() {
        let rows = vec![import_row("2021-01", 1.0), import_row("2021-01", 2.0)];
        let err = normalize(&rows, Flow::Imports).expect_err("duplicate");
        assert_eq!(err, NormalizationError::DuplicateDate { date: ym("2021-01") });
    }

    #[test]
    fn records_keep_product_labels() {
        let rows = vec![RawRecord::new()
            .with("date", "2021-01")
            .with("import_value", 3.0)
            .with("product_name", "AVOCADOS")
            .with("product_code", "080440")];

        let records = normalize_records(&rows, Flow::Imports).expect("valid");
        assert_eq!(records[0].product_name.as_deref(), Some("AVOCADOS"));
        assert_eq!(records[0].product_code.as_deref(), Some("080440"));
    }
}
