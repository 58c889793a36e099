use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{HsCode, ValidationError, YearMonth};

/// Trading partner as known to the trade client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Country {
    pub name: String,
    /// Census Schedule C country code (e.g. `2010` for Mexico).
    pub code: String,
    pub iso2: String,
}

impl Country {
    pub fn new(
        name: impl Into<String>,
        code: impl Into<String>,
        iso2: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        let code = code.into();
        if name.trim().is_empty() || code.trim().is_empty() {
            return Err(ValidationError::EmptyCountry);
        }
        Ok(Self {
            name,
            code,
            iso2: iso2.into().to_ascii_uppercase(),
        })
    }
}

/// One row exactly as the trade client produced it.
///
/// Field names are client-defined; the normalizer owns the mapping onto
/// [`TradeRecord`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(BTreeMap<String, Value>);

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }
}

/// Normalized monthly trade observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub date: YearMonth,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_code: Option<String>,
}

impl TradeRecord {
    pub fn new(
        date: YearMonth,
        value: f64,
        product_name: Option<String>,
        product_code: Option<String>,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("value", value)?;
        Ok(Self {
            date,
            value,
            product_name,
            product_code,
        })
    }
}

/// Date-indexed numeric series with unique, ascending months.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeSeries(BTreeMap<YearMonth, f64>);

impl TimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the previous value when `date` was already present.
    pub fn insert(&mut self, date: YearMonth, value: f64) -> Option<f64> {
        self.0.insert(date, value)
    }

    pub fn get(&self, date: YearMonth) -> Option<f64> {
        self.0.get(&date).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first_date(&self) -> Option<YearMonth> {
        self.0.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<YearMonth> {
        self.0.keys().next_back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (YearMonth, f64)> + '_ {
        self.0.iter().map(|(date, value)| (*date, *value))
    }

    pub fn dates(&self) -> impl Iterator<Item = YearMonth> + '_ {
        self.0.keys().copied()
    }

    /// Renders the series back into canonical `date` / `value` rows.
    pub fn to_records(&self) -> Vec<RawRecord> {
        self.iter()
            .map(|(date, value)| {
                RawRecord::new()
                    .with("date", date.format())
                    .with("value", value)
            })
            .collect()
    }
}

impl FromIterator<(YearMonth, f64)> for TimeSeries {
    fn from_iter<I: IntoIterator<Item = (YearMonth, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Classification code with its description and immediate children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeNode {
    pub code: HsCode,
    pub description: String,
    pub children: BTreeMap<HsCode, String>,
}

impl CodeNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Summed value for one product label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub label: String,
    pub value: f64,
}

/// Label → summed value, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CategorySummary {
    totals: Vec<CategoryTotal>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl CategorySummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, label: &str, value: f64) {
        match self.index.get(label) {
            Some(&position) => self.totals[position].value += value,
            None => {
                self.index.insert(label.to_owned(), self.totals.len());
                self.totals.push(CategoryTotal {
                    label: label.to_owned(),
                    value,
                });
            }
        }
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.index.get(label).map(|&position| self.totals[position].value)
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.totals.iter().map(|entry| entry.value).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryTotal> {
        self.totals.iter()
    }

    /// Largest category first; equal values keep first-appearance order.
    pub fn sorted_desc(&self) -> Vec<CategoryTotal> {
        let mut sorted = self.totals.clone();
        sorted.sort_by(|left, right| right.value.total_cmp(&left.value));
        sorted
    }
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trade_record_rejects_negative_and_nan_values() {
        let date = YearMonth::parse("2021-01").expect("month");
        assert!(matches!(
            TradeRecord::new(date, -1.0, None, None),
            Err(ValidationError::NegativeValue { .. })
        ));
        assert!(matches!(
            TradeRecord::new(date, f64::NAN, None, None),
            Err(ValidationError::NonFiniteValue { .. })
        ));
    }

    #[test]
    fn category_summary_keeps_first_appearance_order() {
        let mut summary = CategorySummary::new();
        summary.add("B", 1.0);
        summary.add("A", 5.0);
        summary.add("B", 2.0);

        let labels = summary.iter().map(|entry| entry.label.as_str()).collect::<Vec<_>>();
        assert_eq!(labels, vec!["B", "A"]);
        assert_eq!(summary.get("B"), Some(3.0));

        let sorted = summary.sorted_desc();
        assert_eq!(sorted[0].label, "A");
        assert_eq!(summary.total(), 8.0);
    }

    #[test]
    fn time_series_serializes_as_month_keyed_object() {
        let series = [
            (YearMonth::parse("2021-02").expect("month"), 2.0),
            (YearMonth::parse("2021-01").expect("month"), 1.0),
        ]
        .into_iter()
        .collect::<TimeSeries>();

        let json = serde_json::to_string(&series).expect("serialize");
        assert_eq!(json, r#"{"2021-01":1.0,"2021-02":2.0}"#);
    }
}
