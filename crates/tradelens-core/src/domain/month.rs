use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::macros::format_description;
use time::{Date, Duration, Month};

use crate::ValidationError;

/// Calendar month, stored as the first day of that month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth(Date);

impl YearMonth {
    pub fn new(year: i32, month: u8) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidMonth {
            value: format!("{year:04}-{month:02}"),
        };
        let month = Month::try_from(month).map_err(|_| invalid())?;
        let date = Date::from_calendar_date(year, month, 1).map_err(|_| invalid())?;
        Ok(Self(date))
    }

    /// Accepts `YYYY-MM` or `YYYY-MM-DD`; the day is validated then dropped.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        let invalid = || ValidationError::InvalidMonth {
            value: trimmed.to_owned(),
        };
        let full = match trimmed.len() {
            7 => format!("{trimmed}-01"),
            10 => trimmed.to_owned(),
            _ => return Err(invalid()),
        };

        let date = Date::parse(&full, format_description!("[year]-[month]-[day]"))
            .map_err(|_| invalid())?;
        Ok(Self::from_date(date))
    }

    pub fn from_date(date: Date) -> Self {
        Self(date.replace_day(1).unwrap_or(date))
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    pub fn month(self) -> u8 {
        u8::from(self.0.month())
    }

    pub fn first_day(self) -> Date {
        self.0
    }

    /// Shifts by whole calendar months; negative values move backwards.
    pub fn add_months(self, months: i32) -> Self {
        let index = self.year() * 12 + i32::from(self.month()) - 1 + months;
        let year = index.div_euclid(12);
        let month = (index.rem_euclid(12) + 1) as u8;
        Self::new(year, month).unwrap_or(self)
    }

    /// Subtracts `days` from the first of the month and truncates the result
    /// back to month granularity.
    pub fn lookback_days(self, days: i64) -> Self {
        self.0
            .checked_sub(Duration::days(days))
            .map(Self::from_date)
            .unwrap_or(self)
    }

    pub fn format(self) -> String {
        format!("{:04}-{:02}", self.year(), self.month())
    }
}

impl Display for YearMonth {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format())
    }
}

impl FromStr for YearMonth {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl Serialize for YearMonth {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format())
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(value: &str) -> YearMonth {
        YearMonth::parse(value).expect("valid month")
    }

    #[test]
    fn parses_month_and_truncates_day() {
        assert_eq!(ym("2021-01").format(), "2021-01");
        assert_eq!(ym("2021-01-17"), ym("2021-01"));
    }

    #[test]
    fn rejects_malformed_months() {
        for input in ["2021", "2021-13", "21-01", "2021-02-30", "not a date"] {
            let err = YearMonth::parse(input).expect_err("must fail");
            assert!(matches!(err, ValidationError::InvalidMonth { .. }), "{input}");
        }
    }

    #[test]
    fn add_months_crosses_year_boundaries() {
        assert_eq!(ym("2021-01").add_months(-12), ym("2020-01"));
        assert_eq!(ym("2021-01").add_months(-1), ym("2020-12"));
        assert_eq!(ym("2020-11").add_months(3), ym("2021-02"));
    }

    #[test]
    fn lookback_of_365_days_lands_twelve_months_earlier() {
        assert_eq!(ym("2021-01").lookback_days(365), ym("2020-01"));
        assert_eq!(ym("2021-03").lookback_days(365), ym("2020-03"));
        assert_eq!(ym("2020-03").lookback_days(365), ym("2019-03"));
    }

    #[test]
    fn serializes_as_year_month_string() {
        let json = serde_json::to_string(&ym("2022-07")).expect("serialize");
        assert_eq!(json, "\"2022-07\"");
        let back: YearMonth = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, ym("2022-07"));
    }
}
