//! Common types used across the backend

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A calendar month, written `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First day of the month
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    /// First day of the following month (exclusive upper bound for range queries)
    pub fn next_first_day(&self) -> NaiveDate {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1).unwrap_or_default()
    }

    /// Human label such as "May 2024"
    pub fn label(&self) -> String {
        self.first_day().format("%B %Y").to_string()
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| format!("expected YYYY-MM, got {:?}", s))?;

        let year: i32 = year
            .parse()
            .map_err(|_| format!("invalid year in {:?}", s))?;
        let month: u32 = month
            .parse()
            .map_err(|_| format!("invalid month in {:?}", s))?;

        YearMonth::new(year, month).ok_or_else(|| format!("no such month: {:?}", s))
    }
}

impl Serialize for YearMonth {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One entry of the order-month filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthLookup {
    /// Query value, `YYYY-MM`
    pub value: String,
    /// Display label, `Month YYYY`
    pub label: String,
}

impl From<YearMonth> for MonthLookup {
    fn from(month: YearMonth) -> Self {
        Self {
            value: month.to_string(),
            label: month.label(),
        }
    }
}

/// Build month filter lookups from order dates, one per month, ascending
pub fn month_lookups<I>(dates: I) -> Vec<MonthLookup>
where
    I: IntoIterator<Item = NaiveDate>,
{
    let mut months: Vec<YearMonth> = dates.into_iter().map(YearMonth::from_date).collect();
    months.sort();
    months.dedup();
    months.into_iter().map(MonthLookup::from).collect()
}

/// Format a currency amount with two decimal places, e.g. "₹1234.50"
pub fn format_currency(symbol: &str, amount: Decimal) -> String {
    format!("{}{:.2}", symbol, amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_year_month() {
        let month: YearMonth = "2024-05".parse().unwrap();
        assert_eq!(month.year(), 2024);
        assert_eq!(month.month(), 5);
        assert_eq!(month.to_string(), "2024-05");
    }

    #[test]
    fn test_parse_year_month_invalid() {
        assert!("2024-13".parse::<YearMonth>().is_err());
        assert!("2024-00".parse::<YearMonth>().is_err());
        assert!("May".parse::<YearMonth>().is_err());
        assert!("2024".parse::<YearMonth>().is_err());
        assert!("2024-ab".parse::<YearMonth>().is_err());
    }

    #[test]
    fn test_label() {
        let month: YearMonth = "2024-05".parse().unwrap();
        assert_eq!(month.label(), "May 2024");
    }

    #[test]
    fn test_month_bounds() {
        let month = YearMonth::new(2024, 12).unwrap();
        assert_eq!(month.first_day(), NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
        assert_eq!(month.next_first_day(), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(YearMonth::from_date(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()), month);
    }

    #[test]
    fn test_month_lookups_dedup_and_sort() {
        let dates = vec![
            NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 20).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 28).unwrap(),
        ];
        let lookups = month_lookups(dates);
        assert_eq!(
            lookups,
            vec![
                MonthLookup {
                    value: "2024-05".to_string(),
                    label: "May 2024".to_string()
                },
                MonthLookup {
                    value: "2024-06".to_string(),
                    label: "June 2024".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_year_month_serde() {
        let month: YearMonth = serde_json::from_str("\"2023-11\"").unwrap();
        assert_eq!(month, YearMonth::new(2023, 11).unwrap());
        assert_eq!(serde_json::to_string(&month).unwrap(), "\"2023-11\"");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency("₹", Decimal::new(123450, 2)), "₹1234.50");
        assert_eq!(format_currency("₹", Decimal::from(6)), "₹6.00");
        assert_eq!(format_currency("$", Decimal::ZERO), "$0.00");
    }
}
