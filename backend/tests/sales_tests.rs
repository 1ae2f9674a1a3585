//! Sales reporting tests
//!
//! Tests for sales order aggregates and list filters:
//! - Profit/loss partition over line items
//! - Order-month filter parsing and lookups
//! - Currency display

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{compute_profit_loss, format_currency, month_lookups, SaleLine, YearMonth};
use std::str::FromStr;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn sale_line_strategy() -> impl Strategy<Value = SaleLine> {
    (0..1000i32, 0..1_000_000i64, 0..1_000_000i64).prop_map(|(q, unit, cost)| {
        SaleLine::new(q, Decimal::new(unit, 2), Decimal::new(cost, 2))
    })
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_profit_and_loss_lines_kept_apart() {
        let lines = vec![
            SaleLine::new(3, dec("7.00"), dec("5.00")),  // +6.00
            SaleLine::new(2, dec("4.00"), dec("5.50")),  // -3.00
            SaleLine::new(1, dec("10.00"), dec("10.00")), // 0
        ];
        let pl = compute_profit_loss(&lines);

        assert_eq!(pl.total_profit, dec("6.00"));
        assert_eq!(pl.total_loss, dec("3.00"));
        assert_eq!(pl.total_cost, dec("36.00"));
        assert_eq!(pl.total_revenue, dec("39.00"));
        assert_eq!(pl.total_profit - pl.total_loss, dec("3.00"));
    }

    #[test]
    fn test_order_without_lines() {
        let pl = compute_profit_loss(&Vec::<SaleLine>::new());
        assert_eq!(pl.total_profit, Decimal::ZERO);
        assert_eq!(pl.total_loss, Decimal::ZERO);
        assert_eq!(pl.total_cost, Decimal::ZERO);
    }

    #[test]
    fn test_month_filter_parsing() {
        let may: YearMonth = "2024-05".parse().unwrap();
        assert_eq!(may.label(), "May 2024");
        assert_eq!(may.to_string(), "2024-05");

        assert!("2024-13".parse::<YearMonth>().is_err());
        assert!("May".parse::<YearMonth>().is_err());
        assert!("2024-00".parse::<YearMonth>().is_err());
    }

    #[test]
    fn test_month_filter_bounds() {
        let dec_2023: YearMonth = "2023-12".parse().unwrap();
        assert_eq!(dec_2023.first_day(), date(2023, 12, 1));
        assert_eq!(dec_2023.next_first_day(), date(2024, 1, 1));
        assert_eq!(YearMonth::from_date(date(2023, 12, 31)), dec_2023);
        assert_ne!(YearMonth::from_date(date(2024, 1, 1)), dec_2023);
    }

    #[test]
    fn test_month_lookups_sorted_and_distinct() {
        let lookups = month_lookups(vec![
            date(2024, 5, 20),
            date(2023, 11, 2),
            date(2024, 5, 1),
        ]);
        let values: Vec<&str> = lookups.iter().map(|l| l.value.as_str()).collect();
        assert_eq!(values, vec!["2023-11", "2024-05"]);
        assert_eq!(lookups[0].label, "November 2023");
    }

    #[test]
    fn test_currency_display() {
        assert_eq!(format_currency("₹", dec("1234.5")), "₹1234.50");
        assert_eq!(format_currency("₹", Decimal::ZERO), "₹0.00");
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    /// Profit and loss are non-negative and net to the sum of line profits
    #[test]
    fn prop_profit_loss_partition(lines in prop::collection::vec(sale_line_strategy(), 0..20)) {
        let pl = compute_profit_loss(&lines);
        let line_profit: Decimal = lines.iter().map(|l| l.profit()).sum();

        prop_assert!(pl.total_profit >= Decimal::ZERO);
        prop_assert!(pl.total_loss >= Decimal::ZERO);
        prop_assert_eq!(pl.total_profit - pl.total_loss, line_profit);
        prop_assert_eq!(pl.total_revenue - pl.total_cost, line_profit);
    }

    /// Every valid month round-trips through its query value
    #[test]
    fn prop_month_value_round_trip(year in 1900..2100i32, month in 1..=12u32) {
        let ym = YearMonth::new(year, month).unwrap();
        let parsed: YearMonth = ym.to_string().parse().unwrap();
        prop_assert_eq!(parsed, ym);
        prop_assert_eq!(YearMonth::from_date(ym.first_day()), ym);
        prop_assert_ne!(YearMonth::from_date(ym.next_first_day()), ym);
    }

    /// Month numbers outside 1-12 are rejected
    #[test]
    fn prop_bad_month_rejected(year in 1900..2100i32, month in 13..100u32) {
        let value = format!("{:04}-{:02}", year, month);
        prop_assert!(value.parse::<YearMonth>().is_err());
    }
}
