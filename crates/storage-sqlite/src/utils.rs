//! Helpers shared by the SQLite repositories.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

/// SQLite caps bound parameters per statement (999 on older builds), so
/// `IN (...)` lists are split into chunks of this size.
pub const SQLITE_MAX_PARAMS_CHUNK: usize = 500;

pub fn chunk_for_sqlite<T>(items: &[T]) -> impl Iterator<Item = &[T]> {
    items.chunks(SQLITE_MAX_PARAMS_CHUNK)
}

/// Dates are stored as ISO `YYYY-MM-DD` text so lexical order is date order.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap_or_default()
}

pub fn parse_decimal(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_chunk_for_sqlite_over_limit() {
        let items: Vec<i32> = (0..1200).collect();
        let chunks: Vec<_> = chunk_for_sqlite(&items).collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].len(), 200);
    }

    #[test]
    fn test_date_text_sorts_chronologically() {
        let a = format_date(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        let b = format_date(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        assert!(a < b);
        assert_eq!(parse_date(&b), NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
    }

    #[test]
    fn test_parse_decimal_keeps_precision() {
        assert_eq!(parse_decimal("10.125000"), dec!(10.125));
        assert_eq!(parse_decimal("garbage"), Decimal::ZERO);
    }
}
