#![allow(clippy::unwrap_used)]

use super::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::io::Write;

fn make_csv_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|s| s.to_string()).collect()
}

fn standard_columns() -> ColumnMap {
    ColumnMap::from_headers(&row(&CSV_HEADER)).unwrap()
}

// ── parse_decimal ─────────────────────────────────────────────

#[test]
fn test_parse_decimal_basic() {
    assert_eq!(parse_decimal("100.50").unwrap(), dec!(100.50));
    assert_eq!(parse_decimal("42").unwrap(), dec!(42));
}

#[test]
fn test_parse_decimal_with_currency() {
    assert_eq!(parse_decimal("$1,234.56").unwrap(), dec!(1234.56));
    assert_eq!(parse_decimal("₹2,500").unwrap(), dec!(2500));
}

#[test]
fn test_parse_decimal_parentheses_negative() {
    assert_eq!(parse_decimal("(500.00)").unwrap(), dec!(-500.00));
}

#[test]
fn test_parse_decimal_empty() {
    assert_eq!(parse_decimal("").unwrap(), Decimal::ZERO);
    assert_eq!(parse_decimal("  ").unwrap(), Decimal::ZERO);
}

#[test]
fn test_parse_decimal_rounds_to_two_places() {
    assert_eq!(parse_decimal("10.125").unwrap(), dec!(10.12));
    assert_eq!(parse_decimal("₹3.999").unwrap(), dec!(4.00));
}

#[test]
fn test_parse_decimal_invalid() {
    assert!(parse_decimal("not_a_number").is_err());
}

// ── parse_date ────────────────────────────────────────────────

#[test]
fn test_parse_date_formats() {
    let expected = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
    assert_eq!(parse_date("2024-01-15").unwrap(), expected);
    assert_eq!(parse_date("01/15/2024").unwrap(), expected);
    assert_eq!(parse_date("01-15-2024").unwrap(), expected);
    assert_eq!(parse_date("01/15/24").unwrap(), expected);
}

#[test]
fn test_parse_date_with_time_part() {
    let expected = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
    assert_eq!(parse_date("2024-01-15 00:00:00").unwrap(), expected);
    assert_eq!(parse_date("2024-01-15T08:30:00").unwrap(), expected);
}

#[test]
fn test_parse_date_invalid() {
    assert!(parse_date("not-a-date").is_err());
    assert!(parse_date("").is_err());
}

// ── ColumnMap ─────────────────────────────────────────────────

#[test]
fn test_columns_found_in_any_order_and_case() {
    let map = ColumnMap::from_headers(&row(&["amount", " NOTES ", "category", "date"])).unwrap();
    assert_eq!(map.amount, 0);
    assert_eq!(map.notes, Some(1));
    assert_eq!(map.category, 2);
    assert_eq!(map.date, 3);
    assert_eq!(map.payment_type, None);
    assert_eq!(map.is_recurring, None);
}

#[test]
fn test_missing_required_column() {
    let err = ColumnMap::from_headers(&row(&["Date", "Amount"])).unwrap_err();
    assert!(err.to_string().contains("Category"));
}

// ── CsvImporter::parse ────────────────────────────────────────

#[test]
fn test_parse_full_rows() {
    let rows = vec![
        row(&["2024-01-15", "Food", "4.50", "UPI", "chai", "False", "old"]),
        row(&["2024-01-16", "Rent", "1200", "Recurring", "Recurring: Flat", "True", "old"]),
    ];
    let expenses = CsvImporter::parse(&rows, &standard_columns()).unwrap();
    assert_eq!(expenses.len(), 2);
    assert_eq!(expenses[0].amount, dec!(4.50));
    assert_eq!(expenses[0].payment_type, PaymentType::Upi);
    assert_eq!(expenses[0].notes, "chai");
    assert!(!expenses[0].is_recurring);
    assert!(expenses[1].is_recurring);
    assert_eq!(expenses[1].payment_type, PaymentType::Recurring);
}

#[test]
fn test_parse_replaces_created_at() {
    let rows = vec![
        row(&["2024-01-15", "Food", "4.50", "Cash", "", "", "2020-01-01"]),
        row(&["2024-01-16", "Food", "5.50", "Cash", "", "", "2020-01-01"]),
    ];
    let expenses = CsvImporter::parse(&rows, &standard_columns()).unwrap();
    assert_ne!(expenses[0].created_at, "2020-01-01");
    assert_eq!(expenses[0].created_at, expenses[1].created_at);
}

#[test]
fn test_parse_skips_empty_dates() {
    let rows = vec![
        row(&["2024-01-15", "Food", "4.50"]),
        row(&["", "", ""]),
        row(&["2024-01-16", "Food", "12.00"]),
    ];
    let expenses = CsvImporter::parse(&rows, &standard_columns()).unwrap();
    assert_eq!(expenses.len(), 2);
}

#[test]
fn test_parse_short_rows_use_defaults() {
    let rows = vec![row(&["2024-01-15", "", "4.50"])];
    let expenses = CsvImporter::parse(&rows, &standard_columns()).unwrap();
    assert_eq!(expenses[0].category, "Other");
    assert_eq!(expenses[0].payment_type, PaymentType::Other);
    assert_eq!(expenses[0].notes, "");
    assert!(!expenses[0].is_recurring);
}

#[test]
fn test_parse_rejects_negative_amounts() {
    let rows = vec![
        row(&["2024-01-15", "Food", "4.50"]),
        row(&["2024-01-16", "Food", "-3"]),
    ];
    let err = CsvImporter::parse(&rows, &standard_columns()).unwrap_err();
    assert!(err.to_string().contains("Row 3"));
}

#[test]
fn test_parse_bad_date_reports_row() {
    let rows = vec![row(&["someday", "Food", "4.50"])];
    let err = CsvImporter::parse(&rows, &standard_columns()).unwrap_err();
    assert!(err.to_string().contains("Row 2"));
}

// ── CsvImporter::load ─────────────────────────────────────────

#[test]
fn test_load_file() {
    let csv = "Date,Category,Amount,PaymentType,Notes,IsRecurring,CreatedAt\n\
               2024-03-01,Food,\"1,250.00\",Card,\"dinner, friends\",False,x\n\
               2024-03-02,Travel,80,Cash,,False,x\n";
    let file = make_csv_file(csv);
    let expenses = CsvImporter::load(file.path()).unwrap();
    assert_eq!(expenses.len(), 2);
    assert_eq!(expenses[0].amount, dec!(1250.00));
    assert_eq!(expenses[0].notes, "dinner, friends");
    assert_eq!(expenses[1].category, "Travel");
}

#[test]
fn test_load_header_only() {
    let file = make_csv_file("Date,Category,Amount\n");
    assert!(CsvImporter::load(file.path()).unwrap().is_empty());
}

#[test]
fn test_load_empty_file() {
    let file = make_csv_file("");
    assert!(CsvImporter::load(file.path()).is_err());
}
