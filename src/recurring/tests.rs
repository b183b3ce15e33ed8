#![allow(clippy::unwrap_used)]

use super::*;
use chrono::{NaiveDate, TimeZone};
use rust_decimal_macros::dec;

use crate::models::Frequency;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

fn monthly(name: &str, day: u32) -> RecurringBill {
    RecurringBill::new(
        name.into(),
        "Rent".into(),
        dec!(1200),
        Frequency::Monthly,
        date(2024, 1, 1),
    )
    .with_day_of_month(day)
}

fn weekly(name: &str, start: NaiveDate) -> RecurringBill {
    RecurringBill::new(
        name.into(),
        "Food".into(),
        dec!(25),
        Frequency::Weekly,
        start,
    )
}

// ── generate_for_month ────────────────────────────────────────

#[test]
fn test_generated_rows_are_marked_recurring() {
    let rows = generate_for_month(&[monthly("Flat", 5)], 2024, 3, now());
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.date, date(2024, 3, 5));
    assert_eq!(row.category, "Rent");
    assert_eq!(row.amount, dec!(1200));
    assert_eq!(row.payment_type, PaymentType::Recurring);
    assert_eq!(row.notes, "Recurring: Flat");
    assert!(row.is_recurring);
    assert_eq!(row.created_at, now().to_rfc3339());
}

#[test]
fn test_monthly_day_clamped_to_short_month() {
    let mut bill = monthly("Flat", 28);
    bill.day_of_month = 31;
    let rows = generate_for_month(std::slice::from_ref(&bill), 2025, 2, now());
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].date, date(2025, 2, 28));

    let leap = generate_for_month(&[bill], 2024, 2, now());
    assert_eq!(leap.len(), 1);
    assert_eq!(leap[0].date, date(2024, 2, 29));
}

#[test]
fn test_monthly_bill_skipped_before_start() {
    assert!(generate_for_month(&[monthly("Flat", 5)], 2023, 12, now()).is_empty());
}

#[test]
fn test_weekly_bill_repeats() {
    let rows = generate_for_month(&[weekly("Veg box", date(2024, 2, 27))], 2024, 3, now());
    let dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
    assert_eq!(
        dates,
        vec![
            date(2024, 3, 5),
            date(2024, 3, 12),
            date(2024, 3, 19),
            date(2024, 3, 26)
        ]
    );
}

#[test]
fn test_bill_starting_later_is_skipped() {
    let mut bill = monthly("Gym", 10);
    bill.start_date = date(2024, 6, 1);
    assert!(generate_for_month(&[bill], 2024, 3, now()).is_empty());
}

#[test]
fn test_generate_ignores_last_applied() {
    let mut bill = monthly("Flat", 5);
    bill.last_applied = "2024-03".into();
    assert_eq!(generate_for_month(&[bill], 2024, 3, now()).len(), 1);
}

// ── apply_for_month ───────────────────────────────────────────

#[test]
fn test_apply_is_idempotent() {
    let mut db = Database::open_in_memory().unwrap();
    db.insert_recurring(&monthly("Flat", 5)).unwrap();
    db.insert_recurring(&weekly("Veg box", date(2024, 2, 27)))
        .unwrap();

    assert_eq!(apply_for_month(&mut db, 2024, 3).unwrap(), 2);
    assert_eq!(db.get_expense_count().unwrap(), 5);

    assert_eq!(apply_for_month(&mut db, 2024, 3).unwrap(), 0);
    assert_eq!(db.get_expense_count().unwrap(), 5);

    let bills = db.get_recurring().unwrap();
    assert!(bills.iter().all(|b| b.last_applied == "2024-03"));
}

#[test]
fn test_apply_next_month_runs_again() {
    let mut db = Database::open_in_memory().unwrap();
    db.insert_recurring(&monthly("Flat", 5)).unwrap();

    apply_for_month(&mut db, 2024, 3).unwrap();
    assert_eq!(apply_for_month(&mut db, 2024, 4).unwrap(), 1);

    let april = db.get_expenses_for_month(2024, 4).unwrap();
    assert_eq!(april.len(), 1);
    assert!(april[0].is_recurring);
}

#[test]
fn test_apply_leaves_future_bills_unstamped() {
    let mut db = Database::open_in_memory().unwrap();
    let mut later = monthly("Gym", 10);
    later.start_date = date(2024, 6, 1);
    db.insert_recurring(&later).unwrap();

    assert_eq!(apply_for_month(&mut db, 2024, 3).unwrap(), 0);
    assert_eq!(db.get_recurring().unwrap()[0].last_applied, "");
}

#[test]
fn test_apply_without_bills() {
    let mut db = Database::open_in_memory().unwrap();
    assert_eq!(apply_for_month(&mut db, 2024, 3).unwrap(), 0);
}
