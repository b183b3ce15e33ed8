use chrono::{Datelike, Months, NaiveDate};

/// Number of days in a calendar month, leap years included.
/// `None` for a month outside `1..=12` or a year chrono cannot represent.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = first.checked_add_months(Months::new(1))?;
    Some((next - first).num_days() as u32)
}

/// "YYYY-MM"
pub fn month_key(year: i32, month: u32) -> String {
    format!("{year:04}-{month:02}")
}

/// Parse "YYYY-MM" (a trailing "-DD" is tolerated) into `(year, month)`.
pub fn parse_month_key(s: &str) -> Option<(i32, u32)> {
    let trimmed = s.trim();
    let head = trimmed.get(..7).unwrap_or(trimmed);
    let date = NaiveDate::parse_from_str(&format!("{head}-01"), "%Y-%m-%d").ok()?;
    Some((date.year(), date.month()))
}

/// Move a month forwards (`delta > 0`) or backwards.
pub fn shift_month(year: i32, month: u32, delta: i32) -> Option<(i32, u32)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let moved = if delta >= 0 {
        first.checked_add_months(Months::new(delta.unsigned_abs()))?
    } else {
        first.checked_sub_months(Months::new(delta.unsigned_abs()))?
    };
    Some((moved.year(), moved.month()))
}
