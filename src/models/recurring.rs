use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use super::month::{days_in_month, month_key};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Monthly,
    Weekly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "Monthly",
            Self::Weekly => "Weekly",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "weekly" | "week" | "w" => Self::Weekly,
            _ => Self::Monthly,
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Highest day of month accepted when a bill is entered, so every month has it.
pub const MAX_BILL_DAY: u32 = 28;

#[derive(Debug, Clone, PartialEq)]
pub struct RecurringBill {
    pub id: Option<i64>,
    pub name: String,
    pub category: String,
    pub amount: Decimal,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub day_of_month: u32,
    /// Month key ("YYYY-MM") of the last month this bill was written into
    /// the expense log, or empty if never.
    pub last_applied: String,
}

impl RecurringBill {
    pub fn new(
        name: String,
        category: String,
        amount: Decimal,
        frequency: Frequency,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            name,
            category,
            amount,
            frequency,
            start_date,
            day_of_month: start_date.day().min(MAX_BILL_DAY),
            last_applied: String::new(),
        }
    }

    pub fn with_day_of_month(mut self, day: u32) -> Self {
        self.day_of_month = day.clamp(1, MAX_BILL_DAY);
        self
    }

    pub fn applied_in(&self, year: i32, month: u32) -> bool {
        self.last_applied == month_key(year, month)
    }

    /// Dates on which this bill falls in the given month.
    ///
    /// Monthly bills land on `day_of_month`, clamped to the month's last day.
    /// Weekly bills land every seven days counted from `start_date`.
    /// Nothing is due in months that end before the bill starts.
    pub fn due_dates(&self, year: i32, month: u32) -> Vec<NaiveDate> {
        let Some(last_day) = days_in_month(year, month) else {
            return Vec::new();
        };
        let Some(month_end) = NaiveDate::from_ymd_opt(year, month, last_day) else {
            return Vec::new();
        };
        if self.start_date > month_end {
            return Vec::new();
        }

        match self.frequency {
            Frequency::Monthly => {
                let day = self.day_of_month.clamp(1, last_day);
                NaiveDate::from_ymd_opt(year, month, day)
                    .into_iter()
                    .collect()
            }
            Frequency::Weekly => {
                let Some(month_start) = NaiveDate::from_ymd_opt(year, month, 1) else {
                    return Vec::new();
                };
                let mut first = self.start_date;
                if first < month_start {
                    let gap = (month_start - first).num_days();
                    let weeks = (gap + 6) / 7;
                    first += chrono::Duration::days(weeks * 7);
                }
                first
                    .iter_weeks()
                    .take_while(|d| *d <= month_end)
                    .collect()
            }
        }
    }
}
