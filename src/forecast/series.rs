use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use super::error::ForecastError;
use crate::models::month::days_in_month;
use crate::models::Expense;

/// Spend per calendar day for one month, with every day present.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DailySeries {
    year: i32,
    month: u32,
    amounts: Vec<Decimal>,
    has_source_records: bool,
}

impl DailySeries {
    pub(crate) fn year(&self) -> i32 {
        self.year
    }

    pub(crate) fn month(&self) -> u32 {
        self.month
    }

    pub(crate) fn len(&self) -> usize {
        self.amounts.len()
    }

    /// `false` when the series was built from an empty record list, as
    /// opposed to a month in which nothing happened to be spent.
    pub(crate) fn has_source_records(&self) -> bool {
        self.has_source_records
    }

    /// Amount for day `day` (1-based).
    #[cfg(test)]
    pub(crate) fn get(&self, day: u32) -> Option<Decimal> {
        let idx = (day as usize).checked_sub(1)?;
        self.amounts.get(idx).copied()
    }

    pub(crate) fn amounts(&self) -> &[Decimal] {
        &self.amounts
    }

    /// The first `days` days of the month.
    pub(crate) fn head(&self, days: usize) -> &[Decimal] {
        &self.amounts[..days.min(self.amounts.len())]
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (NaiveDate, Decimal)> + '_ {
        self.amounts.iter().enumerate().filter_map(|(i, amount)| {
            NaiveDate::from_ymd_opt(self.year, self.month, i as u32 + 1).map(|d| (d, *amount))
        })
    }

    pub(crate) fn total(&self) -> Result<Decimal, ForecastError> {
        checked_sum(&self.amounts)
    }
}

/// Sum of `amounts`, or [`ForecastError::Overflow`] past `Decimal::MAX`.
pub(crate) fn checked_sum(amounts: &[Decimal]) -> Result<Decimal, ForecastError> {
    amounts.iter().try_fold(Decimal::ZERO, |total, amount| {
        total.checked_add(*amount).ok_or(ForecastError::Overflow)
    })
}

/// Collapse expense records into a dense daily series for `(year, month)`.
///
/// Records outside the month are ignored and same-day amounts are summed.
/// A month with no matching records still comes back fully zero-filled.
pub(crate) fn build_daily_series(
    expenses: &[Expense],
    year: i32,
    month: u32,
) -> Result<DailySeries, ForecastError> {
    let days = days_in_month(year, month).ok_or(ForecastError::InvalidMonth { year, month })?;

    let mut amounts = vec![Decimal::ZERO; days as usize];
    for expense in expenses.iter().filter(|e| e.in_month(year, month)) {
        let day = &mut amounts[expense.date.day0() as usize];
        *day = day
            .checked_add(expense.amount)
            .ok_or(ForecastError::Overflow)?;
    }

    Ok(DailySeries {
        year,
        month,
        amounts,
        has_source_records: !expenses.is_empty(),
    })
}
