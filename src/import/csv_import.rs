use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

use crate::models::{Expense, PaymentType};

/// Column order used for export; import locates the same names in any order.
pub(crate) const CSV_HEADER: [&str; 7] = [
    "Date",
    "Category",
    "Amount",
    "PaymentType",
    "Notes",
    "IsRecurring",
    "CreatedAt",
];

/// Positions of the known columns in an import file's header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ColumnMap {
    pub(crate) date: usize,
    pub(crate) category: usize,
    pub(crate) amount: usize,
    pub(crate) payment_type: Option<usize>,
    pub(crate) notes: Option<usize>,
    pub(crate) is_recurring: Option<usize>,
}

impl ColumnMap {
    pub(crate) fn from_headers(headers: &[String]) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let required = |name: &str| {
            find(name).with_context(|| format!("CSV is missing the '{name}' column"))
        };
        Ok(Self {
            date: required("Date")?,
            category: required("Category")?,
            amount: required("Amount")?,
            payment_type: find("PaymentType"),
            notes: find("Notes"),
            is_recurring: find("IsRecurring"),
        })
    }
}

pub(crate) struct CsvImporter;

impl CsvImporter {
    /// Read the header row and all data rows as strings.
    pub(crate) fn read(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .has_headers(true)
            .from_path(path)
            .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

        let headers: Vec<String> = rdr
            .headers()
            .context("Failed to read CSV header")?
            .iter()
            .map(|s| s.to_string())
            .collect();
        if headers.iter().all(|h| h.trim().is_empty()) {
            anyhow::bail!("CSV file is empty");
        }

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result.context("Failed to read CSV record")?;
            rows.push(record.iter().map(|s| s.to_string()).collect());
        }
        Ok((headers, rows))
    }

    /// Parse rows into expenses. Rows without a date are skipped; every
    /// imported row is stamped with the same `CreatedAt`.
    pub(crate) fn parse(rows: &[Vec<String>], columns: &ColumnMap) -> Result<Vec<Expense>> {
        let now = chrono::Utc::now().to_rfc3339();
        let cell = |row: &[String], idx: Option<usize>| {
            idx.and_then(|i| row.get(i))
                .map(|s| s.trim().to_string())
                .unwrap_or_default()
        };

        let mut expenses = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            let line = i + 2;
            let date_str = cell(row, Some(columns.date));
            if date_str.is_empty() {
                continue;
            }

            let date = parse_date(&date_str)
                .with_context(|| format!("Row {line}: failed to parse date '{date_str}'"))?;
            let amount = parse_decimal(&cell(row, Some(columns.amount)))
                .with_context(|| format!("Row {line}: failed to parse amount"))?;
            if amount.is_sign_negative() && !amount.is_zero() {
                anyhow::bail!("Row {line}: negative amount {amount} is not allowed");
            }

            let mut category = cell(row, Some(columns.category));
            if category.is_empty() {
                category = "Other".into();
            }

            let payment = cell(row, columns.payment_type);
            expenses.push(Expense {
                id: None,
                date,
                category,
                amount,
                payment_type: PaymentType::parse(&payment),
                notes: cell(row, columns.notes),
                is_recurring: parse_bool(&cell(row, columns.is_recurring)),
                created_at: now.clone(),
            });
        }

        Ok(expenses)
    }

    /// Read and parse a file in one step.
    pub(crate) fn load(path: &Path) -> Result<Vec<Expense>> {
        let (headers, rows) = Self::read(path)?;
        let columns = ColumnMap::from_headers(&headers)?;
        let expenses = Self::parse(&rows, &columns)?;
        tracing::debug!(path = %path.display(), rows = expenses.len(), "parsed import file");
        Ok(expenses)
    }
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    // Exported files may carry a time part ("2024-01-15 00:00:00").
    let head = s.split([' ', 'T']).next().unwrap_or(s);
    for fmt in &["%Y-%m-%d", "%m/%d/%y", "%m/%d/%Y", "%m-%d-%Y", "%d/%m/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(head, fmt) {
            return Ok(d);
        }
    }
    anyhow::bail!("Could not parse date: {}", s)
}

pub(crate) fn parse_decimal(s: &str) -> Result<Decimal> {
    let cleaned = s
        .replace(['$', '₹', '€', '£', ','], "")
        .replace('(', "-")
        .replace(')', "")
        .trim()
        .to_string();
    if cleaned.is_empty() {
        return Ok(Decimal::ZERO);
    }
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_str(&cleaned.replace('"', "")))
        .map(|amount| amount.round_dp(2))
        .context(format!("Failed to parse '{}' as decimal", s))
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "y"
    )
}

#[cfg(test)]
#[path = "csv_import_tests.rs"]
mod tests;
