mod schema;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

use crate::import::CSV_HEADER;
use crate::models::month::month_key;
use crate::models::*;

const DATE_FORMAT: &str = "%Y-%m-%d";

const EXPENSE_COLUMNS: &str =
    "id, date, category, amount, payment_type, notes, is_recurring, created_at";

const BILL_COLUMNS: &str =
    "id, name, category, amount, frequency, start_date, day_of_month, last_applied";

pub(crate) struct Database {
    conn: Connection,
}

fn parse_date(idx: usize, raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn expense_from_row(row: &Row<'_>) -> rusqlite::Result<Expense> {
    let date: String = row.get(1)?;
    let amount_str: String = row.get(3)?;
    Ok(Expense {
        id: Some(row.get(0)?),
        date: parse_date(1, &date)?,
        category: row.get(2)?,
        amount: Decimal::from_str(&amount_str).unwrap_or_default(),
        payment_type: PaymentType::parse(&row.get::<_, String>(4)?),
        notes: row.get(5)?,
        is_recurring: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn bill_from_row(row: &Row<'_>) -> rusqlite::Result<RecurringBill> {
    let amount_str: String = row.get(3)?;
    let start: String = row.get(5)?;
    Ok(RecurringBill {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        category: row.get(2)?,
        amount: Decimal::from_str(&amount_str).unwrap_or_default(),
        frequency: Frequency::parse(&row.get::<_, String>(4)?),
        start_date: parse_date(5, &start)?,
        day_of_month: row.get(6)?,
        last_applied: row.get(7)?,
    })
}

fn insert_expense_on(conn: &Connection, expense: &Expense) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO expenses (date, category, amount, payment_type, notes, is_recurring, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            expense.date.format(DATE_FORMAT).to_string(),
            expense.category,
            expense.amount.to_string(),
            expense.payment_type.as_str(),
            expense.notes,
            expense.is_recurring,
            expense.created_at,
        ],
    )?;
    Ok(())
}

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("Failed to set database pragmas")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        tracing::debug!(path = %path.display(), "database opened");
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&mut self) -> Result<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            // Fresh database
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            tracing::info!(from = current, to = schema::CURRENT_VERSION, "schema migrated");
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
        }

        Ok(())
    }

    // ── Expenses ──────────────────────────────────────────────

    pub(crate) fn insert_expense(&self, expense: &Expense) -> Result<i64> {
        insert_expense_on(&self.conn, expense)?;
        Ok(self.conn.last_insert_rowid())
    }

    pub(crate) fn insert_expenses_batch(&mut self, expenses: &[Expense]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        for expense in expenses {
            insert_expense_on(&tx, expense)?;
        }
        tx.commit()?;
        Ok(expenses.len())
    }

    /// Newest first, optionally restricted to a "YYYY-MM" month.
    pub(crate) fn get_expenses(&self, month: Option<&str>, limit: Option<u32>) -> Result<Vec<Expense>> {
        let mut sql = format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE 1=1");
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(m) = month {
            sql.push_str(&format!(" AND date LIKE ?{}", param_values.len() + 1));
            param_values.push(Box::new(format!("{m}%")));
        }

        sql.push_str(" ORDER BY date DESC, id DESC");

        if let Some(l) = limit {
            sql.push_str(&format!(" LIMIT {l}"));
        }

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_ref.as_slice(), expense_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Every expense, oldest first.
    pub(crate) fn get_all_expenses(&self) -> Result<Vec<Expense>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses ORDER BY date ASC, id ASC"
        ))?;
        let rows = stmt.query_map([], expense_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_expenses_for_month(&self, year: i32, month: u32) -> Result<Vec<Expense>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE date LIKE ?1 ORDER BY date ASC, id ASC"
        ))?;
        let rows = stmt.query_map(
            params![format!("{}%", month_key(year, month))],
            expense_from_row,
        )?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_expense_count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM expenses", [], |row| row.get(0))?)
    }

    /// Returns whether a row was removed.
    pub(crate) fn delete_expense(&self, id: i64) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM expenses WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }

    /// Whether an expense with the same date, amount and category already exists.
    pub(crate) fn has_similar_expense(
        &self,
        date: NaiveDate,
        amount: Decimal,
        category: &str,
    ) -> Result<bool> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE date = ?1 AND category = ?2 COLLATE NOCASE"
        ))?;
        let rows = stmt.query_map(
            params![date.format(DATE_FORMAT).to_string(), category],
            expense_from_row,
        )?;
        for row in rows {
            // Amounts are text, so compare them as decimals ("5" == "5.00").
            if row?.is_similar_to(date, amount, category) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    // ── Recurring bills ───────────────────────────────────────

    pub(crate) fn insert_recurring(&self, bill: &RecurringBill) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO recurring_bills (name, category, amount, frequency, start_date, day_of_month, last_applied)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                bill.name,
                bill.category,
                bill.amount.to_string(),
                bill.frequency.as_str(),
                bill.start_date.format(DATE_FORMAT).to_string(),
                bill.day_of_month,
                bill.last_applied,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub(crate) fn get_recurring(&self) -> Result<Vec<RecurringBill>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {BILL_COLUMNS} FROM recurring_bills ORDER BY day_of_month, name"
        ))?;
        let rows = stmt.query_map([], bill_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn delete_recurring(&self, id: i64) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM recurring_bills WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }

    /// Append generated expenses and stamp their bills with `month_key` in one
    /// transaction, so a bill is never applied without being marked.
    pub(crate) fn record_recurring_applied(
        &mut self,
        expenses: &[Expense],
        bill_ids: &[i64],
        month_key: &str,
    ) -> Result<()> {
        let tx = self.conn.transaction()?;
        for expense in expenses {
            insert_expense_on(&tx, expense)?;
        }
        for id in bill_ids {
            tx.execute(
                "UPDATE recurring_bills SET last_applied = ?1 WHERE id = ?2",
                params![month_key, id],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    // ── Settings ──────────────────────────────────────────────

    fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let result = self.conn.query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![key],
            |row| row.get(0),
        );
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn get_money_setting(&self, key: &str) -> Result<Option<Decimal>> {
        Ok(self
            .get_setting(key)?
            .and_then(|v| Decimal::from_str(&v).ok())
            .filter(|d| *d > Decimal::ZERO))
    }

    pub(crate) fn load_settings(&self) -> Result<Settings> {
        let mut settings = Settings {
            monthly_budget: self.get_money_setting("monthly_budget")?,
            monthly_income: self.get_money_setting("monthly_income")?,
            savings_goal: self.get_money_setting("savings_goal")?,
            ..Settings::default()
        };
        if let Some(days) = self
            .get_setting("forecast_threshold_days")?
            .and_then(|v| v.parse::<u32>().ok())
        {
            settings.forecast_threshold_days = days;
        }
        Ok(settings)
    }

    pub(crate) fn save_settings(&mut self, settings: &Settings) -> Result<()> {
        let money = |v: Option<Decimal>| v.map(|d| d.to_string()).unwrap_or_default();
        let entries = [
            ("monthly_budget", money(settings.monthly_budget)),
            ("monthly_income", money(settings.monthly_income)),
            ("savings_goal", money(settings.savings_goal)),
            (
                "forecast_threshold_days",
                settings.forecast_threshold_days.to_string(),
            ),
        ];

        let tx = self.conn.transaction()?;
        for (key, value) in &entries {
            tx.execute(
                "INSERT INTO settings (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = ?2",
                params![key, value],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    // ── Analytics ─────────────────────────────────────────────

    /// Amounts are stored as text, so sums are done in Rust to stay exact.
    fn sum_where(&self, clause: &str, value: String) -> Result<Decimal> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT amount FROM expenses WHERE {clause}"))?;
        let rows = stmt.query_map(params![value], |row| row.get::<_, String>(0))?;
        let mut total = Decimal::ZERO;
        for amount in rows {
            let amount = Decimal::from_str(&amount?).unwrap_or_default();
            total = total
                .checked_add(amount)
                .context("Expense total is too large to add up")?;
        }
        Ok(total)
    }

    pub(crate) fn get_month_total(&self, year: i32, month: u32) -> Result<Decimal> {
        self.sum_where("date LIKE ?1", format!("{}%", month_key(year, month)))
    }

    pub(crate) fn get_day_total(&self, date: NaiveDate) -> Result<Decimal> {
        self.sum_where("date = ?1", date.format(DATE_FORMAT).to_string())
    }

    /// Category totals for a "YYYY-MM" month, largest first.
    pub(crate) fn get_spending_by_category(&self, month: &str) -> Result<Vec<(String, Decimal)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT category, amount FROM expenses WHERE date LIKE ?1")?;
        let rows = stmt.query_map(params![format!("{month}%")], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut totals: Vec<(String, Decimal)> = Vec::new();
        for row in rows {
            let (category, amount) = row?;
            let amount = Decimal::from_str(&amount).unwrap_or_default();
            match totals.iter_mut().find(|(c, _)| *c == category) {
                Some((_, total)) => {
                    *total = total
                        .checked_add(amount)
                        .with_context(|| format!("Total for {category} is too large to add up"))?;
                }
                None => totals.push((category, amount)),
            }
        }
        totals.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(totals)
    }

    /// Totals for the most recent `months` months that have expenses, oldest first.
    pub(crate) fn get_monthly_trend(&self, months: usize) -> Result<Vec<(String, Decimal)>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT substr(date, 1, 7) AS month
             FROM expenses
             ORDER BY month DESC
             LIMIT ?1",
        )?;
        let keys = stmt
            .query_map(params![months as i64], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut result = Vec::with_capacity(keys.len());
        for key in keys.into_iter().rev() {
            let total = self.sum_where("date LIKE ?1", format!("{key}%"))?;
            result.push((key, total));
        }
        Ok(result)
    }

    // ── Export ────────────────────────────────────────────────

    /// Write expenses (all, or one "YYYY-MM" month) to `path` as CSV.
    /// Returns the number of rows written; nothing is created when there are none.
    pub(crate) fn export_to_csv(&self, path: &str, month: Option<&str>) -> Result<usize> {
        let mut expenses = self.get_expenses(month, None)?;
        if expenses.is_empty() {
            return Ok(0);
        }
        expenses.reverse();

        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create export file: {path}"))?;
        writer.write_record(CSV_HEADER)?;
        for e in &expenses {
            writer.write_record([
                e.date.format(DATE_FORMAT).to_string(),
                e.category.clone(),
                e.amount.to_string(),
                e.payment_type.as_str().to_string(),
                e.notes.clone(),
                e.is_recurring.to_string(),
                e.created_at.clone(),
            ])?;
        }
        writer.flush()?;

        tracing::info!(rows = expenses.len(), path, "exported expenses");
        Ok(expenses.len())
    }
}

#[cfg(test)]
mod tests;
