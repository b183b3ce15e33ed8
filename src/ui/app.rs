use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::db::Database;
use crate::forecast::build_daily_series;
use crate::models::month::{month_key, shift_month};
use crate::models::*;
use crate::run::{forecaster_for, MonthReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Dashboard,
    Expenses,
    Recurring,
}

impl Screen {
    pub(crate) fn all() -> &'static [Screen] {
        &[Self::Dashboard, Self::Expenses, Self::Recurring]
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dashboard => write!(f, "Dashboard"),
            Self::Expenses => write!(f, "Expenses"),
            Self::Recurring => write!(f, "Recurring"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InputMode {
    Normal,
    Command,
    Confirm,
}

impl std::fmt::Display for InputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL"),
            Self::Command => write!(f, "COMMAND"),
            Self::Confirm => write!(f, "CONFIRM"),
        }
    }
}

/// Pending action that requires user confirmation.
#[derive(Debug, Clone)]
pub(crate) enum PendingAction {
    DeleteExpense { id: i64, label: String },
    DeleteBill { id: i64, name: String },
}

pub(crate) struct App {
    pub(crate) running: bool,
    pub(crate) screen: Screen,
    pub(crate) input_mode: InputMode,
    pub(crate) command_input: String,
    pub(crate) status_message: String,
    pub(crate) show_help: bool,
    pub(crate) year: i32,
    pub(crate) month: u32,
    pub(crate) today: NaiveDate,

    // Dashboard
    pub(crate) report: Option<MonthReport>,
    pub(crate) upgrade_model: Option<&'static str>,
    pub(crate) today_total: Decimal,
    pub(crate) spending_by_category: Vec<(String, Decimal)>,
    pub(crate) daily: Vec<Decimal>,
    pub(crate) monthly_trend: Vec<(String, Decimal)>,

    // Expenses
    pub(crate) expenses: Vec<Expense>,
    pub(crate) expense_index: usize,
    pub(crate) expense_scroll: usize,
    pub(crate) expense_count: i64,

    // Recurring
    pub(crate) bills: Vec<RecurringBill>,
    pub(crate) bill_index: usize,
    pub(crate) bill_scroll: usize,
    /// Rows the bills not yet applied this month would add, and their total.
    pub(crate) unapplied_rows: usize,
    pub(crate) unapplied_total: Decimal,

    // Confirmation
    pub(crate) pending_action: Option<PendingAction>,
    pub(crate) confirm_message: String,

    // Layout (updated each render frame)
    pub(crate) visible_rows: usize,
}

impl App {
    pub(crate) fn new(today: NaiveDate) -> Self {
        use chrono::Datelike;

        Self {
            running: true,
            screen: Screen::Dashboard,
            input_mode: InputMode::Normal,
            command_input: String::new(),
            status_message: String::new(),
            show_help: false,
            year: today.year(),
            month: today.month(),
            today,

            report: None,
            upgrade_model: None,
            today_total: Decimal::ZERO,
            spending_by_category: Vec::new(),
            daily: Vec::new(),
            monthly_trend: Vec::new(),

            expenses: Vec::new(),
            expense_index: 0,
            expense_scroll: 0,
            expense_count: 0,

            bills: Vec::new(),
            bill_index: 0,
            bill_scroll: 0,
            unapplied_rows: 0,
            unapplied_total: Decimal::ZERO,

            pending_action: None,
            confirm_message: String::new(),

            visible_rows: 20,
        }
    }

    pub(crate) fn month_key(&self) -> String {
        month_key(self.year, self.month)
    }

    pub(crate) fn settings(&self) -> Settings {
        self.report
            .as_ref()
            .map(|r| r.settings.clone())
            .unwrap_or_default()
    }

    pub(crate) fn refresh_dashboard(&mut self, db: &Database) -> Result<()> {
        let settings = db.load_settings()?;
        let forecaster = forecaster_for(&settings);
        self.upgrade_model = forecaster.upgrade_name();

        let report = MonthReport::build(db, &forecaster, settings, self.year, self.month, self.today)?;
        self.report = Some(report);

        self.today_total = db.get_day_total(self.today)?;
        self.spending_by_category = db.get_spending_by_category(&self.month_key())?;
        self.monthly_trend = db.get_monthly_trend(6)?;

        let month_expenses = db.get_expenses_for_month(self.year, self.month)?;
        self.daily = build_daily_series(&month_expenses, self.year, self.month)?
            .amounts()
            .to_vec();
        Ok(())
    }

    pub(crate) fn refresh_expenses(&mut self, db: &Database) -> Result<()> {
        self.expenses = db.get_expenses(Some(&self.month_key()), None)?;
        self.expense_count = db.get_expense_count()?;
        crate::ui::util::clamp_cursor(
            &mut self.expense_index,
            &mut self.expense_scroll,
            self.expenses.len(),
        );
        Ok(())
    }

    pub(crate) fn refresh_bills(&mut self, db: &Database) -> Result<()> {
        self.bills = db.get_recurring()?;
        crate::ui::util::clamp_cursor(&mut self.bill_index, &mut self.bill_scroll, self.bills.len());

        let unapplied: Vec<RecurringBill> = self
            .bills
            .iter()
            .filter(|b| !b.applied_in(self.year, self.month))
            .cloned()
            .collect();
        let preview =
            crate::recurring::generate_for_month(&unapplied, self.year, self.month, Utc::now());
        self.unapplied_rows = preview.len();
        self.unapplied_total = preview
            .iter()
            .try_fold(Decimal::ZERO, |total, e| total.checked_add(e.amount))
            .context("Unapplied bills are too large to add up")?;
        Ok(())
    }

    pub(crate) fn refresh_all(&mut self, db: &Database) -> Result<()> {
        self.refresh_dashboard(db)?;
        self.refresh_expenses(db)?;
        self.refresh_bills(db)?;
        Ok(())
    }

    /// Move the viewed month by `delta` months and reload everything.
    pub(crate) fn shift_month(&mut self, db: &Database, delta: i32) -> Result<()> {
        if let Some((year, month)) = shift_month(self.year, self.month, delta) {
            self.set_month(db, year, month)?;
        }
        Ok(())
    }

    pub(crate) fn set_month(&mut self, db: &Database, year: i32, month: u32) -> Result<()> {
        self.year = year;
        self.month = month;
        self.expense_index = 0;
        self.expense_scroll = 0;
        self.refresh_all(db)?;
        self.set_status(format!("Month: {}", self.month_key()));
        Ok(())
    }

    pub(crate) fn selected_expense(&self) -> Option<&Expense> {
        self.expenses.get(self.expense_index)
    }

    pub(crate) fn selected_bill(&self) -> Option<&RecurringBill> {
        self.bills.get(self.bill_index)
    }

    pub(crate) fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }
}
