use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::Context;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

use super::app::{App, InputMode, PendingAction, Screen};
use super::util::{format_amount, parse_amount};
use crate::db::Database;
use crate::import::CsvImporter;
use crate::models::month::parse_month_key;
use crate::models::{Expense, Frequency, PaymentType, RecurringBill};

pub(crate) struct Command {
    pub(crate) description: &'static str,
    pub(crate) run: fn(&str, &mut App, &mut Database) -> anyhow::Result<()>,
}

macro_rules! register_command {
    ($name:expr, $desc:expr, $func:expr, $registry:expr) => {{
        $registry.insert(
            $name,
            Command {
                description: $desc,
                run: $func,
            },
        );
    }};
}

pub(crate) static COMMANDS: LazyLock<HashMap<&str, Command>> = LazyLock::new(|| {
    let mut r: HashMap<&str, Command> = HashMap::new();

    register_command!("q", "Quit spendcast", cmd_quit, r);
    register_command!("quit", "Quit spendcast", cmd_quit, r);
    register_command!("h", "Show available commands", cmd_help, r);
    register_command!("help", "Show available commands", cmd_help, r);
    register_command!("d", "Go to Dashboard", cmd_dashboard, r);
    register_command!("dashboard", "Go to Dashboard", cmd_dashboard, r);
    register_command!("e", "Go to Expenses", cmd_expenses, r);
    register_command!("expenses", "Go to Expenses", cmd_expenses, r);
    register_command!("r", "Go to Recurring bills", cmd_recurring, r);
    register_command!("recurring", "Go to Recurring bills", cmd_recurring, r);
    register_command!(
        "add",
        "Add expense (e.g. :add 250 Food lunch --date 2024-03-05)",
        cmd_add,
        r
    );
    register_command!(
        "a",
        "Add expense (e.g. :a 250 Food lunch)",
        cmd_add,
        r
    );
    register_command!("delete", "Delete the selected expense or bill", cmd_delete, r);
    register_command!(
        "bill",
        "Add recurring bill (e.g. :bill Rent 15000 Rent --day 1)",
        cmd_bill,
        r
    );
    register_command!("apply", "Apply recurring bills to this month", cmd_apply, r);
    register_command!("budget", "Set monthly budget (e.g. :budget 30000)", cmd_budget, r);
    register_command!("income", "Set monthly income (e.g. :income 60000)", cmd_income, r);
    register_command!("goal", "Set savings goal (e.g. :goal 15000)", cmd_goal, r);
    register_command!(
        "threshold",
        "Days of data before forecasting (e.g. :threshold 7)",
        cmd_threshold,
        r
    );
    register_command!(
        "export",
        "Export this month to CSV (e.g. :export ~/march.csv)",
        cmd_export,
        r
    );
    register_command!(
        "import",
        "Import expenses from CSV (e.g. :import ~/expenses.csv)",
        cmd_import,
        r
    );
    register_command!("month", "Set month (e.g. :month 2024-01)", cmd_month, r);
    register_command!("m", "Set month (e.g. :m 2024-01)", cmd_month, r);
    register_command!("next-month", "Go to next month", cmd_next_month, r);
    register_command!("prev-month", "Go to previous month", cmd_prev_month, r);
    register_command!("today", "Go back to the current month", cmd_today, r);

    r
});

pub(crate) fn handle_command(input: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let trimmed = input.trim();
    let mut parts = trimmed.splitn(2, ' ');
    let cmd_name = parts.next().unwrap_or("");
    let args = parts.next().unwrap_or("").trim();

    if let Some(cmd) = COMMANDS.get(cmd_name) {
        (cmd.run)(args, app, db)?;
    } else {
        let suggestion = find_closest(cmd_name);
        app.set_status(format!(
            "Unknown command: :{cmd_name}. Did you mean :{suggestion}?"
        ));
    }

    Ok(())
}

fn find_closest(input: &str) -> String {
    COMMANDS
        .keys()
        .filter(|k| k.len() > 1) // skip single-letter aliases for suggestions
        .min_by_key(|k| levenshtein(input, k))
        .unwrap_or(&"help")
        .to_string()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Split command arguments into positional words and `--flag [value]` pairs.
/// Switches listed in `switches` take no value.
fn split_args<'a>(args: &'a str, switches: &[&str]) -> (Vec<&'a str>, HashMap<&'a str, &'a str>) {
    let mut positional = Vec::new();
    let mut flags = HashMap::new();
    let mut words = args.split_whitespace();
    while let Some(word) = words.next() {
        if let Some(name) = word.strip_prefix("--") {
            if switches.contains(&name) {
                flags.insert(name, "");
            } else {
                flags.insert(name, words.next().unwrap_or(""));
            }
        } else {
            positional.push(word);
        }
    }
    (positional, flags)
}

fn parse_date_flag(value: Option<&&str>, default: NaiveDate) -> anyhow::Result<NaiveDate> {
    match value {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .with_context(|| format!("Invalid date: {raw} (use YYYY-MM-DD)")),
        None => Ok(default),
    }
}

// ── Command implementations ──────────────────────────────────

fn cmd_quit(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.running = false;
    Ok(())
}

fn cmd_help(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.show_help = true;
    Ok(())
}

fn cmd_dashboard(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    app.screen = Screen::Dashboard;
    app.refresh_dashboard(db)?;
    Ok(())
}

fn cmd_expenses(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    app.screen = Screen::Expenses;
    app.refresh_expenses(db)?;
    Ok(())
}

fn cmd_recurring(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    app.screen = Screen::Recurring;
    app.refresh_bills(db)?;
    Ok(())
}

fn cmd_add(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let (pos, flags) = split_args(args, &["force"]);
    if pos.len() < 2 {
        app.set_status(
            "Usage: :add <amount> <category> [note] [--date YYYY-MM-DD] [--payment TYPE] [--force]",
        );
        return Ok(());
    }

    let amount = parse_amount(pos[0])?;
    let category = pos[1];
    let notes = pos[2..].join(" ");
    let date = parse_date_flag(flags.get("date"), app.today)?;
    let payment = flags
        .get("payment")
        .map_or(PaymentType::Card, |p| PaymentType::parse(p));

    if !flags.contains_key("force") && db.has_similar_expense(date, amount, category)? {
        app.set_status(format!(
            "A {category} expense of {} on {date} already exists. Add --force to record it anyway",
            format_amount(amount)
        ));
        return Ok(());
    }

    let expense = Expense::new(date, category.to_string(), amount, payment, notes);
    let id = db.insert_expense(&expense)?;
    tracing::info!(id, %date, %amount, category, "expense added");
    app.refresh_all(db)?;
    app.set_status(format!(
        "Added {} {category} on {date}",
        format_amount(amount)
    ));
    Ok(())
}

fn cmd_delete(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    match app.screen {
        Screen::Expenses => {
            let Some(expense) = app.selected_expense() else {
                app.set_status("No expense selected");
                return Ok(());
            };
            let Some(id) = expense.id else {
                return Ok(());
            };
            let label = format!(
                "{} {} on {}",
                format_amount(expense.amount),
                expense.category,
                expense.date
            );
            app.confirm_message = format!("Delete {label}?");
            app.pending_action = Some(PendingAction::DeleteExpense { id, label });
            app.input_mode = InputMode::Confirm;
        }
        Screen::Recurring => {
            let Some(bill) = app.selected_bill() else {
                app.set_status("No bill selected");
                return Ok(());
            };
            let Some(id) = bill.id else {
                return Ok(());
            };
            let name = bill.name.clone();
            app.confirm_message = format!("Delete recurring bill '{name}'?");
            app.pending_action = Some(PendingAction::DeleteBill { id, name });
            app.input_mode = InputMode::Confirm;
        }
        Screen::Dashboard => {
            app.set_status("Navigate to Expenses or Recurring first");
        }
    }
    Ok(())
}

fn cmd_bill(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let (pos, flags) = split_args(args, &["weekly"]);
    if pos.len() < 3 {
        app.set_status(
            "Usage: :bill <name> <amount> <category> [--weekly] [--day N] [--start YYYY-MM-DD]",
        );
        return Ok(());
    }

    let amount = parse_amount(pos[1])?;
    let start = parse_date_flag(flags.get("start"), app.today)?;
    let frequency = if flags.contains_key("weekly") {
        Frequency::Weekly
    } else {
        Frequency::Monthly
    };
    let mut bill = RecurringBill::new(
        pos[0].to_string(),
        pos[2].to_string(),
        amount,
        frequency,
        start,
    );
    if let Some(day) = flags.get("day") {
        let day: u32 = day.parse().with_context(|| format!("Invalid day: {day}"))?;
        bill = bill.with_day_of_month(day);
    }

    db.insert_recurring(&bill)?;
    app.screen = Screen::Recurring;
    app.refresh_bills(db)?;
    app.set_status(format!(
        "Added bill {} {} {frequency}",
        bill.name,
        format_amount(bill.amount)
    ));
    Ok(())
}

fn cmd_apply(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let applied = crate::recurring::apply_for_month(db, app.year, app.month)?;
    app.refresh_all(db)?;
    if applied == 0 {
        app.set_status(format!("Nothing to apply for {}", app.month_key()));
    } else {
        app.set_status(format!("Applied {applied} bill(s) to {}", app.month_key()));
    }
    Ok(())
}

fn update_money_setting(
    args: &str,
    app: &mut App,
    db: &mut Database,
    label: &str,
    apply: fn(&mut crate::models::Settings, Decimal),
) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status(format!("Usage: :{} <amount> (0 to unset)", label.to_lowercase()));
        return Ok(());
    }
    let value = Decimal::from_str(args.trim_start_matches('₹').replace(',', "").trim())
        .with_context(|| format!("Invalid amount: {args}"))?;

    let mut settings = db.load_settings()?;
    apply(&mut settings, value);
    db.save_settings(&settings)?;
    tracing::info!(setting = label, %value, "setting changed");
    app.refresh_dashboard(db)?;
    if value > Decimal::ZERO {
        app.set_status(format!("{label} set to {}", format_amount(value)));
    } else {
        app.set_status(format!("{label} cleared"));
    }
    Ok(())
}

fn cmd_budget(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    update_money_setting(args, app, db, "Budget", |s, v| s.set_budget(v))
}

fn cmd_income(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    update_money_setting(args, app, db, "Income", |s, v| s.set_income(v))
}

fn cmd_goal(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    update_money_setting(args, app, db, "Goal", |s, v| s.set_savings_goal(v))
}

fn cmd_threshold(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let Ok(days) = args.parse::<u32>() else {
        app.set_status("Usage: :threshold <days>");
        return Ok(());
    };
    let mut settings = db.load_settings()?;
    settings.forecast_threshold_days = days;
    db.save_settings(&settings)?;
    tracing::info!(days, "forecast threshold changed");
    app.refresh_dashboard(db)?;
    app.set_status(format!("Forecast threshold set to {days} days"));
    Ok(())
}

fn cmd_export(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let key = app.month_key();
    let path = if args.is_empty() {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/spendcast-export-{key}.csv")
    } else {
        crate::run::shellexpand(args)
    };

    let count = db.export_to_csv(&path, Some(&key))?;
    if count == 0 {
        app.set_status(format!("No expenses in {key} to export"));
    } else {
        app.set_status(format!("Exported {count} expenses to {path}"));
    }
    Ok(())
}

fn cmd_import(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :import <file.csv>");
        return Ok(());
    }
    let file_path = crate::run::shellexpand(args);
    let path = Path::new(&file_path);
    if !path.exists() {
        app.set_status(format!("File not found: {file_path}"));
        return Ok(());
    }

    let expenses = CsvImporter::load(path)?;
    let count = db.insert_expenses_batch(&expenses)?;
    tracing::info!(rows = count, path = %file_path, "imported expenses");
    app.refresh_all(db)?;
    app.set_status(format!("Imported {count} expenses"));
    Ok(())
}

fn cmd_month(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        return cmd_today(args, app, db);
    }

    // Accept "2024-01", "2024-1", "01" and "1"
    let key = if args.len() <= 2 {
        format!("{}-{args:0>2}", app.year)
    } else {
        args.to_string()
    };

    match parse_month_key(&key) {
        Some((year, month)) => app.set_month(db, year, month)?,
        None => app.set_status("Invalid month format. Use YYYY-MM (e.g. 2024-01)"),
    }
    Ok(())
}

fn cmd_next_month(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    app.shift_month(db, 1)
}

fn cmd_prev_month(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    app.shift_month(db, -1)
}

fn cmd_today(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    use chrono::Datelike;
    let today = app.today;
    app.set_month(db, today.year(), today.month())
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
