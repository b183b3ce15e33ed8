use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

use super::{current_month, forecaster_for, shellexpand, today, MonthReport};
use crate::db::Database;
use crate::import::CsvImporter;
use crate::models::month::{month_key, parse_month_key};
use crate::forecast::build_daily_series;
use crate::models::{Expense, Frequency, PaymentType, RecurringBill, DEFAULT_CATEGORIES};
use crate::recurring;
use crate::ui::util::{format_amount, parse_amount};

/// Flags that take a value; everything else starting with `--` is a switch.
const VALUE_FLAGS: &[&str] = &["--date", "--payment", "--note", "--month", "--limit", "--day", "--start"];

pub(crate) fn as_cli(args: &[String], db: &mut Database) -> Result<()> {
    let rest = &args[2..];
    match args[1].as_str() {
        "add" | "a" => cli_add(rest, db),
        "list" | "ls" => cli_list(rest, db),
        "delete" | "rm" => cli_delete(rest, db),
        "bill" | "bills" => cli_bill(rest, db),
        "settings" => cli_settings(db),
        "set" => cli_set(rest, db),
        "summary" | "s" => cli_summary(rest, db),
        "forecast" | "f" => cli_forecast(rest, db),
        "export" => cli_export(rest, db),
        "import" => cli_import(rest, db),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("spendcast {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    println!("Spendcast - expense tracker with month-end spend forecasts");
    println!();
    println!("Usage: spendcast [command]");
    println!();
    println!("Commands:");
    println!("  (none)                              Launch interactive TUI");
    println!("  add <amount> <category>             Record an expense");
    println!("    --date <YYYY-MM-DD>               Date (default: today)");
    println!("    --payment <Card|UPI|Cash|Other>   Payment type (default: Card)");
    println!("    --note <text>                     Free-form note");
    println!("    --force                           Record even if it looks like a duplicate");
    println!("  list [YYYY-MM] [--limit N]          List expenses, newest first");
    println!("  delete <id>                         Delete an expense");
    println!("  bill add <name> <amount> <category> Add a recurring bill");
    println!("    --weekly                          Repeat weekly instead of monthly");
    println!("    --day <1-28>                      Day of month (monthly bills)");
    println!("    --start <YYYY-MM-DD>              First occurrence (default: today)");
    println!("  bill list                           List recurring bills");
    println!("  bill delete <id>                    Delete a recurring bill");
    println!("  bill apply [YYYY-MM]                Write this month's bills into expenses");
    println!("  settings                            Show budget, income, goal and threshold");
    println!("  set budget|income|goal <amount>     Change a money setting (0 clears it)");
    println!("  set threshold <days>                Days of data before forecasting");
    println!("  summary [YYYY-MM]                   Month totals by category");
    println!("  forecast [YYYY-MM]                  Predicted month-end spend");
    println!("  export [path] [--month YYYY-MM]     Export expenses to CSV (--all for everything)");
    println!("  import <file.csv>                   Append expenses from a CSV export");
    println!("  --help, -h                          Show this help");
    println!("  --version, -V                       Show version");
    println!();
    println!("Categories: {}", DEFAULT_CATEGORIES.join(", "));
    let payments: Vec<&str> = PaymentType::all().iter().map(|p| p.as_str()).collect();
    println!("Payment types: {}", payments.join(", "));
}

// ── Argument helpers ──────────────────────────────────────────

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

/// Arguments that are neither flags nor flag values.
fn positional(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut skip = false;
    for arg in args {
        if skip {
            skip = false;
            continue;
        }
        if VALUE_FLAGS.contains(&arg.as_str()) {
            skip = true;
        } else if !arg.starts_with("--") {
            out.push(arg.as_str());
        }
    }
    out
}

fn parse_day(raw: Option<&str>) -> Result<NaiveDate> {
    match raw {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{s}', expected YYYY-MM-DD")),
        None => Ok(today()),
    }
}

fn month_arg(args: &[String]) -> Result<(i32, u32)> {
    match positional(args).first() {
        Some(raw) => {
            parse_month_key(raw).with_context(|| format!("Invalid month '{raw}', expected YYYY-MM"))
        }
        None => Ok(current_month()),
    }
}

// ── Expenses ──────────────────────────────────────────────────

fn cli_add(args: &[String], db: &mut Database) -> Result<()> {
    let pos = positional(args);
    let (Some(amount), Some(category)) = (pos.first(), pos.get(1)) else {
        anyhow::bail!("Usage: spendcast add <amount> <category> [--date YYYY-MM-DD] [--payment TYPE] [--note TEXT] [--force]");
    };

    let amount = parse_amount(amount)?;
    let date = parse_day(flag_value(args, "--date"))?;
    let payment = flag_value(args, "--payment").map_or(PaymentType::Card, PaymentType::parse);
    let notes = flag_value(args, "--note").unwrap_or_default().to_string();

    if !has_flag(args, "--force") && db.has_similar_expense(date, amount, category)? {
        anyhow::bail!(
            "A {category} expense of {} on {date} already exists. Use --force to add it anyway",
            format_amount(amount)
        );
    }

    let expense = Expense::new(date, category.to_string(), amount, payment, notes);
    let id = db.insert_expense(&expense)?;
    tracing::info!(id, %date, %amount, category, "expense added");
    println!("Added #{id}: {} {category} on {date}", format_amount(amount));
    Ok(())
}

fn cli_list(args: &[String], db: &mut Database) -> Result<()> {
    let month = match positional(args).first() {
        Some(_) => {
            let (y, m) = month_arg(args)?;
            Some(month_key(y, m))
        }
        None => None,
    };
    let limit = flag_value(args, "--limit")
        .map(|l| l.parse::<u32>().with_context(|| format!("Invalid limit: {l}")))
        .transpose()?
        .or(if month.is_none() { Some(20) } else { None });

    let expenses = db.get_expenses(month.as_deref(), limit)?;
    if expenses.is_empty() {
        println!("No expenses");
        return Ok(());
    }

    println!(
        "{:<5} {:<10}  {:<14} {:>12}  {:<9} Notes",
        "ID", "Date", "Category", "Amount", "Payment"
    );
    println!("{}", "─".repeat(66));
    for e in &expenses {
        println!(
            "{:<5} {:<10}  {:<14} {:>12}  {:<9} {}",
            e.id.unwrap_or(0),
            e.date.to_string(),
            e.category,
            format_amount(e.amount),
            e.payment_type.as_str(),
            e.notes,
        );
    }
    Ok(())
}

fn cli_delete(args: &[String], db: &mut Database) -> Result<()> {
    let id = positional(args)
        .first()
        .and_then(|s| s.trim_start_matches('#').parse::<i64>().ok())
        .ok_or_else(|| anyhow::anyhow!("Usage: spendcast delete <id>"))?;
    if db.delete_expense(id)? {
        println!("Deleted expense #{id}");
        Ok(())
    } else {
        anyhow::bail!("No expense with id {id}")
    }
}

// ── Recurring bills ───────────────────────────────────────────

fn cli_bill(args: &[String], db: &mut Database) -> Result<()> {
    let sub = args.first().map(String::as_str).unwrap_or("list");
    let rest = args.get(1..).unwrap_or_default();
    match sub {
        "add" => {
            let pos = positional(rest);
            let (Some(name), Some(amount), Some(category)) = (pos.first(), pos.get(1), pos.get(2))
            else {
                anyhow::bail!("Usage: spendcast bill add <name> <amount> <category> [--weekly] [--day N] [--start YYYY-MM-DD]");
            };
            let amount = parse_amount(amount)?;
            let start = parse_day(flag_value(rest, "--start"))?;
            let frequency = if has_flag(rest, "--weekly") {
                Frequency::Weekly
            } else {
                Frequency::Monthly
            };
            let mut bill = RecurringBill::new(
                name.to_string(),
                category.to_string(),
                amount,
                frequency,
                start,
            );
            if let Some(day) = flag_value(rest, "--day") {
                let day: u32 = day.parse().with_context(|| format!("Invalid day: {day}"))?;
                bill = bill.with_day_of_month(day);
            }
            let id = db.insert_recurring(&bill)?;
            println!(
                "Added bill #{id}: {name} {} {frequency}",
                format_amount(bill.amount)
            );
            Ok(())
        }
        "list" | "ls" => {
            let bills = db.get_recurring()?;
            if bills.is_empty() {
                println!("No recurring bills");
                return Ok(());
            }
            println!(
                "{:<5} {:<18} {:<14} {:>12}  {:<8} {:>3}  Last applied",
                "ID", "Name", "Category", "Amount", "Every", "Day"
            );
            println!("{}", "─".repeat(76));
            for b in &bills {
                let day = match b.frequency {
                    Frequency::Monthly => b.day_of_month.to_string(),
                    Frequency::Weekly => b.start_date.weekday().to_string(),
                };
                println!(
                    "{:<5} {:<18} {:<14} {:>12}  {:<8} {:>3}  {}",
                    b.id.unwrap_or(0),
                    b.name,
                    b.category,
                    format_amount(b.amount),
                    b.frequency.as_str(),
                    day,
                    if b.last_applied.is_empty() { "never" } else { b.last_applied.as_str() },
                );
            }
            Ok(())
        }
        "delete" | "rm" => {
            let id = positional(rest)
                .first()
                .and_then(|s| s.trim_start_matches('#').parse::<i64>().ok())
                .ok_or_else(|| anyhow::anyhow!("Usage: spendcast bill delete <id>"))?;
            if db.delete_recurring(id)? {
                println!("Deleted bill #{id}");
                Ok(())
            } else {
                anyhow::bail!("No recurring bill with id {id}")
            }
        }
        "apply" => {
            let (year, month) = month_arg(rest)?;
            let applied = recurring::apply_for_month(db, year, month)?;
            if applied == 0 {
                println!("Nothing to apply for {}", month_key(year, month));
            } else {
                println!("Applied {applied} bill(s) to {}", month_key(year, month));
            }
            Ok(())
        }
        other => anyhow::bail!("Unknown bill command: {other} (add, list, delete, apply)"),
    }
}

// ── Settings ──────────────────────────────────────────────────

fn money_or_unset(value: Option<Decimal>) -> String {
    value.map_or_else(|| "not set".to_string(), format_amount)
}

fn cli_settings(db: &mut Database) -> Result<()> {
    let s = db.load_settings()?;
    println!("  Monthly budget:   {}", money_or_unset(s.monthly_budget));
    println!("  Monthly income:   {}", money_or_unset(s.monthly_income));
    println!("  Savings goal:     {}", money_or_unset(s.savings_goal));
    println!("  Forecast after:   {} days", s.forecast_threshold_days);
    Ok(())
}

fn cli_set(args: &[String], db: &mut Database) -> Result<()> {
    let (Some(key), Some(value)) = (args.first(), args.get(1)) else {
        anyhow::bail!("Usage: spendcast set <budget|income|goal|threshold> <value>");
    };
    let mut settings = db.load_settings()?;
    let money = || {
        Decimal::from_str(value.replace(',', "").trim())
            .with_context(|| format!("Invalid amount: {value}"))
    };
    match key.as_str() {
        "budget" => settings.set_budget(money()?),
        "income" => settings.set_income(money()?),
        "goal" | "savings" => settings.set_savings_goal(money()?),
        "threshold" => {
            settings.forecast_threshold_days = value
                .parse()
                .with_context(|| format!("Invalid number of days: {value}"))?;
        }
        other => anyhow::bail!("Unknown setting: {other}"),
    }
    db.save_settings(&settings)?;
    tracing::info!(setting = %key, value = %value, "setting changed");
    cli_settings(db)
}

// ── Reports ───────────────────────────────────────────────────

fn cli_summary(args: &[String], db: &mut Database) -> Result<()> {
    let (year, month) = month_arg(args)?;
    let key = month_key(year, month);
    let expenses = db.get_expenses_for_month(year, month)?;
    let series = build_daily_series(&expenses, year, month)?;
    let spending = db.get_spending_by_category(&key)?;
    let settings = db.load_settings()?;

    println!("Spendcast - {key}");
    println!("{}", "─".repeat(40));
    println!("  Spent:       {}", format_amount(series.total()?));
    println!("  Today:       {}", format_amount(db.get_day_total(today())?));
    println!("  Budget:      {}", money_or_unset(settings.monthly_budget));
    println!("  Expenses:    {}", expenses.len());
    if let Some((day, amount)) = series
        .iter()
        .filter(|(_, amount)| !amount.is_zero())
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
    {
        println!("  Busiest day: {} ({})", day, format_amount(amount));
    }

    if !spending.is_empty() {
        println!();
        println!("Spending by Category:");
        for (name, amount) in &spending {
            println!("  {name:<24} {:>14}", format_amount(*amount));
        }
    }

    Ok(())
}

fn cli_forecast(args: &[String], db: &mut Database) -> Result<()> {
    let (year, month) = month_arg(args)?;
    let settings = db.load_settings()?;
    let forecaster = forecaster_for(&settings);
    let report = MonthReport::build(db, &forecaster, settings, year, month, today())?;

    println!("Forecast - {}", month_key(year, month));
    println!("{}", "─".repeat(40));
    println!("  Spent so far:     {}", format_amount(report.spent_so_far));
    match &report.forecast {
        crate::forecast::ForecastResult::Ok {
            predicted_total,
            model_name,
            ..
        } => {
            println!("  Predicted total:  {}", format_amount(*predicted_total));
            println!("  Model:            {model_name}");
        }
        crate::forecast::ForecastResult::InsufficientData { .. } => {
            println!("  {}", report.forecast.describe());
            println!(
                "  Forecasting starts after {} days of data",
                forecaster.threshold_days()
            );
        }
        other => println!("  {}", other.describe()),
    }

    let outlook = &report.outlook;
    if let Some(left) = outlook.budget_left {
        if outlook.over_budget() {
            println!("  Over budget by:   {}", format_amount(left.abs()));
        } else {
            println!("  Budget left:      {}", format_amount(left));
        }
    }
    if let Some(savings) = outlook.predicted_savings {
        println!("  Predicted savings: {}", format_amount(savings));
        if let Some(ratio) = outlook.savings_ratio {
            println!("  Savings goal:     {:.0}%", ratio * 100.0);
        }
    }
    Ok(())
}

// ── Import / export ───────────────────────────────────────────

fn cli_export(args: &[String], db: &mut Database) -> Result<()> {
    let month = if has_flag(args, "--all") {
        None
    } else {
        Some(match flag_value(args, "--month") {
            Some(raw) => {
                let (y, m) = parse_month_key(raw)
                    .with_context(|| format!("Invalid month '{raw}', expected YYYY-MM"))?;
                month_key(y, m)
            }
            None => {
                let (y, m) = current_month();
                month_key(y, m)
            }
        })
    };

    let output_path = positional(args)
        .first()
        .map(|a| shellexpand(a))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            let suffix = month.as_deref().unwrap_or("all");
            format!("{home}/spendcast-export-{suffix}.csv")
        });

    let count = db.export_to_csv(&output_path, month.as_deref())?;
    if count == 0 {
        println!("No expenses for {}", month.as_deref().unwrap_or("any month"));
    } else {
        println!("Exported {count} expenses to {output_path}");
    }
    Ok(())
}

fn cli_import(args: &[String], db: &mut Database) -> Result<()> {
    let Some(file_path) = positional(args).first().map(|p| shellexpand(p)) else {
        anyhow::bail!("Usage: spendcast import <file.csv>");
    };
    let path = Path::new(&file_path);
    if !path.exists() {
        anyhow::bail!("File not found: {file_path}");
    }

    let expenses = CsvImporter::load(path)?;
    let count = db.insert_expenses_batch(&expenses)?;
    tracing::info!(rows = count, path = %file_path, "imported expenses");
    println!("Imported {count} expenses");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use rust_decimal_macros::dec;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_positional_skips_flag_values() {
        let a = args(&["12.50", "--note", "lunch out", "Food", "--force"]);
        assert_eq!(positional(&a), vec!["12.50", "Food"]);
        assert_eq!(flag_value(&a, "--note"), Some("lunch out"));
        assert!(has_flag(&a, "--force"));
        assert!(!has_flag(&a, "--weekly"));
    }

    #[test]
    fn test_add_refuses_duplicates_without_force() {
        let mut db = Database::open_in_memory().unwrap();
        let add = args(&["40", "Food", "--date", "2024-05-02"]);
        cli_add(&add, &mut db).unwrap();
        assert!(cli_add(&add, &mut db).is_err());
        assert_eq!(db.get_expense_count().unwrap(), 1);

        let forced = args(&["40", "Food", "--date", "2024-05-02", "--force"]);
        cli_add(&forced, &mut db).unwrap();
        assert_eq!(db.get_expense_count().unwrap(), 2);
    }

    #[test]
    fn test_add_reads_payment_and_note() {
        let mut db = Database::open_in_memory().unwrap();
        let add = args(&["9.99", "Subscriptions", "--date", "2024-05-02", "--payment", "upi", "--note", "music"]);
        cli_add(&add, &mut db).unwrap();
        let stored = &db.get_all_expenses().unwrap()[0];
        assert_eq!(stored.payment_type, PaymentType::Upi);
        assert_eq!(stored.notes, "music");
        assert_eq!(stored.date, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
    }

    #[test]
    fn test_set_and_bill_commands() {
        let mut db = Database::open_in_memory().unwrap();
        cli_set(&args(&["budget", "30000"]), &mut db).unwrap();
        cli_set(&args(&["threshold", "7"]), &mut db).unwrap();
        let s = db.load_settings().unwrap();
        assert_eq!(s.monthly_budget, Some(dec!(30000)));
        assert_eq!(s.forecast_threshold_days, 7);
        assert!(cli_set(&args(&["colour", "blue"]), &mut db).is_err());

        cli_bill(
            &args(&["add", "Netflix", "649", "Subscriptions", "--day", "31", "--start", "2024-01-01"]),
            &mut db,
        )
        .unwrap();
        let bills = db.get_recurring().unwrap();
        assert_eq!(bills[0].day_of_month, 28);

        cli_bill(&args(&["apply", "2024-02"]), &mut db).unwrap();
        assert_eq!(db.get_expenses_for_month(2024, 2).unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_command_is_error() {
        let mut db = Database::open_in_memory().unwrap();
        assert!(as_cli(&args(&["spendcast", "frobnicate"]), &mut db).is_err());
    }
}
