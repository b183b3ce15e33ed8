#![allow(clippy::unwrap_used)]

use super::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn expense(d: NaiveDate, category: &str, amount: Decimal) -> Expense {
    Expense::new(d, category.into(), amount, PaymentType::Card, String::new())
}

fn setup_test_data(db: &mut Database) {
    let expenses = vec![
        expense(date(2024, 1, 5), "Food", dec!(12.50)),
        expense(date(2024, 1, 5), "Travel", dec!(40)),
        expense(date(2024, 1, 20), "Food", dec!(7.25)),
        expense(date(2024, 2, 1), "Rent", dec!(1200)),
        expense(date(2024, 2, 14), "Shopping", dec!(89.99)),
    ];
    db.insert_expenses_batch(&expenses).unwrap();
}

// ── Schema ────────────────────────────────────────────────────

#[test]
fn test_fresh_database_is_empty() {
    let db = Database::open_in_memory().unwrap();
    assert_eq!(db.get_expense_count().unwrap(), 0);
    assert!(db.get_recurring().unwrap().is_empty());
    assert_eq!(db.load_settings().unwrap(), Settings::default());
}

#[test]
fn test_reopen_file_database_keeps_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spendcast.db");
    {
        let db = Database::open(&path).unwrap();
        db.insert_expense(&expense(date(2024, 3, 1), "Food", dec!(5)))
            .unwrap();
    }
    let db = Database::open(&path).unwrap();
    assert_eq!(db.get_expense_count().unwrap(), 1);
}

// ── Expenses ──────────────────────────────────────────────────

#[test]
fn test_expense_roundtrip() {
    let db = Database::open_in_memory().unwrap();
    let mut e = Expense::new(
        date(2024, 3, 9),
        "Subscriptions".into(),
        dec!(9.99),
        PaymentType::Upi,
        "music".into(),
    );
    e.is_recurring = true;
    let id = db.insert_expense(&e).unwrap();

    let all = db.get_all_expenses().unwrap();
    assert_eq!(all.len(), 1);
    let stored = &all[0];
    assert_eq!(stored.id, Some(id));
    assert_eq!(stored.date, e.date);
    assert_eq!(stored.category, "Subscriptions");
    assert_eq!(stored.amount, dec!(9.99));
    assert_eq!(stored.payment_type, PaymentType::Upi);
    assert_eq!(stored.notes, "music");
    assert!(stored.is_recurring);
    assert_eq!(stored.created_at, e.created_at);
}

#[test]
fn test_batch_insert_counts() {
    let mut db = Database::open_in_memory().unwrap();
    setup_test_data(&mut db);
    assert_eq!(db.get_expense_count().unwrap(), 5);
}

#[test]
fn test_get_expenses_newest_first() {
    let mut db = Database::open_in_memory().unwrap();
    setup_test_data(&mut db);
    let list = db.get_expenses(None, None).unwrap();
    assert_eq!(list.first().unwrap().date, date(2024, 2, 14));
    assert_eq!(list.last().unwrap().date, date(2024, 1, 5));
}

#[test]
fn test_get_expenses_month_and_limit() {
    let mut db = Database::open_in_memory().unwrap();
    setup_test_data(&mut db);
    assert_eq!(db.get_expenses(Some("2024-01"), None).unwrap().len(), 3);
    assert_eq!(db.get_expenses(Some("2024-02"), None).unwrap().len(), 2);
    assert_eq!(db.get_expenses(None, Some(2)).unwrap().len(), 2);
    assert!(db.get_expenses(Some("2023-12"), None).unwrap().is_empty());
}

#[test]
fn test_all_expenses_oldest_first() {
    let mut db = Database::open_in_memory().unwrap();
    setup_test_data(&mut db);
    let all = db.get_all_expenses().unwrap();
    let dates: Vec<NaiveDate> = all.iter().map(|e| e.date).collect();
    let mut sorted = dates.clone();
    sorted.sort();
    assert_eq!(dates, sorted);
}

#[test]
fn test_expenses_for_month() {
    let mut db = Database::open_in_memory().unwrap();
    setup_test_data(&mut db);
    let feb = db.get_expenses_for_month(2024, 2).unwrap();
    assert_eq!(feb.len(), 2);
    assert!(feb.iter().all(|e| e.in_month(2024, 2)));
}

#[test]
fn test_delete_expense() {
    let db = Database::open_in_memory().unwrap();
    let id = db
        .insert_expense(&expense(date(2024, 1, 1), "Food", dec!(3)))
        .unwrap();
    assert!(db.delete_expense(id).unwrap());
    assert!(!db.delete_expense(id).unwrap());
    assert_eq!(db.get_expense_count().unwrap(), 0);
}

#[test]
fn test_similar_expense_detection() {
    let mut db = Database::open_in_memory().unwrap();
    setup_test_data(&mut db);
    assert!(db
        .has_similar_expense(date(2024, 1, 5), dec!(12.5), "food")
        .unwrap());
    assert!(!db
        .has_similar_expense(date(2024, 1, 5), dec!(12.51), "Food")
        .unwrap());
    assert!(!db
        .has_similar_expense(date(2024, 1, 6), dec!(12.50), "Food")
        .unwrap());
    assert!(!db
        .has_similar_expense(date(2024, 1, 5), dec!(12.50), "Travel")
        .unwrap());
}

// ── Recurring bills ───────────────────────────────────────────

fn bill(name: &str, day: u32) -> RecurringBill {
    RecurringBill::new(
        name.into(),
        "Subscriptions".into(),
        dec!(15),
        Frequency::Monthly,
        date(2024, 1, 1),
    )
    .with_day_of_month(day)
}

#[test]
fn test_recurring_crud() {
    let db = Database::open_in_memory().unwrap();
    let id = db.insert_recurring(&bill("Streaming", 12)).unwrap();
    db.insert_recurring(&bill("Gym", 3)).unwrap();

    let bills = db.get_recurring().unwrap();
    assert_eq!(bills.len(), 2);
    assert_eq!(bills[0].name, "Gym");
    assert_eq!(bills[1].day_of_month, 12);
    assert_eq!(bills[1].frequency, Frequency::Monthly);
    assert_eq!(bills[1].last_applied, "");

    assert!(db.delete_recurring(id).unwrap());
    assert_eq!(db.get_recurring().unwrap().len(), 1);
}

#[test]
fn test_record_recurring_applied_is_atomic_unit() {
    let mut db = Database::open_in_memory().unwrap();
    let id = db.insert_recurring(&bill("Streaming", 12)).unwrap();
    let generated = vec![expense(date(2024, 5, 12), "Subscriptions", dec!(15))];

    db.record_recurring_applied(&generated, &[id], "2024-05")
        .unwrap();

    assert_eq!(db.get_expense_count().unwrap(), 1);
    let stored = db.get_recurring().unwrap();
    assert!(stored[0].applied_in(2024, 5));
}

// ── Settings ──────────────────────────────────────────────────

#[test]
fn test_settings_roundtrip() {
    let mut db = Database::open_in_memory().unwrap();
    let mut s = Settings::default();
    s.set_budget(dec!(2500));
    s.set_income(dec!(4000.50));
    s.set_savings_goal(dec!(800));
    s.forecast_threshold_days = 7;
    db.save_settings(&s).unwrap();

    assert_eq!(db.load_settings().unwrap(), s);
}

#[test]
fn test_settings_unset_values_stay_unset() {
    let mut db = Database::open_in_memory().unwrap();
    let mut s = Settings::default();
    s.set_budget(dec!(100));
    db.save_settings(&s).unwrap();

    s.set_budget(Decimal::ZERO);
    db.save_settings(&s).unwrap();

    let loaded = db.load_settings().unwrap();
    assert_eq!(loaded.monthly_budget, None);
    assert_eq!(loaded.monthly_income, None);
}

// ── Analytics ─────────────────────────────────────────────────

#[test]
fn test_month_and_day_totals() {
    let mut db = Database::open_in_memory().unwrap();
    setup_test_data(&mut db);
    assert_eq!(db.get_month_total(2024, 1).unwrap(), dec!(59.75));
    assert_eq!(db.get_month_total(2024, 3).unwrap(), Decimal::ZERO);
    assert_eq!(db.get_day_total(date(2024, 1, 5)).unwrap(), dec!(52.50));
}

#[test]
fn test_spending_by_category() {
    let mut db = Database::open_in_memory().unwrap();
    setup_test_data(&mut db);
    let jan = db.get_spending_by_category("2024-01").unwrap();
    assert_eq!(
        jan,
        vec![("Travel".to_string(), dec!(40)), ("Food".to_string(), dec!(19.75))]
    );
}

#[test]
fn test_overflowing_totals_are_errors() {
    let mut db = Database::open_in_memory().unwrap();
    let huge = vec![
        expense(date(2024, 3, 1), "Food", Decimal::MAX),
        expense(date(2024, 3, 2), "Food", Decimal::MAX),
    ];
    db.insert_expenses_batch(&huge).unwrap();
    assert!(db.get_month_total(2024, 3).is_err());
    assert!(db.get_spending_by_category("2024-03").is_err());
    assert_eq!(db.get_day_total(date(2024, 3, 1)).unwrap(), Decimal::MAX);
}

#[test]
fn test_monthly_trend() {
    let mut db = Database::open_in_memory().unwrap();
    setup_test_data(&mut db);
    let trend = db.get_monthly_trend(6).unwrap();
    assert_eq!(
        trend,
        vec![
            ("2024-01".to_string(), dec!(59.75)),
            ("2024-02".to_string(), dec!(1289.99)),
        ]
    );
    assert_eq!(db.get_monthly_trend(1).unwrap().len(), 1);
}

// ── Export ────────────────────────────────────────────────────

#[test]
fn test_export_month() {
    let mut db = Database::open_in_memory().unwrap();
    setup_test_data(&mut db);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("jan.csv");
    let path = path.to_str().unwrap();

    assert_eq!(db.export_to_csv(path, Some("2024-01")).unwrap(), 3);
    let content = std::fs::read_to_string(path).unwrap();
    let mut lines = content.lines();
    assert_eq!(
        lines.next(),
        Some("Date,Category,Amount,PaymentType,Notes,IsRecurring,CreatedAt")
    );
    assert!(lines.next().unwrap().starts_with("2024-01-05,"));
    assert_eq!(content.lines().count(), 4);
}

#[test]
fn test_export_empty_writes_nothing() {
    let db = Database::open_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("none.csv");
    assert_eq!(db.export_to_csv(path.to_str().unwrap(), None).unwrap(), 0);
    assert!(!path.exists());
}
