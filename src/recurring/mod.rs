use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::db::Database;
use crate::models::month::month_key;
use crate::models::{Expense, PaymentType, RecurringBill};

fn expense_for(bill: &RecurringBill, date: chrono::NaiveDate, created_at: &str) -> Expense {
    Expense {
        id: None,
        date,
        category: bill.category.clone(),
        amount: bill.amount,
        payment_type: PaymentType::Recurring,
        notes: format!("Recurring: {}", bill.name),
        is_recurring: true,
        created_at: created_at.to_string(),
    }
}

/// Expense rows every bill would produce in `(year, month)`. Nothing is stored
/// and `last_applied` is ignored, so this is safe to call for previews.
pub(crate) fn generate_for_month(
    bills: &[RecurringBill],
    year: i32,
    month: u32,
    now: DateTime<Utc>,
) -> Vec<Expense> {
    let created_at = now.to_rfc3339();
    bills
        .iter()
        .flat_map(|bill| {
            bill.due_dates(year, month)
                .into_iter()
                .map(|d| expense_for(bill, d, &created_at))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Write this month's rows for every bill not yet applied in `(year, month)`
/// and stamp those bills. Running it twice for the same month adds nothing.
/// Returns the number of bills applied.
pub(crate) fn apply_for_month(db: &mut Database, year: i32, month: u32) -> Result<usize> {
    let key = month_key(year, month);
    let bills = db.get_recurring()?;

    let pending: Vec<&RecurringBill> = bills
        .iter()
        .filter(|b| !b.applied_in(year, month))
        .collect();

    let created_at = Utc::now().to_rfc3339();
    let mut expenses = Vec::new();
    let mut applied_ids = Vec::new();
    for bill in pending {
        let dates = bill.due_dates(year, month);
        if dates.is_empty() {
            continue;
        }
        expenses.extend(dates.into_iter().map(|d| expense_for(bill, d, &created_at)));
        if let Some(id) = bill.id {
            applied_ids.push(id);
        }
    }

    if applied_ids.is_empty() {
        return Ok(0);
    }

    db.record_recurring_applied(&expenses, &applied_ids, &key)?;
    tracing::info!(
        month = %key,
        bills = applied_ids.len(),
        rows = expenses.len(),
        "applied recurring bills"
    );
    Ok(applied_ids.len())
}

#[cfg(test)]
mod tests;
