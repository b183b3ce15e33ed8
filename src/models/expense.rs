use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentType {
    Card,
    Upi,
    Cash,
    Recurring,
    Other,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Card => "Card",
            Self::Upi => "UPI",
            Self::Cash => "Cash",
            Self::Recurring => "Recurring",
            Self::Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "card" | "credit" | "debit" => Self::Card,
            "upi" => Self::Upi,
            "cash" => Self::Cash,
            "recurring" => Self::Recurring,
            _ => Self::Other,
        }
    }

    pub fn all() -> &'static [PaymentType] {
        &[
            Self::Card,
            Self::Upi,
            Self::Cash,
            Self::Recurring,
            Self::Other,
        ]
    }
}

impl std::fmt::Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Categories offered when entering an expense. Free-form names are accepted too.
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Food",
    "Shopping",
    "Rent",
    "Travel",
    "Subscriptions",
    "Utilities",
    "Other",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    pub id: Option<i64>,
    pub date: NaiveDate,
    pub category: String,
    pub amount: Decimal,
    pub payment_type: PaymentType,
    pub notes: String,
    pub is_recurring: bool,
    pub created_at: String,
}

impl Expense {
    pub fn new(
        date: NaiveDate,
        category: String,
        amount: Decimal,
        payment_type: PaymentType,
        notes: String,
    ) -> Self {
        Self {
            id: None,
            date,
            category,
            amount,
            payment_type,
            notes,
            is_recurring: false,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn in_month(&self, year: i32, month: u32) -> bool {
        self.date.year() == year && self.date.month() == month
    }

    /// Same date, amount and category (case-insensitive). Used to warn before
    /// recording what looks like the same purchase twice.
    pub fn is_similar_to(&self, date: NaiveDate, amount: Decimal, category: &str) -> bool {
        self.date == date && self.amount == amount && self.category.eq_ignore_ascii_case(category)
    }
}
