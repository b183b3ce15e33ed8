mod expense;
pub(crate) mod month;
mod recurring;
mod settings;

pub use expense::{Expense, PaymentType, DEFAULT_CATEGORIES};
pub use recurring::{Frequency, RecurringBill, MAX_BILL_DAY};
pub use settings::{Settings, DEFAULT_THRESHOLD_DAYS};
