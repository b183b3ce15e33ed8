use rust_decimal::Decimal;

/// Days of data the forecaster wants before it trusts a projection.
pub const DEFAULT_THRESHOLD_DAYS: u32 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub monthly_budget: Option<Decimal>,
    pub monthly_income: Option<Decimal>,
    pub savings_goal: Option<Decimal>,
    pub forecast_threshold_days: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            monthly_budget: None,
            monthly_income: None,
            savings_goal: None,
            forecast_threshold_days: DEFAULT_THRESHOLD_DAYS,
        }
    }
}

impl Settings {
    pub fn set_budget(&mut self, value: Decimal) {
        self.monthly_budget = positive(value);
    }

    pub fn set_income(&mut self, value: Decimal) {
        self.monthly_income = positive(value);
    }

    pub fn set_savings_goal(&mut self, value: Decimal) {
        self.savings_goal = positive(value);
    }
}

/// Zero or negative money settings mean "not set".
fn positive(value: Decimal) -> Option<Decimal> {
    (value > Decimal::ZERO).then_some(value)
}
