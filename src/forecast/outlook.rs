use rust_decimal::Decimal;

use super::ForecastResult;
use crate::models::Settings;

/// Budget and savings view derived from a forecast.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Outlook {
    /// Forecast month total, or spend so far when there is no forecast.
    pub(crate) predicted_spend: Decimal,
    pub(crate) has_forecast: bool,
    pub(crate) budget_left: Option<Decimal>,
    /// Share of the budget the forecast uses, in `[0, 1]`.
    pub(crate) budget_ratio: Option<f64>,
    pub(crate) predicted_savings: Option<Decimal>,
    /// Progress of predicted savings towards the goal, in `[0, 1]`.
    pub(crate) savings_ratio: Option<f64>,
}

impl Outlook {
    pub(crate) fn derive(result: &ForecastResult, spent_so_far: Decimal, settings: &Settings) -> Self {
        let forecast = result.predicted_total();
        let predicted_spend = forecast.unwrap_or(spent_so_far);

        let (budget_left, budget_ratio) = match (settings.monthly_budget, forecast) {
            (Some(budget), Some(total)) => (budget.checked_sub(total), ratio(total, budget)),
            _ => (None, None),
        };

        let predicted_savings = settings
            .monthly_income
            .and_then(|income| income.checked_sub(predicted_spend));
        let savings_ratio = match (predicted_savings, settings.savings_goal) {
            (Some(savings), Some(goal)) => ratio(savings, goal),
            _ => None,
        };

        Self {
            predicted_spend,
            has_forecast: forecast.is_some(),
            budget_left,
            budget_ratio,
            predicted_savings,
            savings_ratio,
        }
    }

    pub(crate) fn over_budget(&self) -> bool {
        self.budget_left.is_some_and(|left| left.is_sign_negative() && !left.is_zero())
    }
}

fn ratio(part: Decimal, whole: Decimal) -> Option<f64> {
    use rust_decimal::prelude::ToPrimitive;

    if whole <= Decimal::ZERO {
        return None;
    }
    part.checked_div(whole)?
        .to_f64()
        .map(|r| r.clamp(0.0, 1.0))
}
