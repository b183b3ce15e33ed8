//! Month-end spend forecasting.
//!
//! Expenses are collapsed into a dense [`DailySeries`] for the target month,
//! then a [`Forecaster`] projects the month total. A linear trend is always
//! available; once a month has enough history the forecaster tries the
//! upgrade model picked at construction and keeps the baseline if it fails.

mod error;
pub(crate) mod models;
mod outlook;
pub(crate) mod series;

pub use error::ForecastError;
pub(crate) use outlook::Outlook;
pub(crate) use series::{build_daily_series, checked_sum, DailySeries};

use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::models::Expense;
use models::{available_upgrades, clipped_sum, ForecastModel, LinearTrend};

pub(crate) const DEFAULT_THRESHOLD_DAYS: u32 = crate::models::DEFAULT_THRESHOLD_DAYS;

/// Days of history required before an upgrade model is tried.
pub(crate) const UPGRADE_MIN_DAYS: u32 = 30;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ForecastResult {
    NoData,
    InsufficientData {
        days_collected: u32,
        non_zero_days: usize,
    },
    Ok {
        predicted_total: Decimal,
        model_name: &'static str,
        total_so_far: Decimal,
    },
    Error {
        message: String,
    },
}

impl ForecastResult {
    pub(crate) fn status(&self) -> &'static str {
        match self {
            Self::NoData => "no_data",
            Self::InsufficientData { .. } => "insufficient_data",
            Self::Ok { .. } => "ok",
            Self::Error { .. } => "error",
        }
    }

    pub(crate) fn predicted_total(&self) -> Option<Decimal> {
        match self {
            Self::Ok {
                predicted_total, ..
            } => Some(*predicted_total),
            _ => None,
        }
    }

    pub(crate) fn model_name(&self) -> Option<&'static str> {
        match self {
            Self::Ok { model_name, .. } => Some(*model_name),
            _ => None,
        }
    }

    /// One-line human description, used by the CLI and the dashboard.
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::NoData => "No expenses recorded yet".into(),
            Self::InsufficientData {
                days_collected,
                non_zero_days,
            } => format!(
                "Not enough data yet ({days_collected} days, {non_zero_days} with spending)"
            ),
            Self::Ok {
                predicted_total,
                model_name,
                ..
            } => format!("{predicted_total:.2} via {model_name}"),
            Self::Error { message } => format!("Forecast failed: {message}"),
        }
    }
}

pub(crate) struct Forecaster {
    baseline: LinearTrend,
    upgrade: Option<Box<dyn ForecastModel>>,
    threshold_days: u32,
}

impl Forecaster {
    /// Baseline plus the most capable upgrade compiled into this build.
    pub(crate) fn discover() -> Self {
        let upgrade = available_upgrades().into_iter().next();
        match &upgrade {
            Some(model) => tracing::debug!(model = model.name(), "upgrade model available"),
            None => tracing::debug!("no upgrade model compiled in, baseline only"),
        }
        Self {
            upgrade,
            ..Self::baseline_only()
        }
    }

    pub(crate) fn baseline_only() -> Self {
        Self {
            baseline: LinearTrend,
            upgrade: None,
            threshold_days: DEFAULT_THRESHOLD_DAYS,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_upgrade(mut self, model: Box<dyn ForecastModel>) -> Self {
        self.upgrade = Some(model);
        self
    }

    pub(crate) fn with_threshold_days(mut self, days: u32) -> Self {
        self.threshold_days = days;
        self
    }

    pub(crate) fn threshold_days(&self) -> u32 {
        self.threshold_days
    }

    pub(crate) fn upgrade_name(&self) -> Option<&'static str> {
        self.upgrade.as_ref().map(|m| m.name())
    }

    /// Aggregate `expenses` for `(year, month)` and forecast the month total.
    pub(crate) fn forecast_month(
        &self,
        expenses: &[Expense],
        year: i32,
        month: u32,
        today: NaiveDate,
    ) -> ForecastResult {
        match build_daily_series(expenses, year, month) {
            Ok(series) => self.forecast(&series, today),
            Err(e) => {
                tracing::warn!(error = %e, "could not build daily series");
                ForecastResult::Error {
                    message: e.to_string(),
                }
            }
        }
    }

    pub(crate) fn forecast(&self, series: &DailySeries, today: NaiveDate) -> ForecastResult {
        if !series.has_source_records() {
            return ForecastResult::NoData;
        }

        let days_in_month = series.len() as u32;
        let days_passed = days_passed(series, today);
        let used = series.head(days_passed as usize);
        let non_zero_days = used.iter().filter(|a| !a.is_zero()).count();

        let min_non_zero = 3.max(self.threshold_days / 2) as usize;
        if days_passed < self.threshold_days && non_zero_days < min_non_zero {
            return ForecastResult::InsufficientData {
                days_collected: days_passed,
                non_zero_days,
            };
        }

        let total_so_far = match checked_sum(used) {
            Ok(total) => total,
            Err(e) => {
                tracing::warn!(error = %e, "could not total the month so far");
                return ForecastResult::Error {
                    message: e.to_string(),
                };
            }
        };
        let horizon = (days_in_month - days_passed) as usize;
        let history = match to_history(used) {
            Ok(h) => h,
            Err(e) => {
                return ForecastResult::Error {
                    message: e.to_string(),
                }
            }
        };

        let (mut predicted_total, mut model_name) =
            match project(&self.baseline, &history, horizon, total_so_far) {
                Ok(total) => (total, self.baseline.name()),
                Err(e) => {
                    tracing::warn!(error = %e, "baseline forecast failed");
                    return ForecastResult::Error {
                        message: e.to_string(),
                    };
                }
            };

        if days_passed >= UPGRADE_MIN_DAYS {
            if let Some(model) = &self.upgrade {
                match project(model.as_ref(), &history, horizon, total_so_far) {
                    Ok(total) => {
                        predicted_total = total;
                        model_name = model.name();
                    }
                    Err(e) => {
                        tracing::debug!(model = model.name(), error = %e, "upgrade failed, keeping baseline")
                    }
                }
            }
        }

        tracing::debug!(
            year = series.year(),
            month = series.month(),
            days_passed,
            model = model_name,
            %predicted_total,
            "forecast complete"
        );

        // Both sides rounded the same way keep predicted_total >= total_so_far.
        ForecastResult::Ok {
            predicted_total: predicted_total.round_dp(2),
            model_name,
            total_so_far: total_so_far.round_dp(2),
        }
    }
}

/// Days of the series that count as observed on `today`.
fn days_passed(series: &DailySeries, today: NaiveDate) -> u32 {
    let days_in_month = series.len() as u32;
    if today.year() == series.year() && today.month() == series.month() {
        today.day().min(days_in_month)
    } else {
        days_in_month
    }
}

fn to_history(amounts: &[Decimal]) -> Result<Vec<f64>, ForecastError> {
    amounts
        .iter()
        .map(|a| {
            a.to_f64()
                .ok_or_else(|| ForecastError::Unrepresentable(a.to_string()))
        })
        .collect()
}

/// `total_so_far` plus the clipped sum of the model's predictions.
/// Month total from `total_so_far` plus the clipped forecast for the
/// remaining days. Observed days are never re-predicted, so the total can
/// only grow past what was already spent.
fn project(
    model: &dyn ForecastModel,
    history: &[f64],
    horizon: usize,
    total_so_far: Decimal,
) -> Result<Decimal, ForecastError> {
    let predictions = model.fit_predict(history, horizon)?;
    if predictions.len() != horizon {
        return Err(ForecastError::HorizonMismatch {
            model: model.name(),
            expected: horizon,
            got: predictions.len(),
        });
    }
    let future = clipped_sum(&predictions, model.clipping());
    let future = Decimal::from_f64(future).ok_or(ForecastError::NonFinite(model.name()))?;
    total_so_far.checked_add(future).ok_or(ForecastError::Overflow)
}
