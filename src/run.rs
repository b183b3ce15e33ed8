mod cli;
mod tui;

pub(crate) use cli::as_cli;
pub(crate) use tui::as_tui;

use anyhow::Result;
use chrono::{Datelike, NaiveDate};

use crate::db::Database;
use crate::forecast::{ForecastResult, Forecaster, Outlook};
use crate::models::Settings;

/// Expand a leading `~/` to `$HOME`.
pub(crate) fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}

pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Forecast and outlook for `(year, month)` as of `today`, read from storage.
/// `forecaster` is expected to carry the threshold from `settings`.
pub(crate) struct MonthReport {
    pub(crate) forecast: ForecastResult,
    pub(crate) outlook: Outlook,
    pub(crate) spent_so_far: rust_decimal::Decimal,
    pub(crate) settings: Settings,
}

impl MonthReport {
    pub(crate) fn build(
        db: &Database,
        forecaster: &Forecaster,
        settings: Settings,
        year: i32,
        month: u32,
        today: NaiveDate,
    ) -> Result<Self> {
        let expenses = db.get_all_expenses()?;
        let spent_so_far = db.get_month_total(year, month)?;

        let forecast = forecaster.forecast_month(&expenses, year, month, today);
        tracing::debug!(
            year,
            month,
            status = forecast.status(),
            model = ?forecast.model_name(),
            "month report"
        );
        let outlook = Outlook::derive(&forecast, spent_so_far, &settings);
        Ok(Self {
            forecast,
            outlook,
            spent_so_far,
            settings,
        })
    }
}

/// The forecaster configured from stored settings.
pub(crate) fn forecaster_for(settings: &Settings) -> Forecaster {
    Forecaster::discover().with_threshold_days(settings.forecast_threshold_days)
}

pub(crate) fn current_month() -> (i32, u32) {
    let t = today();
    (t.year(), t.month())
}
