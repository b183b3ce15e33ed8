//! Forecasting models, one per tier.
//!
//! The linear trend is always compiled in and serves as the baseline. The
//! higher-order models sit behind cargo features so a build can leave them
//! out; [`available_upgrades`] reports which ones made it into this binary.

#[cfg(feature = "arima")]
mod arima;
mod linear;
#[cfg(feature = "seasonal")]
mod seasonal;

#[cfg(feature = "arima")]
pub(crate) use arima::Arima;
pub(crate) use linear::LinearTrend;
#[cfg(feature = "seasonal")]
pub(crate) use seasonal::HoltWinters;

use super::error::ForecastError;

/// How a model's day-by-day predictions become a single future amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Clipping {
    /// Each predicted day is floored at zero before summing.
    PerDay,
    /// The predictions are summed first and the sum is floored at zero.
    Total,
}

pub(crate) trait ForecastModel {
    /// Name reported in the forecast result.
    fn name(&self) -> &'static str;

    /// Fit on `history` (day 1 first) and predict the next `horizon` days.
    /// Must return exactly `horizon` values.
    fn fit_predict(&self, history: &[f64], horizon: usize) -> Result<Vec<f64>, ForecastError>;

    fn clipping(&self) -> Clipping {
        Clipping::PerDay
    }
}

/// Upgrade-tier models compiled into this build, most capable first.
pub(crate) fn available_upgrades() -> Vec<Box<dyn ForecastModel>> {
    #[allow(unused_mut)]
    let mut tiers: Vec<Box<dyn ForecastModel>> = Vec::new();
    #[cfg(feature = "seasonal")]
    tiers.push(Box::new(HoltWinters::weekly()));
    #[cfg(feature = "arima")]
    tiers.push(Box::new(Arima::default()));
    tiers
}

/// Sum of predictions after applying the model's clipping rule.
pub(crate) fn clipped_sum(predictions: &[f64], clipping: Clipping) -> f64 {
    match clipping {
        Clipping::PerDay => predictions.iter().map(|p| p.max(0.0)).sum(),
        Clipping::Total => predictions.iter().sum::<f64>().max(0.0),
    }
}

fn ensure_finite(model: &'static str, values: &[f64]) -> Result<(), ForecastError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ForecastError::NonFinite(model))
    }
}
