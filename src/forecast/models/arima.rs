//! ARIMA(1,1,1) without a constant, fitted by conditional sum of squares.
//!
//! The series is differenced once and the ARMA(1,1) coefficients are chosen
//! from a fixed grid inside the stationary/invertible region. Forecasts of the
//! differences are integrated back onto the last observed level.

use super::{ensure_finite, Clipping, ForecastModel};
use crate::forecast::error::ForecastError;

pub(crate) const NAME: &str = "arima";

/// Coefficients are searched over `-BOUND..=BOUND` in steps of `1 / STEPS`.
const STEPS: i32 = 20;
const BOUND: i32 = 19;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ArmaFit {
    pub(crate) phi: f64,
    pub(crate) theta: f64,
    pub(crate) css: f64,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Arima {
    min_points: usize,
}

impl Default for Arima {
    fn default() -> Self {
        Self { min_points: 10 }
    }
}

fn differences(data: &[f64]) -> Vec<f64> {
    data.windows(2).map(|w| w[1] - w[0]).collect()
}

/// One-step residuals of ARMA(1,1) on `diffs`, starting from a zero shock.
fn residuals(diffs: &[f64], phi: f64, theta: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(diffs.len());
    out.push(0.0);
    for t in 1..diffs.len() {
        let predicted = phi * diffs[t - 1] + theta * out[t - 1];
        out.push(diffs[t] - predicted);
    }
    out
}

impl Arima {
    pub(crate) fn fit(&self, data: &[f64]) -> Result<ArmaFit, ForecastError> {
        if data.len() < self.min_points {
            return Err(ForecastError::TooFewPoints {
                model: NAME,
                needed: self.min_points,
                got: data.len(),
            });
        }
        ensure_finite(NAME, data)?;

        let diffs = differences(data);
        let mut best = ArmaFit {
            phi: 0.0,
            theta: 0.0,
            css: f64::INFINITY,
        };
        for p in -BOUND..=BOUND {
            for q in -BOUND..=BOUND {
                let phi = f64::from(p) / f64::from(STEPS);
                let theta = f64::from(q) / f64::from(STEPS);
                let css: f64 = residuals(&diffs, phi, theta).iter().map(|e| e * e).sum();
                if css < best.css {
                    best = ArmaFit { phi, theta, css };
                }
            }
        }

        if !best.css.is_finite() {
            return Err(ForecastError::NonFinite(NAME));
        }
        Ok(best)
    }
}

impl ForecastModel for Arima {
    fn name(&self) -> &'static str {
        NAME
    }

    fn fit_predict(&self, history: &[f64], horizon: usize) -> Result<Vec<f64>, ForecastError> {
        let fit = self.fit(history)?;
        let diffs = differences(history);
        let shocks = residuals(&diffs, fit.phi, fit.theta);

        let mut level = history.last().copied().unwrap_or_default();
        let mut last_diff = diffs.last().copied().unwrap_or_default();
        let mut shock = shocks.last().copied().unwrap_or_default();

        let mut predictions = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            let next = fit.phi * last_diff + fit.theta * shock;
            level += next;
            predictions.push(level);
            last_diff = next;
            shock = 0.0;
        }

        ensure_finite(NAME, &predictions)?;
        Ok(predictions)
    }

    fn clipping(&self) -> Clipping {
        Clipping::Total
    }
}
