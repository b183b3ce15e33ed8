//! Ordinary least squares trend line over `(day, amount)`.

use super::{ensure_finite, ForecastModel};
use crate::forecast::error::ForecastError;

pub(crate) const NAME: &str = "linear_regression";

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TrendLine {
    pub(crate) slope: f64,
    pub(crate) intercept: f64,
}

impl TrendLine {
    pub(crate) fn at(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct LinearTrend;

impl LinearTrend {
    /// Fit `y = intercept + slope * x` with `x = 1, 2, …, n`.
    /// A single observation gives a flat line through it.
    pub(crate) fn fit(&self, history: &[f64]) -> Result<TrendLine, ForecastError> {
        if history.is_empty() {
            return Err(ForecastError::TooFewPoints {
                model: NAME,
                needed: 1,
                got: 0,
            });
        }
        ensure_finite(NAME, history)?;

        let n = history.len() as f64;
        let mean_x = (n + 1.0) / 2.0;
        let mean_y = history.iter().sum::<f64>() / n;

        let mut sxx = 0.0;
        let mut sxy = 0.0;
        for (i, y) in history.iter().enumerate() {
            let dx = (i + 1) as f64 - mean_x;
            sxx += dx * dx;
            sxy += dx * (y - mean_y);
        }

        let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
        let line = TrendLine {
            slope,
            intercept: mean_y - slope * mean_x,
        };
        ensure_finite(NAME, &[line.slope, line.intercept])?;
        Ok(line)
    }
}

impl ForecastModel for LinearTrend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn fit_predict(&self, history: &[f64], horizon: usize) -> Result<Vec<f64>, ForecastError> {
        let line = self.fit(history)?;
        let start = history.len() + 1;
        Ok((start..start + horizon).map(|x| line.at(x as f64)).collect())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_flat_series_has_zero_slope() {
        let line = LinearTrend.fit(&[100.0; 15]).unwrap();
        assert_eq!(line.slope, 0.0);
        assert_eq!(line.intercept, 100.0);
    }

    #[test]
    fn test_exact_line_recovered() {
        // y = 5 + 2x for x = 1..=6
        let data: Vec<f64> = (1..=6).map(|x| 5.0 + 2.0 * x as f64).collect();
        let line = LinearTrend.fit(&data).unwrap();
        assert!((line.slope - 2.0).abs() < 1e-9);
        assert!((line.intercept - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_predictions_continue_the_index() {
        let data = [1.0, 2.0, 3.0];
        let preds = LinearTrend.fit_predict(&data, 2).unwrap();
        assert_eq!(preds.len(), 2);
        assert!((preds[0] - 4.0).abs() < 1e-9);
        assert!((preds[1] - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_point_is_flat() {
        let preds = LinearTrend.fit_predict(&[42.0], 3).unwrap();
        assert_eq!(preds, vec![42.0, 42.0, 42.0]);
    }

    #[test]
    fn test_zero_horizon() {
        assert!(LinearTrend.fit_predict(&[1.0, 2.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_empty_and_non_finite() {
        assert!(matches!(
            LinearTrend.fit(&[]),
            Err(ForecastError::TooFewPoints { got: 0, .. })
        ));
        assert_eq!(
            LinearTrend.fit(&[1.0, f64::NAN]),
            Err(ForecastError::NonFinite(NAME))
        );
    }
}
