//! Additive Holt-Winters (triple exponential smoothing).
//!
//! ```text
//! Level:    L_t = α (x_t - S_{t-m}) + (1 - α)(L_{t-1} + T_{t-1})
//! Trend:    T_t = β (L_t - L_{t-1}) + (1 - β) T_{t-1}
//! Season:   S_t = γ (x_t - L_t) + (1 - γ) S_{t-m}
//! Forecast: F_{t+h} = L_t + h T_t + S_{t+h-m}
//! ```
//!
//! Daily spend has a strong day-of-week rhythm, so the season length is a
//! week. The smoothing constants are chosen by a grid search minimising the
//! one-step-ahead squared error, which keeps the fit deterministic.

use super::{ensure_finite, ForecastModel};
use crate::forecast::error::ForecastError;

pub(crate) const NAME: &str = "holt_winters";

const GRID: [f64; 5] = [0.1, 0.3, 0.5, 0.7, 0.9];

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Smoothing {
    pub(crate) alpha: f64,
    pub(crate) beta: f64,
    pub(crate) gamma: f64,
}

#[derive(Debug, Clone)]
struct State {
    level: f64,
    trend: f64,
    season: Vec<f64>,
    /// Index of the next, not yet observed, time step.
    next: usize,
    sse: f64,
}

impl State {
    fn forecast(&self, h: usize) -> f64 {
        let m = self.season.len();
        self.level + h as f64 * self.trend + self.season[(self.next + h - 1) % m]
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct HoltWinters {
    period: usize,
}

impl HoltWinters {
    pub(crate) fn weekly() -> Self {
        Self { period: 7 }
    }

    /// Two full seasons are needed to initialise level, trend and season.
    pub(crate) fn min_points(&self) -> usize {
        2 * self.period
    }

    fn smooth(&self, data: &[f64], p: Smoothing) -> State {
        let m = self.period;
        let first = data[..m].iter().sum::<f64>() / m as f64;
        let second = data[m..2 * m].iter().sum::<f64>() / m as f64;

        let mut state = State {
            level: first,
            trend: (second - first) / m as f64,
            season: data[..m].iter().map(|x| x - first).collect(),
            next: m,
            sse: 0.0,
        };

        for (t, &x) in data.iter().enumerate().skip(m) {
            let s = state.season[t % m];
            let fitted = state.level + state.trend + s;
            state.sse += (x - fitted).powi(2);

            let level = p.alpha * (x - s) + (1.0 - p.alpha) * (state.level + state.trend);
            state.trend = p.beta * (level - state.level) + (1.0 - p.beta) * state.trend;
            state.season[t % m] = p.gamma * (x - level) + (1.0 - p.gamma) * s;
            state.level = level;
            state.next = t + 1;
        }

        state
    }

    fn best_fit(&self, data: &[f64]) -> (Smoothing, State) {
        let mut best: Option<(Smoothing, State)> = None;
        for &alpha in &GRID {
            for &beta in &GRID {
                for &gamma in &GRID {
                    let p = Smoothing { alpha, beta, gamma };
                    let state = self.smooth(data, p);
                    let better = best
                        .as_ref()
                        .map_or(true, |(_, b)| state.sse < b.sse);
                    if better {
                        best = Some((p, state));
                    }
                }
            }
        }
        // GRID is non-empty, so the loop always records a candidate.
        best.unwrap_or_else(|| {
            let p = Smoothing {
                alpha: GRID[0],
                beta: GRID[0],
                gamma: GRID[0],
            };
            (p, self.smooth(data, p))
        })
    }

    pub(crate) fn fit(&self, data: &[f64]) -> Result<Smoothing, ForecastError> {
        self.check(data)?;
        Ok(self.best_fit(data).0)
    }

    fn check(&self, data: &[f64]) -> Result<(), ForecastError> {
        if data.len() < self.min_points() {
            return Err(ForecastError::TooFewPoints {
                model: NAME,
                needed: self.min_points(),
                got: data.len(),
            });
        }
        ensure_finite(NAME, data)
    }
}

impl ForecastModel for HoltWinters {
    fn name(&self) -> &'static str {
        NAME
    }

    fn fit_predict(&self, history: &[f64], horizon: usize) -> Result<Vec<f64>, ForecastError> {
        self.check(history)?;
        let (_, state) = self.best_fit(history);
        let predictions: Vec<f64> = (1..=horizon).map(|h| state.forecast(h)).collect();
        ensure_finite(NAME, &predictions)?;
        Ok(predictions)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_constant_series_forecasts_constant() {
        let preds = HoltWinters::weekly().fit_predict(&[80.0; 30], 5).unwrap();
        assert_eq!(preds.len(), 5);
        for p in preds {
            assert!((p - 80.0).abs() < 1e-9, "expected 80, got {p}");
        }
    }

    #[test]
    fn test_weekly_pattern_is_repeated() {
        let week = [10.0, 0.0, 0.0, 0.0, 0.0, 50.0, 20.0];
        let data: Vec<f64> = week.iter().cycle().take(28).copied().collect();
        let preds = HoltWinters::weekly().fit_predict(&data, 7).unwrap();
        for (p, expected) in preds.iter().zip(week.iter()) {
            assert!((p - expected).abs() < 1e-6, "expected {expected}, got {p}");
        }
    }

    #[test]
    fn test_rising_series_keeps_rising() {
        let data: Vec<f64> = (1..=28).map(|x| 10.0 * x as f64).collect();
        let preds = HoltWinters::weekly().fit_predict(&data, 3).unwrap();
        assert!(preds[0] > 270.0, "first forecast {} should exceed 270", preds[0]);
        assert!(preds[0] < preds[1] && preds[1] < preds[2]);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let data: Vec<f64> = (0..30).map(|x| ((x * 37) % 11) as f64 * 9.0).collect();
        let model = HoltWinters::weekly();
        assert_eq!(model.fit(&data).unwrap(), model.fit(&data).unwrap());
        assert_eq!(
            model.fit_predict(&data, 4).unwrap(),
            model.fit_predict(&data, 4).unwrap()
        );
    }

    #[test]
    fn test_needs_two_seasons() {
        let err = HoltWinters::weekly().fit_predict(&[1.0; 13], 2).unwrap_err();
        assert_eq!(
            err,
            ForecastError::TooFewPoints {
                model: NAME,
                needed: 14,
                got: 13
            }
        );
    }

    #[test]
    fn test_rejects_non_finite() {
        let mut data = vec![5.0; 20];
        data[3] = f64::INFINITY;
        assert_eq!(
            HoltWinters::weekly().fit_predict(&data, 1),
            Err(ForecastError::NonFinite(NAME))
        );
    }

    #[test]
    fn test_zero_horizon() {
        assert!(HoltWinters::weekly()
            .fit_predict(&[3.0; 31], 0)
            .unwrap()
            .is_empty());
    }
}
