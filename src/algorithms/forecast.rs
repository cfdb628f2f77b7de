//! Simplified ARIMA-style forecasting.
//!
//! The series is differenced `d` times, an AR term and an MA term are computed
//! over the differenced values, and their average supplies a per-step trend
//! that is projected linearly from the last observed value:
//!
//! ```text
//! ar[i - p] = Σ_{j=1..p} x[i - j] · c_j        c_j = 0.5 / j (heuristic)
//! ma[i - q] = mean(x[i - q .. i])
//! trend     = last((ar + ma) / 2)
//! ŷ_s       = y_last + trend · s + noise_s
//! ```
//!
//! The AR coefficients are fixed heuristics, not fitted.
//! [`ArEstimator::LeastSquares`] is an opt-in alternative.

use crate::algorithms::differencing::difference;
use crate::config::{ForecastingConfig, DAY_MILLIS};
use crate::error::Result;
use crate::models::{ArimaParams, ForecastPoint};
use crate::utils::mean;
use crate::utils::metrics::{mean_absolute_error, scaled_accuracy};
use crate::utils::validation::{validate_noise_amplitude, validate_step_millis};
use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// How the AR coefficients `c_1..c_p` are chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArEstimator {
    /// `c_j = 0.5 / j`.
    #[default]
    Heuristic,
    /// Ordinary least squares on the differenced series, falling back to the
    /// heuristic when there is too little data.
    LeastSquares,
}

/// Intermediate series of a forecast, for inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastComponents {
    pub differenced: Vec<f64>,
    pub coefficients: Vec<f64>,
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
    pub combined: Vec<f64>,
    pub trend: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccuracyScore {
    pub mean_absolute_error: f64,
    pub accuracy: f64,
}

#[derive(Debug, Clone)]
pub struct ForecastModel {
    series: Vec<f64>,
    params: ArimaParams,
    estimator: ArEstimator,
    noise_amplitude: f64,
    seed: Option<u64>,
    anchor: Option<i64>,
    step_millis: i64,
}

impl ForecastModel {
    pub fn new(series: Vec<f64>, params: ArimaParams) -> Self {
        Self {
            series,
            params,
            estimator: ArEstimator::default(),
            noise_amplitude: 1.0,
            seed: None,
            anchor: None,
            step_millis: DAY_MILLIS,
        }
    }

    pub fn from_config(series: Vec<f64>, config: &ForecastingConfig) -> Result<Self> {
        let mut model = Self::new(series, config.params())
            .with_noise_amplitude(config.noise_amplitude)?
            .with_step_millis(config.step_millis)?;
        model.seed = config.seed;
        Ok(model)
    }

    /// Every subsequent `forecast` call draws noise from a fresh RNG seeded
    /// with `seed`, so repeated calls return identical values.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Pins "now" (epoch millis) used to lay out timestamps.
    pub fn with_anchor(mut self, anchor_millis: i64) -> Self {
        self.anchor = Some(anchor_millis);
        self
    }

    pub fn with_estimator(mut self, estimator: ArEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    /// Noise is drawn uniformly from `[-amplitude, amplitude)`.
    pub fn with_noise_amplitude(mut self, amplitude: f64) -> Result<Self> {
        validate_noise_amplitude(amplitude)?;
        self.noise_amplitude = amplitude;
        Ok(self)
    }

    pub fn with_step_millis(mut self, step_millis: i64) -> Result<Self> {
        validate_step_millis(step_millis)?;
        self.step_millis = step_millis;
        Ok(self)
    }

    /// Same settings over a different series.
    pub fn with_series(&self, series: Vec<f64>) -> Self {
        Self {
            series,
            ..self.clone()
        }
    }

    pub fn series(&self) -> &[f64] {
        &self.series
    }

    pub fn params(&self) -> ArimaParams {
        self.params
    }

    pub fn estimator(&self) -> ArEstimator {
        self.estimator
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn components(&self) -> ForecastComponents {
        let ArimaParams { p, d, q } = self.params;
        let differenced = difference(&self.series, d);
        let coefficients = self.ar_coefficients(&differenced);

        let ar: Vec<f64> = (p..differenced.len().max(p))
            .map(|i| {
                coefficients
                    .iter()
                    .enumerate()
                    .map(|(j, c)| differenced[i - j - 1] * c)
                    .sum::<f64>()
            })
            .collect();

        // An empty window (q == 0) averages to 0, matching the empty AR sum.
        let ma: Vec<f64> = (q..differenced.len().max(q))
            .map(|i| mean(&differenced[i - q..i]).unwrap_or(0.0))
            .collect();

        let combined: Vec<f64> = ar
            .iter()
            .zip(ma.iter())
            .map(|(a, m)| (a + m) / 2.0)
            .collect();
        let trend = combined.last().copied().unwrap_or(0.0);

        ForecastComponents {
            differenced,
            coefficients,
            ar,
            ma,
            combined,
            trend,
        }
    }

    /// History (`predicted == false`) followed by `steps` projected points.
    /// Timestamps saturate at the `i64` bounds.
    pub fn forecast(&self, steps: usize) -> Vec<ForecastPoint> {
        let mut rng = self.rng();
        self.forecast_with_rng(steps, &mut rng)
    }

    pub fn forecast_with_rng<R: Rng + ?Sized>(
        &self,
        steps: usize,
        rng: &mut R,
    ) -> Vec<ForecastPoint> {
        let predictions = self.project(steps, rng);
        let anchor = self
            .anchor
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
        let n = self.series.len() as i64;

        let history = self.series.iter().enumerate().map(|(i, &value)| {
            let offset = (n - i as i64).saturating_mul(self.step_millis);
            ForecastPoint::historical(anchor.saturating_sub(offset), value)
        });
        let future = predictions.into_iter().enumerate().map(|(s, value)| {
            let offset = (s as i64 + 1).saturating_mul(self.step_millis);
            ForecastPoint::predicted(anchor.saturating_add(offset), value)
        });

        history.chain(future).collect()
    }

    /// `1 - MAE / mean(test)` clamped to [0, 1]; an empty test series scores 0.
    pub fn calculate_accuracy(&self, test_series: &[f64]) -> f64 {
        self.score(test_series).map_or(0.0, |score| score.accuracy)
    }

    pub fn score(&self, test_series: &[f64]) -> Option<AccuracyScore> {
        let actual_mean = mean(test_series)?;
        let mut rng = self.rng();
        let predicted = self.project(test_series.len(), &mut rng);
        let mae = mean_absolute_error(&predicted, test_series)?;

        Some(AccuracyScore {
            mean_absolute_error: mae,
            accuracy: scaled_accuracy(mae, actual_mean),
        })
    }

    fn project<R: Rng + ?Sized>(&self, steps: usize, rng: &mut R) -> Vec<f64> {
        let trend = self.components().trend;
        let last_value = self.series.last().copied().unwrap_or(0.0);
        debug!(
            "{} projecting {} steps from {:.4} with trend {:.4}",
            self.params, steps, last_value, trend
        );

        (1..=steps)
            .map(|s| {
                let noise = (rng.gen::<f64>() - 0.5) * 2.0 * self.noise_amplitude;
                last_value + trend * s as f64 + noise
            })
            .collect()
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    fn ar_coefficients(&self, differenced: &[f64]) -> Vec<f64> {
        let p = self.params.p;
        let heuristic: Vec<f64> = (1..=p).map(|j| 0.5 / j as f64).collect();

        match self.estimator {
            ArEstimator::Heuristic => heuristic,
            ArEstimator::LeastSquares => fit_least_squares(differenced, p).unwrap_or_else(|| {
                if p > 0 {
                    warn!(
                        "Least-squares AR({}) fit unavailable for {} values, using heuristic coefficients",
                        p,
                        differenced.len()
                    );
                }
                heuristic
            }),
        }
    }
}

/// Solves `x[i] ≈ Σ_j c_j · x[i - j]` for `i ≥ p`.
fn fit_least_squares(x: &[f64], p: usize) -> Option<Vec<f64>> {
    if p == 0 || x.len() < 2 * p {
        return None;
    }

    let rows = x.len() - p;
    let design = DMatrix::from_fn(rows, p, |r, c| x[r + p - c - 1]);
    let target = DVector::from_fn(rows, |r, _| x[r + p]);

    let solution = design.svd(true, true).solve(&target, 1e-12).ok()?;
    if solution.iter().all(|c| c.is_finite()) {
        Some(solution.iter().copied().collect())
    } else {
        None
    }
}
