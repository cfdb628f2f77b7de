use crate::algorithms::forecast::ForecastModel;
use crate::config::Config;
use crate::error::Result;
use crate::models::{ArimaParams, ForecastPoint};
use crate::utils::validation::validate_train_ratio;
use serde::{Deserialize, Serialize};
use tracing::info;

pub const DEFAULT_TRAIN_RATIO: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldoutEvaluation {
    pub train_len: usize,
    pub test_len: usize,
    /// In [0, 1]; 0 when either side of the split is empty.
    pub accuracy: f64,
    pub mean_absolute_error: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastReport {
    pub points: Vec<ForecastPoint>,
    pub evaluation: HoldoutEvaluation,
}

/// Hold-out protocol: fit on the leading `train_ratio` share of a series and
/// score the forecast against the remainder.
#[derive(Debug, Clone)]
pub struct AccuracyEvaluator {
    template: ForecastModel,
    train_ratio: f64,
}

impl AccuracyEvaluator {
    pub fn new(params: ArimaParams, train_ratio: f64) -> Result<Self> {
        Self::with_model(ForecastModel::new(Vec::new(), params), train_ratio)
    }

    /// Uses `template`'s parameters, noise and seed for every evaluation; its
    /// series is ignored.
    pub fn with_model(template: ForecastModel, train_ratio: f64) -> Result<Self> {
        validate_train_ratio(train_ratio)?;
        Ok(Self {
            template,
            train_ratio,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let template = ForecastModel::from_config(Vec::new(), &config.forecasting)?;
        Self::with_model(template, config.evaluation.train_ratio)
    }

    pub fn train_ratio(&self) -> f64 {
        self.train_ratio
    }

    pub fn params(&self) -> ArimaParams {
        self.template.params()
    }

    /// `(train, test)` where `test` is the trailing `floor(len * (1 - ratio))`
    /// values.
    pub fn split<'a>(&self, series: &'a [f64]) -> (&'a [f64], &'a [f64]) {
        // The epsilon keeps e.g. 10 * (1 - 0.8) from flooring to 1.
        let test_len = ((series.len() as f64) * (1.0 - self.train_ratio) + 1e-9).floor() as usize;
        series.split_at(series.len() - test_len.min(series.len()))
    }

    pub fn evaluate(&self, series: &[f64]) -> HoldoutEvaluation {
        let (train, test) = self.split(series);

        if train.is_empty() || test.is_empty() {
            info!(
                "Hold-out split of {} values is degenerate ({} train / {} test)",
                series.len(),
                train.len(),
                test.len()
            );
            return HoldoutEvaluation {
                train_len: train.len(),
                test_len: test.len(),
                accuracy: 0.0,
                mean_absolute_error: None,
            };
        }

        let model = self.template.with_series(train.to_vec());
        let score = model.score(test);
        let evaluation = HoldoutEvaluation {
            train_len: train.len(),
            test_len: test.len(),
            accuracy: score.map_or(0.0, |s| s.accuracy),
            mean_absolute_error: score.map(|s| s.mean_absolute_error),
        };

        info!(
            "{} hold-out accuracy {:.4} ({} train / {} test)",
            self.params(),
            evaluation.accuracy,
            evaluation.train_len,
            evaluation.test_len
        );
        evaluation
    }

    /// Forecast over the full series plus a hold-out score.
    pub fn report(&self, series: &[f64], steps: usize) -> ForecastReport {
        let points = self.template.with_series(series.to_vec()).forecast(steps);
        ForecastReport {
            points,
            evaluation: self.evaluate(series),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet(params: ArimaParams) -> AccuracyEvaluator {
        let template = ForecastModel::new(Vec::new(), params)
            .with_noise_amplitude(0.0)
            .unwrap();
        AccuracyEvaluator::with_model(template, DEFAULT_TRAIN_RATIO).unwrap()
    }

    #[test]
    fn test_split_is_eighty_twenty() {
        let evaluator = quiet(ArimaParams::default());
        let series: Vec<f64> = (0..10).map(f64::from).collect();
        let (train, test) = evaluator.split(&series);
        assert_eq!(train.len(), 8);
        assert_eq!(test, &[8.0, 9.0]);

        let (train, test) = evaluator.split(&series[..4]);
        assert_eq!((train.len(), test.len()), (4, 0));
    }

    #[test]
    fn test_linear_series_scores_perfectly() {
        let evaluator = quiet(ArimaParams::new(1, 1, 1));
        let series: Vec<f64> = (0..10).map(|i| 10.0 + 2.0 * i as f64).collect();
        let evaluation = evaluator.evaluate(&series);

        // diff = 2s, ar = 1, ma = 2, trend = 1.5: predictions 25.5, 27 vs 26, 28
        assert_eq!((evaluation.train_len, evaluation.test_len), (8, 2));
        let mae = evaluation.mean_absolute_error.unwrap();
        assert!((mae - 0.75).abs() < 1e-12);
        assert!((evaluation.accuracy - (1.0 - 0.75 / 27.0)).abs() < 1e-12);
    }

    #[test]
    fn test_matches_manual_protocol() {
        let template = ForecastModel::new(Vec::new(), ArimaParams::new(2, 1, 1)).with_seed(11);
        let evaluator = AccuracyEvaluator::with_model(template, 0.8).unwrap();
        let series = vec![5.0, 7.0, 6.0, 9.0, 11.0, 10.0, 13.0, 15.0, 14.0, 17.0];

        let manual = ForecastModel::new(series[..8].to_vec(), ArimaParams::new(2, 1, 1))
            .with_seed(11)
            .calculate_accuracy(&series[8..]);
        assert_eq!(evaluator.evaluate(&series).accuracy, manual);
    }

    #[test]
    fn test_degenerate_series() {
        let evaluator = quiet(ArimaParams::default());
        let evaluation = evaluator.evaluate(&[1.0, 2.0]);
        assert_eq!(evaluation.accuracy, 0.0);
        assert_eq!(evaluation.mean_absolute_error, None);
        assert_eq!(evaluator.evaluate(&[]).accuracy, 0.0);
    }

    #[test]
    fn test_report_and_validation() {
        let evaluator = quiet(ArimaParams::default());
        let series: Vec<f64> = (1..=10).map(f64::from).collect();
        let report = evaluator.report(&series, 4);
        assert_eq!(report.points.len(), 14);
        assert_eq!(report.evaluation.test_len, 2);
        assert!((0.0..=1.0).contains(&report.evaluation.accuracy));

        assert!(AccuracyEvaluator::new(ArimaParams::default(), 1.0).is_err());
        assert!(AccuracyEvaluator::new(ArimaParams::default(), 0.0).is_err());
        assert!(AccuracyEvaluator::from_config(&Config::default()).is_ok());
    }
}
