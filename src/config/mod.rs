use crate::algorithms::store::DuplicatePolicy;
use crate::models::ArimaParams;
use serde::{Deserialize, Serialize};

pub const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub recommendation: RecommendationConfig,
    pub forecasting: ForecastingConfig,
    pub evaluation: EvaluationConfig,
    pub runtime: RuntimeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationConfig {
    pub top_k: usize,
    pub duplicate_policy: DuplicatePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastingConfig {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub steps: usize,
    pub noise_amplitude: f64,
    pub seed: Option<u64>,
    pub step_millis: i64,
}

impl ForecastingConfig {
    pub fn params(&self) -> ArimaParams {
        ArimaParams::new(self.p, self.d, self.q)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    pub train_ratio: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub workers: usize,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        let params = ArimaParams::default();
        Self {
            recommendation: RecommendationConfig {
                top_k: 10,
                duplicate_policy: DuplicatePolicy::default(),
            },
            forecasting: ForecastingConfig {
                p: params.p,
                d: params.d,
                q: params.q,
                steps: 10,
                noise_amplitude: 1.0,
                seed: None,
                step_millis: DAY_MILLIS,
            },
            evaluation: EvaluationConfig { train_ratio: 0.8 },
            runtime: RuntimeConfig {
                workers: num_cpus::get(),
                log_level: "info".to_string(),
            },
        }
    }
}

impl Config {
    /// Defaults, then the file at `path`, then `RECAST__SECTION__KEY` variables.
    pub fn from_file(path: &str) -> crate::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Config::default())?)
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("RECAST").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.recommendation.top_k, 10);
        assert_eq!(config.forecasting.params(), ArimaParams::new(1, 1, 1));
        assert_eq!(config.forecasting.step_millis, DAY_MILLIS);
        assert!((config.evaluation.train_ratio - 0.8).abs() < 1e-12);
        assert!(config.runtime.workers >= 1);
    }

    #[test]
    fn test_from_file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!("recast-config-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "[forecasting]\np = 2\nseed = 7\n\n[recommendation]\ntop_k = 3\nduplicate_policy = \"reject\"\n",
        )
        .unwrap();

        let config = Config::from_file(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.forecasting.p, 2);
        assert_eq!(config.forecasting.d, 1);
        assert_eq!(config.forecasting.seed, Some(7));
        assert_eq!(config.recommendation.top_k, 3);
        assert_eq!(config.recommendation.duplicate_policy, DuplicatePolicy::Reject);
    }
}
