use crate::models::Recommendation;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationMetrics {
    pub precision_at_k: f64,
    pub recall_at_k: f64,
    pub f1_score: f64,
    pub ndcg_at_k: f64,
    pub coverage: f64,
}

/// Offline ranking metrics over recommendation lists.
#[derive(Debug, Clone)]
pub struct MetricsCalculator {
    k: usize,
}

impl MetricsCalculator {
    pub fn new(k: usize) -> Self {
        Self { k }
    }

    pub fn calculate_precision_at_k(
        &self,
        recommended: &[Recommendation],
        relevant: &[String],
    ) -> f64 {
        let cutoff = self.k.min(recommended.len());
        if cutoff == 0 {
            return 0.0;
        }

        self.relevant_hits(recommended, relevant) as f64 / cutoff as f64
    }

    pub fn calculate_recall_at_k(
        &self,
        recommended: &[Recommendation],
        relevant: &[String],
    ) -> f64 {
        if relevant.is_empty() {
            return 0.0;
        }

        self.relevant_hits(recommended, relevant) as f64 / relevant.len() as f64
    }

    pub fn calculate_f1_score(&self, precision: f64, recall: f64) -> f64 {
        if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        }
    }

    pub fn calculate_ndcg_at_k(
        &self,
        recommended: &[Recommendation],
        relevance: &HashMap<String, f64>,
    ) -> f64 {
        let dcg = self.calculate_dcg(recommended, relevance);
        let idcg = self.calculate_ideal_dcg(relevance);

        if idcg == 0.0 {
            0.0
        } else {
            dcg / idcg
        }
    }

    /// Share of the catalogue that appears in at least one list.
    pub fn calculate_coverage(&self, lists: &[Vec<Recommendation>], catalogue_size: usize) -> f64 {
        if catalogue_size == 0 {
            return 0.0;
        }

        let covered: HashSet<&str> = lists
            .iter()
            .flat_map(|list| list.iter().take(self.k))
            .map(|rec| rec.item_id.as_str())
            .collect();

        covered.len() as f64 / catalogue_size as f64
    }

    pub fn calculate_all_metrics(
        &self,
        recommended: &[Recommendation],
        relevant: &[String],
        relevance: &HashMap<String, f64>,
        catalogue_size: usize,
    ) -> RecommendationMetrics {
        let precision = self.calculate_precision_at_k(recommended, relevant);
        let recall = self.calculate_recall_at_k(recommended, relevant);

        RecommendationMetrics {
            precision_at_k: precision,
            recall_at_k: recall,
            f1_score: self.calculate_f1_score(precision, recall),
            ndcg_at_k: self.calculate_ndcg_at_k(recommended, relevance),
            coverage: self.calculate_coverage(&[recommended.to_vec()], catalogue_size),
        }
    }

    fn relevant_hits(&self, recommended: &[Recommendation], relevant: &[String]) -> usize {
        let relevant_set: HashSet<&str> = relevant.iter().map(String::as_str).collect();
        recommended
            .iter()
            .take(self.k)
            .filter(|rec| relevant_set.contains(rec.item_id.as_str()))
            .count()
    }

    fn calculate_dcg(
        &self,
        recommended: &[Recommendation],
        relevance: &HashMap<String, f64>,
    ) -> f64 {
        recommended
            .iter()
            .take(self.k)
            .enumerate()
            .map(|(i, rec)| {
                let gain = relevance.get(&rec.item_id).copied().unwrap_or(0.0);
                gain / ((i + 2) as f64).log2()
            })
            .sum()
    }

    fn calculate_ideal_dcg(&self, relevance: &HashMap<String, f64>) -> f64 {
        let mut gains: Vec<f64> = relevance.values().copied().collect();
        gains.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

        gains
            .iter()
            .take(self.k)
            .enumerate()
            .map(|(i, &gain)| gain / ((i + 2) as f64).log2())
            .sum()
    }
}

/// Mean absolute error over the overlapping prefix of the two sequences.
pub fn mean_absolute_error(predicted: &[f64], actual: &[f64]) -> Option<f64> {
    let n = predicted.len().min(actual.len());
    if n == 0 {
        return None;
    }

    let total: f64 = predicted
        .iter()
        .zip(actual.iter())
        .map(|(p, a)| (p - a).abs())
        .sum();
    Some(total / n as f64)
}

pub fn root_mean_squared_error(predicted: &[f64], actual: &[f64]) -> Option<f64> {
    let n = predicted.len().min(actual.len());
    if n == 0 {
        return None;
    }

    let total: f64 = predicted
        .iter()
        .zip(actual.iter())
        .map(|(p, a)| (p - a).powi(2))
        .sum();
    Some((total / n as f64).sqrt())
}

/// `1 - mae / mean(actual)`, clamped to [0, 1]. A zero or non-finite
/// denominator scores 0.
pub fn scaled_accuracy(mae: f64, actual_mean: f64) -> f64 {
    if actual_mean == 0.0 || !actual_mean.is_finite() || !mae.is_finite() {
        return 0.0;
    }

    (1.0 - mae / actual_mean).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Strategy;

    fn recs(ids: &[&str]) -> Vec<Recommendation> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| Recommendation::new(*id, 10.0 - i as f64, Strategy::Hybrid))
            .collect()
    }

    #[test]
    fn test_precision_recall() {
        let calculator = MetricsCalculator::new(5);
        let recommended = recs(&["a", "b", "c"]);
        let relevant = vec!["a".to_string(), "c".to_string()];

        let precision = calculator.calculate_precision_at_k(&recommended, &relevant);
        assert!((precision - 2.0 / 3.0).abs() < 1e-12);

        let recall = calculator.calculate_recall_at_k(&recommended, &relevant);
        assert!((recall - 1.0).abs() < 1e-12);

        let f1 = calculator.calculate_f1_score(precision, recall);
        assert!((f1 - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_ndcg_perfect_ordering() {
        let calculator = MetricsCalculator::new(3);
        let recommended = recs(&["a", "b", "c"]);
        let relevance: HashMap<String, f64> =
            [("a", 3.0), ("b", 2.0), ("c", 1.0)].iter().map(|(k, v)| (k.to_string(), *v)).collect();

        let ndcg = calculator.calculate_ndcg_at_k(&recommended, &relevance);
        assert!((ndcg - 1.0).abs() < 1e-12);

        let reversed = recs(&["c", "b", "a"]);
        let ndcg = calculator.calculate_ndcg_at_k(&reversed, &relevance);
        assert!(ndcg > 0.0 && ndcg < 1.0);
    }

    #[test]
    fn test_coverage() {
        let calculator = MetricsCalculator::new(2);
        let lists = vec![recs(&["a", "b", "c"]), recs(&["b", "d"])];
        assert!((calculator.calculate_coverage(&lists, 8) - 0.375).abs() < 1e-12);
        assert_eq!(calculator.calculate_coverage(&lists, 0), 0.0);
    }

    #[test]
    fn test_forecast_errors() {
        assert_eq!(mean_absolute_error(&[], &[1.0]), None);
        assert_eq!(mean_absolute_error(&[1.0, 3.0], &[2.0, 1.0, 9.0]), Some(1.5));
        assert_eq!(root_mean_squared_error(&[0.0, 0.0], &[3.0, 4.0]), Some(12.5f64.sqrt()));

        assert!((scaled_accuracy(1.0, 10.0) - 0.9).abs() < 1e-12);
        assert_eq!(scaled_accuracy(20.0, 10.0), 0.0);
        assert_eq!(scaled_accuracy(1.0, 0.0), 0.0);
        // A negative mean makes the scaled error negative, which clamps to 1.
        assert_eq!(scaled_accuracy(1.0, -10.0), 1.0);
    }
}
