use crate::models::Recommendation;
use std::cmp::Ordering;

pub mod metrics;
pub mod validation;

/// Cosine of two equal-length vectors. Length mismatch or a zero norm gives 0.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    cosine_from_parts(dot_product, norm_a, norm_b)
}

pub(crate) fn cosine_from_parts(dot_product: f64, norm_a: f64, norm_b: f64) -> f64 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let similarity = dot_product / (norm_a * norm_b);
    if similarity.is_finite() {
        similarity.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Score descending, then item id ascending.
pub fn compare_recommendations(a: &Recommendation, b: &Recommendation) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.item_id.cmp(&b.item_id))
}

pub fn rank_top_k(mut recommendations: Vec<Recommendation>, k: usize) -> Vec<Recommendation> {
    recommendations.sort_by(compare_recommendations);
    recommendations.truncate(k);
    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Strategy;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);

        let a = vec![1.0, 1.0];
        let b = vec![2.0, 2.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-12);

        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[2.0, 4.0]), Some(3.0));
    }

    #[test]
    fn test_rank_breaks_ties_by_item_id() {
        let recs = vec![
            Recommendation::new("b", 1.0, Strategy::UserBased),
            Recommendation::new("c", 2.0, Strategy::UserBased),
            Recommendation::new("a", 1.0, Strategy::UserBased),
        ];
        let ranked = rank_top_k(recs, 2);
        let ids: Vec<&str> = ranked.iter().map(|r| r.item_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
    }
}
