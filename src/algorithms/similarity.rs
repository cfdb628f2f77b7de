use crate::algorithms::store::RatingStore;
use crate::utils::cosine_from_parts;
use nalgebra::DVector;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// User-user and item-item cosine similarity over a fixed [`RatingStore`].
#[derive(Debug, Clone)]
pub struct SimilarityEngine {
    store: Arc<RatingStore>,
    vocabulary: Vec<String>,
    feature_vectors: Vec<DVector<f64>>,
}

impl SimilarityEngine {
    pub fn new(store: Arc<RatingStore>) -> Self {
        // Every item is laid out against the sorted union of feature names,
        // missing features as 0, so vectors line up by name.
        let vocabulary: Vec<String> = store
            .items()
            .iter()
            .flat_map(|item| item.features.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let feature_vectors = store
            .items()
            .iter()
            .map(|item| {
                DVector::from_iterator(
                    vocabulary.len(),
                    vocabulary
                        .iter()
                        .map(|name| item.features.get(name).copied().unwrap_or(0.0)),
                )
            })
            .collect();

        debug!(
            "Aligned {} items over {} feature dimensions",
            store.item_count(),
            vocabulary.len()
        );

        Self {
            store,
            vocabulary,
            feature_vectors,
        }
    }

    pub fn store(&self) -> &RatingStore {
        &self.store
    }

    /// Feature names in vector order.
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// Cosine over co-rated items only. Unknown users score 0.
    pub fn user_similarity(&self, user1: &str, user2: &str) -> f64 {
        match (self.store.user_index(user1), self.store.user_index(user2)) {
            (Some(a), Some(b)) => self.user_similarity_at(a, b),
            _ => 0.0,
        }
    }

    pub fn user_similarity_at(&self, user1_idx: usize, user2_idx: usize) -> f64 {
        let matrix = self.store.matrix();
        let row1 = matrix.row(user1_idx);
        let row2 = matrix.row(user2_idx);

        let mut dot_product = 0.0;
        let mut norm1 = 0.0;
        let mut norm2 = 0.0;
        let mut common_items = 0;

        for (&r1, &r2) in row1.iter().zip(row2.iter()) {
            if r1 != 0.0 && r2 != 0.0 {
                dot_product += r1 * r2;
                norm1 += r1 * r1;
                norm2 += r2 * r2;
                common_items += 1;
            }
        }

        if common_items == 0 {
            return 0.0;
        }

        cosine_from_parts(dot_product, norm1.sqrt(), norm2.sqrt())
    }

    /// Cosine over name-aligned feature vectors. Unknown items score 0.
    pub fn item_similarity(&self, item1: &str, item2: &str) -> f64 {
        match (self.store.item_index(item1), self.store.item_index(item2)) {
            (Some(a), Some(b)) => self.item_similarity_at(a, b),
            _ => 0.0,
        }
    }

    pub fn item_similarity_at(&self, item1_idx: usize, item2_idx: usize) -> f64 {
        let a = &self.feature_vectors[item1_idx];
        let b = &self.feature_vectors[item2_idx];
        cosine_from_parts(a.dot(b), a.norm(), b.norm())
    }

    /// The `n` users most similar to `user_idx`, most similar first; ties keep
    /// user order.
    pub fn neighbors(&self, user_idx: usize, n: usize) -> Vec<(usize, f64)> {
        let mut similarities: Vec<(usize, f64)> = (0..self.store.user_count())
            .into_par_iter()
            .filter(|&other| other != user_idx)
            .map(|other| (other, self.user_similarity_at(user_idx, other)))
            .collect();

        similarities.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        similarities.truncate(n);
        similarities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::store::DuplicatePolicy;
    use crate::models::*;

    fn engine() -> SimilarityEngine {
        let users = vec![
            User::new("u1", "Alice"),
            User::new("u2", "Bob"),
            User::new("u3", "Carol"),
            User::new("u4", "Dave"),
        ];
        let items = vec![
            Item::new("i1", "A", "Movie").with_feature("action", 1.0).with_feature("drama", 0.0),
            Item::new("i2", "B", "Movie").with_feature("drama", 1.0),
            Item::new("i3", "C", "Movie").with_feature("action", 2.0).with_feature("comedy", 0.0),
            Item::new("i4", "D", "Movie"),
        ];
        let ratings = vec![
            Rating::new("u1", "i1", 5.0).at(1),
            Rating::new("u1", "i2", 1.0).at(1),
            Rating::new("u2", "i1", 1.0).at(1),
            Rating::new("u2", "i2", 5.0).at(1),
            Rating::new("u3", "i1", 4.0).at(1),
            Rating::new("u3", "i2", 1.0).at(1),
        ];
        let store = RatingStore::new(users, items, ratings, DuplicatePolicy::default()).unwrap();
        SimilarityEngine::new(Arc::new(store))
    }

    #[test]
    fn test_user_similarity_uses_co_rated_items() {
        let engine = engine();
        let expected = (5.0 * 1.0 + 1.0 * 5.0) / (26.0f64.sqrt() * 26.0f64.sqrt());
        assert!((engine.user_similarity("u1", "u2") - expected).abs() < 1e-12);
        assert_eq!(engine.user_similarity("u1", "u4"), 0.0);
        assert_eq!(engine.user_similarity("u1", "ghost"), 0.0);
        assert_eq!(
            engine.user_similarity("u1", "u3"),
            engine.user_similarity("u3", "u1")
        );
    }

    #[test]
    fn test_item_similarity_aligns_by_name() {
        let engine = engine();
        assert_eq!(engine.vocabulary(), &["action", "comedy", "drama"]);

        // i1 and i3 only share "action"; positional alignment would pair
        // i1.drama with i3.comedy.
        assert!((engine.item_similarity("i1", "i3") - 1.0).abs() < 1e-12);
        assert_eq!(engine.item_similarity("i1", "i2"), 0.0);
        assert_eq!(engine.item_similarity("i4", "i1"), 0.0);
        assert_eq!(engine.item_similarity("i1", "missing"), 0.0);
    }

    #[test]
    fn test_neighbors_sorted_and_truncated() {
        let engine = engine();
        let neighbors = engine.neighbors(0, 2);
        assert_eq!(neighbors.len(), 2);
        assert_eq!(neighbors[0].0, 2);
        assert!(neighbors[0].1 >= neighbors[1].1);
        assert!(neighbors.iter().all(|(idx, _)| *idx != 0));
    }
}
