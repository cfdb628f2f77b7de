use crate::algorithms::similarity::SimilarityEngine;
use crate::algorithms::store::{DuplicatePolicy, RatingStore};
use crate::error::Result;
use crate::models::*;
use crate::utils::rank_top_k;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Number of most-similar users consulted by user-based filtering.
pub const NEIGHBORHOOD_SIZE: usize = 5;
pub const USER_WEIGHT: f64 = 0.6;
pub const ITEM_WEIGHT: f64 = 0.4;

/// Ranked recommendation queries over a store fixed at construction.
///
/// Unknown users and empty data yield empty lists; nothing here errors.
/// Every list is ordered by score descending, then item id ascending.
#[derive(Debug, Clone)]
pub struct RecommenderEngine {
    store: Arc<RatingStore>,
    similarity: SimilarityEngine,
}

impl RecommenderEngine {
    pub fn new(store: Arc<RatingStore>) -> Self {
        let similarity = SimilarityEngine::new(store.clone());
        Self { store, similarity }
    }

    pub fn from_dataset(dataset: Dataset, policy: DuplicatePolicy) -> Result<Self> {
        let store = RatingStore::from_dataset(dataset, policy)?;
        Ok(Self::new(Arc::new(store)))
    }

    pub fn store(&self) -> &RatingStore {
        &self.store
    }

    pub fn similarity(&self) -> &SimilarityEngine {
        &self.similarity
    }

    pub fn recommend(&self, strategy: Strategy, user_id: &str, k: usize) -> Vec<Recommendation> {
        match strategy {
            Strategy::UserBased => self.user_based_recommendations(user_id, k),
            Strategy::ItemBased => self.item_based_recommendations(user_id, k),
            Strategy::Hybrid => self.hybrid_recommendations(user_id, k),
        }
    }

    pub fn recommendation_set(&self, user_id: &str, k: usize) -> RecommendationSet {
        RecommendationSet {
            user_based: self.user_based_recommendations(user_id, k),
            item_based: self.item_based_recommendations(user_id, k),
            hybrid: self.hybrid_recommendations(user_id, k),
        }
    }

    pub fn user_based_recommendations(&self, user_id: &str, k: usize) -> Vec<Recommendation> {
        let Some(user_idx) = self.store.user_index(user_id) else {
            debug!("User-based query for unknown user {}", user_id);
            return Vec::new();
        };
        if k == 0 || self.store.user_count() < 2 {
            return Vec::new();
        }

        let neighbors = self.similarity.neighbors(user_idx, NEIGHBORHOOD_SIZE);
        let mut scores: Vec<Option<f64>> = vec![None; self.store.item_count()];

        for &(neighbor_idx, similarity) in &neighbors {
            for (item_idx, neighbor_rating) in self.store.rated_items(neighbor_idx) {
                if self.store.rating(user_idx, item_idx) == 0.0 {
                    let score = scores[item_idx].get_or_insert(0.0);
                    *score += similarity * neighbor_rating;
                }
            }
        }

        debug!(
            "User-based scoring for {} used {} neighbors",
            user_id,
            neighbors.len()
        );
        self.ranked(scores, Strategy::UserBased, k)
    }

    pub fn item_based_recommendations(&self, user_id: &str, k: usize) -> Vec<Recommendation> {
        let Some(user_idx) = self.store.user_index(user_id) else {
            debug!("Item-based query for unknown user {}", user_id);
            return Vec::new();
        };

        let rated = self.store.rated_items(user_idx);
        if k == 0 || rated.is_empty() {
            return Vec::new();
        }

        let mut scores: Vec<Option<f64>> = vec![None; self.store.item_count()];

        for &(rated_idx, user_rating) in &rated {
            for (item_idx, score) in scores.iter_mut().enumerate() {
                if self.store.rating(user_idx, item_idx) == 0.0 {
                    let similarity = self.similarity.item_similarity_at(rated_idx, item_idx);
                    *score.get_or_insert(0.0) += similarity * user_rating;
                }
            }
        }

        self.ranked(scores, Strategy::ItemBased, k)
    }

    /// `0.6 * user-based + 0.4 * item-based`, missing scores counted as 0.
    ///
    /// Both inputs are already capped at `k`, so an item that one strategy
    /// ranked just outside its top `k` contributes nothing from that side.
    pub fn hybrid_recommendations(&self, user_id: &str, k: usize) -> Vec<Recommendation> {
        let user_based = self.user_based_recommendations(user_id, k);
        let item_based = self.item_based_recommendations(user_id, k);

        let mut blended: HashMap<String, f64> = HashMap::new();
        for rec in user_based {
            *blended.entry(rec.item_id).or_insert(0.0) += USER_WEIGHT * rec.score;
        }
        for rec in item_based {
            *blended.entry(rec.item_id).or_insert(0.0) += ITEM_WEIGHT * rec.score;
        }

        let recommendations = blended
            .into_iter()
            .map(|(item_id, score)| Recommendation::new(item_id, score, Strategy::Hybrid))
            .collect();
        rank_top_k(recommendations, k)
    }

    fn ranked(
        &self,
        scores: Vec<Option<f64>>,
        strategy: Strategy,
        k: usize,
    ) -> Vec<Recommendation> {
        let items = self.store.items();
        let recommendations = scores
            .into_iter()
            .enumerate()
            .filter_map(|(idx, score)| {
                score.map(|s| Recommendation::new(items[idx].id.clone(), s, strategy))
            })
            .collect();
        rank_top_k(recommendations, k)
    }
}
