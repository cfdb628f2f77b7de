use crate::error::{RecastError, Result};
use crate::models::*;
use crate::utils::validation::{validate_item, validate_rating, validate_user};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// How repeated ratings of the same (user, item) pair are resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Greatest timestamp wins; equal timestamps fall back to input order.
    #[default]
    LatestTimestamp,
    /// Input order, last one wins.
    LastProcessed,
    /// Any repeat fails construction.
    Reject,
}

/// Immutable snapshot of users, items and the dense user x item rating matrix.
///
/// Rows follow the user input order and columns the item input order. A cell
/// holds the resolved rating or `0.0` for "unrated".
#[derive(Debug, Clone)]
pub struct RatingStore {
    users: Vec<User>,
    items: Vec<Item>,
    user_index: HashMap<String, usize>,
    item_index: HashMap<String, usize>,
    matrix: DMatrix<f64>,
    skipped_ratings: usize,
}

impl RatingStore {
    pub fn new(
        users: Vec<User>,
        items: Vec<Item>,
        ratings: Vec<Rating>,
        policy: DuplicatePolicy,
    ) -> Result<Self> {
        let user_index =
            index_entities("user", &users, |u| validate_user(u).map(|_| u.id.as_str()))?;
        let item_index =
            index_entities("item", &items, |i| validate_item(i).map(|_| i.id.as_str()))?;

        let mut matrix = DMatrix::zeros(users.len(), items.len());
        let mut stamps: HashMap<(usize, usize), i64> = HashMap::new();
        let mut skipped_ratings = 0;

        for rating in &ratings {
            validate_rating(rating)?;

            let (Some(&row), Some(&col)) = (
                user_index.get(&rating.user_id),
                item_index.get(&rating.item_id),
            ) else {
                skipped_ratings += 1;
                continue;
            };

            match stamps.get(&(row, col)).copied() {
                None => {}
                Some(_) if policy == DuplicatePolicy::Reject => {
                    return Err(RecastError::DuplicateRating {
                        user_id: rating.user_id.clone(),
                        item_id: rating.item_id.clone(),
                    });
                }
                Some(previous)
                    if policy == DuplicatePolicy::LatestTimestamp
                        && rating.timestamp < previous =>
                {
                    debug!(
                        "Keeping newer rating for ({}, {}) over one stamped {}",
                        rating.user_id, rating.item_id, rating.timestamp
                    );
                    continue;
                }
                Some(_) => {}
            }

            stamps.insert((row, col), rating.timestamp);
            matrix[(row, col)] = rating.rating;
        }

        if skipped_ratings > 0 {
            warn!(
                "Skipped {} ratings referencing unknown users or items",
                skipped_ratings
            );
        }

        info!(
            "Built rating matrix: {} users x {} items, {} rated cells",
            users.len(),
            items.len(),
            stamps.len()
        );

        Ok(Self {
            users,
            items,
            user_index,
            item_index,
            matrix,
            skipped_ratings,
        })
    }

    pub fn from_dataset(dataset: Dataset, policy: DuplicatePolicy) -> Result<Self> {
        Self::new(dataset.users, dataset.items, dataset.ratings, policy)
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn user(&self, user_id: &str) -> Option<&User> {
        self.user_index(user_id).map(|idx| &self.users[idx])
    }

    pub fn item(&self, item_id: &str) -> Option<&Item> {
        self.item_index(item_id).map(|idx| &self.items[idx])
    }

    pub fn user_index(&self, user_id: &str) -> Option<usize> {
        self.user_index.get(user_id).copied()
    }

    pub fn item_index(&self, item_id: &str) -> Option<usize> {
        self.item_index.get(item_id).copied()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    /// Ratings that referenced an unknown user or item at construction.
    pub fn skipped_ratings(&self) -> usize {
        self.skipped_ratings
    }

    /// Resolved rating, or `0.0` when unrated.
    pub fn rating(&self, user_idx: usize, item_idx: usize) -> f64 {
        self.matrix[(user_idx, item_idx)]
    }

    /// Column indices and values of the items a user has rated.
    pub fn rated_items(&self, user_idx: usize) -> Vec<(usize, f64)> {
        self.matrix
            .row(user_idx)
            .iter()
            .enumerate()
            .filter(|(_, &value)| value != 0.0)
            .map(|(col, &value)| (col, value))
            .collect()
    }

    pub fn item_stats(&self) -> Vec<ItemStats> {
        self.items
            .iter()
            .enumerate()
            .map(|(col, item)| {
                let column = self.matrix.column(col);
                let (sum, count) = column
                    .iter()
                    .filter(|&&value| value != 0.0)
                    .fold((0.0, 0usize), |(sum, count), &value| (sum + value, count + 1));

                ItemStats {
                    item_id: item.id.clone(),
                    average_rating: if count > 0 { sum / count as f64 } else { 0.0 },
                    rating_count: count,
                }
            })
            .collect()
    }

    /// Highest average rating first, then most ratings, then item id.
    pub fn top_rated_items(&self, k: usize, category: Option<&str>) -> Vec<ItemStats> {
        let mut stats: Vec<ItemStats> = self
            .item_stats()
            .into_iter()
            .zip(self.items.iter())
            .filter(|(_, item)| category.map_or(true, |c| item.category == c))
            .map(|(stats, _)| stats)
            .collect();

        stats.sort_by(|a, b| {
            b.average_rating
                .partial_cmp(&a.average_rating)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.rating_count.cmp(&a.rating_count))
                .then_with(|| a.item_id.cmp(&b.item_id))
        });
        stats.truncate(k);
        stats
    }
}

fn index_entities<'a, T, F>(
    kind: &'static str,
    entities: &'a [T],
    id_of: F,
) -> Result<HashMap<String, usize>>
where
    F: Fn(&'a T) -> Result<&'a str>,
{
    let mut index = HashMap::with_capacity(entities.len());
    for (position, entity) in entities.iter().enumerate() {
        let id = id_of(entity)?;
        if index.insert(id.to_string(), position).is_some() {
            return Err(RecastError::DuplicateEntity {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Vec<User> {
        vec![User::new("u1", "Alice"), User::new("u2", "Bob")]
    }

    fn items() -> Vec<Item> {
        vec![
            Item::new("i1", "The Matrix", "Movie"),
            Item::new("i2", "Inception", "Movie"),
            Item::new("i3", "Dune", "Book"),
        ]
    }

    #[test]
    fn test_builds_matrix_in_input_order() {
        let ratings = vec![
            Rating::new("u1", "i1", 5.0).at(1),
            Rating::new("u2", "i3", 2.0).at(1),
        ];
        let store =
            RatingStore::new(users(), items(), ratings, DuplicatePolicy::default()).unwrap();

        assert_eq!(store.matrix().shape(), (2, 3));
        assert_eq!(store.rating(0, 0), 5.0);
        assert_eq!(store.rating(1, 2), 2.0);
        assert_eq!(store.rating(0, 1), 0.0);
        assert_eq!(store.rated_items(0), vec![(0, 5.0)]);
        assert_eq!(store.user("u2").map(|u| u.name.as_str()), Some("Bob"));
        assert_eq!(store.item_index("i3"), Some(2));
        assert!(store.item("missing").is_none());
    }

    #[test]
    fn test_unknown_references_are_skipped() {
        let ratings = vec![
            Rating::new("u1", "i1", 4.0).at(1),
            Rating::new("ghost", "i1", 4.0).at(1),
            Rating::new("u1", "nope", 4.0).at(1),
        ];
        let store =
            RatingStore::new(users(), items(), ratings, DuplicatePolicy::default()).unwrap();
        assert_eq!(store.skipped_ratings(), 2);
        assert_eq!(store.rated_items(0).len(), 1);
    }

    #[test]
    fn test_duplicate_policies() {
        let ratings = vec![
            Rating::new("u1", "i1", 5.0).at(200),
            Rating::new("u1", "i1", 2.0).at(100),
        ];

        let latest = RatingStore::new(
            users(),
            items(),
            ratings.clone(),
            DuplicatePolicy::LatestTimestamp,
        )
        .unwrap();
        assert_eq!(latest.rating(0, 0), 5.0);

        let last = RatingStore::new(
            users(),
            items(),
            ratings.clone(),
            DuplicatePolicy::LastProcessed,
        )
        .unwrap();
        assert_eq!(last.rating(0, 0), 2.0);

        let rejected = RatingStore::new(users(), items(), ratings, DuplicatePolicy::Reject);
        assert!(matches!(rejected, Err(RecastError::DuplicateRating { .. })));
    }

    #[test]
    fn test_equal_timestamps_fall_back_to_input_order() {
        let ratings = vec![
            Rating::new("u1", "i1", 5.0).at(100),
            Rating::new("u1", "i1", 3.0).at(100),
        ];
        let store =
            RatingStore::new(users(), items(), ratings, DuplicatePolicy::LatestTimestamp).unwrap();
        assert_eq!(store.rating(0, 0), 3.0);
    }

    #[test]
    fn test_rejects_invalid_input() {
        let dup_users = vec![User::new("u1", "Alice"), User::new("u1", "Again")];
        let result = RatingStore::new(dup_users, items(), vec![], DuplicatePolicy::default());
        assert!(matches!(result, Err(RecastError::DuplicateEntity { kind: "user", .. })));

        let bad_rating = vec![Rating::new("u1", "i1", 0.0)];
        let result = RatingStore::new(users(), items(), bad_rating, DuplicatePolicy::default());
        assert!(matches!(result, Err(RecastError::InvalidRating { .. })));
    }

    #[test]
    fn test_item_stats_and_top_rated() {
        let ratings = vec![
            Rating::new("u1", "i1", 4.0).at(1),
            Rating::new("u2", "i1", 2.0).at(1),
            Rating::new("u1", "i2", 3.0).at(1),
            Rating::new("u2", "i3", 5.0).at(1),
        ];
        let store =
            RatingStore::new(users(), items(), ratings, DuplicatePolicy::default()).unwrap();

        let stats = store.item_stats();
        assert_eq!(stats[0].rating_count, 2);
        assert!((stats[0].average_rating - 3.0).abs() < 1e-12);

        let top: Vec<String> = store
            .top_rated_items(3, None)
            .into_iter()
            .map(|s| s.item_id)
            .collect();
        assert_eq!(top, vec!["i3", "i1", "i2"]);

        let movies: Vec<String> = store
            .top_rated_items(5, Some("Movie"))
            .into_iter()
            .map(|s| s.item_id)
            .collect();
        assert_eq!(movies, vec!["i1", "i2"]);
    }
}
