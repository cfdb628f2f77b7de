use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    /// Category name to affinity weight.
    #[serde(default)]
    pub preferences: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub category: String,
    /// Feature name to weight. Items are compared by feature name, so two
    /// items may carry different key sets.
    #[serde(default)]
    pub features: BTreeMap<String, f64>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub user_id: String,
    pub item_id: String,
    pub rating: f64,
    /// Epoch milliseconds.
    #[serde(default)]
    pub timestamp: i64,
}

/// Point-in-time snapshot the recommender is built from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub ratings: Vec<Rating>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub item_id: String,
    pub score: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    UserBased,
    ItemBased,
    Hybrid,
}

/// All three strategies for one user, as shown side by side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationSet {
    pub user_based: Vec<Recommendation>,
    pub item_based: Vec<Recommendation>,
    pub hybrid: Vec<Recommendation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStats {
    pub item_id: String,
    pub average_rating: f64,
    pub rating_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub value: f64,
    pub predicted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArimaParams {
    /// Autoregressive order.
    pub p: usize,
    /// Differencing order.
    pub d: usize,
    /// Moving-average order.
    pub q: usize,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            preferences: BTreeMap::new(),
        }
    }

    pub fn with_preference(mut self, category: impl Into<String>, weight: f64) -> Self {
        self.preferences.insert(category.into(), weight);
        self
    }
}

impl Item {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            features: BTreeMap::new(),
            price: 0.0,
            tags: Vec::new(),
        }
    }

    pub fn with_feature(mut self, name: impl Into<String>, weight: f64) -> Self {
        self.features.insert(name.into(), weight);
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

impl Rating {
    pub fn new(user_id: impl Into<String>, item_id: impl Into<String>, rating: f64) -> Self {
        Self {
            user_id: user_id.into(),
            item_id: item_id.into(),
            rating,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn at(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }
}

impl Dataset {
    pub fn new(users: Vec<User>, items: Vec<Item>, ratings: Vec<Rating>) -> Self {
        Self {
            users,
            items,
            ratings,
        }
    }
}

impl Recommendation {
    pub fn new(item_id: impl Into<String>, score: f64, strategy: Strategy) -> Self {
        Self {
            item_id: item_id.into(),
            score,
            reason: strategy.reason().to_string(),
        }
    }
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::UserBased, Strategy::ItemBased, Strategy::Hybrid];

    pub fn reason(&self) -> &'static str {
        match self {
            Strategy::UserBased => "user-based collaborative filtering",
            Strategy::ItemBased => "item-based collaborative filtering",
            Strategy::Hybrid => "hybrid collaborative filtering",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::UserBased => "user_based",
            Strategy::ItemBased => "item_based",
            Strategy::Hybrid => "hybrid",
        };
        f.write_str(name)
    }
}

impl RecommendationSet {
    pub fn get(&self, strategy: Strategy) -> &[Recommendation] {
        match strategy {
            Strategy::UserBased => &self.user_based,
            Strategy::ItemBased => &self.item_based,
            Strategy::Hybrid => &self.hybrid,
        }
    }
}

impl ForecastPoint {
    pub fn historical(timestamp: i64, value: f64) -> Self {
        Self {
            timestamp,
            value,
            predicted: false,
        }
    }

    pub fn predicted(timestamp: i64, value: f64) -> Self {
        Self {
            timestamp,
            value,
            predicted: true,
        }
    }
}

impl ArimaParams {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

impl Default for ArimaParams {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

impl fmt::Display for ArimaParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ARIMA({}, {}, {})", self.p, self.d, self.q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_json_uses_camel_case() {
        let rating = Rating::new("u1", "i1", 4.0).at(1_700_000_000_000);
        let json = serde_json::to_value(&rating).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["itemId"], "i1");
        assert_eq!(json["timestamp"], 1_700_000_000_000i64);

        let back: Rating = serde_json::from_value(json).unwrap();
        assert_eq!(back, rating);
    }

    #[test]
    fn test_item_defaults_when_fields_missing() {
        let item: Item =
            serde_json::from_str(r#"{"id":"i1","name":"Widget","category":"Tools"}"#).unwrap();
        assert!(item.features.is_empty());
        assert!(item.tags.is_empty());
        assert_eq!(item.price, 0.0);
    }

    #[test]
    fn test_strategy_reasons() {
        let rec = Recommendation::new("i1", 1.5, Strategy::Hybrid);
        assert_eq!(rec.reason, "hybrid collaborative filtering");
        assert_eq!(Strategy::UserBased.to_string(), "user_based");
        assert_eq!(ArimaParams::default().to_string(), "ARIMA(1, 1, 1)");
    }
}
