pub mod differencing;
pub mod evaluation;
pub mod forecast;
pub mod recommender;
pub mod similarity;
pub mod store;

pub use differencing::difference;
pub use evaluation::{AccuracyEvaluator, ForecastReport, HoldoutEvaluation};
pub use forecast::{AccuracyScore, ArEstimator, ForecastComponents, ForecastModel};
pub use recommender::RecommenderEngine;
pub use similarity::SimilarityEngine;
pub use store::{DuplicatePolicy, RatingStore};
