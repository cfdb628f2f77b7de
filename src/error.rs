use thiserror::Error;

pub type Result<T> = std::result::Result<T, RecastError>;

/// Errors raised while building engines or models.
///
/// Query-time conditions (unknown ids, empty series, zero norms) never surface
/// here; they degrade to neutral values instead.
#[derive(Debug, Error)]
pub enum RecastError {
    #[error("Invalid parameter {name}={value}: {constraint}")]
    InvalidParameter {
        name: String,
        value: String,
        constraint: String,
    },

    #[error("Invalid rating {rating} from user {user_id} on item {item_id}: must be finite and within [1, 5]")]
    InvalidRating {
        user_id: String,
        item_id: String,
        rating: f64,
    },

    #[error("Invalid {kind}: {reason}")]
    InvalidEntity { kind: &'static str, reason: String },

    #[error("Duplicate {kind} id: {id}")]
    DuplicateEntity { kind: &'static str, id: String },

    #[error("Duplicate rating from user {user_id} on item {item_id}")]
    DuplicateRating { user_id: String, item_id: String },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RecastError {
    pub fn invalid_parameter(
        name: impl Into<String>,
        value: impl ToString,
        constraint: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
            constraint: constraint.into(),
        }
    }
}
