use crate::error::{RecastError, Result};
use crate::models::*;

pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 5.0;

pub fn validate_user(user: &User) -> Result<()> {
    if user.id.trim().is_empty() {
        return Err(RecastError::InvalidEntity {
            kind: "user",
            reason: "id cannot be empty".to_string(),
        });
    }

    for (category, &weight) in &user.preferences {
        if !weight.is_finite() {
            return Err(RecastError::InvalidEntity {
                kind: "user",
                reason: format!("preference '{}' of user {} is not finite", category, user.id),
            });
        }
    }

    Ok(())
}

pub fn validate_item(item: &Item) -> Result<()> {
    if item.id.trim().is_empty() {
        return Err(RecastError::InvalidEntity {
            kind: "item",
            reason: "id cannot be empty".to_string(),
        });
    }

    // A non-finite weight turns every item cosine into NaN.
    for (feature, &weight) in &item.features {
        if !weight.is_finite() {
            return Err(RecastError::InvalidEntity {
                kind: "item",
                reason: format!("feature '{}' of item {} is not finite", feature, item.id),
            });
        }
    }

    if !item.price.is_finite() {
        return Err(RecastError::InvalidEntity {
            kind: "item",
            reason: format!("price of item {} is not finite", item.id),
        });
    }

    Ok(())
}

/// Ratings must be finite and within [1, 5] so that 0 stays free as the
/// "unrated" sentinel in the rating matrix.
pub fn validate_rating(rating: &Rating) -> Result<()> {
    if !rating.rating.is_finite() || rating.rating < MIN_RATING || rating.rating > MAX_RATING {
        return Err(RecastError::InvalidRating {
            user_id: rating.user_id.clone(),
            item_id: rating.item_id.clone(),
            rating: rating.rating,
        });
    }
    Ok(())
}

pub fn validate_train_ratio(ratio: f64) -> Result<()> {
    if !ratio.is_finite() || ratio <= 0.0 || ratio >= 1.0 {
        return Err(RecastError::invalid_parameter(
            "train_ratio",
            ratio,
            "must lie strictly between 0 and 1",
        ));
    }
    Ok(())
}

pub fn validate_noise_amplitude(amplitude: f64) -> Result<()> {
    if !amplitude.is_finite() || amplitude < 0.0 {
        return Err(RecastError::invalid_parameter(
            "noise_amplitude",
            amplitude,
            "must be finite and non-negative",
        ));
    }
    Ok(())
}

pub fn validate_step_millis(step_millis: i64) -> Result<()> {
    if step_millis <= 0 {
        return Err(RecastError::invalid_parameter(
            "step_millis",
            step_millis,
            "must be positive",
        ));
    }
    Ok(())
}
