//! Customer review validation.

use crate::error::CoreError;

/// Lowest accepted star rating.
pub const MIN_RATING: i16 = 1;

/// Highest accepted star rating.
pub const MAX_RATING: i16 = 5;

/// Maximum length of a review's text.
pub const MAX_REVIEW_LENGTH: usize = 5_000;

/// Validate a star rating is within `1..=5`.
pub fn validate_rating(rating: i16) -> Result<(), CoreError> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Rating must be between {MIN_RATING} and {MAX_RATING}, got {rating}"
        )))
    }
}

/// Validate review text is present and not oversized.
pub fn validate_review_text(text: &str) -> Result<(), CoreError> {
    if text.trim().is_empty() {
        return Err(CoreError::Validation("Review text must not be empty".into()));
    }
    if text.len() > MAX_REVIEW_LENGTH {
        return Err(CoreError::Validation(format!(
            "Review text must be at most {MAX_REVIEW_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratings_in_range() {
        for r in 1..=5 {
            assert!(validate_rating(r).is_ok());
        }
    }

    #[test]
    fn ratings_out_of_range() {
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
        assert!(validate_rating(-1).is_err());
    }

    #[test]
    fn review_text_rules() {
        assert!(validate_review_text("Lovely puppy!").is_ok());
        assert!(validate_review_text("  ").is_err());
        assert!(validate_review_text(&"x".repeat(MAX_REVIEW_LENGTH + 1)).is_err());
    }
}
