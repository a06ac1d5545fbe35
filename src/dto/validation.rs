//! Validation helpers for DTOs.

use validator::ValidationError;

/// Count whitespace-delimited words in argument content.
///
/// This is the tokenization the minimum-length rule is defined over; leading
/// and trailing whitespace contribute no tokens.
pub fn word_count(content: &str) -> usize {
    content.split_whitespace().count()
}

/// Validates that submitted content is not empty or whitespace-only.
pub fn validate_not_blank(content: &str) -> Result<(), ValidationError> {
    if content.trim().is_empty() {
        let mut err = ValidationError::new("content_blank");
        err.message = Some("Content must not be blank".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_count_splits_on_any_whitespace() {
        assert_eq!(word_count("one two three"), 3);
        assert_eq!(word_count("  padded \t words\nacross lines "), 4);
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   "), 0);
        assert_eq!(word_count("single"), 1);
    }

    #[test]
    fn blank_content_is_rejected() {
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank("   \n\t").is_err());
        assert!(validate_not_blank("fine").is_ok());
    }
}
