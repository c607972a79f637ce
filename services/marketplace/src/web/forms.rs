//! services/marketplace/src/web/forms.rs
//!
//! Field normalisation shared by the form handlers.

/// A trimmed, non-empty value, or `None` for a blank field.
pub fn required(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Blank optional fields are stored as NULL.
pub fn optional(raw: Option<&str>) -> Option<String> {
    raw.and_then(required)
}

#[derive(Debug, PartialEq, Eq)]
pub enum PriceError {
    Missing,
    Invalid,
}

/// Parses a course price. Zero is a valid (free) price.
pub fn parse_price(raw: &str) -> Result<f64, PriceError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PriceError::Missing);
    }
    match trimmed.parse::<f64>() {
        // Adding zero folds a parsed "-0" into +0.0.
        Ok(price) if price.is_finite() && price >= 0.0 => Ok(price + 0.0),
        _ => Err(PriceError::Invalid),
    }
}
