//! Error types for survey scoring

use thiserror::Error;

/// Errors that can occur while parsing documents or computing scores
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Field not found in form: {reference}")]
    FieldNotFound { reference: String },

    #[error("Answer not found in response: {reference}")]
    AnswerNotFound { reference: String },

    #[error("Unsupported answer type '{answer_type}' for item {reference}")]
    UnsupportedAnswerType {
        reference: String,
        answer_type: String,
    },

    #[error("Field {reference} of type '{field_type}' has no scale")]
    UnscaledField {
        reference: String,
        field_type: String,
    },

    #[error("Answer {value} for item {reference} is outside [{min}, {max}]")]
    AnswerOutOfRange {
        reference: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("No answered items in dimension: {dimension}")]
    NoAnsweredItems { dimension: String },

    #[error("Invalid scoring configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse document: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

impl ScoringError {
    /// Whether this error comes from an absent answer rather than bad data
    pub fn is_missing_answer(&self) -> bool {
        matches!(self, ScoringError::AnswerNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_answer_classification() {
        let missing = ScoringError::AnswerNotFound {
            reference: "q1".to_string(),
        };
        let unknown = ScoringError::FieldNotFound {
            reference: "q1".to_string(),
        };

        assert!(missing.is_missing_answer());
        assert!(!unknown.is_missing_answer());
        assert_eq!(missing.to_string(), "Answer not found in response: q1");
    }
}
