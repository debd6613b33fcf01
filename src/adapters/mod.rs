//! Vendor document adapters
//!
//! This module provides adapters that parse raw vendor form definitions and
//! responses into the typed [`Form`] and [`Response`] structures.

mod typeform;

pub use typeform::TypeformAdapter;

use crate::error::ScoringError;
use crate::form::Form;
use crate::response::Response;

/// Trait for vendor document adapters
pub trait FormAdapter {
    /// Parse a raw form definition
    fn parse_form(&self, raw_json: &str) -> Result<Form, ScoringError>;

    /// Convert one already-decoded response document
    fn parse_response_value(&self, value: serde_json::Value) -> Result<Response, ScoringError>;

    /// Parse one raw response document
    fn parse_response(&self, raw_json: &str) -> Result<Response, ScoringError> {
        let value: serde_json::Value = serde_json::from_str(raw_json)?;
        self.parse_response_value(value)
    }

    /// Parse NDJSON (one response per line)
    fn parse_responses_ndjson(&self, ndjson: &str) -> Result<Vec<Response>, ScoringError> {
        let mut responses = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let response = self.parse_response(trimmed).map_err(|e| {
                ScoringError::ParseError(format!("Failed to parse line {}: {}", line_num + 1, e))
            })?;
            responses.push(response);
        }
        Ok(responses)
    }

    /// Parse a JSON array of responses, or a page object with an `items` array
    fn parse_responses_array(&self, json: &str) -> Result<Vec<Response>, ScoringError> {
        let batch: ResponseBatch = serde_json::from_str(json)?;
        let items = match batch {
            ResponseBatch::List(items) => items,
            ResponseBatch::Page { items } => items,
        };

        items
            .into_iter()
            .enumerate()
            .map(|(idx, value)| {
                self.parse_response_value(value).map_err(|e| {
                    ScoringError::ParseError(format!("Failed to parse response {idx}: {e}"))
                })
            })
            .collect()
    }
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum ResponseBatch {
    List(Vec<serde_json::Value>),
    Page { items: Vec<serde_json::Value> },
}
