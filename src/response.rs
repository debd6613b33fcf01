//! Response documents
//!
//! A response is an unordered set of answers keyed by the `ref` of the field
//! they answer. Only numeric answers can be scored directly; the other payload
//! types are kept so callers can report what they received.

use crate::error::ScoringError;
use crate::form::FieldType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Selected choice of a single-choice question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub label: Option<String>,
    /// Free text entered in an "other" option
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other: Option<String>,
}

/// Answer payload, tagged by payload type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnswerValue {
    Number { number: f64 },
    Choice { choice: Choice },
    Choices { choices: Choices },
    Boolean { boolean: bool },
    Text { text: String },
    Email { email: String },
    Url { url: String },
    FileUrl { file_url: String },
    Date { date: String },
    PhoneNumber { phone_number: String },
    Payment { payment: serde_json::Value },
    #[serde(other)]
    Unknown,
}

/// Selected choices of a multi-choice question
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Choices {
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other: Option<String>,
}

impl AnswerValue {
    pub fn number(value: f64) -> Self {
        AnswerValue::Number { number: value }
    }

    pub fn text(value: impl Into<String>) -> Self {
        AnswerValue::Text { text: value.into() }
    }

    pub fn boolean(value: bool) -> Self {
        AnswerValue::Boolean { boolean: value }
    }

    pub fn choice(label: impl Into<String>) -> Self {
        AnswerValue::Choice {
            choice: Choice {
                label: Some(label.into()),
                other: None,
            },
        }
    }

    /// Numeric payload, only for number answers
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AnswerValue::Number { number } => Some(*number),
            _ => None,
        }
    }

    /// Payload type name
    pub fn kind(&self) -> &'static str {
        match self {
            AnswerValue::Number { .. } => "number",
            AnswerValue::Choice { .. } => "choice",
            AnswerValue::Choices { .. } => "choices",
            AnswerValue::Boolean { .. } => "boolean",
            AnswerValue::Text { .. } => "text",
            AnswerValue::Email { .. } => "email",
            AnswerValue::Url { .. } => "url",
            AnswerValue::FileUrl { .. } => "file_url",
            AnswerValue::Date { .. } => "date",
            AnswerValue::PhoneNumber { .. } => "phone_number",
            AnswerValue::Payment { .. } => "payment",
            AnswerValue::Unknown => "unknown",
        }
    }
}

/// One answer of a response
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub reference: String,
    /// Type of the answered field, when the document states it
    pub field_type: Option<FieldType>,
    pub value: AnswerValue,
}

/// A respondent's submitted answers
#[derive(Debug, Clone)]
pub struct Response {
    id: String,
    submitted_at: Option<DateTime<Utc>>,
    answers: HashMap<String, Answer>,
}

impl Response {
    pub fn builder(id: impl Into<String>) -> ResponseBuilder {
        ResponseBuilder {
            id: id.into(),
            submitted_at: None,
            answers: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn has_answer(&self, reference: &str) -> bool {
        self.answers.contains_key(reference)
    }

    /// Resolve the answer to the field carrying `reference`
    pub fn answer(&self, reference: &str) -> Result<&Answer, ScoringError> {
        self.answers
            .get(reference)
            .ok_or_else(|| ScoringError::AnswerNotFound {
                reference: reference.to_string(),
            })
    }
}

/// Builder for [`Response`]
#[derive(Debug)]
pub struct ResponseBuilder {
    id: String,
    submitted_at: Option<DateTime<Utc>>,
    answers: Vec<Answer>,
}

impl ResponseBuilder {
    pub fn submitted_at(mut self, at: DateTime<Utc>) -> Self {
        self.submitted_at = Some(at);
        self
    }

    pub fn answer(mut self, answer: Answer) -> Self {
        self.answers.push(answer);
        self
    }

    /// Shorthand for a numeric answer
    pub fn number(self, reference: impl Into<String>, value: f64) -> Self {
        self.value(reference, AnswerValue::number(value))
    }

    pub fn value(self, reference: impl Into<String>, value: AnswerValue) -> Self {
        self.answer(Answer {
            reference: reference.into(),
            field_type: None,
            value,
        })
    }

    /// Key answers by ref; a ref answered twice is rejected
    pub fn build(self) -> Result<Response, ScoringError> {
        let mut answers = HashMap::with_capacity(self.answers.len());
        for answer in self.answers {
            let reference = answer.reference.clone();
            if answers.insert(reference.clone(), answer).is_some() {
                return Err(ScoringError::ParseError(format!(
                    "response {} answers {} more than once",
                    self.id, reference
                )));
            }
        }

        Ok(Response {
            id: self.id,
            submitted_at: self.submitted_at,
            answers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_lookup() {
        let response = Response::builder("resp-1")
            .number("q1", 3.0)
            .value("q2", AnswerValue::text("fine"))
            .build()
            .unwrap();

        assert_eq!(response.len(), 2);
        assert_eq!(response.answer("q1").unwrap().value.as_number(), Some(3.0));
        assert_eq!(response.answer("q2").unwrap().value.as_number(), None);
        assert_eq!(response.answer("q2").unwrap().value.kind(), "text");
    }

    #[test]
    fn test_answer_not_found() {
        let response = Response::builder("resp-1").build().unwrap();
        let err = response.answer("q1").unwrap_err();
        assert!(err.is_missing_answer());
    }

    #[test]
    fn test_duplicate_answers_rejected() {
        let result = Response::builder("resp-1")
            .number("q1", 3.0)
            .number("q1", 4.0)
            .build();
        assert!(matches!(result, Err(ScoringError::ParseError(_))));
    }

    #[test]
    fn test_answer_value_deserialization() {
        let value: AnswerValue =
            serde_json::from_str(r#"{"type": "choice", "choice": {"label": "Often"}}"#).unwrap();
        assert_eq!(value, AnswerValue::choice("Often"));

        let value: AnswerValue =
            serde_json::from_str(r#"{"type": "number", "number": 4}"#).unwrap();
        assert_eq!(value.as_number(), Some(4.0));

        let value: AnswerValue = serde_json::from_str(r#"{"type": "signature"}"#).unwrap();
        assert_eq!(value, AnswerValue::Unknown);
    }
}
