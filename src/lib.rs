//! Survey Score - hierarchical scoring of questionnaire responses
//!
//! Computes dimension and domain scores from questionnaire responses through a
//! deterministic pipeline: vendor adaptation → item scoring → dimension
//! aggregation → domain aggregation → report encoding.
//!
//! ## Modules
//!
//! - **Form / Response**: Typed questionnaire definitions and submitted answers
//! - **Config**: Declarative domain → dimension → item configuration
//! - **Scoring**: Range and value computation at every level

pub mod adapters;
pub mod config;
pub mod encoder;
pub mod error;
pub mod form;
pub mod pipeline;
pub mod response;
pub mod scoring;
pub mod types;

pub use adapters::{FormAdapter, TypeformAdapter};
pub use config::{Aggregation, Dimension, Domain, FormConfig, ItemRef, MissingAnswerPolicy};
pub use error::ScoringError;
pub use form::{Field, FieldType, Form};
pub use pipeline::{score_response, SurveyProcessor};
pub use response::{AnswerValue, Response};
pub use scoring::Scored;
pub use types::{ScoreRange, ScoreReport};

/// Crate version embedded in all score reports
pub const SCORE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for score reports
pub const PRODUCER_NAME: &str = "survey-score";
