//! Pipeline orchestration
//!
//! This module provides the public API for scoring survey responses.
//! It orchestrates the full pipeline from raw vendor JSON to score reports.

use crate::adapters::{FormAdapter, TypeformAdapter};
use crate::config::FormConfig;
use crate::encoder::ReportEncoder;
use crate::error::ScoringError;
use crate::form::Form;
use crate::response::Response;
use crate::types::{DomainRange, ScoreReport};
use std::sync::Arc;
use tracing::{debug, warn};

/// Score one raw Typeform response and return its report as JSON.
///
/// # Arguments
/// * `form_json` - Typeform form definition
/// * `config_json` - Scoring configuration (domains, dimensions, items)
/// * `response_json` - Typeform response or webhook payload
///
/// # Example
/// ```ignore
/// let report_json = score_response(form_json, config_json, response_json)?;
/// ```
pub fn score_response(
    form_json: &str,
    config_json: &str,
    response_json: &str,
) -> Result<String, ScoringError> {
    let adapter = TypeformAdapter;

    // Stage 1: Parse form and configuration
    let form = adapter.parse_form(form_json)?;
    let config = FormConfig::from_json(config_json)?;

    // Stage 2: Parse response
    let response = adapter.parse_response(response_json)?;

    // Stage 3: Score and encode
    ReportEncoder::new().encode_to_json(&form, &config, &response)
}

/// Processor scoring many responses against one form and configuration.
///
/// Form and configuration are immutable and shared by reference, so a
/// processor can be cloned cheaply or shared between threads.
#[derive(Debug, Clone)]
pub struct SurveyProcessor {
    form: Arc<Form>,
    config: Arc<FormConfig>,
    encoder: ReportEncoder,
}

impl SurveyProcessor {
    pub fn new(form: Arc<Form>, config: Arc<FormConfig>) -> Self {
        Self {
            form,
            config,
            encoder: ReportEncoder::new(),
        }
    }

    /// Build a processor from raw Typeform form JSON and configuration JSON
    pub fn from_json(form_json: &str, config_json: &str) -> Result<Self, ScoringError> {
        let form = TypeformAdapter.parse_form(form_json)?;
        let config = FormConfig::from_json(config_json)?;
        Ok(Self::new(Arc::new(form), Arc::new(config)))
    }

    /// Use a fixed encoder instance ID
    pub fn with_instance_id(mut self, instance_id: String) -> Self {
        self.encoder = ReportEncoder::with_instance_id(instance_id);
        self
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    /// Score a parsed response
    pub fn score(&self, response: &Response) -> Result<ScoreReport, ScoringError> {
        let report = self.encoder.encode(&self.form, &self.config, response)?;
        debug!(
            response_id = response.id(),
            domains = report.domains.len(),
            "scored response"
        );
        Ok(report)
    }

    /// Parse and score a raw Typeform response, returning report JSON
    pub fn process(&self, response_json: &str) -> Result<String, ScoringError> {
        let response = TypeformAdapter.parse_response(response_json)?;
        let report = self.score(&response)?;
        serde_json::to_string(&report).map_err(|e| ScoringError::EncodingError(e.to_string()))
    }

    /// Score every response independently, keeping input order
    ///
    /// One failing response does not stop the others.
    pub fn process_batch(&self, responses: &[Response]) -> Vec<Result<ScoreReport, ScoringError>> {
        responses
            .iter()
            .map(|response| {
                let result = self.score(response);
                if let Err(e) = &result {
                    warn!(response_id = response.id(), error = %e, "failed to score response");
                }
                result
            })
            .collect()
    }

    /// Theoretical range of every domain and dimension
    pub fn ranges(&self) -> Result<Vec<DomainRange>, ScoringError> {
        self.config
            .domains()
            .iter()
            .map(|domain| domain.range_summary(&self.form))
            .collect()
    }
}
