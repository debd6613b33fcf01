//! Report encoding
//!
//! This module scores a response against every configured domain and wraps
//! the results with producer and provenance metadata.

use crate::config::FormConfig;
use crate::error::ScoringError;
use crate::form::Form;
use crate::response::Response;
use crate::types::{ReportProducer, ReportProvenance, ScoreReport};
use crate::{PRODUCER_NAME, SCORE_VERSION};
use chrono::Utc;
use uuid::Uuid;

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// Encoder producing score reports
#[derive(Debug, Clone)]
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Score `response` and build its report
    ///
    /// Fails on the first domain that cannot be scored.
    pub fn encode(
        &self,
        form: &Form,
        config: &FormConfig,
        response: &Response,
    ) -> Result<ScoreReport, ScoringError> {
        let domains = config
            .domains()
            .iter()
            .map(|domain| domain.score(form, response))
            .collect::<Result<Vec<_>, _>>()?;

        let producer = ReportProducer {
            name: PRODUCER_NAME.to_string(),
            version: SCORE_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        };

        let provenance = ReportProvenance {
            form_id: form.id().map(str::to_string),
            response_id: response.id().to_string(),
            submitted_at_utc: response.submitted_at().map(|t| t.to_rfc3339()),
            computed_at_utc: Utc::now().to_rfc3339(),
        };

        Ok(ScoreReport {
            report_version: REPORT_VERSION.to_string(),
            producer,
            provenance,
            domains,
        })
    }

    /// Encode to a compact JSON string
    pub fn encode_to_json(
        &self,
        form: &Form,
        config: &FormConfig,
        response: &Response,
    ) -> Result<String, ScoringError> {
        let report = self.encode(form, config, response)?;
        serde_json::to_string(&report).map_err(|e| ScoringError::EncodingError(e.to_string()))
    }
}
