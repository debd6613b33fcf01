//! Core types for survey scoring
//!
//! This module defines the numeric range shared by every scoring level and the
//! report structures produced for each scored response.

use crate::config::Aggregation;
use serde::{Deserialize, Serialize};

/// Closed numeric interval `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
}

impl ScoreRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Width of the interval
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Position of `value` within the range, 0-1
    ///
    /// Returns `None` for a degenerate range where `min == max`.
    pub fn normalize(&self, value: f64) -> Option<f64> {
        let span = self.span();
        if span.abs() < f64::EPSILON {
            return None;
        }
        Some(((value - self.min) / span).clamp(0.0, 1.0))
    }

    /// Mirror `value` within the range: `min + max - value`
    pub fn reflect(&self, value: f64) -> f64 {
        self.min + self.max - value
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Report producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Report provenance information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProvenance {
    pub form_id: Option<String>,
    pub response_id: String,
    pub submitted_at_utc: Option<String>,
    pub computed_at_utc: String,
}

/// Score of a single dimension
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionScore {
    pub name: String,
    pub aggregation: Aggregation,
    pub value: f64,
    pub range: ScoreRange,
    /// Value positioned within `range`, 0-1
    pub normalized: Option<f64>,
    pub answered_items: usize,
    /// Refs excluded from the value because they were unanswered
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_items: Vec<String>,
}

/// Score of a domain together with its dimensions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainScore {
    pub name: String,
    pub aggregation: Aggregation,
    pub value: f64,
    pub range: ScoreRange,
    pub normalized: Option<f64>,
    pub dimensions: Vec<DimensionScore>,
}

impl DomainScore {
    pub fn dimension(&self, name: &str) -> Option<&DimensionScore> {
        self.dimensions.iter().find(|d| d.name == name)
    }
}

/// Complete scoring report for one response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub provenance: ReportProvenance,
    pub domains: Vec<DomainScore>,
}

impl ScoreReport {
    pub fn domain(&self, name: &str) -> Option<&DomainScore> {
        self.domains.iter().find(|d| d.name == name)
    }
}

/// Theoretical range of a dimension
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionRange {
    pub name: String,
    pub aggregation: Aggregation,
    pub range: ScoreRange,
}

/// Theoretical range of a domain together with its dimensions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainRange {
    pub name: String,
    pub aggregation: Aggregation,
    pub range: ScoreRange,
    pub dimensions: Vec<DimensionRange>,
}
