//! Domain scoring
//!
//! A domain aggregates the already-aggregated values and ranges of its
//! dimensions. A mean domain over mean dimensions is the mean of the dimension
//! means: each dimension weighs the same regardless of its item count.

use super::{aggregate_ranges, Scored};
use crate::config::Domain;
use crate::error::ScoringError;
use crate::form::Form;
use crate::response::Response;
use crate::types::{DomainRange, DomainScore, ScoreRange};

impl Scored for Domain {
    fn range(&self, form: &Form) -> Result<ScoreRange, ScoringError> {
        let ranges = self
            .dimensions()
            .iter()
            .map(|dimension| dimension.range(form))
            .collect::<Result<Vec<_>, _>>()?;

        aggregate_ranges(self.aggregation(), &ranges).ok_or_else(|| self.empty())
    }

    fn value(&self, form: &Form, response: &Response) -> Result<f64, ScoringError> {
        let values = self
            .dimensions()
            .iter()
            .map(|dimension| dimension.value(form, response))
            .collect::<Result<Vec<_>, _>>()?;

        self.aggregation().apply(values).ok_or_else(|| self.empty())
    }
}

impl Domain {
    /// Value and range of this domain and of each of its dimensions
    pub fn score(&self, form: &Form, response: &Response) -> Result<DomainScore, ScoringError> {
        let dimensions = self
            .dimensions()
            .iter()
            .map(|dimension| dimension.score(form, response))
            .collect::<Result<Vec<_>, _>>()?;

        let value = self
            .aggregation()
            .apply(dimensions.iter().map(|d| d.value))
            .ok_or_else(|| self.empty())?;
        let ranges: Vec<ScoreRange> = dimensions.iter().map(|d| d.range).collect();
        let range = aggregate_ranges(self.aggregation(), &ranges).ok_or_else(|| self.empty())?;

        Ok(DomainScore {
            name: self.name().to_string(),
            aggregation: self.aggregation(),
            value,
            range,
            normalized: range.normalize(value),
            dimensions,
        })
    }

    pub fn range_summary(&self, form: &Form) -> Result<DomainRange, ScoringError> {
        let dimensions = self
            .dimensions()
            .iter()
            .map(|dimension| dimension.range_summary(form))
            .collect::<Result<Vec<_>, _>>()?;
        let ranges: Vec<ScoreRange> = dimensions.iter().map(|d| d.range).collect();
        let range = aggregate_ranges(self.aggregation(), &ranges).ok_or_else(|| self.empty())?;

        Ok(DomainRange {
            name: self.name().to_string(),
            aggregation: self.aggregation(),
            range,
            dimensions,
        })
    }

    // Unreachable through the public constructors, which reject empty domains
    fn empty(&self) -> ScoringError {
        ScoringError::InvalidConfig(format!("domain {} has no dimensions", self.name()))
    }
}
