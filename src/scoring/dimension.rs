//! Dimension scoring
//!
//! A dimension aggregates its items in configuration order. With the
//! `exclude` policy, unanswered items are left out of the value (both the sum
//! and the count used for the mean) while the range still spans every
//! configured item.

use super::{aggregate_ranges, Scored};
use crate::config::{Dimension, MissingAnswerPolicy};
use crate::error::ScoringError;
use crate::form::Form;
use crate::response::Response;
use crate::types::{DimensionRange, DimensionScore, ScoreRange};

impl Scored for Dimension {
    fn range(&self, form: &Form) -> Result<ScoreRange, ScoringError> {
        let ranges = self
            .items()
            .iter()
            .map(|item| item.range(form))
            .collect::<Result<Vec<_>, _>>()?;

        aggregate_ranges(self.aggregation(), &ranges).ok_or_else(|| self.no_answers())
    }

    fn value(&self, form: &Form, response: &Response) -> Result<f64, ScoringError> {
        let mut values = Vec::with_capacity(self.items().len());
        let excluding = self.missing() == MissingAnswerPolicy::Exclude;

        for item in self.items() {
            match item.value(form, response) {
                Ok(value) => values.push(value),
                Err(e) if excluding && e.is_missing_answer() => continue,
                Err(e) => return Err(e),
            }
        }

        self.aggregation()
            .apply(values)
            .ok_or_else(|| self.no_answers())
    }
}

impl Dimension {
    /// Configured refs with no answer in `response`
    pub fn missing_items<'a>(&'a self, response: &Response) -> Vec<&'a str> {
        self.items()
            .iter()
            .filter(|item| !response.has_answer(&item.reference))
            .map(|item| item.reference.as_str())
            .collect()
    }

    /// Value, range and answer coverage of this dimension
    pub fn score(&self, form: &Form, response: &Response) -> Result<DimensionScore, ScoringError> {
        let range = self.range(form)?;
        let value = self.value(form, response)?;
        let missing_items: Vec<String> = self
            .missing_items(response)
            .into_iter()
            .map(str::to_string)
            .collect();

        Ok(DimensionScore {
            name: self.name().to_string(),
            aggregation: self.aggregation(),
            value,
            range,
            normalized: range.normalize(value),
            answered_items: self.items().len() - missing_items.len(),
            missing_items,
        })
    }

    pub fn range_summary(&self, form: &Form) -> Result<DimensionRange, ScoringError> {
        Ok(DimensionRange {
            name: self.name().to_string(),
            aggregation: self.aggregation(),
            range: self.range(form)?,
        })
    }

    fn no_answers(&self) -> ScoringError {
        ScoringError::NoAnsweredItems {
            dimension: self.name().to_string(),
        }
    }
}
