//! Survey scoring
//!
//! Scores are computed bottom-up over the configuration tree:
//! item → dimension → domain. Every level exposes the same two operations,
//! a theoretical range derived from the form and a value derived from a
//! response, and aggregates the already-aggregated results of the level below.
//!
//! Everything here is a pure function of (form, response, configuration).

mod dimension;
mod domain;
mod item;

use crate::config::Aggregation;
use crate::error::ScoringError;
use crate::form::Form;
use crate::response::Response;
use crate::types::ScoreRange;

/// A node of the configuration tree that can be scored
pub trait Scored {
    /// Theoretical range given the form's scale metadata
    fn range(&self, form: &Form) -> Result<ScoreRange, ScoringError>;

    /// Value computed from a response
    fn value(&self, form: &Form, response: &Response) -> Result<f64, ScoringError>;
}

/// Aggregate child ranges bound-by-bound
///
/// `min` aggregates the child minimums and `max` the child maximums, in order.
pub fn aggregate_ranges(aggregation: Aggregation, ranges: &[ScoreRange]) -> Option<ScoreRange> {
    let min = aggregation.apply(ranges.iter().map(|r| r.min))?;
    let max = aggregation.apply(ranges.iter().map(|r| r.max))?;
    Some(ScoreRange::new(min, max))
}
