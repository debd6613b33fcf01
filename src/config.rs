//! Scoring configuration
//!
//! The configuration describes which answers belong to which dimension, how
//! dimensions roll up into domains, and how each level aggregates its
//! children. It is loaded once, validated on construction and never mutated
//! afterwards; share it between scoring calls through an `Arc`.
//!
//! ```json
//! {
//!   "domains": [{
//!     "name": "wellbeing",
//!     "aggregation": "mean",
//!     "dimensions": [{
//!       "name": "mood",
//!       "aggregation": "sum",
//!       "missing": "exclude",
//!       "items": ["q1", {"ref": "q2", "reverse": true}]
//!     }]
//!   }]
//! }
//! ```

use crate::error::ScoringError;
use crate::form::Form;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Rule combining child values or ranges into a parent value or range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Sum,
    Mean,
}

impl Aggregation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Sum => "sum",
            Aggregation::Mean => "mean",
        }
    }

    /// Aggregate `values` in iteration order
    ///
    /// Returns `None` when there is nothing to aggregate.
    pub fn apply<I>(&self, values: I) -> Option<f64>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut total = 0.0;
        let mut count = 0usize;
        for value in values {
            total += value;
            count += 1;
        }

        if count == 0 {
            return None;
        }

        match self {
            Aggregation::Sum => Some(total),
            Aggregation::Mean => Some(total / count as f64),
        }
    }
}

/// What a dimension does when one of its items has no answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingAnswerPolicy {
    /// The whole dimension fails with `AnswerNotFound`
    #[default]
    Fail,
    /// The item is dropped from the sum and from the count used for the mean
    Exclude,
}

/// Reference to one scored item, with its reversal flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawItemRef")]
pub struct ItemRef {
    #[serde(rename = "ref")]
    pub reference: String,
    pub reverse: bool,
}

impl ItemRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            reverse: false,
        }
    }

    pub fn reversed(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            reverse: true,
        }
    }
}

/// Items may be written as a bare ref or as `{"ref", "reverse"}`
#[derive(Deserialize)]
#[serde(untagged)]
enum RawItemRef {
    Bare(String),
    Full {
        #[serde(rename = "ref")]
        reference: String,
        #[serde(default)]
        reverse: bool,
    },
}

impl From<RawItemRef> for ItemRef {
    fn from(raw: RawItemRef) -> Self {
        match raw {
            RawItemRef::Bare(reference) => ItemRef::new(reference),
            RawItemRef::Full { reference, reverse } => ItemRef { reference, reverse },
        }
    }
}

/// Named group of items with an aggregation rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDimension")]
pub struct Dimension {
    name: String,
    aggregation: Aggregation,
    missing: MissingAnswerPolicy,
    items: Vec<ItemRef>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDimension {
    name: String,
    aggregation: Aggregation,
    #[serde(default)]
    missing: MissingAnswerPolicy,
    items: Vec<ItemRef>,
}

impl TryFrom<RawDimension> for Dimension {
    type Error = ScoringError;

    fn try_from(raw: RawDimension) -> Result<Self, Self::Error> {
        Dimension::new(raw.name, raw.aggregation, raw.items).map(|d| d.with_missing(raw.missing))
    }
}

impl Dimension {
    /// A dimension needs at least one item, each ref at most once
    pub fn new(
        name: impl Into<String>,
        aggregation: Aggregation,
        items: Vec<ItemRef>,
    ) -> Result<Self, ScoringError> {
        let name = name.into();
        if items.is_empty() {
            return Err(ScoringError::InvalidConfig(format!("dimension {name} has no items")));
        }
        ensure_unique(
            items.iter().map(|i| i.reference.as_str()),
            &format!("item in dimension {name}"),
        )?;

        Ok(Self {
            name,
            aggregation,
            missing: MissingAnswerPolicy::default(),
            items,
        })
    }

    pub fn with_missing(mut self, missing: MissingAnswerPolicy) -> Self {
        self.missing = missing;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }

    pub fn missing(&self) -> MissingAnswerPolicy {
        self.missing
    }

    pub fn items(&self) -> &[ItemRef] {
        &self.items
    }
}

/// Named group of dimensions with an aggregation rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDomain")]
pub struct Domain {
    name: String,
    aggregation: Aggregation,
    dimensions: Vec<Dimension>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDomain {
    name: String,
    aggregation: Aggregation,
    dimensions: Vec<Dimension>,
}

impl TryFrom<RawDomain> for Domain {
    type Error = ScoringError;

    fn try_from(raw: RawDomain) -> Result<Self, Self::Error> {
        Domain::new(raw.name, raw.aggregation, raw.dimensions)
    }
}

impl Domain {
    pub fn new(
        name: impl Into<String>,
        aggregation: Aggregation,
        dimensions: Vec<Dimension>,
    ) -> Result<Self, ScoringError> {
        let name = name.into();
        if dimensions.is_empty() {
            return Err(ScoringError::InvalidConfig(format!("domain {name} has no dimensions")));
        }
        ensure_unique(
            dimensions.iter().map(|d| d.name()),
            &format!("dimension in domain {name}"),
        )?;

        Ok(Self {
            name,
            aggregation,
            dimensions,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }
}

/// Root of the scoring configuration: independent domains in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFormConfig")]
pub struct FormConfig {
    domains: Vec<Domain>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFormConfig {
    domains: Vec<Domain>,
}

impl TryFrom<RawFormConfig> for FormConfig {
    type Error = ScoringError;

    fn try_from(raw: RawFormConfig) -> Result<Self, Self::Error> {
        FormConfig::new(raw.domains)
    }
}

impl FormConfig {
    pub fn new(domains: Vec<Domain>) -> Result<Self, ScoringError> {
        if domains.is_empty() {
            return Err(ScoringError::InvalidConfig(
                "configuration has no domains".to_string(),
            ));
        }
        ensure_unique(domains.iter().map(|d| d.name()), "domain")?;
        Ok(Self { domains })
    }

    /// Parse a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, ScoringError> {
        let config: FormConfig = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self, ScoringError> {
        let json = fs::read_to_string(path).map_err(|e| {
            ScoringError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    pub fn domains(&self) -> &[Domain] {
        &self.domains
    }

    pub fn domain(&self, name: &str) -> Option<&Domain> {
        self.domains.iter().find(|d| d.name == name)
    }

    /// Check every configured item against `form` without scoring anything
    pub fn check_against(&self, form: &Form) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        for domain in &self.domains {
            for dimension in domain.dimensions() {
                for item in dimension.items() {
                    let problem = match form.field(&item.reference) {
                        Ok(field) => field.range().err(),
                        Err(e) => Some(e),
                    };

                    if let Some(problem) = problem {
                        issues.push(ConfigIssue {
                            domain: domain.name().to_string(),
                            dimension: dimension.name().to_string(),
                            reference: item.reference.clone(),
                            message: problem.to_string(),
                        });
                    }
                }
            }
        }

        issues
    }
}

/// Configured item that cannot be scored against a form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigIssue {
    pub domain: String,
    pub dimension: String,
    #[serde(rename = "ref")]
    pub reference: String,
    pub message: String,
}

fn ensure_unique<'a>(
    names: impl Iterator<Item = &'a str>,
    what: &str,
) -> Result<(), ScoringError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ScoringError::InvalidConfig(format!("duplicate {what}: {name}")));
        }
    }
    Ok(())
}
