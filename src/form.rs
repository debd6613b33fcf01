//! Form definitions
//!
//! A form is an ordered tree of fields: leaves carry a question type and its
//! scale metadata, groups hold one level of sub-fields. Forms are assembled
//! once through [`FormBuilder`], which indexes every field by its `ref` so that
//! lookups never re-walk the vendor document.

use crate::error::ScoringError;
use crate::types::ScoreRange;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Question type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    MultipleChoice,
    Dropdown,
    PictureChoice,
    OpinionScale,
    Nps,
    Rating,
    Number,
    YesNo,
    Legal,
    ShortText,
    LongText,
    Email,
    Website,
    PhoneNumber,
    Date,
    FileUpload,
    Payment,
    Ranking,
    Matrix,
    Statement,
    Group,
    /// Any type this crate does not know about
    #[serde(other)]
    Other,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::MultipleChoice => "multiple_choice",
            FieldType::Dropdown => "dropdown",
            FieldType::PictureChoice => "picture_choice",
            FieldType::OpinionScale => "opinion_scale",
            FieldType::Nps => "nps",
            FieldType::Rating => "rating",
            FieldType::Number => "number",
            FieldType::YesNo => "yes_no",
            FieldType::Legal => "legal",
            FieldType::ShortText => "short_text",
            FieldType::LongText => "long_text",
            FieldType::Email => "email",
            FieldType::Website => "website",
            FieldType::PhoneNumber => "phone_number",
            FieldType::Date => "date",
            FieldType::FileUpload => "file_upload",
            FieldType::Payment => "payment",
            FieldType::Ranking => "ranking",
            FieldType::Matrix => "matrix",
            FieldType::Statement => "statement",
            FieldType::Group => "group",
            FieldType::Other => "other",
        }
    }
}

/// Stepped scale metadata of opinion scale, NPS and rating fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scale {
    /// Number of selectable steps
    pub steps: u32,
    /// Whether the first step is 1 rather than 0
    pub start_at_one: bool,
}

impl Scale {
    pub fn new(steps: u32, start_at_one: bool) -> Result<Self, ScoringError> {
        if steps == 0 {
            return Err(ScoringError::ParseError(
                "scale must have at least one step".to_string(),
            ));
        }
        Ok(Self {
            steps,
            start_at_one,
        })
    }

    /// Scale used when the vendor document leaves properties out
    pub fn default_for(field_type: FieldType) -> Option<Self> {
        match field_type {
            FieldType::OpinionScale | FieldType::Nps => Some(Self {
                steps: 11,
                start_at_one: false,
            }),
            FieldType::Rating => Some(Self {
                steps: 5,
                start_at_one: true,
            }),
            _ => None,
        }
    }

    /// Closed range `[1, steps]` or `[0, steps - 1]`
    pub fn range(&self) -> ScoreRange {
        let min = if self.start_at_one { 1.0 } else { 0.0 };
        ScoreRange::new(min, min + f64::from(self.steps) - 1.0)
    }
}

/// Theoretical bounds of a scored field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bounds {
    Scale(Scale),
    /// Explicit numeric bounds (number fields with min/max validations)
    Numeric(ScoreRange),
}

impl Bounds {
    pub fn range(&self) -> ScoreRange {
        match self {
            Bounds::Scale(scale) => scale.range(),
            Bounds::Numeric(range) => *range,
        }
    }
}

/// A single question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafField {
    #[serde(rename = "ref")]
    pub reference: String,
    pub title: Option<String>,
    pub field_type: FieldType,
    pub bounds: Option<Bounds>,
}

impl LeafField {
    /// A field without bounds; stepped scale types get their default scale
    pub fn new(reference: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            reference: reference.into(),
            title: None,
            field_type,
            bounds: Scale::default_for(field_type).map(Bounds::Scale),
        }
    }

    pub fn with_scale(mut self, scale: Scale) -> Self {
        self.bounds = Some(Bounds::Scale(scale));
        self
    }

    pub fn with_numeric_bounds(mut self, min: f64, max: f64) -> Self {
        self.bounds = Some(Bounds::Numeric(ScoreRange::new(min, max)));
        self
    }

    /// Theoretical range of the field, or `UnscaledField` when it has none
    pub fn range(&self) -> Result<ScoreRange, ScoringError> {
        self.bounds
            .map(|b| b.range())
            .ok_or_else(|| ScoringError::UnscaledField {
                reference: self.reference.clone(),
                field_type: self.field_type.as_str().to_string(),
            })
    }
}

/// A group of sub-fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupField {
    #[serde(rename = "ref")]
    pub reference: String,
    pub title: Option<String>,
    pub fields: Vec<Field>,
}

/// Node of the form tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Field {
    Leaf(LeafField),
    Group(GroupField),
}

impl Field {
    /// Stepped scale question
    pub fn scale(
        reference: impl Into<String>,
        field_type: FieldType,
        steps: u32,
        start_at_one: bool,
    ) -> Result<Self, ScoringError> {
        let scale = Scale::new(steps, start_at_one)?;
        Ok(Field::Leaf(LeafField::new(reference, field_type).with_scale(scale)))
    }

    pub fn leaf(reference: impl Into<String>, field_type: FieldType) -> Self {
        Field::Leaf(LeafField::new(reference, field_type))
    }

    pub fn group(reference: impl Into<String>, fields: Vec<Field>) -> Self {
        Field::Group(GroupField {
            reference: reference.into(),
            title: None,
            fields,
        })
    }

    pub fn reference(&self) -> &str {
        match self {
            Field::Leaf(leaf) => &leaf.reference,
            Field::Group(group) => &group.reference,
        }
    }

    pub fn field_type(&self) -> FieldType {
        match self {
            Field::Leaf(leaf) => leaf.field_type,
            Field::Group(_) => FieldType::Group,
        }
    }

    /// Theoretical range; groups never have one
    pub fn range(&self) -> Result<ScoreRange, ScoringError> {
        match self {
            Field::Leaf(leaf) => leaf.range(),
            Field::Group(group) => Err(ScoringError::UnscaledField {
                reference: group.reference.clone(),
                field_type: FieldType::Group.as_str().to_string(),
            }),
        }
    }
}

/// An indexed, immutable questionnaire definition
#[derive(Debug, Clone)]
pub struct Form {
    id: Option<String>,
    title: Option<String>,
    fields: Vec<Field>,
    /// ref -> position path (top-level index, then group index)
    index: HashMap<String, Vec<usize>>,
}

impl Form {
    pub fn builder() -> FormBuilder {
        FormBuilder::default()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Top-level fields in form order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Number of indexed refs (groups and their sub-fields included)
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.index.contains_key(reference)
    }

    /// Resolve a field by its `ref`
    pub fn field(&self, reference: &str) -> Result<&Field, ScoringError> {
        let not_found = || ScoringError::FieldNotFound {
            reference: reference.to_string(),
        };
        let path = self.index.get(reference).ok_or_else(not_found)?;

        let mut fields = self.fields.as_slice();
        let mut found = None;
        for &position in path {
            let field = fields.get(position).ok_or_else(not_found)?;
            if let Field::Group(group) = field {
                fields = &group.fields;
            }
            found = Some(field);
        }

        found.ok_or_else(not_found)
    }

    /// Theoretical range of the field carrying `reference`
    pub fn range(&self, reference: &str) -> Result<ScoreRange, ScoringError> {
        self.field(reference)?.range()
    }
}

/// Builder assembling and indexing a [`Form`]
#[derive(Debug, Default)]
pub struct FormBuilder {
    id: Option<String>,
    title: Option<String>,
    fields: Vec<Field>,
}

impl FormBuilder {
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Index every ref, rejecting duplicates and groups nested in groups
    pub fn build(self) -> Result<Form, ScoringError> {
        let mut index = HashMap::new();

        for (position, field) in self.fields.iter().enumerate() {
            insert_ref(&mut index, field.reference(), vec![position])?;

            if let Field::Group(group) = field {
                for (sub_position, sub_field) in group.fields.iter().enumerate() {
                    if let Field::Group(nested) = sub_field {
                        return Err(ScoringError::ParseError(format!(
                            "group {} is nested inside group {}",
                            nested.reference, group.reference
                        )));
                    }
                    insert_ref(
                        &mut index,
                        sub_field.reference(),
                        vec![position, sub_position],
                    )?;
                }
            }
        }

        Ok(Form {
            id: self.id,
            title: self.title,
            fields: self.fields,
            index,
        })
    }
}

fn insert_ref(
    index: &mut HashMap<String, Vec<usize>>,
    reference: &str,
    path: Vec<usize>,
) -> Result<(), ScoringError> {
    if index.insert(reference.to_string(), path).is_some() {
        return Err(ScoringError::ParseError(format!(
            "duplicate field ref: {reference}"
        )));
    }
    Ok(())
}
