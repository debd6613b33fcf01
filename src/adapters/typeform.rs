//! Typeform adapter
//!
//! Parses Typeform form definitions and responses. Responses may be bare
//! response objects (Responses API) or webhook envelopes of the form
//! `{"form_response": {..., "definition": {...}}}`.

use crate::error::ScoringError;
use crate::form::{Field, FieldType, Form, GroupField, LeafField, Scale};
use crate::response::{Answer, AnswerValue, Response};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::FormAdapter;

/// Typeform document adapter
pub struct TypeformAdapter;

impl FormAdapter for TypeformAdapter {
    fn parse_form(&self, raw_json: &str) -> Result<Form, ScoringError> {
        let value: Value = serde_json::from_str(raw_json)?;

        // A webhook envelope carries the definition next to the answers
        let value = match unwrap_envelope(value) {
            Value::Object(mut map) if map.contains_key("definition") => {
                map.remove("definition").unwrap_or(Value::Null)
            }
            other => other,
        };

        let payload: TypeformForm = serde_json::from_value(value)?;
        let fields = payload
            .fields
            .into_iter()
            .map(convert_field)
            .collect::<Result<Vec<_>, _>>()?;

        let mut builder = Form::builder().fields(fields);
        if let Some(id) = payload.id {
            builder = builder.id(id);
        }
        if let Some(title) = payload.title {
            builder = builder.title(title);
        }
        builder.build()
    }

    fn parse_response_value(&self, value: Value) -> Result<Response, ScoringError> {
        let payload: TypeformResponse = serde_json::from_value(unwrap_envelope(value))?;

        let id = payload
            .response_id
            .or(payload.token)
            .ok_or_else(|| ScoringError::ParseError("response has no token".to_string()))?;

        let mut builder = Response::builder(id);
        if let Some(submitted_at) = payload.submitted_at {
            builder = builder.submitted_at(submitted_at);
        }
        for answer in payload.answers.unwrap_or_default() {
            builder = builder.answer(Answer {
                reference: answer.field.reference,
                field_type: answer.field.field_type,
                value: answer.value,
            });
        }
        builder.build()
    }
}

fn unwrap_envelope(mut value: Value) -> Value {
    match value
        .as_object_mut()
        .and_then(|map| map.remove("form_response"))
    {
        Some(inner) => inner,
        None => value,
    }
}

fn convert_field(raw: TypeformField) -> Result<Field, ScoringError> {
    if raw.field_type == FieldType::Group {
        let fields = raw
            .properties
            .fields
            .into_iter()
            .map(convert_field)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Field::Group(GroupField {
            reference: raw.reference,
            title: raw.title,
            fields,
        }));
    }

    let mut leaf = LeafField::new(raw.reference, raw.field_type);
    leaf.title = raw.title;

    if let Some(default) = Scale::default_for(raw.field_type) {
        let steps = raw.properties.steps.unwrap_or(default.steps);
        let start_at_one = raw.properties.start_at_one.unwrap_or(default.start_at_one);
        let scale = Scale::new(steps, start_at_one).map_err(|e| {
            ScoringError::ParseError(format!("field {}: {}", leaf.reference, e))
        })?;
        leaf = leaf.with_scale(scale);
    } else if raw.field_type == FieldType::Number {
        if let Some(TypeformValidations {
            min_value: Some(min),
            max_value: Some(max),
        }) = raw.validations
        {
            if min > max {
                return Err(ScoringError::ParseError(format!(
                    "field {}: min_value {} exceeds max_value {}",
                    leaf.reference, min, max
                )));
            }
            leaf = leaf.with_numeric_bounds(min, max);
        }
    }

    Ok(Field::Leaf(leaf))
}

// Typeform API structures

#[derive(Debug, Deserialize)]
struct TypeformForm {
    id: Option<String>,
    title: Option<String>,
    #[serde(default)]
    fields: Vec<TypeformField>,
}

#[derive(Debug, Deserialize)]
struct TypeformField {
    title: Option<String>,
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "type")]
    field_type: FieldType,
    #[serde(default)]
    properties: TypeformProperties,
    validations: Option<TypeformValidations>,
}

#[derive(Debug, Default, Deserialize)]
struct TypeformProperties {
    steps: Option<u32>,
    start_at_one: Option<bool>,
    #[serde(default)]
    fields: Vec<TypeformField>,
}

#[derive(Debug, Deserialize)]
struct TypeformValidations {
    min_value: Option<f64>,
    max_value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TypeformResponse {
    response_id: Option<String>,
    token: Option<String>,
    submitted_at: Option<DateTime<Utc>>,
    answers: Option<Vec<TypeformAnswer>>,
}

#[derive(Debug, Deserialize)]
struct TypeformAnswer {
    field: TypeformFieldRef,
    #[serde(flatten)]
    value: AnswerValue,
}

#[derive(Debug, Deserialize)]
struct TypeformFieldRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "type")]
    field_type: Option<FieldType>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScoreRange;
    use pretty_assertions::assert_eq;

    fn sample_form_json() -> &'static str {
        r#"{
            "id": "wb2024",
            "title": "Weekly wellbeing",
            "fields": [
                {
                    "id": "f1",
                    "ref": "mood",
                    "title": "How was your mood?",
                    "type": "opinion_scale",
                    "properties": {"steps": 5, "start_at_one": true}
                },
                {
                    "id": "f2",
                    "ref": "sleep_block",
                    "title": "Sleep",
                    "type": "group",
                    "properties": {
                        "fields": [
                            {"id": "f3", "ref": "sleep_quality", "type": "rating", "properties": {"steps": 10}},
                            {"id": "f4", "ref": "sleep_notes", "type": "long_text", "properties": {}}
                        ]
                    }
                },
                {
                    "id": "f5",
                    "ref": "hours",
                    "type": "number",
                    "validations": {"required": false, "min_value": 0, "max_value": 24}
                },
                {"id": "f6", "ref": "consent", "type": "legal"},
                {"id": "f7", "ref": "signature", "type": "contact_info"}
            ]
        }"#
    }

    fn sample_response_json() -> &'static str {
        r#"{
            "landing_id": "abc",
            "token": "tok-1",
            "response_id": "resp-1",
            "submitted_at": "2024-03-01T10:15:00Z",
            "answers": [
                {"field": {"id": "f1", "ref": "mood", "type": "opinion_scale"}, "type": "number", "number": 4},
                {"field": {"id": "f3", "ref": "sleep_quality", "type": "rating"}, "type": "number", "number": 7},
                {"field": {"id": "f4", "ref": "sleep_notes", "type": "long_text"}, "type": "text", "text": "woke up twice"},
                {"field": {"id": "f6", "ref": "consent", "type": "legal"}, "type": "boolean", "boolean": true}
            ]
        }"#
    }

    #[test]
    fn test_parse_form() {
        let form = TypeformAdapter.parse_form(sample_form_json()).unwrap();

        assert_eq!(form.id(), Some("wb2024"));
        assert_eq!(form.len(), 7);
        assert_eq!(form.range("mood").unwrap(), ScoreRange::new(1.0, 5.0));
        // Ratings start at one unless told otherwise
        assert_eq!(form.range("sleep_quality").unwrap(), ScoreRange::new(1.0, 10.0));
        assert_eq!(form.range("hours").unwrap(), ScoreRange::new(0.0, 24.0));
        assert!(form.range("sleep_notes").is_err());
        assert_eq!(form.field("signature").unwrap().field_type(), FieldType::Other);
    }

    #[test]
    fn test_parse_response() {
        let response = TypeformAdapter
            .parse_response(sample_response_json())
            .unwrap();

        assert_eq!(response.id(), "resp-1");
        assert!(response.submitted_at().is_some());
        assert_eq!(response.len(), 4);

        let mood = response.answer("mood").unwrap();
        assert_eq!(mood.value.as_number(), Some(4.0));
        assert_eq!(mood.field_type, Some(FieldType::OpinionScale));
        assert_eq!(
            response.answer("consent").unwrap().value,
            AnswerValue::boolean(true)
        );
    }

    #[test]
    fn test_parse_webhook_envelope() {
        let json = format!(
            r#"{{"event_id": "evt", "event_type": "form_response",
                "form_response": {{"token": "tok-9", "definition": {form},
                "answers": [{{"field": {{"ref": "mood", "type": "opinion_scale"}}, "type": "number", "number": 2}}]}}}}"#,
            form = sample_form_json()
        );

        let form = TypeformAdapter.parse_form(&json).unwrap();
        assert!(form.contains("sleep_quality"));

        let response = TypeformAdapter.parse_response(&json).unwrap();
        assert_eq!(response.id(), "tok-9");
        assert_eq!(response.answer("mood").unwrap().value.as_number(), Some(2.0));
    }

    #[test]
    fn test_invalid_scale_rejected() {
        let json =
            r#"{"fields": [{"ref": "q", "type": "opinion_scale", "properties": {"steps": 0}}]}"#;
        assert!(matches!(
            TypeformAdapter.parse_form(json),
            Err(ScoringError::ParseError(_))
        ));
    }

    #[test]
    fn test_response_without_id() {
        let result = TypeformAdapter.parse_response(r#"{"answers": []}"#);
        assert!(matches!(result, Err(ScoringError::ParseError(_))));
    }

    #[test]
    fn test_parse_ndjson() {
        let ndjson = r#"{"token": "a", "answers": [{"field": {"ref": "mood"}, "type": "number", "number": 1}]}

{"token": "b", "answers": []}
"#;
        let responses = TypeformAdapter.parse_responses_ndjson(ndjson).unwrap();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[1].id(), "b");
    }

    #[test]
    fn test_parse_ndjson_reports_line() {
        let ndjson = "{\"token\": \"a\"}\nnot json\n";
        let err = TypeformAdapter.parse_responses_ndjson(ndjson).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_parse_array_and_page() {
        let array = r#"[{"token": "a"}, {"token": "b"}]"#;
        assert_eq!(TypeformAdapter.parse_responses_array(array).unwrap().len(), 2);

        let page = r#"{"total_items": 1, "page_count": 1, "items": [{"response_id": "c"}]}"#;
        let responses = TypeformAdapter.parse_responses_array(page).unwrap();
        assert_eq!(responses[0].id(), "c");
    }
}
