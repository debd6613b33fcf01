//! Item scoring
//!
//! An item's range is its field's scale. Reversal is a value transform only:
//! a reversed item reports the same `[min, max]` as its plain counterpart and
//! contributes `min + max - raw` instead of `raw`. Answers outside the range
//! are rejected before any reversal.

use super::Scored;
use crate::config::ItemRef;
use crate::error::ScoringError;
use crate::form::Form;
use crate::response::Response;
use crate::types::ScoreRange;

impl Scored for ItemRef {
    fn range(&self, form: &Form) -> Result<ScoreRange, ScoringError> {
        form.range(&self.reference)
    }

    fn value(&self, form: &Form, response: &Response) -> Result<f64, ScoringError> {
        // Resolve the field first so an unknown ref is reported as such
        let range = self.range(form)?;
        let answer = response.answer(&self.reference)?;

        let raw = answer
            .value
            .as_number()
            .ok_or_else(|| ScoringError::UnsupportedAnswerType {
                reference: self.reference.clone(),
                answer_type: answer.value.kind().to_string(),
            })?;

        if !range.contains(raw) {
            return Err(ScoringError::AnswerOutOfRange {
                reference: self.reference.clone(),
                value: raw,
                min: range.min,
                max: range.max,
            });
        }

        if self.reverse {
            Ok(range.reflect(raw))
        } else {
            Ok(raw)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{Field, FieldType};
    use crate::response::AnswerValue;
    use pretty_assertions::assert_eq;

    fn make_test_form() -> Form {
        Form::builder()
            .field(Field::scale("calm", FieldType::OpinionScale, 6, false).unwrap())
            .field(Field::scale("rested", FieldType::Rating, 7, true).unwrap())
            .field(Field::leaf("notes", FieldType::LongText))
            .build()
            .unwrap()
    }

    fn make_test_response() -> Response {
        Response::builder("resp-1")
            .number("calm", 1.0)
            .number("rested", 2.0)
            .value("notes", AnswerValue::text("slept badly"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_item_range_from_scale() {
        let form = make_test_form();
        assert_eq!(
            ItemRef::new("calm").range(&form).unwrap(),
            ScoreRange::new(0.0, 5.0)
        );
        assert_eq!(
            ItemRef::new("rested").range(&form).unwrap(),
            ScoreRange::new(1.0, 7.0)
        );
    }

    #[test]
    fn test_item_value() {
        let form = make_test_form();
        let response = make_test_response();
        assert_eq!(ItemRef::new("calm").value(&form, &response).unwrap(), 1.0);
    }

    #[test]
    fn test_reversed_value() {
        let form = make_test_form();
        let response = make_test_response();

        // 0 + 5 - 1
        assert_eq!(ItemRef::reversed("calm").value(&form, &response).unwrap(), 4.0);
        // 1 + 7 - 2
        assert_eq!(ItemRef::reversed("rested").value(&form, &response).unwrap(), 6.0);
    }

    #[test]
    fn test_reversal_twice_restores_raw_value() {
        let form = make_test_form();
        let response = make_test_response();
        let item = ItemRef::reversed("rested");

        let range = item.range(&form).unwrap();
        let reversed = item.value(&form, &response).unwrap();
        assert_eq!(range.reflect(reversed), 2.0);
    }

    #[test]
    fn test_reversed_range_is_unchanged() {
        let form = make_test_form();
        let plain = ItemRef::new("rested").range(&form).unwrap();
        let reversed = ItemRef::reversed("rested").range(&form).unwrap();

        assert_eq!(reversed, plain);
        // Bounds are not swapped for reversed items
        assert_ne!(reversed, ScoreRange::new(plain.max, plain.min));
        assert!(reversed.min <= reversed.max);
    }

    #[test]
    fn test_reversed_value_normalizes_within_same_range() {
        let form = make_test_form();
        let response = Response::builder("resp-2")
            .number("rested", 7.0)
            .build()
            .unwrap();
        let item = ItemRef::reversed("rested");

        let range = item.range(&form).unwrap();
        let value = item.value(&form, &response).unwrap();
        assert_eq!(value, 1.0);
        assert_eq!(range.normalize(value), Some(0.0));
    }

    #[test]
    fn test_answer_outside_scale_rejected() {
        let form = make_test_form();
        let response = Response::builder("resp-4")
            .number("calm", 9.0)
            .number("rested", 0.0)
            .build()
            .unwrap();

        let err = ItemRef::new("calm").value(&form, &response).unwrap_err();
        assert!(matches!(
            err,
            ScoringError::AnswerOutOfRange { reference, value, min, max }
                if reference == "calm" && value == 9.0 && min == 0.0 && max == 5.0
        ));

        // Reversal would otherwise turn 9 into -4
        let err = ItemRef::reversed("calm").value(&form, &response).unwrap_err();
        assert!(matches!(err, ScoringError::AnswerOutOfRange { .. }));

        // Rating scales start at one
        let err = ItemRef::reversed("rested").value(&form, &response).unwrap_err();
        assert!(matches!(
            err,
            ScoringError::AnswerOutOfRange { reference, .. } if reference == "rested"
        ));
    }

    #[test]
    fn test_scale_bounds_are_inclusive() {
        let form = make_test_form();
        let response = Response::builder("resp-5")
            .number("calm", 5.0)
            .number("rested", 1.0)
            .build()
            .unwrap();

        assert_eq!(ItemRef::reversed("calm").value(&form, &response).unwrap(), 0.0);
        assert_eq!(ItemRef::reversed("rested").value(&form, &response).unwrap(), 7.0);
    }

    #[test]
    fn test_field_not_found() {
        let form = make_test_form();
        let response = make_test_response();
        let err = ItemRef::new("unknown").value(&form, &response).unwrap_err();
        assert!(matches!(err, ScoringError::FieldNotFound { .. }));
    }

    #[test]
    fn test_answer_not_found() {
        let form = make_test_form();
        let response = Response::builder("empty").build().unwrap();
        let err = ItemRef::new("calm").value(&form, &response).unwrap_err();
        assert!(matches!(err, ScoringError::AnswerNotFound { reference } if reference == "calm"));
    }

    #[test]
    fn test_unsupported_answer_type() {
        let form = Form::builder()
            .field(Field::scale("calm", FieldType::OpinionScale, 6, false).unwrap())
            .build()
            .unwrap();
        let response = Response::builder("resp-3")
            .value("calm", AnswerValue::choice("Very calm"))
            .build()
            .unwrap();

        let err = ItemRef::new("calm").value(&form, &response).unwrap_err();
        assert!(matches!(
            err,
            ScoringError::UnsupportedAnswerType { answer_type, .. } if answer_type == "choice"
        ));
    }

    #[test]
    fn test_unscaled_field() {
        let form = make_test_form();
        let response = make_test_response();
        let err = ItemRef::new("notes").value(&form, &response).unwrap_err();
        assert!(matches!(err, ScoringError::UnscaledField { .. }));
    }
}
