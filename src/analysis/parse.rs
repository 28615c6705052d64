//! Recovery of a [`ToneResult`] from free-form analyzer output.

use serde_json::{Map, Value};

use crate::models::tone::{
    is_unit_interval, SecondaryEmotion, ToneResult, DEFAULT_CONFIDENCE, DEFAULT_EMOTION,
    DEFAULT_EXPLANATION,
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_warn;

/// Parses the first top-level JSON object embedded in `text`.
///
/// Scanning starts at the first `{`; exactly one JSON value is read from there
/// and any trailing prose is ignored. Returns `None` when there is no `{`, the
/// object is truncated or invalid, or the value is not an object.
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    let start = text.find('{')?;
    let mut values = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
    match values.next()? {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => None,
        Err(err) => {
            log_warn!("analyzer response contained unparsable JSON: {err}");
            None
        }
    }
}

/// Builds a result from a parsed object, defaulting each field on its own so
/// one malformed field never voids the rest.
pub fn tone_result_from_object(object: &Map<String, Value>) -> ToneResult {
    let emotion = non_empty_str(object.get("emotion"))
        .unwrap_or(DEFAULT_EMOTION)
        .to_string();

    // Out-of-range values are replaced, not clamped.
    let confidence = object
        .get("confidence")
        .and_then(Value::as_f64)
        .filter(|value| is_unit_interval(*value))
        .unwrap_or(DEFAULT_CONFIDENCE);

    let explanation = non_empty_str(object.get("explanation"))
        .unwrap_or(DEFAULT_EXPLANATION)
        .to_string();

    ToneResult {
        emotion,
        confidence,
        explanation,
        tone: non_empty_str(object.get("tone")).map(str::to_string),
        intention: non_empty_str(object.get("intention")).map(str::to_string),
        secondary_emotions: secondary_emotions(object.get("secondaryEmotions")),
        feedback_id: None,
    }
}

/// Full recovery path for a remote completion: locate, parse, default. Falls
/// back to the neutral result when no object can be recovered.
pub fn parse_model_response(text: &str, feedback_id: &str) -> ToneResult {
    match extract_json_object(text) {
        Some(object) => tone_result_from_object(&object).with_feedback_id(feedback_id),
        None => {
            log_warn!("no JSON object found in analyzer response; using neutral fallback");
            ToneResult::neutral_fallback(Some(feedback_id.to_string()))
        }
    }
}

/// Blank strings count as missing; anything else is kept untouched.
fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn secondary_emotions(value: Option<&Value>) -> Vec<SecondaryEmotion> {
    let Some(entries) = value.and_then(Value::as_array) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let emotion = non_empty_str(entry.get("emotion"))?;
            let confidence = entry
                .get("confidence")
                .and_then(Value::as_f64)
                .filter(|value| is_unit_interval(*value))?;
            Some(SecondaryEmotion {
                emotion: emotion.to_string(),
                confidence,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tone::{FALLBACK_CONFIDENCE, FALLBACK_EXPLANATION};

    #[test]
    fn extracts_object_surrounded_by_prose() {
        let text = r#"here is the result: {"emotion":"joy","confidence":0.9}"#;
        let result = parse_model_response(text, "fb-1");
        assert_eq!(result.emotion, "joy");
        assert_eq!(result.confidence, 0.9);
        assert_eq!(result.explanation, DEFAULT_EXPLANATION);
        assert_eq!(result.feedback_id.as_deref(), Some("fb-1"));
    }

    #[test]
    fn text_without_braces_falls_back_to_neutral() {
        let result = parse_model_response("I could not decide, sorry.", "fb-2");
        assert_eq!(result.emotion, "neutral");
        assert_eq!(result.confidence, FALLBACK_CONFIDENCE);
        assert_eq!(
            result.explanation,
            "The system encountered an issue while analyzing the emotional content. \
             The message appears to be neutral in tone."
        );
        assert!(result.tone.is_none());
        assert!(result.intention.is_none());
        assert!(result.secondary_emotions.is_empty());
        assert_eq!(result.feedback_id.as_deref(), Some("fb-2"));
    }

    #[test]
    fn trailing_text_and_nested_braces_are_handled() {
        let text = r#"Analysis:
{
  "emotion": "Anger",
  "confidence": 0.75,
  "explanation": "Uses {caps} and exclamation marks",
  "tone": "urgent",
  "intention": "complain",
  "secondaryEmotions": [{"emotion": "annoyance", "confidence": 0.4}]
}
Let me know if you need more {detail}."#;
        let result = parse_model_response(text, "fb");
        assert_eq!(result.emotion, "Anger");
        assert_eq!(result.confidence, 0.75);
        assert_eq!(result.explanation, "Uses {caps} and exclamation marks");
        assert_eq!(result.tone.as_deref(), Some("urgent"));
        assert_eq!(result.intention.as_deref(), Some("complain"));
        assert_eq!(result.secondary_emotions.len(), 1);
    }

    #[test]
    fn out_of_range_confidence_is_replaced_not_clamped() {
        for raw in ["1.5", "-0.2", "\"0.9\"", "null", "97"] {
            let text = format!(r#"{{"emotion":"joy","confidence":{raw}}}"#);
            let result = parse_model_response(&text, "fb");
            assert_eq!(result.confidence, DEFAULT_CONFIDENCE, "raw confidence {raw}");
            assert_eq!(result.emotion, "joy");
        }
    }

    #[test]
    fn each_field_defaults_independently() {
        let text = r#"{"emotion": 42, "confidence": 0.3, "explanation": "", "tone": ["x"],
                       "intention": "inform", "secondaryEmotions": "none"}"#;
        let result = parse_model_response(text, "fb");
        assert_eq!(result.emotion, DEFAULT_EMOTION);
        assert_eq!(result.confidence, 0.3);
        assert_eq!(result.explanation, DEFAULT_EXPLANATION);
        assert!(result.tone.is_none());
        assert_eq!(result.intention.as_deref(), Some("inform"));
        assert!(result.secondary_emotions.is_empty());
    }

    #[test]
    fn strings_are_kept_as_given_and_blank_ones_default() {
        let text = r#"{"emotion":" Joy ","confidence":0.6,"explanation":"  ","tone":" warm"}"#;
        let result = parse_model_response(text, "fb");
        assert_eq!(result.emotion, " Joy ");
        assert_eq!(result.explanation, DEFAULT_EXPLANATION);
        assert_eq!(result.tone.as_deref(), Some(" warm"));

        let result = parse_model_response(r#"{"emotion":"   "}"#, "fb");
        assert_eq!(result.emotion, DEFAULT_EMOTION);
    }

    #[test]
    fn malformed_secondary_entries_are_dropped_individually() {
        let text = r#"{"emotion":"joy","confidence":0.8,"secondaryEmotions":[
            {"emotion":"trust","confidence":0.5},
            {"emotion":"","confidence":0.5},
            {"emotion":"fear","confidence":3},
            {"confidence":0.1},
            "surprise",
            {"emotion":"relief","confidence":0.2}
        ]}"#;
        let result = parse_model_response(text, "fb");
        let names: Vec<_> = result
            .secondary_emotions
            .iter()
            .map(|s| s.emotion.as_str())
            .collect();
        assert_eq!(names, vec!["trust", "relief"]);
    }

    #[test]
    fn malformed_responses_always_yield_a_renderable_result() {
        let inputs = [
            "",
            "not json at all",
            "{",
            r#"{"emotion": "joy", "confidence": 0.9"#,
            "{}",
            "[1, 2, 3]",
            r#"{"emotion": null, "confidence": "high"}"#,
            "}{",
            r#"prefix { "emotion": "sad" "confidence": 0.2 } suffix"#,
            "{\"emotion\": \"\u{0}\"}",
        ];
        for input in inputs {
            let result = parse_model_response(input, "fb");
            assert!(!result.emotion.is_empty(), "input {input:?}");
            assert!(is_unit_interval(result.confidence), "input {input:?}");
            assert!(!result.explanation.is_empty(), "input {input:?}");
            assert_eq!(result.feedback_id.as_deref(), Some("fb"));
        }
    }
}
