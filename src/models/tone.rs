use serde::{Deserialize, Serialize};

pub const DEFAULT_EMOTION: &str = "neutral";
pub const DEFAULT_CONFIDENCE: f64 = 0.7;
pub const DEFAULT_EXPLANATION: &str = "Unable to provide a detailed explanation.";

pub const FALLBACK_CONFIDENCE: f64 = 0.5;
pub const FALLBACK_EXPLANATION: &str = "The system encountered an issue while analyzing the \
     emotional content. The message appears to be neutral in tone.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecondaryEmotion {
    pub emotion: String,
    pub confidence: f64,
}

/// Canonical analysis output handed to the overlay and the feedback sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToneResult {
    pub emotion: String,
    pub confidence: f64,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intention: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secondary_emotions: Vec<SecondaryEmotion>,
    /// Correlates a later feedback submission with this result. `None`
    /// disables feedback for the result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_id: Option<String>,
}

impl ToneResult {
    /// Minimal result used whenever analyzer output cannot be located or parsed.
    pub fn neutral_fallback(feedback_id: Option<String>) -> Self {
        Self {
            emotion: DEFAULT_EMOTION.to_string(),
            confidence: FALLBACK_CONFIDENCE,
            explanation: FALLBACK_EXPLANATION.to_string(),
            tone: None,
            intention: None,
            secondary_emotions: Vec::new(),
            feedback_id,
        }
    }

    pub fn with_feedback_id(mut self, feedback_id: impl Into<String>) -> Self {
        self.feedback_id = Some(feedback_id.into());
        self
    }

    /// Key used for emoji/color lookups; the display keeps the original casing.
    pub fn emotion_key(&self) -> String {
        self.emotion.to_lowercase()
    }
}

pub fn is_unit_interval(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}
