use serde::{Deserialize, Serialize};

use super::tone::{SecondaryEmotion, ToneResult};

/// Accuracy judgment for a displayed result, handed to the feedback sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    pub feedback_id: String,
    pub emotion: String,
    pub confidence: f64,
    pub explanation: String,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub intention: Option<String>,
    #[serde(default)]
    pub secondary_emotions: Vec<SecondaryEmotion>,
    pub helpful: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

impl FeedbackRecord {
    /// Returns `None` when the result carries no feedback id.
    pub fn from_result(result: &ToneResult, helpful: bool, comments: Option<String>) -> Option<Self> {
        let feedback_id = result.feedback_id.clone()?;
        Some(Self {
            feedback_id,
            emotion: result.emotion.clone(),
            confidence: result.confidence,
            explanation: result.explanation.clone(),
            tone: result.tone.clone(),
            intention: result.intention.clone(),
            secondary_emotions: result.secondary_emotions.clone(),
            helpful,
            comments,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub success: bool,
}
