use serde::Serialize;

use crate::models::{SecondaryEmotion, ToneResult};

const DEFAULT_EMOTION_EMOJI: &str = "🤔";
const DEFAULT_INTENTION_ICON: &str = "💭";

/// Render model pushed to the overlay surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayView {
    pub emotion: String,
    pub emoji: &'static str,
    pub confidence_percent: u8,
    pub tone: Option<String>,
    pub intention: Option<IntentionRow>,
    pub secondary: Vec<SecondaryRow>,
    pub explanation: String,
    pub feedback_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentionRow {
    pub label: String,
    pub icon: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecondaryRow {
    pub emotion: String,
    pub emoji: &'static str,
    pub confidence_percent: u8,
}

impl OverlayView {
    pub fn from_result(result: &ToneResult) -> Self {
        Self {
            emotion: result.emotion.clone(),
            emoji: emotion_emoji(&result.emotion_key()),
            confidence_percent: percent(result.confidence),
            tone: result.tone.clone(),
            intention: result.intention.as_ref().map(|label| IntentionRow {
                label: label.clone(),
                icon: intention_icon(label),
            }),
            secondary: result.secondary_emotions.iter().map(SecondaryRow::from).collect(),
            explanation: result.explanation.clone(),
            feedback_id: result.feedback_id.clone(),
        }
    }

    pub fn offers_feedback(&self) -> bool {
        self.feedback_id.is_some()
    }
}

impl From<&SecondaryEmotion> for SecondaryRow {
    fn from(secondary: &SecondaryEmotion) -> Self {
        Self {
            emotion: secondary.emotion.clone(),
            emoji: emotion_emoji(&secondary.emotion.to_lowercase()),
            confidence_percent: percent(secondary.confidence),
        }
    }
}

fn percent(confidence: f64) -> u8 {
    (confidence.clamp(0.0, 1.0) * 100.0).round() as u8
}

/// Looks up a lower-cased emotion key. Covers Plutchik primaries, GoEmotions
/// labels and the plain labels the local analyzer produces.
pub fn emotion_emoji(key: &str) -> &'static str {
    match key {
        "joy" | "happy" => "😊",
        "trust" => "🤝",
        "fear" | "fearful" => "😨",
        "surprise" | "surprised" => "😲",
        "sadness" | "sad" => "😢",
        "disgust" | "disgusted" => "🤢",
        "anger" | "angry" => "😠",
        "anticipation" | "excitement" | "excited" => "🤩",
        "admiration" => "🥰",
        "amusement" | "amused" => "😄",
        "annoyance" => "😒",
        "approval" => "👍",
        "caring" => "🤗",
        "confusion" | "confused" => "😕",
        "curiosity" => "🧐",
        "desire" => "😍",
        "disappointment" => "😞",
        "disapproval" => "👎",
        "embarrassment" => "😳",
        "gratitude" | "grateful" => "🙏",
        "grief" => "💔",
        "love" | "loving" => "❤️",
        "nervousness" | "anxious" => "😰",
        "optimism" => "🌈",
        "pride" => "🦚",
        "proud" => "🥲",
        "realization" => "💡",
        "relief" => "😌",
        "remorse" => "😔",
        "neutral" => "😐",
        "hopeful" => "🤞",
        "insult" => "🤬",
        "joking" => "😜",
        _ => DEFAULT_EMOTION_EMOJI,
    }
}

pub fn intention_icon(intention: &str) -> &'static str {
    match intention.to_lowercase().as_str() {
        "inform" => "📝",
        "persuade" => "🎯",
        "request" => "🙏",
        "complain" => "😤",
        "praise" => "👏",
        "question" => "❓",
        "suggest" => "💡",
        "warn" => "⚠️",
        "express" => "💬",
        _ => DEFAULT_INTENTION_ICON,
    }
}
