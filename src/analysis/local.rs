//! Keyword-scoring analyzer hosted inside the sandbox context.
//!
//! Only the output shape matters to the rest of the crate; the heuristic is
//! deliberately small.

use serde::Serialize;

use crate::models::tone::{DEFAULT_EMOTION, FALLBACK_CONFIDENCE};

const EMOTION_KEYWORDS: &[(&str, &[&str])] = &[
    ("happy", &["happy", "joy", "excited", "glad", "delighted"]),
    ("sad", &["sad", "unhappy", "depressed", "down", "miserable"]),
    ("angry", &["angry", "mad", "furious", "outraged", "annoyed"]),
];

const CONFIDENCE_STEP: f64 = 0.1;
const MAX_CONFIDENCE: f64 = 0.95;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalAnalysis {
    pub emotion: String,
    pub confidence: f64,
    pub explanation: String,
}

pub fn analyze_tone(message: &str) -> LocalAnalysis {
    let lowered = message.to_lowercase();

    let mut detected = DEFAULT_EMOTION;
    let mut best_count = 0;
    for (emotion, keywords) in EMOTION_KEYWORDS {
        // Each keyword counts once, however often it appears.
        let count = keywords
            .iter()
            .filter(|keyword| lowered.contains(*keyword))
            .count();
        // Strictly greater: ties keep the earlier emotion.
        if count > best_count {
            best_count = count;
            detected = emotion;
        }
    }

    let confidence = if best_count == 0 {
        FALLBACK_CONFIDENCE
    } else {
        (FALLBACK_CONFIDENCE + CONFIDENCE_STEP * best_count as f64).min(MAX_CONFIDENCE)
    };

    LocalAnalysis {
        emotion: detected.to_string(),
        confidence,
        explanation: format!("Detected {detected} tone in the message."),
    }
}
