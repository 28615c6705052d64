use crate::models::{FeedbackRecord, FeedbackResponse};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Accepts accuracy feedback. Nothing is stored; submissions are logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingFeedbackSink;

impl LoggingFeedbackSink {
    pub fn submit(&self, record: &FeedbackRecord) -> FeedbackResponse {
        if record.feedback_id.trim().is_empty() {
            log_warn!("rejecting feedback without a correlation id");
            return FeedbackResponse { success: false };
        }

        log_info!(
            "feedback {}: {} for {} ({:.2}){}",
            record.feedback_id,
            if record.helpful { "helpful" } else { "not helpful" },
            record.emotion,
            record.confidence,
            if record.comments.is_some() { ", with comments" } else { "" }
        );
        FeedbackResponse { success: true }
    }
}
