pub mod capture;
pub mod feedback;
pub mod tone;

pub use capture::{CaptureEvent, SourceApp};
pub use feedback::{FeedbackRecord, FeedbackResponse};
pub use tone::{SecondaryEmotion, ToneResult};
