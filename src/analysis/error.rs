use std::time::Duration;

use thiserror::Error;

/// Invocation fault of an analyzer backend. Parse problems never surface here;
/// they are recovered into a neutral result.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("analysis failed: remote analyzer error: {0}")]
    Remote(#[source] anyhow::Error),

    #[error("analysis failed: no response within {0:?}")]
    Timeout(Duration),

    #[error("analysis failed: analysis context is closed")]
    ContextClosed,
}
