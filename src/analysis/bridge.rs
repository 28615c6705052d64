use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::events::Subscription;
use crate::models::{CaptureEvent, ToneResult};
use crate::overlay::PresenterHandle;

use super::error::AnalysisError;
use super::remote::RemoteAnalyzer;
use super::sandbox::{SandboxContext, SandboxReply};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

/// The two interchangeable analyzers.
pub enum AnalyzerBackend {
    Remote(RemoteAnalyzer),
    Sandboxed(SandboxContext),
}

impl AnalyzerBackend {
    pub fn name(&self) -> &'static str {
        match self {
            AnalyzerBackend::Remote(_) => "remote",
            AnalyzerBackend::Sandboxed(_) => "sandboxed",
        }
    }

    async fn analyze(&self, text: &str, feedback_id: &str) -> Result<ToneResult, AnalysisError> {
        match self {
            AnalyzerBackend::Remote(analyzer) => analyzer.analyze(text, feedback_id).await,
            AnalyzerBackend::Sandboxed(context) => match context.analyze_tone(text).await? {
                SandboxReply::Valid(result) => Ok(result.with_feedback_id(feedback_id)),
                SandboxReply::Malformed => {
                    log_warn!("sandbox result failed validation; using neutral fallback");
                    Ok(ToneResult::neutral_fallback(Some(feedback_id.to_string())))
                }
            },
        }
    }

    fn shutdown(&self) {
        if let AnalyzerBackend::Sandboxed(context) = self {
            context.shutdown();
        }
    }
}

/// Turns capture events into tone results and hands them to the overlay.
#[derive(Clone)]
pub struct AnalysisBridge {
    backend: Arc<AnalyzerBackend>,
    presenter: PresenterHandle,
}

impl AnalysisBridge {
    pub fn new(backend: AnalyzerBackend, presenter: PresenterHandle) -> Self {
        Self {
            backend: Arc::new(backend),
            presenter,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Analyzes `text` directly, bypassing the overlay.
    pub async fn analyze(&self, text: &str) -> Result<ToneResult, AnalysisError> {
        let feedback_id = Uuid::new_v4().to_string();
        self.backend.analyze(text, &feedback_id).await
    }

    /// One capture-to-overlay pipeline. Failures end here; they are never
    /// returned to the event loop.
    async fn dispatch(&self, event: CaptureEvent) {
        // Minted before the backend runs so every outcome can carry it.
        let feedback_id = Uuid::new_v4().to_string();

        match self.backend.analyze(&event.text, &feedback_id).await {
            Ok(result) => {
                log_debug!(
                    "{:?} message analyzed as {} ({:.2})",
                    event.source_app,
                    result.emotion,
                    result.confidence
                );
                if !self.presenter.show(result) {
                    log_warn!("overlay presenter is gone; dropping result");
                }
            }
            Err(err) => {
                log_error!("{:?} message: {err:#}", event.source_app);
                self.presenter.analysis_failed(feedback_id);
            }
        }
    }

    /// Consumes events until cancelled or the channel closes. Each event gets
    /// its own pipeline; pipelines may overlap and finish in any order.
    pub async fn run(self, mut events: Subscription<CaptureEvent>, cancel: CancellationToken) {
        log_info!("analysis bridge running ({} backend)", self.backend.name());
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        let bridge = self.clone();
                        in_flight.spawn(async move { bridge.dispatch(event).await });
                    }
                    None => break,
                },
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(err) = joined {
                        log_error!("analysis pipeline task failed: {err}");
                    }
                }
                _ = cancel.cancelled() => break,
            }
        }

        let abandoned = in_flight.len();
        in_flight.abort_all();
        log_info!(
            "analysis bridge stopped ({} pipeline(s) abandoned)",
            abandoned
        );
    }

    /// Tears down the backend's execution context, if it has one.
    pub fn shutdown_backend(&self) {
        self.backend.shutdown();
    }
}
