use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::analysis::{
    AnalysisBridge, AnalysisError, AnalyzerBackend, CompletionClient, GroqClient, RemoteAnalyzer,
    SandboxContext,
};
use crate::capture::CaptureWatcher;
use crate::events::{EventChannel, SubscriberId};
use crate::feedback::LoggingFeedbackSink;
use crate::models::{CaptureEvent, FeedbackRecord, FeedbackResponse, ToneResult};
use crate::overlay::{spawn_presenter, OverlayPhase, OverlaySurface, PresenterHandle};
use crate::settings::{AnalyzerBackendKind, AppSettings};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

struct ServiceTasks {
    bridge: JoinHandle<()>,
    presenter: JoinHandle<()>,
}

/// Owns the whole capture → analyze → render pipeline for one process.
pub struct ToneService {
    channel: EventChannel<CaptureEvent>,
    watcher: CaptureWatcher,
    bridge: AnalysisBridge,
    presenter: PresenterHandle,
    feedback: LoggingFeedbackSink,
    subscription: SubscriberId,
    cancel: CancellationToken,
    tasks: Mutex<Option<ServiceTasks>>,
}

impl ToneService {
    /// Wires the pipeline and spawns its tasks. Must run inside a tokio runtime.
    ///
    /// `client` overrides the completion client built from `settings`.
    pub fn start<S: OverlaySurface>(
        settings: &AppSettings,
        surface: S,
        client: Option<Arc<dyn CompletionClient>>,
    ) -> Result<Self> {
        let channel = EventChannel::new();
        let watcher = CaptureWatcher::new(channel.clone(), settings.watcher_config());

        let (presenter, presenter_task) = spawn_presenter(surface, settings.presenter_config());
        let backend = build_backend(settings, client)?;
        let bridge = AnalysisBridge::new(backend, presenter.clone());

        let subscription = channel.subscribe();
        let subscription_id = subscription.id();
        let cancel = CancellationToken::new();
        let bridge_task = tokio::spawn(bridge.clone().run(subscription, cancel.clone()));

        log_info!("tone service started ({} analyzer)", bridge.backend_name());

        Ok(Self {
            channel,
            watcher,
            bridge,
            presenter,
            feedback: LoggingFeedbackSink,
            subscription: subscription_id,
            cancel,
            tasks: Mutex::new(Some(ServiceTasks {
                bridge: bridge_task,
                presenter: presenter_task,
            })),
        })
    }

    pub fn watcher(&self) -> &CaptureWatcher {
        &self.watcher
    }

    pub fn backend_name(&self) -> &'static str {
        self.bridge.backend_name()
    }

    pub async fn analyze_text(&self, text: &str) -> Result<ToneResult, AnalysisError> {
        self.bridge.analyze(text).await
    }

    pub fn submit_feedback(&self, record: &FeedbackRecord) -> FeedbackResponse {
        self.feedback.submit(record)
    }

    /// `None` once the service has shut down.
    pub async fn overlay_phase(&self) -> Option<OverlayPhase> {
        self.presenter.phase().await
    }

    /// Stops the bridge loop, releases the overlay surface and tears down the
    /// analysis context. Only the first call does anything.
    pub async fn shutdown(&self) {
        let Some(tasks) = self.tasks.lock().await.take() else {
            return;
        };

        self.cancel.cancel();
        self.channel.unsubscribe(self.subscription);
        if let Err(err) = tasks.bridge.await {
            log_error!("analysis bridge task failed to join: {err}");
        }

        self.bridge.shutdown_backend();

        self.presenter.shutdown().await;
        if let Err(err) = tasks.presenter.await {
            log_error!("overlay presenter task failed to join: {err}");
        }

        log_info!("tone service stopped");
    }
}

fn build_backend(
    settings: &AppSettings,
    client: Option<Arc<dyn CompletionClient>>,
) -> Result<AnalyzerBackend> {
    let remote_client: Option<Arc<dyn CompletionClient>> = match settings.analyzer.backend {
        AnalyzerBackendKind::Local => None,
        AnalyzerBackendKind::Remote => match (client, settings.completion_config()) {
            (Some(client), _) => Some(client),
            (None, Some(config)) => Some(Arc::new(GroqClient::new(config)?)),
            (None, None) => {
                log_warn!("no API key for the remote analyzer; using the local sandbox");
                None
            }
        },
    };

    match remote_client {
        Some(client) => Ok(AnalyzerBackend::Remote(RemoteAnalyzer::new(
            client,
            settings.request_timeout(),
        ))),
        None => Ok(AnalyzerBackend::Sandboxed(SandboxContext::start()?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::{HeadlessSurface, SurfaceEvent};

    fn local_settings() -> AppSettings {
        let mut settings = AppSettings::default();
        settings.analyzer.backend = AnalyzerBackendKind::Local;
        settings
    }

    #[tokio::test]
    async fn local_backend_uses_the_sandbox() {
        let service = ToneService::start(&local_settings(), HeadlessSurface::new(), None).unwrap();
        assert_eq!(service.backend_name(), "sandboxed");
        let result = service.analyze_text("so glad you came").await.unwrap();
        assert_eq!(result.emotion, "happy");
        service.shutdown().await;
    }

    #[tokio::test]
    async fn remote_without_a_key_falls_back_to_the_sandbox() {
        let mut settings = AppSettings::default();
        settings.analyzer.api_key = None;
        settings.analyzer.endpoint = "http://127.0.0.1:9/unused".into();
        if settings.api_key().is_some() {
            // GROQ_API_KEY is set in this environment; nothing to check.
            return;
        }
        let service = ToneService::start(&settings, HeadlessSurface::new(), None).unwrap();
        assert_eq!(service.backend_name(), "sandboxed");
        service.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let surface = HeadlessSurface::new();
        let service = ToneService::start(&local_settings(), surface.clone(), None).unwrap();

        service.shutdown().await;
        service.shutdown().await;

        assert_eq!(surface.count(|e| *e == SurfaceEvent::Attached), 1);
        assert_eq!(surface.count(|e| *e == SurfaceEvent::Detached), 1);
        assert_eq!(service.overlay_phase().await, None);
        assert!(service.analyze_text("hello").await.is_err());
    }
}
