use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::models::ToneResult;

use super::state::{OverlayPhase, OverlayStateMachine, Transition};
use super::surface::OverlaySurface;
use super::view::OverlayView;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info};

pub const DEFAULT_DISMISS_AFTER: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone)]
pub struct PresenterConfig {
    pub dismiss_after: Duration,
    /// Render a neutral view when analysis fails instead of skipping the update.
    pub show_neutral_on_failure: bool,
}

impl Default for PresenterConfig {
    fn default() -> Self {
        Self {
            dismiss_after: DEFAULT_DISMISS_AFTER,
            show_neutral_on_failure: false,
        }
    }
}

enum PresenterCommand {
    Show(ToneResult),
    AnalysisFailed { feedback_id: String },
    Inspect(oneshot::Sender<OverlayPhase>),
    Shutdown(oneshot::Sender<()>),
}

/// Sending side of the presenter task. All surface mutation is marshalled
/// through here onto the task that owns the surface.
#[derive(Clone)]
pub struct PresenterHandle {
    tx: mpsc::UnboundedSender<PresenterCommand>,
}

impl PresenterHandle {
    /// Queues a result for display. Returns `false` once the presenter is gone.
    pub fn show(&self, result: ToneResult) -> bool {
        self.tx.send(PresenterCommand::Show(result)).is_ok()
    }

    pub fn analysis_failed(&self, feedback_id: impl Into<String>) -> bool {
        self.tx
            .send(PresenterCommand::AnalysisFailed {
                feedback_id: feedback_id.into(),
            })
            .is_ok()
    }

    pub async fn phase(&self) -> Option<OverlayPhase> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx.send(PresenterCommand::Inspect(reply_tx)).ok()?;
        reply_rx.await.ok()
    }

    /// Stops the presenter and waits for the surface to be released. Later
    /// calls return immediately.
    pub async fn shutdown(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(PresenterCommand::Shutdown(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }
}

/// Spawns the presenter task. The surface is attached once when the task
/// starts and detached once when it stops.
pub fn spawn_presenter<S: OverlaySurface>(
    surface: S,
    config: PresenterConfig,
) -> (PresenterHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let presenter = Presenter {
        surface,
        machine: OverlayStateMachine::new(config.dismiss_after),
        config,
    };
    let handle = tokio::spawn(presenter.run(rx));
    (PresenterHandle { tx }, handle)
}

struct Presenter<S> {
    surface: S,
    machine: OverlayStateMachine,
    config: PresenterConfig,
}

impl<S: OverlaySurface> Presenter<S> {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<PresenterCommand>) {
        self.attach();

        loop {
            let deadline = self.machine.deadline();
            tokio::select! {
                command = rx.recv() => match command {
                    Some(PresenterCommand::Show(result)) => self.present(&result),
                    Some(PresenterCommand::AnalysisFailed { feedback_id }) => {
                        if self.config.show_neutral_on_failure {
                            self.present(&ToneResult::neutral_fallback(Some(feedback_id)));
                        } else {
                            log_debug!("analysis failed; leaving overlay untouched");
                        }
                    }
                    Some(PresenterCommand::Inspect(reply)) => {
                        let _ = reply.send(self.machine.phase());
                    }
                    Some(PresenterCommand::Shutdown(ack)) => {
                        self.teardown();
                        let _ = ack.send(());
                        break;
                    }
                    None => {
                        self.teardown();
                        break;
                    }
                },
                _ = wait_until(deadline) => self.dismiss_if_due(),
            }
        }

        log_info!("overlay presenter stopped");
    }

    fn attach(&mut self) {
        if self.surface.is_attached() {
            return;
        }
        match self.surface.attach() {
            Ok(()) => log_info!("overlay surface attached"),
            Err(err) => log_error!("failed to attach overlay surface: {err:#}"),
        }
    }

    fn present(&mut self, result: &ToneResult) {
        let view = OverlayView::from_result(result);
        if let Err(err) = self.surface.render(&view) {
            log_error!("failed to render overlay: {err:#}");
            return;
        }

        match self.machine.on_result(Instant::now()) {
            Transition::Shown => {
                log_debug!("overlay: hidden -> showing");
                if let Err(err) = self.surface.set_visible(true) {
                    log_error!("failed to show overlay: {err:#}");
                }
            }
            Transition::Refreshed => log_debug!("overlay: refreshed in place"),
        }
    }

    fn dismiss_if_due(&mut self) {
        if self.machine.on_tick(Instant::now()) {
            log_debug!("overlay: showing -> hidden");
            if let Err(err) = self.surface.set_visible(false) {
                log_error!("failed to hide overlay: {err:#}");
            }
        }
    }

    fn teardown(&mut self) {
        self.machine.reset();
        if !self.surface.is_attached() {
            return;
        }
        match self.surface.detach() {
            Ok(()) => log_info!("overlay surface detached"),
            Err(err) => log_error!("failed to detach overlay surface: {err:#}"),
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
