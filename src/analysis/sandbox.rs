//! Isolated analysis context.
//!
//! The local analyzer runs on its own thread and can only talk back to the
//! host through [`HostBridge::receive_analysis_result`], which takes one flat
//! JSON string. Everything arriving through that callback is treated as
//! untrusted and validated field by field.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tokio::sync::oneshot;

use crate::models::tone::{is_unit_interval, SecondaryEmotion, ToneResult};

use super::error::AnalysisError;
use super::local;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

const SCRIPT_FAILURE_PAYLOAD: &str =
    r#"{"emotion":"neutral","confidence":0.5,"explanation":"Could not analyze the message."}"#;

/// Entry point evaluated inside the context: raw message in, structured result out.
pub type SandboxScript = Box<dyn Fn(&str) -> Value + Send + 'static>;

/// Host-side verdict on a payload delivered by the context.
#[derive(Debug, Clone, PartialEq)]
pub enum SandboxReply {
    Valid(ToneResult),
    Malformed,
}

type PendingReplies = Arc<Mutex<VecDeque<oneshot::Sender<SandboxReply>>>>;

fn lock_pending(pending: &PendingReplies) -> MutexGuard<'_, VecDeque<oneshot::Sender<SandboxReply>>> {
    match pending.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// The single native interface exposed to the context.
///
/// The context is single-threaded and answers in request order, so replies
/// are matched to waiters first-in first-out.
pub struct HostBridge {
    pending: PendingReplies,
}

impl HostBridge {
    pub fn receive_analysis_result(&self, json: String) {
        let reply = validate_payload(&json);
        if reply == SandboxReply::Malformed {
            log_warn!("sandbox delivered a malformed result payload");
        }

        match lock_pending(&self.pending).pop_front() {
            Some(waiter) => {
                // The caller may have given up; nothing to do then.
                let _ = waiter.send(reply);
            }
            None => log_warn!("sandbox delivered a result with no pending request"),
        }
    }

    fn close(&self) {
        let dropped = {
            let mut pending = lock_pending(&self.pending);
            let count = pending.len();
            pending.clear();
            count
        };
        if dropped > 0 {
            log_warn!("sandbox closed with {} request(s) unanswered", dropped);
        }
    }
}

impl Drop for HostBridge {
    fn drop(&mut self) {
        // Also runs when the context thread unwinds.
        self.close();
    }
}

enum SandboxCommand {
    AnalyzeTone(String),
    Shutdown,
}

struct SandboxInner {
    sender: mpsc::Sender<SandboxCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
    pending: PendingReplies,
}

impl SandboxInner {
    fn shutdown(&self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(SandboxCommand::Shutdown) {
                log_error!("Failed to send shutdown to sandbox thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                log_error!("Failed to join sandbox thread: {join_err:?}");
            }
        }
    }
}

impl Drop for SandboxInner {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Handle to the isolated context. Created once per service; clones share it.
#[derive(Clone)]
pub struct SandboxContext {
    inner: Arc<SandboxInner>,
}

impl SandboxContext {
    /// Starts the context with the built-in keyword analyzer.
    pub fn start() -> Result<Self> {
        Self::start_with(Box::new(|message| {
            serde_json::to_value(local::analyze_tone(message)).unwrap_or(Value::Null)
        }))
    }

    pub fn start_with(script: SandboxScript) -> Result<Self> {
        let (command_tx, command_rx) = mpsc::channel::<SandboxCommand>();
        let pending: PendingReplies = Arc::new(Mutex::new(VecDeque::new()));
        let host = HostBridge {
            pending: Arc::clone(&pending),
        };

        let worker = thread::Builder::new()
            .name("tone-sandbox".into())
            .spawn(move || {
                while let Ok(command) = command_rx.recv() {
                    match command {
                        SandboxCommand::AnalyzeTone(message) => {
                            let output = panic::catch_unwind(AssertUnwindSafe(|| script(&message)));
                            let payload = match output {
                                Ok(value) => serde_json::to_string(&value)
                                    .unwrap_or_else(|_| SCRIPT_FAILURE_PAYLOAD.to_string()),
                                Err(_) => {
                                    log_error!("sandbox script panicked; answering with fallback");
                                    SCRIPT_FAILURE_PAYLOAD.to_string()
                                }
                            };
                            host.receive_analysis_result(payload);
                        }
                        SandboxCommand::Shutdown => break,
                    }
                }

                // Stop accepting work before failing whatever is still queued.
                drop(command_rx);
                drop(host);
                log_info!("Sandbox thread shutting down");
            })
            .context("failed to spawn sandbox thread")?;

        log_info!("Sandbox context started");

        Ok(Self {
            inner: Arc::new(SandboxInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
                pending,
            }),
        })
    }

    /// Invokes the context's entry point and waits for its callback.
    pub async fn analyze_tone(&self, message: &str) -> Result<SandboxReply, AnalysisError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        {
            // Send and enqueue under one lock so waiters stay in request order.
            let mut pending = lock_pending(&self.inner.pending);
            self.inner
                .sender
                .send(SandboxCommand::AnalyzeTone(message.to_string()))
                .map_err(|_| AnalysisError::ContextClosed)?;
            pending.push_back(reply_tx);
        }

        reply_rx.await.map_err(|_| AnalysisError::ContextClosed)
    }

    /// Stops the context thread. Safe to call more than once.
    pub fn shutdown(&self) {
        self.inner.shutdown();
    }

    /// False after `shutdown` or once the context thread has exited on its own.
    pub fn is_running(&self) -> bool {
        let guard = match self.inner.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

/// Checks presence and type of every field before building a result.
pub fn validate_payload(json: &str) -> SandboxReply {
    let Ok(Value::Object(object)) = serde_json::from_str::<Value>(json) else {
        return SandboxReply::Malformed;
    };
    match validated_result(&object) {
        Some(result) => SandboxReply::Valid(result),
        None => SandboxReply::Malformed,
    }
}

fn validated_result(object: &Map<String, Value>) -> Option<ToneResult> {
    let emotion = object
        .get("emotion")?
        .as_str()
        .filter(|s| !s.trim().is_empty())?;
    let confidence = object
        .get("confidence")?
        .as_f64()
        .filter(|value| is_unit_interval(*value))?;
    let explanation = object.get("explanation")?.as_str()?;

    Some(ToneResult {
        emotion: emotion.to_string(),
        confidence,
        explanation: explanation.to_string(),
        tone: optional_string(object.get("tone"))?,
        intention: optional_string(object.get("intention"))?,
        secondary_emotions: optional_secondary(object.get("secondaryEmotions"))?,
        feedback_id: None,
    })
}

/// `Some(None)` for absent/null, `Some(Some(_))` for a string, `None` for any
/// other type.
fn optional_string(value: Option<&Value>) -> Option<Option<String>> {
    match value {
        None | Some(Value::Null) => Some(None),
        Some(Value::String(s)) => Some(Some(s.clone())),
        Some(_) => None,
    }
}

fn optional_secondary(value: Option<&Value>) -> Option<Vec<SecondaryEmotion>> {
    match value {
        None | Some(Value::Null) => Some(Vec::new()),
        Some(Value::Array(entries)) => entries
            .iter()
            .map(|entry| {
                let emotion = entry.get("emotion")?.as_str()?;
                let confidence = entry
                    .get("confidence")?
                    .as_f64()
                    .filter(|value| is_unit_interval(*value))?;
                Some(SecondaryEmotion {
                    emotion: emotion.to_string(),
                    confidence,
                })
            })
            .collect(),
        Some(_) => None,
    }
}
