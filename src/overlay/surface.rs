use std::sync::{Arc, Mutex};

use anyhow::Result;

use super::view::OverlayView;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_info;

/// A top-level always-on-top window the presenter draws into.
///
/// Only the presenter task touches a surface, so implementations need not be
/// `Sync`. Callers check `is_attached` before `attach`/`detach`.
pub trait OverlaySurface: Send + 'static {
    fn attach(&mut self) -> Result<()>;
    fn detach(&mut self) -> Result<()>;
    fn is_attached(&self) -> bool;
    fn render(&mut self, view: &OverlayView) -> Result<()>;
    fn set_visible(&mut self, visible: bool) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    Attached,
    Detached,
    Rendered(OverlayView),
    Visible(bool),
}

/// Surface without a window: records every operation and logs renders.
///
/// Clones share the recording, so a test can keep one while the presenter
/// owns the other.
#[derive(Debug, Clone, Default)]
pub struct HeadlessSurface {
    attached: bool,
    events: Arc<Mutex<Vec<SurfaceEvent>>>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SurfaceEvent> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count(&self, predicate: impl Fn(&SurfaceEvent) -> bool) -> usize {
        self.events().iter().filter(|event| predicate(event)).count()
    }

    fn record(&self, event: SurfaceEvent) {
        match self.events.lock() {
            Ok(mut guard) => guard.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

impl OverlaySurface for HeadlessSurface {
    fn attach(&mut self) -> Result<()> {
        self.attached = true;
        self.record(SurfaceEvent::Attached);
        Ok(())
    }

    fn detach(&mut self) -> Result<()> {
        self.attached = false;
        self.record(SurfaceEvent::Detached);
        Ok(())
    }

    fn is_attached(&self) -> bool {
        self.attached
    }

    fn render(&mut self, view: &OverlayView) -> Result<()> {
        log_info!(
            "overlay: {} {} {}%",
            view.emotion,
            view.emoji,
            view.confidence_percent
        );
        self.record(SurfaceEvent::Rendered(view.clone()));
        Ok(())
    }

    fn set_visible(&mut self, visible: bool) -> Result<()> {
        self.record(SurfaceEvent::Visible(visible));
        Ok(())
    }
}
