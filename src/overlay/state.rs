use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum OverlayPhase {
    #[default]
    Hidden,
    Showing,
}

/// What a delivered result did to the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// `Hidden -> Showing`; the surface must be made visible.
    Shown,
    /// Already showing; content is replaced in place.
    Refreshed,
}

/// Two-state overlay lifetime with a reschedulable dismissal deadline.
///
/// The deadline always tracks the most recent result, so a burst of results
/// keeps the overlay up until `dismiss_after` past the last one.
#[derive(Debug, Clone)]
pub struct OverlayStateMachine {
    phase: OverlayPhase,
    dismiss_after: Duration,
    deadline: Option<Instant>,
}

impl OverlayStateMachine {
    pub fn new(dismiss_after: Duration) -> Self {
        Self {
            phase: OverlayPhase::Hidden,
            dismiss_after,
            deadline: None,
        }
    }

    pub fn phase(&self) -> OverlayPhase {
        self.phase
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn on_result(&mut self, now: Instant) -> Transition {
        self.deadline = Some(now + self.dismiss_after);
        match self.phase {
            OverlayPhase::Hidden => {
                self.phase = OverlayPhase::Showing;
                Transition::Shown
            }
            OverlayPhase::Showing => Transition::Refreshed,
        }
    }

    /// Returns `true` when this tick hid the overlay.
    pub fn on_tick(&mut self, now: Instant) -> bool {
        match (self.phase, self.deadline) {
            (OverlayPhase::Showing, Some(deadline)) if now >= deadline => {
                self.phase = OverlayPhase::Hidden;
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn reset(&mut self) {
        self.phase = OverlayPhase::Hidden;
        self.deadline = None;
    }
}
