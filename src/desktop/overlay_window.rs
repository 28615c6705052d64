use anyhow::{anyhow, Context, Result};
use tauri::{
    AppHandle, Emitter, LogicalPosition, Position, WebviewUrl, WebviewWindow, WebviewWindowBuilder,
};

use crate::overlay::{OverlaySurface, OverlayView};

pub const OVERLAY_LABEL: &str = "overlay";
pub const TONE_RESULT_EVENT: &str = "tone-result";

const OVERLAY_WIDTH: f64 = 320.0;
const OVERLAY_HEIGHT: f64 = 220.0;

/// Overlay surface backed by a borderless, always-on-top webview window that
/// never takes focus. Anchored to the top-right corner of the current monitor.
pub struct WebviewOverlaySurface {
    app: AppHandle,
    offset_y: f64,
    window: Option<WebviewWindow>,
}

impl WebviewOverlaySurface {
    pub fn new(app: AppHandle, offset_y: f64) -> Self {
        Self {
            app,
            offset_y,
            window: None,
        }
    }

    fn window(&self) -> Result<&WebviewWindow> {
        self.window
            .as_ref()
            .ok_or_else(|| anyhow!("overlay window is not attached"))
    }

    fn anchor_top_right(&self, window: &WebviewWindow) -> Result<()> {
        let Some(monitor) = window.current_monitor()? else {
            return Ok(());
        };
        let scale = monitor.scale_factor();
        let screen_width = monitor.size().width as f64 / scale;
        let x = (screen_width - OVERLAY_WIDTH).max(0.0);
        window.set_position(Position::Logical(LogicalPosition { x, y: self.offset_y }))?;
        Ok(())
    }
}

impl OverlaySurface for WebviewOverlaySurface {
    fn attach(&mut self) -> Result<()> {
        let builder = WebviewWindowBuilder::new(
            &self.app,
            OVERLAY_LABEL,
            WebviewUrl::App("overlay.html".into()),
        )
        .title("ToneLens")
        .inner_size(OVERLAY_WIDTH, OVERLAY_HEIGHT)
        .decorations(false)
        .always_on_top(true)
        .skip_taskbar(true)
        .resizable(false)
        .focused(false)
        .focusable(false)
        .visible(false);

        // Transparency on macOS needs the private-API feature.
        #[cfg(not(target_os = "macos"))]
        let builder = builder.transparent(true);

        let window = builder
            .build()
            .context("failed to create overlay window")?;

        self.anchor_top_right(&window)
            .context("failed to position overlay window")?;
        self.window = Some(window);
        Ok(())
    }

    fn detach(&mut self) -> Result<()> {
        if let Some(window) = self.window.take() {
            window.destroy().context("failed to destroy overlay window")?;
        }
        Ok(())
    }

    fn is_attached(&self) -> bool {
        self.window.is_some()
    }

    fn render(&mut self, view: &OverlayView) -> Result<()> {
        self.window()?;
        self.app
            .emit_to(OVERLAY_LABEL, TONE_RESULT_EVENT, view)
            .context("failed to deliver overlay view")
    }

    fn set_visible(&mut self, visible: bool) -> Result<()> {
        let window = self.window()?;
        if visible {
            window.show()?;
        } else {
            window.hide()?;
        }
        Ok(())
    }
}
