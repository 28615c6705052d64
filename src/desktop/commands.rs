use tauri::State;

use crate::capture::{UiChangeNotification, UiNodeSnapshot};
use crate::models::{CaptureEvent, FeedbackRecord, FeedbackResponse, ToneResult};
use crate::settings::AppSettings;

use super::AppState;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_info;

/// Entry point for platform accessibility bridges: one UI snapshot of the
/// foreground app.
#[tauri::command]
pub fn report_ui_change(
    state: State<'_, AppState>,
    package: String,
    root: Option<UiNodeSnapshot>,
) -> Option<CaptureEvent> {
    state
        .service
        .watcher()
        .on_ui_change(UiChangeNotification { package, root })
}

#[tauri::command]
pub async fn analyze_message(state: State<'_, AppState>, text: String) -> Result<ToneResult, String> {
    state
        .service
        .analyze_text(&text)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn submit_feedback(state: State<'_, AppState>, record: FeedbackRecord) -> FeedbackResponse {
    state.service.submit_feedback(&record)
}

#[tauri::command]
pub fn get_settings(state: State<'_, AppState>) -> AppSettings {
    state.settings.settings()
}

#[tauri::command]
pub fn update_settings(state: State<'_, AppState>, settings: AppSettings) -> Result<(), String> {
    state.settings.update(settings).map_err(|e| e.to_string())?;
    log_info!("settings saved; analyzer and overlay changes apply on next launch");
    Ok(())
}
