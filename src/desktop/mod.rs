mod commands;
mod overlay_window;

use tauri::{Manager, RunEvent};

use crate::service::ToneService;
use crate::settings::SettingsStore;
use crate::utils::logging;

use commands::{analyze_message, get_settings, report_ui_change, submit_feedback, update_settings};
use overlay_window::WebviewOverlaySurface;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_info;

pub(crate) struct AppState {
    pub(crate) service: ToneService,
    pub(crate) settings: SettingsStore,
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    logging::init();
    log_info!("ToneLens starting up...");

    let app = tauri::Builder::default()
        .setup(|app| {
            let result = (|| -> anyhow::Result<()> {
                let app_data_dir = app
                    .path()
                    .app_data_dir()
                    .map_err(|err| anyhow::anyhow!(err))?;
                std::fs::create_dir_all(&app_data_dir)?;

                let settings_store = SettingsStore::new(app_data_dir.join("settings.json"))?;
                let settings = settings_store.settings();

                let surface =
                    WebviewOverlaySurface::new(app.handle().clone(), settings.overlay.offset_y);
                // Spawning needs the runtime context.
                let service = tauri::async_runtime::block_on(async {
                    ToneService::start(&settings, surface, None)
                })?;

                app.manage(AppState {
                    service,
                    settings: settings_store,
                });
                Ok(())
            })();

            result.map_err(|err| err.into())
        })
        .invoke_handler(tauri::generate_handler![
            report_ui_change,
            analyze_message,
            submit_feedback,
            get_settings,
            update_settings,
        ])
        .build(tauri::generate_context!())
        .expect("error while building tauri application");

    app.run(|handle, event| {
        if let RunEvent::Exit = event {
            if let Some(state) = handle.try_state::<AppState>() {
                tauri::async_runtime::block_on(state.service.shutdown());
            }
        }
    });
}
