use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use crate::analysis::CompletionConfig;
use crate::capture::WatcherConfig;
use crate::overlay::PresenterConfig;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_warn;

pub const API_KEY_ENV: &str = "GROQ_API_KEY";
const DEFAULT_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";
const DEFAULT_MODEL: &str = "llama3-70b-8192";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum AnalyzerBackendKind {
    #[default]
    Remote,
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzerSettings {
    pub backend: AnalyzerBackendKind,
    pub endpoint: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout_secs: u64,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            backend: AnalyzerBackendKind::Remote,
            endpoint: DEFAULT_ENDPOINT.into(),
            model: DEFAULT_MODEL.into(),
            api_key: None,
            temperature: 0.2,
            max_tokens: 1024,
            request_timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct OverlaySettings {
    pub dismiss_after_ms: u64,
    pub show_neutral_on_failure: bool,
    /// Distance from the top edge of the screen, in logical pixels.
    pub offset_y: f64,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            dismiss_after_ms: 5000,
            show_neutral_on_failure: false,
            offset_y: 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptureSettings {
    pub suppress_repeats: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub analyzer: AnalyzerSettings,
    pub overlay: OverlaySettings,
    pub capture: CaptureSettings,
}

impl AppSettings {
    /// Configured key, or the `GROQ_API_KEY` environment variable.
    pub fn api_key(&self) -> Option<String> {
        self.resolve_api_key(std::env::var(API_KEY_ENV).ok())
    }

    fn resolve_api_key(&self, from_env: Option<String>) -> Option<String> {
        let usable = |key: &String| !key.trim().is_empty();
        self.analyzer
            .api_key
            .clone()
            .filter(usable)
            .or_else(|| from_env.filter(usable))
    }

    /// Remote client settings, or `None` when no API key is available.
    pub fn completion_config(&self) -> Option<CompletionConfig> {
        let api_key = self.api_key()?;
        Some(CompletionConfig {
            endpoint: self.analyzer.endpoint.clone(),
            model: self.analyzer.model.clone(),
            api_key,
            temperature: self.analyzer.temperature,
            max_tokens: self.analyzer.max_tokens,
            timeout: self.request_timeout(),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.analyzer.request_timeout_secs)
    }

    pub fn presenter_config(&self) -> PresenterConfig {
        PresenterConfig {
            dismiss_after: Duration::from_millis(self.overlay.dismiss_after_ms),
            show_neutral_on_failure: self.overlay.show_neutral_on_failure,
        }
    }

    pub fn watcher_config(&self) -> WatcherConfig {
        WatcherConfig {
            suppress_repeats: self.capture.suppress_repeats,
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<AppSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log_warn!(
                    "Ignoring invalid settings file {}: {err}",
                    path.display()
                );
                AppSettings::default()
            })
        } else {
            AppSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn settings(&self) -> AppSettings {
        self.read().clone()
    }

    pub fn update(&self, settings: AppSettings) -> Result<()> {
        let mut guard = self.write();
        self.persist(&settings)?;
        *guard = settings;
        Ok(())
    }

    fn persist(&self, data: &AppSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, AppSettings> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, AppSettings> {
        match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        let settings = store.settings();
        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.analyzer.model, "llama3-70b-8192");
        assert_eq!(settings.analyzer.max_tokens, 1024);
        assert_eq!(settings.overlay.dismiss_after_ms, 5000);
        assert!(!settings.capture.suppress_repeats);
    }

    #[test]
    fn update_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();

        let mut settings = store.settings();
        settings.analyzer.backend = AnalyzerBackendKind::Local;
        settings.overlay.show_neutral_on_failure = true;
        store.update(settings.clone()).unwrap();

        let reloaded = SettingsStore::new(path).unwrap();
        assert_eq!(reloaded.settings(), settings);
    }

    #[test]
    fn partial_and_invalid_files_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();

        let partial = dir.path().join("partial.json");
        fs::write(&partial, r#"{"overlay":{"dismissAfterMs":2500}}"#).unwrap();
        let settings = SettingsStore::new(partial).unwrap().settings();
        assert_eq!(settings.overlay.dismiss_after_ms, 2500);
        assert_eq!(settings.overlay.offset_y, 100.0);
        assert_eq!(settings.analyzer, AnalyzerSettings::default());

        let invalid = dir.path().join("invalid.json");
        fs::write(&invalid, "{ not json").unwrap();
        assert_eq!(
            SettingsStore::new(invalid).unwrap().settings(),
            AppSettings::default()
        );
    }

    #[test]
    fn configured_key_wins_over_environment() {
        let mut settings = AppSettings::default();
        assert_eq!(settings.resolve_api_key(None), None);
        assert_eq!(
            settings.resolve_api_key(Some("from-env".into())).as_deref(),
            Some("from-env")
        );

        settings.analyzer.api_key = Some("configured".into());
        assert_eq!(
            settings.resolve_api_key(Some("from-env".into())).as_deref(),
            Some("configured")
        );

        settings.analyzer.api_key = Some("  ".into());
        assert_eq!(settings.resolve_api_key(None), None);
        assert_eq!(
            settings.resolve_api_key(Some("from-env".into())).as_deref(),
            Some("from-env")
        );
    }

    #[test]
    fn derived_component_configs() {
        let mut settings = AppSettings::default();
        settings.overlay.dismiss_after_ms = 1500;
        settings.capture.suppress_repeats = true;
        assert_eq!(
            settings.presenter_config().dismiss_after,
            Duration::from_millis(1500)
        );
        assert!(settings.watcher_config().suppress_repeats);
        assert_eq!(settings.request_timeout(), Duration::from_secs(20));
    }
}
