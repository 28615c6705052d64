use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Messaging apps the watcher is allowed to read from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum SourceApp {
    WhatsApp,
    Messenger,
    GoogleMessages,
}

impl SourceApp {
    pub const ALL: [SourceApp; 3] = [
        SourceApp::WhatsApp,
        SourceApp::Messenger,
        SourceApp::GoogleMessages,
    ];

    pub fn package_name(&self) -> &'static str {
        match self {
            SourceApp::WhatsApp => "com.whatsapp",
            SourceApp::Messenger => "com.facebook.orca",
            SourceApp::GoogleMessages => "com.google.android.apps.messaging",
        }
    }

    /// View id of the nodes that carry message bodies in this app.
    pub fn message_view_id(&self) -> &'static str {
        match self {
            SourceApp::WhatsApp => "com.whatsapp:id/conversation_text",
            SourceApp::Messenger => "com.facebook.orca:id/message_text",
            SourceApp::GoogleMessages => "com.google.android.apps.messaging:id/message_text",
        }
    }

    pub fn from_package(package: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|app| app.package_name() == package)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureEvent {
    pub source_app: SourceApp,
    pub text: String,
    pub observed_at: DateTime<Utc>,
}

impl CaptureEvent {
    pub fn new(source_app: SourceApp, text: String) -> Self {
        Self {
            source_app,
            text,
            observed_at: Utc::now(),
        }
    }
}
