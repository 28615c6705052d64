use std::collections::HashMap;
use std::sync::Mutex;

use crate::events::EventChannel;
use crate::models::{CaptureEvent, SourceApp};

use super::ui_tree::{NodeGuard, UiChangeNotification, UiNode};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

#[derive(Debug, Clone, Default)]
pub struct WatcherConfig {
    /// Skip an event when its text equals the last text dispatched for the
    /// same app. Off by default: repeated notifications re-emit.
    pub suppress_repeats: bool,
}

/// Turns UI-change notifications from allow-listed messaging apps into
/// [`CaptureEvent`]s on the event channel.
pub struct CaptureWatcher {
    channel: EventChannel<CaptureEvent>,
    config: WatcherConfig,
    last_dispatched: Mutex<HashMap<SourceApp, String>>,
}

impl CaptureWatcher {
    pub fn new(channel: EventChannel<CaptureEvent>, config: WatcherConfig) -> Self {
        Self {
            channel,
            config,
            last_dispatched: Mutex::new(HashMap::new()),
        }
    }

    /// Handles one notification. Returns the event that was published, if any.
    /// A missing root, an unknown package or no matching node is a normal
    /// "nothing new" outcome.
    pub fn on_ui_change<N: UiNode>(
        &self,
        notification: UiChangeNotification<N>,
    ) -> Option<CaptureEvent> {
        let UiChangeNotification { package, root } = notification;
        let root = NodeGuard::new(root?);

        let Some(app) = SourceApp::from_package(&package) else {
            log_debug!("ignoring UI change from unsupported package {}", package);
            return None;
        };

        let text = latest_message_text(&*root, app)?;
        drop(root);

        if self.config.suppress_repeats && !self.remember(app, &text) {
            log_debug!("suppressing repeated message from {:?}", app);
            return None;
        }

        let event = CaptureEvent::new(app, text);
        let delivered = self.channel.publish(event.clone());
        log_info!(
            "captured message from {:?} ({} chars), delivered to {} subscriber(s)",
            app,
            event.text.chars().count(),
            delivered
        );
        Some(event)
    }

    /// Records `text` as the last dispatched text for `app`. Returns false when
    /// it was already the last one.
    fn remember(&self, app: SourceApp, text: &str) -> bool {
        let mut last = match self.last_dispatched.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if last.get(&app).map(String::as_str) == Some(text) {
            return false;
        }
        last.insert(app, text.to_string());
        true
    }
}

/// Text of the last (most recent) message node for `app`. Every matched handle
/// is released before returning.
fn latest_message_text<N: UiNode>(root: &N, app: SourceApp) -> Option<String> {
    let mut nodes: Vec<NodeGuard<N>> = root
        .find_by_view_id(app.message_view_id())
        .into_iter()
        .map(NodeGuard::new)
        .collect();

    let last = nodes.pop()?;
    drop(nodes);

    let text = last.text()?;
    if text.is_empty() {
        return None;
    }
    Some(text)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::capture::ui_tree::UiNodeSnapshot;

    const WHATSAPP_MSG: &str = "com.whatsapp:id/conversation_text";

    fn notification(package: &str, root: UiNodeSnapshot) -> UiChangeNotification<UiNodeSnapshot> {
        UiChangeNotification {
            package: package.to_string(),
            root: Some(root),
        }
    }

    fn chat(messages: &[&str]) -> UiNodeSnapshot {
        UiNodeSnapshot::container(
            messages
                .iter()
                .map(|text| UiNodeSnapshot::leaf(WHATSAPP_MSG, text))
                .collect(),
        )
    }

    #[tokio::test]
    async fn emits_the_last_matching_message() {
        let channel = EventChannel::new();
        let mut sub = channel.subscribe();
        let watcher = CaptureWatcher::new(channel, WatcherConfig::default());

        let event = watcher
            .on_ui_change(notification("com.whatsapp", chat(&["older", "newest"])))
            .expect("event");
        assert_eq!(event.source_app, SourceApp::WhatsApp);
        assert_eq!(event.text, "newest");

        let received = sub.recv().await.expect("published");
        assert_eq!(received, event);
    }

    #[test]
    fn ignores_packages_outside_the_allow_list() {
        let channel = EventChannel::new();
        let mut sub = channel.subscribe();
        let watcher = CaptureWatcher::new(channel, WatcherConfig::default());

        assert!(watcher
            .on_ui_change(notification("org.telegram.messenger", chat(&["hi"])))
            .is_none());
        assert!(sub.try_recv().is_none());
    }

    #[test]
    fn missing_root_empty_text_and_no_match_emit_nothing() {
        let channel = EventChannel::new();
        let mut sub = channel.subscribe();
        let watcher = CaptureWatcher::new(channel, WatcherConfig::default());

        let no_root: UiChangeNotification<UiNodeSnapshot> = UiChangeNotification {
            package: "com.whatsapp".into(),
            root: None,
        };
        assert!(watcher.on_ui_change(no_root).is_none());
        assert!(watcher
            .on_ui_change(notification("com.whatsapp", chat(&["hello", ""])))
            .is_none());
        assert!(watcher
            .on_ui_change(notification(
                "com.facebook.orca",
                chat(&["whatsapp selector does not match messenger"])
            ))
            .is_none());
        assert!(sub.try_recv().is_none());
    }

    #[test]
    fn each_app_uses_its_own_selector() {
        let channel = EventChannel::new();
        let watcher = CaptureWatcher::new(channel, WatcherConfig::default());

        for app in SourceApp::ALL {
            let tree = UiNodeSnapshot::container(vec![
                UiNodeSnapshot::leaf("unrelated:id/title", "Contact"),
                UiNodeSnapshot::leaf(app.message_view_id(), "ping"),
            ]);
            let event = watcher
                .on_ui_change(notification(app.package_name(), tree))
                .expect("event");
            assert_eq!(event.source_app, app);
            assert_eq!(event.text, "ping");
        }
    }

    #[test]
    fn repeated_notifications_re_emit_by_default() {
        let channel = EventChannel::new();
        let mut sub = channel.subscribe();
        let watcher = CaptureWatcher::new(channel, WatcherConfig::default());

        for _ in 0..3 {
            assert!(watcher
                .on_ui_change(notification("com.whatsapp", chat(&["same"])))
                .is_some());
        }
        let mut count = 0;
        while sub.try_recv().is_some() {
            count += 1;
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn suppress_repeats_skips_identical_text_per_app() {
        let channel = EventChannel::new();
        let watcher = CaptureWatcher::new(
            channel,
            WatcherConfig {
                suppress_repeats: true,
            },
        );

        assert!(watcher
            .on_ui_change(notification("com.whatsapp", chat(&["same"])))
            .is_some());
        assert!(watcher
            .on_ui_change(notification("com.whatsapp", chat(&["same"])))
            .is_none());
        assert!(watcher
            .on_ui_change(notification("com.whatsapp", chat(&["different"])))
            .is_some());
        assert!(watcher
            .on_ui_change(notification("com.whatsapp", chat(&["same"])))
            .is_some());
    }

    /// Platform-style handle that counts acquisitions and releases.
    struct CountingNode {
        text: Option<&'static str>,
        children: Vec<(&'static str, Option<&'static str>)>,
        acquired: Arc<AtomicUsize>,
        released: Arc<AtomicUsize>,
    }

    impl CountingNode {
        fn root(
            children: Vec<(&'static str, Option<&'static str>)>,
            acquired: &Arc<AtomicUsize>,
            released: &Arc<AtomicUsize>,
        ) -> Self {
            acquired.fetch_add(1, Ordering::SeqCst);
            Self {
                text: None,
                children,
                acquired: Arc::clone(acquired),
                released: Arc::clone(released),
            }
        }
    }

    impl UiNode for CountingNode {
        fn find_by_view_id(&self, view_id: &str) -> Vec<Self> {
            self.children
                .iter()
                .filter(|(id, _)| *id == view_id)
                .map(|(_, text)| {
                    self.acquired.fetch_add(1, Ordering::SeqCst);
                    CountingNode {
                        text: *text,
                        children: Vec::new(),
                        acquired: Arc::clone(&self.acquired),
                        released: Arc::clone(&self.released),
                    }
                })
                .collect()
        }

        fn text(&self) -> Option<String> {
            self.text.map(str::to_string)
        }

        fn release(&mut self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn every_acquired_handle_is_released_on_every_path() {
        let channel = EventChannel::new();
        let watcher = CaptureWatcher::new(channel, WatcherConfig::default());

        let cases: Vec<(&str, Vec<(&'static str, Option<&'static str>)>, bool)> = vec![
            (
                "com.whatsapp",
                vec![(WHATSAPP_MSG, Some("a")), (WHATSAPP_MSG, Some("b"))],
                true,
            ),
            ("com.whatsapp", vec![(WHATSAPP_MSG, None)], false),
            ("com.whatsapp", vec![(WHATSAPP_MSG, Some(""))], false),
            ("com.whatsapp", vec![], false),
            ("com.example.other", vec![(WHATSAPP_MSG, Some("x"))], false),
        ];

        for (package, children, expect_event) in cases {
            let acquired = Arc::new(AtomicUsize::new(0));
            let released = Arc::new(AtomicUsize::new(0));
            let root = CountingNode::root(children, &acquired, &released);

            let emitted = watcher.on_ui_change(UiChangeNotification {
                package: package.to_string(),
                root: Some(root),
            });

            assert_eq!(emitted.is_some(), expect_event, "package {package}");
            assert_eq!(
                acquired.load(Ordering::SeqCst),
                released.load(Ordering::SeqCst),
                "leaked handle for package {package}"
            );
        }
    }
}
