pub mod ui_tree;
pub mod watcher;

pub use ui_tree::{NodeGuard, UiChangeNotification, UiNode, UiNodeSnapshot};
pub use watcher::{CaptureWatcher, WatcherConfig};
