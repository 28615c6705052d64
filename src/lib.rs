//! ToneLens: watches the foreground messaging app, analyzes the tone of the
//! latest incoming message and shows the result in a floating overlay.
//!
//! The library builds without a window system. The `desktop` feature adds
//! the Tauri shell and its `run()` entry point.

pub mod analysis;
pub mod capture;
pub mod events;
pub mod feedback;
pub mod models;
pub mod overlay;
pub mod service;
pub mod settings;
pub mod utils;

#[cfg(feature = "desktop")]
mod desktop;

#[cfg(feature = "desktop")]
pub use desktop::run;

pub use service::ToneService;
