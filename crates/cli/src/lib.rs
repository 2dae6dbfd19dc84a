//! Teawatch terminal dashboard
//!
//! Configuration, logging, the dashboard message loop and its ratatui
//! rendering. The binary in `main.rs` only parses flags and reports fatal
//! errors.

pub mod app;
pub mod config;
pub mod icons;
pub mod logging;
pub mod runtime;
pub mod ui;

pub use app::{Control, Dashboard, Key, Message, Settings, View};
pub use config::{Config, UiStrings};
pub use icons::Icons;
