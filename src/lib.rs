pub mod config;
pub mod db;
pub mod keyboard;
pub mod launcher;

pub use config::SettingsStore;
pub use db::Database;
pub use keyboard::{KeyPressStore, KeyboardMonitor, PressAggregator};
pub use launcher::LauncherController;
