pub mod command;
pub mod controller;
pub mod fuzzy;
pub mod usage;

pub use command::{builtin_commands, CommandAction, LauncherCommand};
pub use controller::LauncherController;
pub use fuzzy::MatchResult;
pub use usage::UsageStore;
