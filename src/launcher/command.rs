//! Static launcher command catalog.

/// Action a launcher command dispatches to the window-management boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    TileLeftHalf,
    TileRightHalf,
}

impl CommandAction {
    pub fn command_id(self) -> &'static str {
        match self {
            CommandAction::TileLeftHalf => "tile-left-half",
            CommandAction::TileRightHalf => "tile-right-half",
        }
    }

    pub fn command_title(self) -> &'static str {
        match self {
            CommandAction::TileLeftHalf => "Tile left half",
            CommandAction::TileRightHalf => "Tile right half",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LauncherCommand {
    pub id: String,
    pub title: String,
    pub keywords: Vec<String>,
    pub action: CommandAction,
}

impl LauncherCommand {
    fn for_action(action: CommandAction, keywords: &[&str]) -> Self {
        Self {
            id: action.command_id().to_string(),
            title: action.command_title().to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            action,
        }
    }
}

/// Commands available at process start; the catalog never changes afterwards.
pub fn builtin_commands() -> Vec<LauncherCommand> {
    vec![
        LauncherCommand::for_action(
            CommandAction::TileLeftHalf,
            &["tile", "left", "half", "window"],
        ),
        LauncherCommand::for_action(
            CommandAction::TileRightHalf,
            &["tile", "right", "half", "window"],
        ),
    ]
}
