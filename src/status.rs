use crate::commands::ExtensionCommand;

/// Status bar entry reflecting the enable flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBarItem {
    pub text: String,
    pub tooltip: String,
    pub warning_background: bool,
    pub command: ExtensionCommand,
}

impl StatusBarItem {
    pub fn for_state(enabled: bool) -> Self {
        if enabled {
            Self {
                text: "$(globe) Browser DevTools".to_string(),
                tooltip: "Browser DevTools MCP is enabled. Click to disable.".to_string(),
                warning_background: false,
                command: ExtensionCommand::ToggleExtension,
            }
        } else {
            Self {
                text: "$(circle-slash) Browser DevTools".to_string(),
                tooltip: "Browser DevTools MCP is disabled. Click to enable.".to_string(),
                warning_background: true,
                command: ExtensionCommand::ToggleExtension,
            }
        }
    }
}
