//! Commands the extension contributes.

use anyhow::{bail, Result};

use crate::config::{ConfigurationChangeEvent, ConfigurationStore, ConfigurationTarget, ENABLE_KEY};
use crate::host::Workbench;

/// Publisher-qualified identifier used to filter the host settings UI.
pub const EXTENSION_ID: &str = "serkan-ozal.browser-devtools-mcp";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionCommand {
    ToggleExtension,
    OpenSettings,
    RestartServer,
}

impl ExtensionCommand {
    pub const ALL: [ExtensionCommand; 3] = [
        ExtensionCommand::ToggleExtension,
        ExtensionCommand::OpenSettings,
        ExtensionCommand::RestartServer,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::ToggleExtension => "browserDevtoolsMcp.toggleExtension",
            Self::OpenSettings => "browserDevtoolsMcp.openSettings",
            Self::RestartServer => "browserDevtoolsMcp.restartServer",
        }
    }

    pub fn from_id(id: &str) -> Result<Self> {
        match Self::ALL.into_iter().find(|c| c.id() == id) {
            Some(command) => Ok(command),
            None => bail!("unknown command {id}"),
        }
    }
}

/// Flips the master enable flag in the global scope.
pub fn toggle_extension(store: &mut dyn ConfigurationStore) -> Result<ConfigurationChangeEvent> {
    let enabled = store.get_bool(ENABLE_KEY, true);
    log::info!("toggling browser devtools: {} -> {}", enabled, !enabled);
    store.update(ENABLE_KEY, (!enabled).into(), ConfigurationTarget::Global)
}

pub fn open_settings(workbench: &mut dyn Workbench) {
    workbench.open_settings(&format!("@ext:{EXTENSION_ID}"));
}

/// Only notifies. The host owns the server process and picks up new
/// settings when the MCP session restarts.
pub fn restart_server(workbench: &mut dyn Workbench) {
    workbench.show_information_message("Browser DevTools MCP: Restarting server...");
    workbench.show_information_message(
        "Browser DevTools MCP: Server configuration updated. Please restart the MCP session.",
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JsonSettings;
    use crate::testing::RecordingWorkbench;

    #[test]
    fn ids_round_trip() {
        for command in ExtensionCommand::ALL {
            assert_eq!(ExtensionCommand::from_id(command.id()).unwrap(), command);
        }
        assert!(ExtensionCommand::from_id("browserDevtoolsMcp.nope").is_err());
    }

    #[test]
    fn toggle_flips_enable() {
        let mut store = JsonSettings::new();
        let event = toggle_extension(&mut store).unwrap();
        assert!(event.affects_configuration("browserDevtoolsMcp.enable"));
        assert!(!store.get_bool(ENABLE_KEY, true));

        toggle_extension(&mut store).unwrap();
        assert!(store.get_bool(ENABLE_KEY, false));
    }

    #[test]
    fn restart_only_notifies() {
        let mut workbench = RecordingWorkbench::default();
        restart_server(&mut workbench);
        assert_eq!(workbench.messages.len(), 2);
        assert!(workbench.messages[1].contains("restart the MCP session"));
        assert!(workbench.opened_settings.is_empty());
    }

    #[test]
    fn open_settings_filters_to_extension() {
        let mut workbench = RecordingWorkbench::default();
        open_settings(&mut workbench);
        assert_eq!(
            workbench.opened_settings,
            vec!["@ext:serkan-ozal.browser-devtools-mcp".to_string()]
        );
    }
}
