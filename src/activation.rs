//! Extension lifecycle.
//!
//! [`Activation`] owns everything the extension keeps between host callbacks.
//! The host creates it with [`Activation::activate`], routes each callback
//! through it one at a time and ends it with [`Activation::deactivate`].

use std::path::PathBuf;

use anyhow::Result;

use crate::commands::{self, ExtensionCommand};
use crate::config::{
    qualified_key, ConfigurationChangeEvent, ConfigurationStore, CONFIG_NAMESPACE, ENABLE_KEY,
};
use crate::env::{ServerDefinition, ServerDefinitionProvider};
use crate::host::{Webview, Workbench};
use crate::panel::{InboundMessage, SettingsPanel};
use crate::status::StatusBarItem;

/// What the host tells the extension about itself at activation.
#[derive(Debug, Clone)]
pub struct ExtensionContext {
    /// Install directory, the root of bundled resources.
    pub extension_path: PathBuf,
}

pub struct Activation<S, W> {
    store: S,
    provider: ServerDefinitionProvider,
    panel: SettingsPanel<W>,
    status_bar: StatusBarItem,
}

impl<S: ConfigurationStore, W: Webview> Activation<S, W> {
    pub fn activate(context: ExtensionContext, store: S, workbench: &mut dyn Workbench) -> Self {
        log::info!("activating browser devtools extension");

        let status_bar = StatusBarItem::for_state(store.get_bool(ENABLE_KEY, true));
        workbench.update_status_bar(&status_bar);

        let activation = Self {
            provider: ServerDefinitionProvider::new(&context.extension_path),
            panel: SettingsPanel::new(&context.extension_path),
            store,
            status_bar,
        };
        log::info!("browser devtools extension activated");
        activation
    }

    /// Ends the activation and hands the store back to the host.
    pub fn deactivate(self) -> S {
        log::info!("browser devtools extension deactivated");
        self.store
    }

    pub fn with_provider(mut self, provider: ServerDefinitionProvider) -> Self {
        self.provider = provider;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Direct access for changes made outside the extension. Route the
    /// resulting event through [`Activation::configuration_changed`].
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn panel(&self) -> &SettingsPanel<W> {
        &self.panel
    }

    pub fn status_bar(&self) -> &StatusBarItem {
        &self.status_bar
    }

    /// Server definitions for the host's provider query.
    pub fn server_definitions<I>(&self, inherited: I) -> Vec<ServerDefinition>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.provider.server_definitions(&self.store, inherited)
    }

    pub fn resolve_panel(&mut self, webview: W) -> Result<()> {
        self.panel.resolve(webview, &self.store)
    }

    pub fn handle_panel_message(
        &mut self,
        message: InboundMessage,
        workbench: &mut dyn Workbench,
    ) -> Result<()> {
        let event = self
            .panel
            .handle_message(message, &mut self.store, workbench)?;
        match event {
            Some(event) => self.configuration_changed(&event, workbench),
            None => Ok(()),
        }
    }

    pub fn execute_command(
        &mut self,
        command: ExtensionCommand,
        workbench: &mut dyn Workbench,
    ) -> Result<()> {
        log::debug!("executing {}", command.id());
        match command {
            ExtensionCommand::ToggleExtension => {
                let event = commands::toggle_extension(&mut self.store)?;
                self.configuration_changed(&event, workbench)
            }
            ExtensionCommand::OpenSettings => {
                commands::open_settings(workbench);
                Ok(())
            }
            ExtensionCommand::RestartServer => {
                commands::restart_server(workbench);
                Ok(())
            }
        }
    }

    /// Reacts to a change that already landed in the store: status bar,
    /// notice, then a panel refresh.
    pub fn configuration_changed(
        &mut self,
        event: &ConfigurationChangeEvent,
        workbench: &mut dyn Workbench,
    ) -> Result<()> {
        if !event.affects_configuration(CONFIG_NAMESPACE) {
            return Ok(());
        }

        if event.affects_configuration(&qualified_key(ENABLE_KEY)) {
            let enabled = self.store.get_bool(ENABLE_KEY, true);
            self.status_bar = StatusBarItem::for_state(enabled);
            workbench.update_status_bar(&self.status_bar);
            workbench.show_information_message(&format!(
                "Browser DevTools MCP: Extension {}. Restart the MCP session to apply changes.",
                if enabled { "enabled" } else { "disabled" }
            ));
        } else {
            workbench.show_information_message(
                "Browser DevTools MCP: Settings changed. Restart the MCP session to apply changes.",
            );
        }

        self.panel.on_configuration_changed(event, &self.store)
    }
}
