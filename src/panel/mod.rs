//! Sidebar settings panel.
//!
//! The panel renders [`MARKUP`] in a host webview and keeps it in sync with the
//! configuration store: snapshots go out, edits come back as
//! [`InboundMessage::UpdateSetting`] and are written to the global scope.

pub mod form;
pub mod protocol;
pub mod snapshot;

use std::path::PathBuf;

use anyhow::{bail, Result};

use crate::commands;
use crate::config::{
    ConfigurationChangeEvent, ConfigurationStore, ConfigurationTarget, CONFIG_NAMESPACE,
};
use crate::host::{Webview, WebviewOptions, Workbench};

pub use protocol::{InboundMessage, OutboundMessage};
pub use snapshot::SettingsSnapshot;

pub const VIEW_TYPE: &str = "browserDevtoolsMcp.settingsView";

/// Static form markup installed into the webview.
pub const MARKUP: &str = include_str!("../../assets/settings.html");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    Uninitialized,
    Active,
}

pub struct SettingsPanel<W> {
    extension_root: PathBuf,
    view: Option<W>,
}

impl<W: Webview> SettingsPanel<W> {
    pub fn new(extension_root: impl Into<PathBuf>) -> Self {
        Self {
            extension_root: extension_root.into(),
            view: None,
        }
    }

    pub fn state(&self) -> PanelState {
        match self.view {
            Some(_) => PanelState::Active,
            None => PanelState::Uninitialized,
        }
    }

    pub fn view(&self) -> Option<&W> {
        self.view.as_ref()
    }

    /// Takes ownership of the host webview, renders the form and pushes the
    /// first snapshot. Happens once per panel.
    pub fn resolve(&mut self, mut webview: W, store: &dyn ConfigurationStore) -> Result<()> {
        if self.view.is_some() {
            bail!("{VIEW_TYPE} is already resolved");
        }

        webview.set_options(WebviewOptions {
            enable_scripts: true,
            local_resource_roots: vec![self.extension_root.clone()],
        });
        webview.set_html(MARKUP.to_string());
        self.view = Some(webview);
        log::debug!("{VIEW_TYPE} resolved");

        self.push_settings(store)
    }

    /// Handles one message from the webview. Returns the change event when
    /// the message wrote to the store.
    pub fn handle_message(
        &mut self,
        message: InboundMessage,
        store: &mut dyn ConfigurationStore,
        workbench: &mut dyn Workbench,
    ) -> Result<Option<ConfigurationChangeEvent>> {
        match message {
            InboundMessage::GetSettings => {
                self.push_settings(store)?;
                Ok(None)
            }
            InboundMessage::UpdateSetting { key, value } => {
                log::debug!("panel update {key} = {value}");
                let event = store.update(&key, value, ConfigurationTarget::Global)?;
                Ok(Some(event))
            }
            InboundMessage::OpenSettings => {
                commands::open_settings(workbench);
                Ok(None)
            }
        }
    }

    /// Full refresh when anything in the namespace changed.
    pub fn on_configuration_changed(
        &mut self,
        event: &ConfigurationChangeEvent,
        store: &dyn ConfigurationStore,
    ) -> Result<()> {
        if event.affects_configuration(CONFIG_NAMESPACE) {
            self.push_settings(store)?;
        }
        Ok(())
    }

    /// Sends the current snapshot. No-op until resolved.
    pub fn push_settings(&mut self, store: &dyn ConfigurationStore) -> Result<()> {
        let Some(view) = self.view.as_mut() else {
            return Ok(());
        };
        view.post_message(&OutboundMessage::Settings {
            settings: SettingsSnapshot::from_store(store),
        })
    }
}
