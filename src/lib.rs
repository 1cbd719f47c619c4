// src/lib.rs
pub mod activation;
pub mod commands;
pub mod config;
pub mod env;
pub mod host;
pub mod panel;
pub mod status;

#[cfg(test)]
mod testing;

use zed_extension_api as zed;
use zed::settings::ContextServerSettings;
use zed::{Command, ContextServerId, Project, Result};

use crate::config::JsonSettings;
use crate::env::{ServerDefinitionProvider, SERVER_LABEL, SERVER_PACKAGE};

pub const CONTEXT_SERVER_ID: &str = SERVER_LABEL;

struct BrowserDevtoolsExtension {
    installed_version: Option<String>,
}

impl BrowserDevtoolsExtension {
    /// Installs or updates the server package in the extension work
    /// directory, once per session.
    fn ensure_server_package(&mut self) -> Result<()> {
        if self.installed_version.is_some() {
            return Ok(());
        }

        let installed = zed::npm_package_installed_version(SERVER_PACKAGE)?;
        let version = match zed::npm_package_latest_version(SERVER_PACKAGE) {
            Ok(latest) => {
                if installed.as_deref() != Some(latest.as_str()) {
                    log::info!("installing {SERVER_PACKAGE}@{latest}");
                    zed::npm_install_package(SERVER_PACKAGE, &latest)
                        .map_err(|e| format!("failed to install {SERVER_PACKAGE}: {e}"))?;
                }
                latest
            }
            // Offline: keep whatever is already there.
            Err(e) => match installed {
                Some(version) => {
                    log::warn!("could not check {SERVER_PACKAGE} for updates: {e}");
                    version
                }
                None => return Err(format!("failed to resolve {SERVER_PACKAGE}: {e}")),
            },
        };

        self.installed_version = Some(version);
        Ok(())
    }
}

impl zed::Extension for BrowserDevtoolsExtension {
    fn new() -> Self {
        BrowserDevtoolsExtension {
            installed_version: None,
        }
    }

    fn context_server_command(
        &mut self,
        context_server_id: &ContextServerId,
        project: &Project,
    ) -> Result<Command> {
        // Only respond to our specific context server ID
        if context_server_id.as_ref() != CONTEXT_SERVER_ID {
            return Err("unknown context server".into());
        }

        let server_settings = ContextServerSettings::for_project(CONTEXT_SERVER_ID, project)?;
        let store = server_settings
            .settings
            .as_ref()
            .map(JsonSettings::from_json)
            .unwrap_or_default();

        let extension_path = std::env::current_dir()
            .map_err(|e| format!("failed to resolve extension directory: {e}"))?;
        let provider = ServerDefinitionProvider::new(extension_path);
        let Some(mut definition) = provider
            .server_definitions(&store, std::env::vars())
            .into_iter()
            .next()
        else {
            return Err(format!("{CONTEXT_SERVER_ID} context server is disabled"));
        };

        self.ensure_server_package()?;
        definition.command = zed::node_binary_path()?;

        let env = definition.env_pairs();
        Ok(Command {
            command: definition.command,
            args: definition.args,
            env,
        })
    }
}

zed::register_extension!(BrowserDevtoolsExtension);
