//! Surfaces the host editor provides. Every component receives these
//! explicitly; nothing here is global.

use std::path::PathBuf;

use anyhow::Result;

use crate::panel::protocol::OutboundMessage;
use crate::status::StatusBarItem;

/// Rendering options for the settings webview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebviewOptions {
    pub enable_scripts: bool,
    pub local_resource_roots: Vec<PathBuf>,
}

/// The panel's rendering surface and message channel.
pub trait Webview {
    fn set_options(&mut self, options: WebviewOptions);
    fn set_html(&mut self, html: String);
    fn post_message(&mut self, message: &OutboundMessage) -> Result<()>;
}

/// Editor chrome: notifications, the native settings UI, the status bar.
pub trait Workbench {
    fn show_information_message(&mut self, message: &str);

    /// Opens the host's settings UI filtered by `query`.
    fn open_settings(&mut self, query: &str);

    fn update_status_bar(&mut self, item: &StatusBarItem);
}
