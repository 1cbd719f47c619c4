//! In-memory host surfaces for tests.

use anyhow::Result;

use crate::host::{Webview, WebviewOptions, Workbench};
use crate::panel::protocol::OutboundMessage;
use crate::status::StatusBarItem;

#[derive(Debug, Default)]
pub struct RecordingWebview {
    pub options: Option<WebviewOptions>,
    pub html: Option<String>,
    pub posted: Vec<OutboundMessage>,
}

impl Webview for RecordingWebview {
    fn set_options(&mut self, options: WebviewOptions) {
        self.options = Some(options);
    }

    fn set_html(&mut self, html: String) {
        self.html = Some(html);
    }

    fn post_message(&mut self, message: &OutboundMessage) -> Result<()> {
        self.posted.push(message.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingWorkbench {
    pub messages: Vec<String>,
    pub opened_settings: Vec<String>,
    pub status_bar: Vec<StatusBarItem>,
}

impl Workbench for RecordingWorkbench {
    fn show_information_message(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }

    fn open_settings(&mut self, query: &str) {
        self.opened_settings.push(query.to_string());
    }

    fn update_status_bar(&mut self, item: &StatusBarItem) {
        self.status_bar.push(item.clone());
    }
}
