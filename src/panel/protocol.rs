//! Messages exchanged between the extension and the settings webview.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::SettingValue;
use crate::panel::snapshot::SettingsSnapshot;

/// Posted by the webview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InboundMessage {
    GetSettings,
    UpdateSetting { key: String, value: SettingValue },
    OpenSettings,
}

impl InboundMessage {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).with_context(|| format!("invalid panel message: {text}"))
    }
}

/// Posted to the webview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboundMessage {
    Settings { settings: SettingsSnapshot },
}

impl OutboundMessage {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("serializing panel message failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_inbound_variants() {
        assert_eq!(
            InboundMessage::from_json(r#"{"type":"getSettings"}"#).unwrap(),
            InboundMessage::GetSettings
        );
        assert_eq!(
            InboundMessage::from_json(r#"{"type":"openSettings"}"#).unwrap(),
            InboundMessage::OpenSettings
        );
        assert_eq!(
            InboundMessage::from_json(
                r#"{"type":"updateSetting","key":"browser.headless","value":false}"#
            )
            .unwrap(),
            InboundMessage::UpdateSetting {
                key: "browser.headless".to_string(),
                value: SettingValue::Bool(false),
            }
        );
    }

    #[test]
    fn rejects_unknown_and_compound_values() {
        assert!(InboundMessage::from_json(r#"{"type":"reboot"}"#).is_err());
        assert!(InboundMessage::from_json(
            r#"{"type":"updateSetting","key":"aws.region","value":{"a":1}}"#
        )
        .is_err());
    }

    #[test]
    fn outbound_is_tagged() {
        let message = OutboundMessage::Settings {
            settings: SettingsSnapshot::default(),
        };
        let value: serde_json::Value = serde_json::from_str(&message.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], json!("settings"));
        assert!(value["settings"]["browser"].is_object());
        assert!(value["settings"]["figma"].is_object());
    }
}
