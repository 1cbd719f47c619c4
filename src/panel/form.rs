//! Model of the webview's form script.
//!
//! The markup in `assets/settings.html` is the rendered form. This module
//! mirrors what its script does: it fills controls from a snapshot and turns
//! control changes into `updateSetting` messages.

use std::collections::BTreeMap;

use crate::config::{SettingValue, EXPORTER_TYPES};
use crate::panel::protocol::InboundMessage;
use crate::panel::snapshot::SettingsSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Checkbox,
    Text,
    Select(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormControl {
    /// Element id, identical to the setting key it edits.
    pub id: &'static str,
    pub kind: ControlKind,
}

const fn checkbox(id: &'static str) -> FormControl {
    FormControl {
        id,
        kind: ControlKind::Checkbox,
    }
}

const fn text(id: &'static str) -> FormControl {
    FormControl {
        id,
        kind: ControlKind::Text,
    }
}

/// Controls in document order.
pub const FORM_CONTROLS: &[FormControl] = &[
    checkbox("browser.headless"),
    checkbox("browser.persistent"),
    checkbox("browser.useSystemBrowser"),
    text("browser.userDataDir"),
    text("browser.executablePath"),
    text("browser.locale"),
    checkbox("opentelemetry.enable"),
    text("opentelemetry.serviceName"),
    FormControl {
        id: "opentelemetry.exporterType",
        kind: ControlKind::Select(EXPORTER_TYPES),
    },
    text("opentelemetry.exporterUrl"),
    text("opentelemetry.exporterHeaders"),
    checkbox("bedrock.enable"),
    text("aws.region"),
    text("aws.profile"),
    text("bedrock.imageModelId"),
    text("bedrock.textModelId"),
    text("bedrock.visionModelId"),
    text("figma.accessToken"),
    text("figma.apiBaseUrl"),
];

pub fn control(id: &str) -> Option<&'static FormControl> {
    FORM_CONTROLS.iter().find(|c| c.id == id)
}

/// What a control currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlValue {
    Checked(bool),
    Text(String),
}

impl ControlValue {
    fn into_setting(self) -> SettingValue {
        match self {
            Self::Checked(b) => SettingValue::Bool(b),
            Self::Text(s) => SettingValue::String(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    values: BTreeMap<&'static str, ControlValue>,
}

impl Default for FormState {
    /// The markup's initial state, before any snapshot arrives.
    fn default() -> Self {
        let values = FORM_CONTROLS
            .iter()
            .map(|c| {
                let value = match c.kind {
                    ControlKind::Checkbox => ControlValue::Checked(c.id == "browser.headless"),
                    ControlKind::Text => ControlValue::Text(String::new()),
                    ControlKind::Select(options) => {
                        ControlValue::Text(options.first().copied().unwrap_or_default().to_string())
                    }
                };
                (c.id, value)
            })
            .collect();
        Self { values }
    }
}

impl FormState {
    pub fn value(&self, id: &str) -> Option<&ControlValue> {
        self.values.get(id)
    }

    pub fn is_checked(&self, id: &str) -> bool {
        matches!(self.values.get(id), Some(ControlValue::Checked(true)))
    }

    pub fn text(&self, id: &str) -> Option<&str> {
        match self.values.get(id) {
            Some(ControlValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Mirrors every control from `snapshot`. Checkboxes take the value's
    /// truthiness, text inputs fall back to empty and selects to `none`.
    pub fn apply_snapshot(&mut self, snapshot: &SettingsSnapshot) {
        for c in FORM_CONTROLS {
            let setting = snapshot.lookup(c.id);
            let value = match c.kind {
                ControlKind::Checkbox => {
                    ControlValue::Checked(setting.is_some_and(SettingValue::is_truthy))
                }
                ControlKind::Text => ControlValue::Text(or_fallback(setting, "")),
                ControlKind::Select(_) => ControlValue::Text(or_fallback(setting, "none")),
            };
            self.values.insert(c.id, value);
        }
    }

    /// Applies a user edit and returns the message the change listener posts.
    /// Returns `None` for ids the form does not contain.
    pub fn change(&mut self, id: &str, value: ControlValue) -> Option<InboundMessage> {
        let c = control(id)?;
        self.values.insert(c.id, value.clone());
        Some(InboundMessage::UpdateSetting {
            key: c.id.to_string(),
            value: value.into_setting(),
        })
    }
}

fn or_fallback(setting: Option<&SettingValue>, fallback: &str) -> String {
    match setting {
        Some(value) if value.is_truthy() => value.to_string(),
        _ => fallback.to_string(),
    }
}
