//! Setting declarations and the configuration stores the extension reads from.
//!
//! Keys are dotted and relative to [`CONFIG_NAMESPACE`]. A store holds two
//! layers, global and workspace. Reads fall through workspace, then global, then
//! the declared default.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const CONFIG_NAMESPACE: &str = "browserDevtoolsMcp";

/// Master switch. When false no server definition is offered.
pub const ENABLE_KEY: &str = "enable";

pub const EXPORTER_TYPES: &[&str] = &["none", "console", "otlp/http"];
pub const PLATFORMS: &[&str] = &["browser", "node"];

/// A single configuration value, as stored by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl SettingValue {
    /// Converts a scalar JSON value. Arrays and objects have no setting form.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::Null),
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => Some(Self::Number(n.clone())),
            Value::String(s) => Some(Self::String(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::String(s) => Value::String(s.clone()),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The string handed to the server process, or `None` when the value
    /// should not appear in its environment at all.
    pub fn to_env_value(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::String(s) if s.is_empty() => None,
            other => Some(other.to_string()),
        }
    }

    /// Truthiness as the webview script sees it.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
            Self::String(s) => !s.is_empty(),
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    Boolean,
    String,
    Enum(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    Bool(bool),
    Str(&'static str),
}

/// Storage scope a write lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigurationTarget {
    Global,
    Workspace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingDeclaration {
    pub key: &'static str,
    pub kind: SettingKind,
    pub default: DefaultValue,
    pub target: ConfigurationTarget,
}

impl SettingDeclaration {
    const fn boolean(key: &'static str, default: bool) -> Self {
        Self {
            key,
            kind: SettingKind::Boolean,
            default: DefaultValue::Bool(default),
            target: ConfigurationTarget::Global,
        }
    }

    const fn string(key: &'static str) -> Self {
        Self {
            key,
            kind: SettingKind::String,
            default: DefaultValue::Str(""),
            target: ConfigurationTarget::Global,
        }
    }

    const fn choice(
        key: &'static str,
        options: &'static [&'static str],
        default: &'static str,
    ) -> Self {
        Self {
            key,
            kind: SettingKind::Enum(options),
            default: DefaultValue::Str(default),
            target: ConfigurationTarget::Global,
        }
    }

    pub fn default_value(&self) -> SettingValue {
        match self.default {
            DefaultValue::Bool(b) => SettingValue::Bool(b),
            DefaultValue::Str(s) => SettingValue::String(s.to_string()),
        }
    }
}

/// Every setting the extension contributes.
pub const SETTINGS: &[SettingDeclaration] = &[
    SettingDeclaration::boolean(ENABLE_KEY, true),
    SettingDeclaration::boolean("browser.headless", true),
    SettingDeclaration::boolean("browser.persistent", false),
    SettingDeclaration::string("browser.userDataDir"),
    SettingDeclaration::boolean("browser.useSystemBrowser", false),
    SettingDeclaration::string("browser.executablePath"),
    SettingDeclaration::string("browser.locale"),
    SettingDeclaration::choice("platform", PLATFORMS, "browser"),
    SettingDeclaration::string("node.inspectorHost"),
    SettingDeclaration::boolean("opentelemetry.enable", false),
    SettingDeclaration::string("opentelemetry.serviceName"),
    SettingDeclaration::choice("opentelemetry.exporterType", EXPORTER_TYPES, "none"),
    SettingDeclaration::string("opentelemetry.exporterUrl"),
    SettingDeclaration::string("opentelemetry.exporterHeaders"),
    SettingDeclaration::string("aws.region"),
    SettingDeclaration::string("aws.profile"),
    SettingDeclaration::boolean("bedrock.enable", false),
    SettingDeclaration::string("bedrock.imageModelId"),
    SettingDeclaration::string("bedrock.textModelId"),
    SettingDeclaration::string("bedrock.visionModelId"),
    SettingDeclaration::string("figma.accessToken"),
    SettingDeclaration::string("figma.apiBaseUrl"),
];

pub fn declaration(key: &str) -> Option<&'static SettingDeclaration> {
    SETTINGS.iter().find(|d| d.key == key)
}

/// Fully qualified form of a namespace-relative key.
pub fn qualified_key(key: &str) -> String {
    format!("{CONFIG_NAMESPACE}.{key}")
}

/// Read and write access to the extension's settings.
pub trait ConfigurationStore {
    /// Value stored for `key` in exactly one scope, without defaults.
    fn inspect(&self, key: &str, target: ConfigurationTarget) -> Option<SettingValue>;

    /// Stores `value` and reports which keys actually changed.
    fn update(
        &mut self,
        key: &str,
        value: SettingValue,
        target: ConfigurationTarget,
    ) -> Result<ConfigurationChangeEvent>;

    /// Effective value of `key`. A stored `null` is returned as is and does
    /// not fall back to the default.
    fn get(&self, key: &str) -> Option<SettingValue> {
        self.inspect(key, ConfigurationTarget::Workspace)
            .or_else(|| self.inspect(key, ConfigurationTarget::Global))
            .or_else(|| declaration(key).map(SettingDeclaration::default_value))
    }

    fn get_bool(&self, key: &str, fallback: bool) -> bool {
        self.get(key)
            .and_then(|v| v.as_bool())
            .unwrap_or(fallback)
    }
}

/// Keys touched by a configuration write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationChangeEvent {
    keys: BTreeSet<String>,
}

impl ConfigurationChangeEvent {
    pub fn for_key(key: &str) -> Self {
        let mut event = Self::default();
        event.insert(key);
        event
    }

    /// Records a namespace-relative key as changed.
    pub fn insert(&mut self, key: &str) {
        self.keys.insert(qualified_key(key));
    }

    pub fn merge(&mut self, other: ConfigurationChangeEvent) {
        self.keys.extend(other.keys);
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Fully qualified keys, in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    /// True when a changed key equals `section`, lies beneath it, or is one of
    /// its parents.
    pub fn affects_configuration(&self, section: &str) -> bool {
        self.keys
            .iter()
            .any(|key| is_within(key, section) || is_within(section, key))
    }
}

fn is_within(key: &str, section: &str) -> bool {
    match key.strip_prefix(section) {
        Some(rest) => rest.is_empty() || rest.starts_with('.'),
        None => false,
    }
}

/// In-memory store backed by JSON objects.
///
/// Accepts both nested sections (`{"browser": {"headless": true}}`) and flat
/// dotted keys (`{"browser.headless": true}`). Keys may also carry the
/// namespace prefix, as they do in a host-wide settings file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonSettings {
    global: BTreeMap<String, SettingValue>,
    workspace: BTreeMap<String, SettingValue>,
}

impl JsonSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Global layer built from a JSON document.
    pub fn from_json(value: &Value) -> Self {
        Self {
            global: flatten(value),
            workspace: BTreeMap::new(),
        }
    }

    /// True when neither layer stores anything.
    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.workspace.is_empty()
    }

    pub fn with_workspace(mut self, value: &Value) -> Self {
        self.workspace = flatten(value);
        self
    }

    /// Global layer as a flat JSON object.
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .global
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect();
        Value::Object(map)
    }

    /// Keys whose stored value differs between `self` and `other` in either layer.
    pub fn diff(&self, other: &JsonSettings) -> ConfigurationChangeEvent {
        let mut event = ConfigurationChangeEvent::default();
        for (ours, theirs) in [
            (&self.global, &other.global),
            (&self.workspace, &other.workspace),
        ] {
            for key in ours.keys().chain(theirs.keys()) {
                if ours.get(key) != theirs.get(key) {
                    event.insert(key);
                }
            }
        }
        event
    }

    fn layer(&self, target: ConfigurationTarget) -> &BTreeMap<String, SettingValue> {
        match target {
            ConfigurationTarget::Global => &self.global,
            ConfigurationTarget::Workspace => &self.workspace,
        }
    }

    fn layer_mut(&mut self, target: ConfigurationTarget) -> &mut BTreeMap<String, SettingValue> {
        match target {
            ConfigurationTarget::Global => &mut self.global,
            ConfigurationTarget::Workspace => &mut self.workspace,
        }
    }
}

impl ConfigurationStore for JsonSettings {
    fn inspect(&self, key: &str, target: ConfigurationTarget) -> Option<SettingValue> {
        self.layer(target).get(key).cloned()
    }

    fn update(
        &mut self,
        key: &str,
        value: SettingValue,
        target: ConfigurationTarget,
    ) -> Result<ConfigurationChangeEvent> {
        if declaration(key).is_none() {
            log::debug!("writing undeclared setting {key}");
        }
        let previous = self.layer_mut(target).insert(key.to_string(), value.clone());
        if previous.as_ref() == Some(&value) {
            return Ok(ConfigurationChangeEvent::default());
        }
        Ok(ConfigurationChangeEvent::for_key(key))
    }
}

fn flatten(value: &Value) -> BTreeMap<String, SettingValue> {
    let mut out = BTreeMap::new();
    match value {
        Value::Object(map) => flatten_into("", map, &mut out),
        Value::Null => {}
        other => log::warn!("ignoring non-object settings document: {other}"),
    }
    out
}

fn flatten_into(prefix: &str, map: &Map<String, Value>, out: &mut BTreeMap<String, SettingValue>) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        if let Value::Object(nested) = value {
            flatten_into(&path, nested, out);
            continue;
        }
        let path = match path.strip_prefix(CONFIG_NAMESPACE) {
            Some(rest) if rest.starts_with('.') => rest[1..].to_string(),
            _ => path,
        };
        match SettingValue::from_json(value) {
            Some(setting) => {
                out.insert(path, setting);
            }
            None => log::warn!("ignoring setting {path}: arrays are not supported"),
        }
    }
}

/// Global settings persisted as a JSON file.
#[derive(Debug)]
pub struct SettingsFile {
    path: PathBuf,
    settings: JsonSettings,
}

impl SettingsFile {
    /// Opens `path`. A missing file is treated as empty and created on the
    /// first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let settings = read_settings(&path)?.unwrap_or_default();
        Ok(Self { path, settings })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &JsonSettings {
        &self.settings
    }

    /// Re-reads the file and reports which keys differ from what was loaded.
    ///
    /// An empty file replacing a non-empty one is taken as a write in
    /// progress: the loaded settings are kept and no change is reported.
    pub fn reload(&mut self) -> Result<ConfigurationChangeEvent> {
        let fresh = match read_settings(&self.path)? {
            Some(fresh) => fresh,
            None if !self.settings.is_empty() => {
                log::debug!(
                    "{} is empty, keeping loaded settings",
                    self.path.display()
                );
                return Ok(ConfigurationChangeEvent::default());
            }
            None => JsonSettings::new(),
        };
        let event = self.settings.diff(&fresh);
        self.settings = fresh;
        Ok(event)
    }

    /// Writes a sibling temp file and renames it over the target, so readers
    /// never see a truncated document.
    fn save(&self) -> Result<()> {
        let mut text = serde_json::to_string_pretty(&self.settings.to_json())
            .context("serializing settings failed")?;
        text.push('\n');

        let mut temp_name = self.path.file_name().unwrap_or_default().to_os_string();
        temp_name.push(".tmp");
        let temp_file = self.path.with_file_name(temp_name);

        fs::write(&temp_file, text)
            .with_context(|| format!("writing settings to {} failed", temp_file.display()))?;
        if let Err(e) = fs::rename(&temp_file, &self.path) {
            fs::remove_file(&temp_file).ok();
            return Err(e).with_context(|| {
                format!("moving settings into {} failed", self.path.display())
            });
        }
        Ok(())
    }
}

impl ConfigurationStore for SettingsFile {
    fn inspect(&self, key: &str, target: ConfigurationTarget) -> Option<SettingValue> {
        self.settings.inspect(key, target)
    }

    fn update(
        &mut self,
        key: &str,
        value: SettingValue,
        target: ConfigurationTarget,
    ) -> Result<ConfigurationChangeEvent> {
        if target == ConfigurationTarget::Workspace {
            bail!(
                "{} only holds global settings, cannot write workspace value for {key}",
                self.path.display()
            );
        }
        let event = self.settings.update(key, value, target)?;
        if !event.is_empty() {
            self.save()?;
        }
        Ok(event)
    }
}

/// `None` when the file exists but holds no document yet.
fn read_settings(path: &Path) -> Result<Option<JsonSettings>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Some(JsonSettings::new())),
        Err(e) => {
            return Err(e).with_context(|| format!("reading {} failed", path.display()));
        }
    };
    if text.trim().is_empty() {
        return Ok(None);
    }
    let document: Value = serde_json::from_str(&text)
        .with_context(|| format!("parsing {} failed", path.display()))?;
    Ok(Some(JsonSettings::from_json(&document)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_nested_flat_and_prefixed_keys() {
        let settings = JsonSettings::from_json(&json!({
            "browser": { "headless": false },
            "aws.region": "eu-west-1",
            "browserDevtoolsMcp.figma.accessToken": "figd_1"
        }));

        assert_eq!(settings.get("browser.headless"), Some(SettingValue::Bool(false)));
        assert_eq!(settings.get("aws.region"), Some("eu-west-1".into()));
        assert_eq!(settings.get("figma.accessToken"), Some("figd_1".into()));
    }

    #[test]
    fn falls_back_to_declared_default() {
        let settings = JsonSettings::new();
        assert_eq!(settings.get(ENABLE_KEY), Some(SettingValue::Bool(true)));
        assert_eq!(
            settings.get("opentelemetry.exporterType"),
            Some("none".into())
        );
        assert_eq!(settings.get("not.declared"), None);
    }

    #[test]
    fn stored_null_does_not_fall_back() {
        let settings = JsonSettings::from_json(&json!({ "browser.headless": null }));
        assert_eq!(settings.get("browser.headless"), Some(SettingValue::Null));
    }

    #[test]
    fn workspace_layer_wins_over_global() {
        let settings = JsonSettings::from_json(&json!({ "aws.profile": "global" }))
            .with_workspace(&json!({ "aws": { "profile": "project" } }));
        assert_eq!(settings.get("aws.profile"), Some("project".into()));
        assert_eq!(
            settings.inspect("aws.profile", ConfigurationTarget::Global),
            Some("global".into())
        );
    }

    #[test]
    fn arrays_are_skipped() {
        let settings = JsonSettings::from_json(&json!({ "aws.region": ["a", "b"] }));
        assert_eq!(settings.inspect("aws.region", ConfigurationTarget::Global), None);
    }

    #[test]
    fn update_reports_only_real_changes() {
        let mut settings = JsonSettings::new();
        let event = settings
            .update("aws.region", "eu-west-1".into(), ConfigurationTarget::Global)
            .unwrap();
        assert!(event.affects_configuration("browserDevtoolsMcp.aws.region"));

        let again = settings
            .update("aws.region", "eu-west-1".into(), ConfigurationTarget::Global)
            .unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn change_event_section_matching() {
        let event = ConfigurationChangeEvent::for_key("browser.headless");
        assert!(event.affects_configuration(CONFIG_NAMESPACE));
        assert!(event.affects_configuration("browserDevtoolsMcp.browser"));
        assert!(event.affects_configuration("browserDevtoolsMcp.browser.headless"));
        assert!(event.affects_configuration("browserDevtoolsMcp.browser.headless.deep"));
        assert!(!event.affects_configuration("browserDevtoolsMcp.enable"));
        assert!(!event.affects_configuration("browserDevtoolsMcp.browser.head"));
        assert!(!event.affects_configuration("editor"));
    }

    #[test]
    fn diff_lists_changed_keys_only() {
        let before = JsonSettings::from_json(&json!({ "aws.region": "a", "aws.profile": "p" }));
        let after = JsonSettings::from_json(&json!({ "aws.region": "b", "aws.profile": "p", "enable": false }));
        let keys: Vec<_> = before.diff(&after).keys().map(String::from).collect();
        assert_eq!(
            keys,
            vec!["browserDevtoolsMcp.aws.region", "browserDevtoolsMcp.enable"]
        );
    }

    #[test]
    fn env_value_rendering() {
        assert_eq!(SettingValue::Bool(true).to_env_value().as_deref(), Some("true"));
        assert_eq!(SettingValue::Bool(false).to_env_value().as_deref(), Some("false"));
        assert_eq!(SettingValue::from("").to_env_value(), None);
        assert_eq!(SettingValue::Null.to_env_value(), None);
        assert_eq!(
            SettingValue::from_json(&json!(9229)).and_then(|v| v.to_env_value()).as_deref(),
            Some("9229")
        );
    }

    #[test]
    fn settings_file_round_trips_updates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut file = SettingsFile::open(&path).unwrap();
        assert_eq!(file.get("aws.region"), Some("".into()));
        file.update("aws.region", "eu-west-1".into(), ConfigurationTarget::Global)
            .unwrap();

        let reopened = SettingsFile::open(&path).unwrap();
        assert_eq!(reopened.get("aws.region"), Some("eu-west-1".into()));
    }

    #[test]
    fn settings_file_rejects_workspace_writes() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = SettingsFile::open(dir.path().join("settings.json")).unwrap();
        let result = file.update("aws.region", "x".into(), ConfigurationTarget::Workspace);
        assert!(result.is_err());
    }

    #[test]
    fn settings_file_reload_reports_external_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "browser": { "headless": true } }"#).unwrap();

        let mut file = SettingsFile::open(&path).unwrap();
        fs::write(&path, r#"{ "browser": { "headless": false } }"#).unwrap();

        let event = file.reload().unwrap();
        assert!(event.affects_configuration("browserDevtoolsMcp.browser.headless"));
        assert_eq!(file.get("browser.headless"), Some(SettingValue::Bool(false)));
        assert!(file.reload().unwrap().is_empty());
    }

    #[test]
    fn settings_file_reload_keeps_values_over_truncated_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut file = SettingsFile::open(&path).unwrap();
        file.update("aws.region", "eu-west-1".into(), ConfigurationTarget::Global)
            .unwrap();
        file.update(ENABLE_KEY, false.into(), ConfigurationTarget::Global)
            .unwrap();

        fs::write(&path, "").unwrap();
        let event = file.reload().unwrap();

        assert!(event.is_empty());
        assert_eq!(file.get("aws.region"), Some("eu-west-1".into()));
        assert_eq!(file.get(ENABLE_KEY), Some(SettingValue::Bool(false)));
    }

    #[test]
    fn settings_file_empty_from_the_start_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "").unwrap();

        let mut file = SettingsFile::open(&path).unwrap();
        assert!(file.settings().is_empty());
        assert!(file.reload().unwrap().is_empty());
        assert_eq!(file.get(ENABLE_KEY), Some(SettingValue::Bool(true)));
    }

    #[test]
    fn settings_file_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut file = SettingsFile::open(&path).unwrap();
        file.update("aws.profile", "dev".into(), ConfigurationTarget::Global)
            .unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("settings.json")]);
        let on_disk: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk["aws.profile"], json!("dev"));
    }
}
