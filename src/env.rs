//! Settings to environment mapping for the external MCP server.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::{ConfigurationStore, ENABLE_KEY};

/// Environment variables handed to the server process.
pub type EnvMap = BTreeMap<String, String>;

pub const SERVER_LABEL: &str = "browser-devtools";
pub const SERVER_PACKAGE: &str = "browser-devtools-mcp";
pub const DEFAULT_COMMAND: &str = "node";

/// Setting key to environment variable, one to one.
pub const SETTINGS_TO_ENV: &[(&str, &str)] = &[
    ("browser.headless", "BROWSER_HEADLESS_ENABLE"),
    ("browser.persistent", "BROWSER_PERSISTENT_ENABLE"),
    ("browser.userDataDir", "BROWSER_PERSISTENT_USER_DATA_DIR"),
    ("browser.useSystemBrowser", "BROWSER_USE_INSTALLED_ON_SYSTEM"),
    ("browser.executablePath", "BROWSER_EXECUTABLE_PATH"),
    ("browser.locale", "BROWSER_LOCALE"),
    ("platform", "PLATFORM"),
    ("node.inspectorHost", "NODE_INSPECTOR_HOST"),
    ("opentelemetry.enable", "OTEL_ENABLE"),
    ("opentelemetry.serviceName", "OTEL_SERVICE_NAME"),
    ("opentelemetry.exporterType", "OTEL_EXPORTER_TYPE"),
    ("opentelemetry.exporterUrl", "OTEL_EXPORTER_HTTP_URL"),
    ("opentelemetry.exporterHeaders", "OTEL_EXPORTER_HTTP_HEADERS"),
    ("aws.region", "AWS_REGION"),
    ("aws.profile", "AWS_PROFILE"),
    ("bedrock.enable", "AMAZON_BEDROCK_ENABLE"),
    ("bedrock.imageModelId", "AMAZON_BEDROCK_IMAGE_EMBED_MODEL_ID"),
    ("bedrock.textModelId", "AMAZON_BEDROCK_TEXT_EMBED_MODEL_ID"),
    ("bedrock.visionModelId", "AMAZON_BEDROCK_VISION_MODEL_ID"),
    ("figma.accessToken", "FIGMA_ACCESS_TOKEN"),
    ("figma.apiBaseUrl", "FIGMA_API_BASE_URL"),
];

/// Builds the custom environment from the current settings. Null and empty
/// values are left out entirely. An unset key resolves to its declared
/// default first, so only empty-string defaults end up absent.
pub fn environment_from_settings(store: &dyn ConfigurationStore) -> EnvMap {
    SETTINGS_TO_ENV
        .iter()
        .filter_map(|(key, var)| {
            let value = store.get(key)?.to_env_value()?;
            Some((var.to_string(), value))
        })
        .collect()
}

/// Overlays `custom` on the inherited environment. Custom keys win.
pub fn merge_environment<I>(inherited: I, custom: &EnvMap) -> EnvMap
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut merged: EnvMap = inherited.into_iter().collect();
    merged.extend(custom.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// How the host should launch the server. Owned by the host once returned.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ServerDefinition {
    pub label: String,
    pub command: String,
    pub args: Vec<String>,
    pub env: EnvMap,
}

impl ServerDefinition {
    pub fn env_pairs(&self) -> Vec<(String, String)> {
        self.env
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ServerDefinitionProvider {
    extension_path: PathBuf,
    command: String,
}

impl ServerDefinitionProvider {
    pub fn new(extension_path: impl Into<PathBuf>) -> Self {
        Self {
            extension_path: extension_path.into(),
            command: DEFAULT_COMMAND.to_string(),
        }
    }

    /// Replaces `node` with a host-resolved binary.
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    pub fn extension_path(&self) -> &Path {
        &self.extension_path
    }

    /// Entry point of the bundled server package. Not checked for existence.
    pub fn script_path(&self) -> PathBuf {
        self.extension_path
            .join("node_modules")
            .join(SERVER_PACKAGE)
            .join("dist")
            .join("index.js")
    }

    /// Definitions to offer the host: none while disabled, otherwise one.
    pub fn server_definitions<I>(
        &self,
        store: &dyn ConfigurationStore,
        inherited: I,
    ) -> Vec<ServerDefinition>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        if !store.get_bool(ENABLE_KEY, true) {
            log::debug!("{SERVER_LABEL} is disabled, offering no server");
            return Vec::new();
        }

        let custom = environment_from_settings(store);
        log::debug!(
            "offering {SERVER_LABEL} with {} configured variables",
            custom.len()
        );

        vec![ServerDefinition {
            label: SERVER_LABEL.to_string(),
            command: self.command.clone(),
            args: vec![self.script_path().to_string_lossy().into_owned()],
            env: merge_environment(inherited, &custom),
        }]
    }
}
