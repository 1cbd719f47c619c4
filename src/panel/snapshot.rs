use serde::{Deserialize, Serialize};

use crate::config::{ConfigurationStore, SettingValue};

/// Current settings grouped the way the panel lays them out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsSnapshot {
    pub browser: BrowserSection,
    pub opentelemetry: OpenTelemetrySection,
    pub aws: AwsSection,
    pub bedrock: BedrockSection,
    pub figma: FigmaSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headless: Option<SettingValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent: Option<SettingValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data_dir: Option<SettingValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_system_browser: Option<SettingValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable_path: Option<SettingValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<SettingValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenTelemetrySection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable: Option<SettingValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<SettingValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exporter_type: Option<SettingValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exporter_url: Option<SettingValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exporter_headers: Option<SettingValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<SettingValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<SettingValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BedrockSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable: Option<SettingValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_model_id: Option<SettingValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_model_id: Option<SettingValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision_model_id: Option<SettingValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FigmaSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<SettingValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<SettingValue>,
}

impl SettingsSnapshot {
    /// Reads every panel-visible setting from `store` in one pass.
    pub fn from_store(store: &dyn ConfigurationStore) -> Self {
        let get = |key: &str| store.get(key);
        Self {
            browser: BrowserSection {
                headless: get("browser.headless"),
                persistent: get("browser.persistent"),
                user_data_dir: get("browser.userDataDir"),
                use_system_browser: get("browser.useSystemBrowser"),
                executable_path: get("browser.executablePath"),
                locale: get("browser.locale"),
            },
            opentelemetry: OpenTelemetrySection {
                enable: get("opentelemetry.enable"),
                service_name: get("opentelemetry.serviceName"),
                exporter_type: get("opentelemetry.exporterType"),
                exporter_url: get("opentelemetry.exporterUrl"),
                exporter_headers: get("opentelemetry.exporterHeaders"),
            },
            aws: AwsSection {
                region: get("aws.region"),
                profile: get("aws.profile"),
            },
            bedrock: BedrockSection {
                enable: get("bedrock.enable"),
                image_model_id: get("bedrock.imageModelId"),
                text_model_id: get("bedrock.textModelId"),
                vision_model_id: get("bedrock.visionModelId"),
            },
            figma: FigmaSection {
                access_token: get("figma.accessToken"),
                api_base_url: get("figma.apiBaseUrl"),
            },
        }
    }

    /// Value for a dotted setting key, if the panel shows it.
    pub fn lookup(&self, key: &str) -> Option<&SettingValue> {
        let field = match key {
            "browser.headless" => &self.browser.headless,
            "browser.persistent" => &self.browser.persistent,
            "browser.userDataDir" => &self.browser.user_data_dir,
            "browser.useSystemBrowser" => &self.browser.use_system_browser,
            "browser.executablePath" => &self.browser.executable_path,
            "browser.locale" => &self.browser.locale,
            "opentelemetry.enable" => &self.opentelemetry.enable,
            "opentelemetry.serviceName" => &self.opentelemetry.service_name,
            "opentelemetry.exporterType" => &self.opentelemetry.exporter_type,
            "opentelemetry.exporterUrl" => &self.opentelemetry.exporter_url,
            "opentelemetry.exporterHeaders" => &self.opentelemetry.exporter_headers,
            "aws.region" => &self.aws.region,
            "aws.profile" => &self.aws.profile,
            "bedrock.enable" => &self.bedrock.enable,
            "bedrock.imageModelId" => &self.bedrock.image_model_id,
            "bedrock.textModelId" => &self.bedrock.text_model_id,
            "bedrock.visionModelId" => &self.bedrock.vision_model_id,
            "figma.accessToken" => &self.figma.access_token,
            "figma.apiBaseUrl" => &self.figma.api_base_url,
            _ => return None,
        };
        field.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JsonSettings;
    use serde_json::json;

    #[test]
    fn groups_by_section_with_camel_case_fields() {
        let store = JsonSettings::from_json(&json!({
            "browser": { "userDataDir": "/tmp/profile" },
            "bedrock.visionModelId": "vision-1"
        }));
        let value = serde_json::to_value(SettingsSnapshot::from_store(&store)).unwrap();

        assert_eq!(value["browser"]["userDataDir"], json!("/tmp/profile"));
        assert_eq!(value["browser"]["headless"], json!(true));
        assert_eq!(value["bedrock"]["visionModelId"], json!("vision-1"));
        assert_eq!(value["opentelemetry"]["exporterType"], json!("none"));
    }

    #[test]
    fn lookup_follows_dotted_keys() {
        let store = JsonSettings::from_json(&json!({ "aws": { "region": "eu-west-1" } }));
        let snapshot = SettingsSnapshot::from_store(&store);
        assert_eq!(snapshot.lookup("aws.region"), Some(&"eu-west-1".into()));
        assert_eq!(snapshot.lookup("platform"), None);
    }
}
