//! Keys derived from the application settings
//!
//! API urls, image tags, node pool options and, for local clusters, the
//! metallb configuration.

use base64::Engine as _;
use opctl_core::Params;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{EngineError, Result};
use crate::secrets::{SecretCharset, SecretGenerator};

const LOCAL_PROVIDERS: &[&str] = &["minikube", "microk8s"];
const METALLB_SECRET_LENGTH: usize = 128;

/// Image tags of the core services
#[derive(Debug, Clone, Default)]
pub struct ImageOptions {
    pub core_image_tag: Option<String>,
    pub core_ui_image_tag: Option<String>,
    /// Use `latest` images, always pulled
    pub dev: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ImageTags {
    core_tag: String,
    core_pull_policy: &'static str,
    core_ui_tag: String,
    core_ui_pull_policy: &'static str,
}

impl ImageOptions {
    fn resolve(&self) -> Result<ImageTags> {
        if self.dev {
            return Ok(ImageTags {
                core_tag: "latest".to_string(),
                core_pull_policy: "Always",
                core_ui_tag: "latest".to_string(),
                core_ui_pull_policy: "Always",
            });
        }

        let core_tag = self
            .core_image_tag
            .clone()
            .filter(|tag| !tag.is_empty())
            .ok_or(EngineError::MissingImageTag)?;
        let core_ui_tag = self
            .core_ui_image_tag
            .clone()
            .unwrap_or_else(|| core_tag.clone());

        Ok(ImageTags {
            core_tag,
            core_pull_policy: "IfNotPresent",
            core_ui_tag,
            core_ui_pull_policy: "IfNotPresent",
        })
    }
}

/// Settings read from `vars/onepanel-config-map-hidden.env`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HiddenSettings {
    pub api_path: String,
    pub api_grpc_port: i64,
    pub ui_path: String,
}

impl HiddenSettings {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Accepts `key=value` as well as `key: value` lines
    pub fn parse(content: &str) -> Self {
        let entries = parse_settings(content);
        let get = |key: &str| entries.get(key).cloned().unwrap_or_default();

        Self {
            api_path: get("applicationCloudApiPath"),
            api_grpc_port: get("applicationCloudApiGRPCPort").parse().unwrap_or(0),
            ui_path: get("applicationCloudUiPath"),
        }
    }
}

fn parse_settings(content: &str) -> BTreeMap<String, String> {
    content
        .lines()
        .map(|line| line.trim_end_matches('\r').trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('=').or_else(|| line.split_once(':')))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Escape a url so it survives the UI's sed based configuration
pub fn format_url_for_ui(url: &str) -> String {
    url.replace('/', r"\/")
        .replace('.', r"\.")
        .replace(':', r"\:")
}

/// Write the application derived keys into `params`
pub fn apply_application_keys(
    params: &mut Params,
    hidden: &HiddenSettings,
    images: &ImageOptions,
) -> Result<()> {
    let tags = images.resolve()?;

    let fqdn = params.get_str("application.fqdn").unwrap_or_default().to_string();
    let insecure = params.get_bool("application.insecure").unwrap_or(false);
    let (http, ws) = if insecure {
        ("http://", "ws://")
    } else {
        ("https://", "wss://")
    };

    let api_url = format!("{}{}{}", http, fqdn, hidden.api_path);
    let ws_url = format!("{}{}{}", ws, fqdn, hidden.api_path);

    params.put("applicationApiUrl", format_url_for_ui(&api_url));
    params.put("applicationApiWsUrl", format_url_for_ui(&ws_url));
    params.put("applicationApiPath", hidden.api_path.as_str());
    params.put("applicationUiPath", hidden.ui_path.as_str());
    params.put("applicationApiGrpcPort", hidden.api_grpc_port);
    params.put("providerType", "cloud");
    params.put("onepanelApiUrl", api_url);

    params.put("applicationCoreImageTag", tags.core_tag);
    params.put("applicationCoreImagePullPolicy", tags.core_pull_policy);
    params.put("applicationCoreuiImageTag", tags.core_ui_tag);
    params.put("applicationCoreuiImagePullPolicy", tags.core_ui_pull_policy);

    let node_pool_options = node_pool_options(params.get("application.nodePool.options"));
    params.put("applicationNodePoolOptions", node_pool_options);

    Ok(())
}

/// Render the node pool options as a YAML block scalar indented for a config map
pub fn node_pool_options(options: Option<&Value>) -> String {
    let Some(options) = options.filter(|value| value.is_sequence()) else {
        return String::new();
    };
    let Ok(yaml) = serde_yaml::to_string(options) else {
        return String::new();
    };

    let mut block = String::from("|\n");
    for line in yaml.split('\n') {
        block.push_str("    ");
        block.push_str(line);
        block.push('\n');
    }
    block
}

pub fn is_local_provider(provider: &str) -> bool {
    LOCAL_PROVIDERS.contains(&provider)
}

/// Render the metallb address pools as YAML list lines
pub fn metallb_addresses(addresses: Option<&Value>) -> String {
    let Some(Value::Sequence(items)) = addresses else {
        return String::new();
    };

    items
        .iter()
        .filter_map(Value::as_str)
        .enumerate()
        .map(|(i, address)| {
            let indent = if i > 0 { "      " } else { "" };
            format!("{}- {}\n", indent, address)
        })
        .collect()
}

/// Write the metallb keys for local clusters
pub fn apply_metallb_keys(params: &mut Params, secrets: &mut SecretGenerator) {
    let provider = params.get_str("application.provider").unwrap_or_default();
    if !is_local_provider(provider) {
        return;
    }

    let addresses = metallb_addresses(params.get("metalLb.addresses"));
    params.put("metalLbAddresses", addresses);

    let secret = secrets.generate(METALLB_SECRET_LENGTH, SecretCharset::Alphanumeric);
    params.put(
        "metalLbSecretKey",
        base64::engine::general_purpose::STANDARD.encode(secret),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> Params {
        Params::from_yaml(
            r#"
application:
  fqdn: app.example.com
  insecure: false
  provider: minikube
  nodePool:
    options:
      - name: small
        value: n1
metalLb:
  addresses:
    - 192.168.99.100-192.168.99.110
    - 192.168.99.120-192.168.99.130
"#,
        )
        .unwrap()
    }

    fn hidden() -> HiddenSettings {
        HiddenSettings {
            api_path: "/api".into(),
            api_grpc_port: 8887,
            ui_path: "/".into(),
        }
    }

    #[test]
    fn test_format_url_for_ui() {
        assert_eq!(
            format_url_for_ui("https://app.example.com/api"),
            r"https\:\/\/app\.example\.com\/api"
        );
    }

    #[test]
    fn test_hidden_settings_formats() {
        let env = HiddenSettings::parse(
            "applicationCloudApiPath=/api\r\napplicationCloudApiGRPCPort=8887\napplicationCloudUiPath=/\n",
        );
        assert_eq!(env, hidden());

        let yaml = HiddenSettings::parse(
            "applicationCloudApiPath: /api\napplicationCloudApiGRPCPort: 8887\napplicationCloudUiPath: /\n",
        );
        assert_eq!(yaml, hidden());
    }

    #[test]
    fn test_application_keys() {
        let mut params = params();
        let images = ImageOptions {
            core_image_tag: Some("v1.0.0".into()),
            core_ui_image_tag: Some("v1.0.1".into()),
            dev: false,
        };

        apply_application_keys(&mut params, &hidden(), &images).unwrap();

        assert_eq!(
            params.get_str("applicationApiUrl"),
            Some(r"https\:\/\/app\.example\.com\/api")
        );
        assert_eq!(
            params.get_str("applicationApiWsUrl"),
            Some(r"wss\:\/\/app\.example\.com\/api")
        );
        assert_eq!(params.get_str("onepanelApiUrl"), Some("https://app.example.com/api"));
        assert_eq!(params.get("applicationApiGrpcPort"), Some(&Value::from(8887)));
        assert_eq!(params.get_str("providerType"), Some("cloud"));
        assert_eq!(params.get_str("applicationCoreImageTag"), Some("v1.0.0"));
        assert_eq!(params.get_str("applicationCoreuiImageTag"), Some("v1.0.1"));
        assert_eq!(params.get_str("applicationCoreImagePullPolicy"), Some("IfNotPresent"));
    }

    #[test]
    fn test_dev_images_and_insecure_scheme() {
        let mut params = params();
        params.put("application.insecure", true);
        let images = ImageOptions {
            dev: true,
            ..Default::default()
        };

        apply_application_keys(&mut params, &hidden(), &images).unwrap();

        assert_eq!(params.get_str("onepanelApiUrl"), Some("http://app.example.com/api"));
        assert_eq!(params.get_str("applicationCoreImageTag"), Some("latest"));
        assert_eq!(params.get_str("applicationCoreuiImagePullPolicy"), Some("Always"));
    }

    #[test]
    fn test_missing_image_tag() {
        let mut params = params();

        let err = apply_application_keys(&mut params, &hidden(), &ImageOptions::default())
            .unwrap_err();

        assert!(matches!(err, EngineError::MissingImageTag));
    }

    #[test]
    fn test_node_pool_options_block() {
        let params = params();

        let block = node_pool_options(params.get("application.nodePool.options"));

        assert_eq!(block, "|\n    - name: small\n      value: n1\n    \n");
        assert_eq!(node_pool_options(None), "");
    }

    #[test]
    fn test_metallb_keys() {
        let mut params = params();
        let mut secrets = SecretGenerator::seeded(3);

        apply_metallb_keys(&mut params, &mut secrets);

        assert_eq!(
            params.get_str("metalLbAddresses"),
            Some("- 192.168.99.100-192.168.99.110\n      - 192.168.99.120-192.168.99.130\n")
        );
        let key = params.get_str("metalLbSecretKey").unwrap();
        let decoded = base64::engine::general_purpose::STANDARD.decode(key).unwrap();
        assert_eq!(decoded.len(), 128);
    }

    #[test]
    fn test_metallb_skipped_for_cloud() {
        let mut params = params();
        params.put("application.provider", "gcp");

        apply_metallb_keys(&mut params, &mut SecretGenerator::seeded(3));

        assert!(!params.has_key("metalLbAddresses"));
    }
}
