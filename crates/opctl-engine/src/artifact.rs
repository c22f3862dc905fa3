//! Artifact repository resolution
//!
//! The `artifactRepository` block of the parameters declares exactly one of
//! `s3`, `gcs` or `abs`. Whatever the provider, workloads talk to an
//! S3-compatible endpoint, so GCS and Azure Blob storage are exposed through
//! an in-cluster minio gateway with a derived S3 configuration.

use base64::Engine as _;
use opctl_core::Params;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::{EngineError, Result};
use crate::flat::FlatMap;
use crate::secrets::{SecretCharset, SecretGenerator};

pub const ARTIFACT_REPOSITORY_KEY: &str = "artifactRepository";
pub const PROVIDER_KEY: &str = "artifactRepositoryProvider";

const ACCESS_KEY_SECRET_KEY: &str = "artifactRepositoryS3AccessKey";
const SECRET_KEY_SECRET_KEY: &str = "artifactRepositoryS3SecretKey";
const ACCESS_KEY_NAME_KEY: &str = "artifactRepositoryS3AccessKeySecretName";
const SECRET_KEY_NAME_KEY: &str = "artifactRepositoryS3SecretKeySecretName";

const GATEWAY_REGION: &str = "us-west-2";
const PROVIDER_INDENT: usize = 6;

/// A key inside a named Kubernetes secret
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretRef {
    pub key: String,
    pub name: String,
}

impl SecretRef {
    fn new(key: &str, name: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            name: name.into(),
        }
    }
}

/// S3-compatible storage, also the shape handed to workloads
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct S3Config {
    pub key_format: String,
    pub bucket: String,
    pub endpoint: String,
    pub public_endpoint: String,
    pub public_insecure: Option<bool>,
    pub insecure: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub region: String,
    pub access_key_secret: SecretRef,
    pub secret_key_secret: SecretRef,
    #[serde(skip_serializing)]
    pub access_key: String,
    #[serde(skip_serializing)]
    pub secret_key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GcsConfig {
    pub key_format: String,
    pub bucket: String,
    pub endpoint: String,
    pub insecure: bool,
    pub service_account_key: String,
    pub service_account_key_secret: SecretRef,
}

/// Azure Blob storage
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AbsConfig {
    pub key_format: String,
    pub endpoint: String,
    pub insecure: bool,
    pub container: String,
    pub storage_account_key: String,
    pub storage_account_name: String,
}

#[derive(Serialize)]
struct ProviderDocument<'a> {
    s3: &'a S3Config,
}

impl S3Config {
    /// Render the `s3:` block embedded in the workflow config map
    pub fn to_provider_yaml(&self) -> Result<String> {
        let yaml = serde_yaml::to_string(&ProviderDocument { s3: self })?;
        Ok(reindent(&yaml, PROVIDER_INDENT))
    }

    /// Expand the workflow template variables of the key format
    pub fn format_key(&self, namespace: &str, workflow_name: &str, pod_name: &str) -> String {
        self.key_format
            .replace("{{workflow.namespace}}", namespace)
            .replace("{{workflow.name}}", workflow_name)
            .replace("{{pod.name}}", pod_name)
    }
}

/// Scale serde_yaml's two-space indentation up to `indent` spaces per level
fn reindent(yaml: &str, indent: usize) -> String {
    let mut out = String::with_capacity(yaml.len() * 2);
    for line in yaml.lines() {
        let trimmed = line.trim_start_matches(' ');
        let level = (line.len() - trimmed.len()) / 2;
        out.push_str(&" ".repeat(level * indent));
        out.push_str(trimmed);
        out.push('\n');
    }
    out
}

/// The provider declared under `artifactRepository`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactRepository {
    S3(S3Config),
    Gcs(GcsConfig),
    Abs(AbsConfig),
}

impl ArtifactRepository {
    /// Decode the block; `None` when the parameters have no artifact repository
    pub fn from_params(params: &Params) -> Result<Option<Self>> {
        let Some(node) = params.get(ARTIFACT_REPOSITORY_KEY) else {
            return Ok(None);
        };
        Self::from_value(node).map(Some)
    }

    pub fn from_value(node: &Value) -> Result<Self> {
        let declared = |name: &str| node.get(name).filter(|value| !value.is_null());

        let found: Vec<&str> = ["s3", "gcs", "abs"]
            .into_iter()
            .filter(|name| declared(name).is_some())
            .collect();

        match found.as_slice() {
            [] => Err(EngineError::UnsupportedArtifactRepository),
            ["s3"] => Ok(Self::S3(decode(declared("s3"))?)),
            ["gcs"] => Ok(Self::Gcs(decode(declared("gcs"))?)),
            ["abs"] => Ok(Self::Abs(decode(declared("abs"))?)),
            _ => Err(EngineError::AmbiguousArtifactRepository {
                providers: found.iter().map(|name| name.to_string()).collect(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::S3(_) => "s3",
            Self::Gcs(_) => "gcs",
            Self::Abs(_) => "abs",
        }
    }

    pub fn bucket(&self) -> &str {
        match self {
            Self::S3(s3) => &s3.bucket,
            Self::Gcs(gcs) => &gcs.bucket,
            Self::Abs(abs) => &abs.container,
        }
    }

    pub fn endpoint(&self) -> &str {
        match self {
            Self::S3(s3) => &s3.endpoint,
            Self::Gcs(gcs) => &gcs.endpoint,
            Self::Abs(abs) => &abs.endpoint,
        }
    }

    /// Endpoint reachable from outside the cluster
    pub fn public_endpoint(&self, namespace: &str, domain: &str) -> String {
        match self {
            Self::S3(s3) => s3.public_endpoint.clone(),
            Self::Gcs(_) | Self::Abs(_) => gateway_public_endpoint(namespace, domain),
        }
    }

    pub fn access_key(&self) -> &str {
        match self {
            Self::S3(s3) => &s3.access_key,
            Self::Gcs(gcs) => &gcs.bucket,
            Self::Abs(abs) => &abs.storage_account_name,
        }
    }

    pub fn access_secret(&self) -> &str {
        match self {
            Self::S3(s3) => &s3.secret_key,
            Self::Gcs(gcs) => &gcs.service_account_key_secret.key,
            Self::Abs(abs) => &abs.storage_account_key,
        }
    }
}

fn decode<T: for<'de> Deserialize<'de>>(node: Option<&Value>) -> Result<T> {
    let node = node.cloned().unwrap_or(Value::Null);
    Ok(serde_yaml::from_value(node)?)
}

fn gateway_endpoint(namespace: &str) -> String {
    format!("minio-gateway.{}.svc.cluster.local:9000", namespace)
}

fn gateway_public_endpoint(namespace: &str, domain: &str) -> String {
    format!("sys-storage-{}.{}", namespace, domain)
}

/// Deployment settings the resolver depends on
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    pub namespace: &'a str,
    pub domain: &'a str,
    /// `application.insecure`
    pub insecure: bool,
}

/// The declared provider plus the S3 shape derived from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifactRepository {
    pub source: ArtifactRepository,
    pub s3: S3Config,
}

/// Resolve the artifact repository and write its derived keys into `params`.
///
/// Returns `None` when no artifact repository is configured.
pub fn resolve(
    params: &mut Params,
    context: ResolveContext<'_>,
    secrets: &mut SecretGenerator,
) -> Result<Option<ResolvedArtifactRepository>> {
    let Some(source) = ArtifactRepository::from_params(params)? else {
        return Ok(None);
    };

    let s3 = match &source {
        ArtifactRepository::S3(declared) => {
            let mut s3 = declared.clone();
            s3.access_key_secret =
                SecretRef::new(ACCESS_KEY_SECRET_KEY, format!("$({})", ACCESS_KEY_NAME_KEY));
            s3.secret_key_secret =
                SecretRef::new(SECRET_KEY_SECRET_KEY, format!("$({})", SECRET_KEY_NAME_KEY));
            if s3.public_endpoint.is_empty() {
                s3.public_endpoint = s3.endpoint.clone();
            }
            if s3.public_insecure.is_none() {
                s3.public_insecure = Some(s3.insecure);
            }

            params.put(PROVIDER_KEY, s3.to_provider_yaml()?);
            params.put("artifactRepository.s3.region", s3.region.as_str());
            s3
        }
        ArtifactRepository::Gcs(gcs) => {
            let secret_key = secrets.generate(16, SecretCharset::Alpha);
            let s3 = S3Config {
                key_format: gcs.key_format.clone(),
                bucket: gcs.bucket.clone(),
                endpoint: gateway_endpoint(context.namespace),
                public_endpoint: gateway_public_endpoint(context.namespace, context.domain),
                public_insecure: Some(context.insecure),
                insecure: true,
                access_key_secret: SecretRef::new(ACCESS_KEY_SECRET_KEY, gcs.bucket.as_str()),
                secret_key_secret: SecretRef::new(SECRET_KEY_SECRET_KEY, secret_key.as_str()),
                ..Default::default()
            };

            params.put(PROVIDER_KEY, s3.to_provider_yaml()?);
            params.put("artifactRepository.s3.accessKey", gcs.bucket.as_str());
            params.put("artifactRepository.s3.region", GATEWAY_REGION);
            params.put("artifactRepository.s3.secretKey", secret_key);
            params.put("artifactRepository.s3.bucket", gcs.bucket.as_str());
            params.put("artifactRepository.s3.endpoint", s3.endpoint.as_str());
            params.put("artifactRepository.s3.publicEndpoint", s3.public_endpoint.as_str());
            params.put("artifactRepository.s3.insecure", "true");
            params.put(
                "artifactRepositoryServiceAccountKey",
                base64::engine::general_purpose::STANDARD.encode(&gcs.service_account_key),
            );
            s3
        }
        ArtifactRepository::Abs(abs) => {
            let s3 = S3Config {
                key_format: abs.key_format.clone(),
                bucket: abs.container.clone(),
                endpoint: gateway_endpoint(context.namespace),
                public_endpoint: gateway_public_endpoint(context.namespace, context.domain),
                public_insecure: Some(context.insecure),
                insecure: true,
                access_key_secret: SecretRef::new(
                    ACCESS_KEY_SECRET_KEY,
                    format!("$({})", ACCESS_KEY_SECRET_KEY),
                ),
                secret_key_secret: SecretRef::new(
                    SECRET_KEY_SECRET_KEY,
                    format!("$({})", SECRET_KEY_NAME_KEY),
                ),
                ..Default::default()
            };

            params.put(PROVIDER_KEY, s3.to_provider_yaml()?);
            params.put("artifactRepository.s3.accessKey", "placeholder");
            params.put("artifactRepository.s3.secretKey", "placeholder");
            params.put("artifactRepository.s3.bucket", "bucket-name");
            params.put("artifactRepository.s3.region", GATEWAY_REGION);
            params.put("artifactRepository.s3.endpoint", s3.endpoint.as_str());
            params.put("artifactRepository.s3.publicEndpoint", s3.public_endpoint.as_str());
            params.put("artifactRepository.s3.insecure", "true");
            s3
        }
    };

    tracing::debug!(provider = source.name(), "resolved artifact repository");
    Ok(Some(ResolvedArtifactRepository { source, s3 }))
}

impl ResolvedArtifactRepository {
    /// Point the S3 secret references at the names from the hidden workflow
    /// settings and re-render the provider block into `flat`
    pub fn apply_secret_names(&mut self, flat: &mut FlatMap) -> Result<()> {
        self.s3.access_key_secret.name = flat_text(flat, ACCESS_KEY_NAME_KEY)?;
        self.s3.secret_key_secret.name = flat_text(flat, SECRET_KEY_NAME_KEY)?;
        flat.insert(PROVIDER_KEY.to_string(), self.s3.to_provider_yaml()?.into());
        Ok(())
    }

    /// Contents of `vars/workflow-config-map.env`, `None` for GCS
    pub fn workflow_env(&self, params: &Params, flat: &FlatMap) -> Result<Option<String>> {
        let keys: &[(&str, &str)] = match self.source {
            ArtifactRepository::Gcs(_) => return Ok(None),
            ArtifactRepository::Abs(_) => &[
                ("artifactRepositoryBucket", "artifactRepository.s3.bucket"),
                ("artifactRepositoryEndpoint", "artifactRepository.s3.endpoint"),
                ("artifactRepositoryInsecure", "artifactRepository.s3.insecure"),
            ],
            ArtifactRepository::S3(_) => &[
                ("artifactRepositoryBucket", "artifactRepository.s3.bucket"),
                ("artifactRepositoryEndpoint", "artifactRepository.s3.endpoint"),
                ("artifactRepositoryInsecure", "artifactRepository.s3.insecure"),
                ("artifactRepositoryRegion", "artifactRepository.s3.region"),
            ],
        };

        let required: Vec<&str> = keys.iter().map(|(_, param)| *param).collect();
        let missing = params.find_missing_keys(&required);
        if !missing.is_empty() {
            return Err(EngineError::MissingParams { keys: missing });
        }

        let env = keys
            .iter()
            .map(|(name, param)| {
                let flat_key = opctl_core::lower_camel_key(param, ".");
                let value = flat.get(&flat_key).map(|v| v.raw()).unwrap_or_default();
                format!("{}={}\n", name, value)
            })
            .collect();
        Ok(Some(env))
    }
}

fn flat_text(flat: &FlatMap, key: &str) -> Result<String> {
    flat.get(key)
        .and_then(|value| value.as_str())
        .map(str::to_string)
        .ok_or_else(|| EngineError::MissingFlatKey {
            key: key.to_string(),
        })
}
