//! Env and secret fragments written into the manifests copy
//!
//! The config maps of the platform are generated by kustomize from `.env`
//! files under `vars/`; their values come from the flattened parameters.

use opctl_core::Params;
use std::path::Path;

use crate::artifact::ResolvedArtifactRepository;
use crate::error::{EngineError, Result};
use crate::flat::{FlatMap, FlatValue};

pub const WORKFLOW_HIDDEN_ENV: &str = "vars/workflow-config-map-hidden.env";
pub const WORKFLOW_ENV: &str = "vars/workflow-config-map.env";
pub const LOGGING_ENV: &str = "vars/logging-config-map.env";
pub const ONEPANEL_ENV: &str = "vars/onepanel-config-map.env";
pub const ONEPANEL_SECRET: &str = "common/onepanel/base/secret-onepanel-defaultnamespace.yaml";

pub const ARTIFACT_SECRET_PLACEHOLDER: &str = "$(artifactRepositoryProviderSecret)";

/// Parse `key=value` lines. Lines without exactly one `=` are ignored.
pub fn parse_env(content: &str) -> Vec<(String, String)> {
    content
        .split('\n')
        .map(|line| line.replace('\r', ""))
        .filter_map(|line| {
            let parts: Vec<&str> = line.split('=').collect();
            match parts.as_slice() {
                [key, value] => Some((key.to_string(), value.to_string())),
                _ => None,
            }
        })
        .collect()
}

/// Merge the hidden workflow settings into `flat`.
///
/// Keys mentioning `S3` are only taken when an artifact repository is configured.
pub fn merge_hidden_workflow_env(flat: &mut FlatMap, root: &Path, with_s3: bool) -> Result<()> {
    let content = std::fs::read_to_string(root.join(WORKFLOW_HIDDEN_ENV))?;

    for (key, value) in parse_env(&content) {
        if !with_s3 && key.contains("S3") {
            continue;
        }
        flat.insert(key, FlatValue::Str(value));
    }
    Ok(())
}

fn flat_raw(flat: &FlatMap, key: &str) -> String {
    flat.get(key).map(FlatValue::raw).unwrap_or_default()
}

fn write_env(root: &Path, relative: &str, entries: &[(&str, String)]) -> Result<()> {
    let content: String = entries
        .iter()
        .map(|(key, value)| format!("{}={}\n", key, value))
        .collect();

    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, content)?;
    tracing::debug!(path = %path.display(), "wrote env file");
    Ok(())
}

/// Write the workflow, logging and onepanel env files
pub fn write_env_files(
    root: &Path,
    params: &Params,
    flat: &FlatMap,
    artifact: Option<&ResolvedArtifactRepository>,
) -> Result<()> {
    if let Some(artifact) = artifact {
        if let Some(content) = artifact.workflow_env(params, flat)? {
            let path = root.join(WORKFLOW_ENV);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, content)?;
        }
    }

    if params.has_keys(&["logging.image", "logging.volumeStorage"]) {
        write_env(
            root,
            LOGGING_ENV,
            &[
                ("loggingImage", flat_raw(flat, "loggingImage")),
                ("loggingVolumeStorage", flat_raw(flat, "loggingVolumeStorage")),
            ],
        )?;
    }

    write_env(
        root,
        ONEPANEL_ENV,
        &[(
            "applicationDefaultNamespace",
            flat_raw(flat, "applicationDefaultNamespace"),
        )],
    )
}

/// Put the artifact repository credentials into the onepanel secret
pub fn inject_artifact_secret(root: &Path, params: &Params, flat: &FlatMap) -> Result<()> {
    if !params.has_key("artifactRepository.s3") {
        return Ok(());
    }

    let missing = params.find_missing_keys(&[
        "artifactRepository.s3.accessKey",
        "artifactRepository.s3.secretKey",
    ]);
    if !missing.is_empty() {
        return Err(EngineError::MissingParams { keys: missing });
    }

    let credentials = format!(
        "artifactRepositoryS3AccessKey: {}\n  artifactRepositoryS3SecretKey: {}",
        flat_raw(flat, "artifactRepositoryS3AccessKey"),
        flat_raw(flat, "artifactRepositoryS3SecretKey"),
    );

    let path = root.join(ONEPANEL_SECRET);
    let content = std::fs::read_to_string(&path)?;
    if !content.contains(ARTIFACT_SECRET_PLACEHOLDER) {
        tracing::warn!(
            path = %path.display(),
            "{} not present, not used",
            ARTIFACT_SECRET_PLACEHOLDER
        );
        return Ok(());
    }

    std::fs::write(
        &path,
        content.replacen(ARTIFACT_SECRET_PLACEHOLDER, &credentials, 1),
    )?;
    Ok(())
}
