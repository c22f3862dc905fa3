//! The generation pipeline
//!
//! Copies the manifests into a scratch directory, resolves every variable of
//! the deployment into a flat map, writes the env and secret fragments,
//! substitutes placeholders and finally runs kustomize over the copy.

use opctl_core::{DatabaseConfig, DeploymentConfig, Params, validate_params};
use std::path::{Path, PathBuf};

use crate::application::{HiddenSettings, ImageOptions, apply_application_keys, apply_metallb_keys};
use crate::artifact::{self, ResolveContext};
use crate::database::ensure_database;
use crate::env_files::{inject_artifact_secret, merge_hidden_workflow_env, write_env_files};
use crate::error::{EngineError, Result};
use crate::flat::{FlatMap, flatten_params};
use crate::fs_util::refresh_copy;
use crate::kustomize::{Kustomization, Kustomizer};
use crate::linked::map_linked_vars;
use crate::placeholder::substitute_tree;
use crate::secrets::SecretGenerator;

/// Default scratch directory, relative to the working directory
pub const DEFAULT_SCRATCH_DIR: &str = ".onepanel/manifests/cache";

const ONEPANEL_HIDDEN_ENV: &str = "vars/onepanel-config-map-hidden.env";
const ARGO_VARS_FILE: &str = "common/argo/base/vars.yaml";
const EXECUTOR_KEY: &str = "workflowEngine.containerRuntimeExecutor";

/// Options of one generation run
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Where the manifests are copied and rewritten. Wiped on every run.
    pub scratch_dir: PathBuf,
    pub images: ImageOptions,
    /// Database settings of an existing deployment
    pub existing_database: Option<DatabaseConfig>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            scratch_dir: PathBuf::from(DEFAULT_SCRATCH_DIR),
            images: ImageOptions::default(),
            existing_database: None,
        }
    }
}

/// A scratch copy ready for `kustomize build`
#[derive(Debug)]
pub struct PreparedManifests {
    pub root: PathBuf,
    /// Parameters with every derived key
    pub params: Params,
    /// The map used for placeholder substitution
    pub flat: FlatMap,
}

/// Generate the Kubernetes manifests of a deployment
pub fn generate(
    config: &DeploymentConfig,
    options: &GenerateOptions,
    kustomizer: &dyn Kustomizer,
) -> Result<String> {
    let prepared = prepare(config, options, &mut SecretGenerator::new())?;
    kustomizer.build(&prepared.root)
}

/// Run every step of the pipeline except the kustomize build
pub fn prepare(
    config: &DeploymentConfig,
    options: &GenerateOptions,
    secrets: &mut SecretGenerator,
) -> Result<PreparedManifests> {
    let mut params = Params::from_file(&config.spec.params)?;
    validate_params(&params)?;

    let root = options.scratch_dir.clone();
    refresh_copy(&config.spec.manifests_repo, &root)?;

    Kustomization::from_selection(&config.overlayed_selection()).write(&root)?;

    let hidden = HiddenSettings::from_file(&root.join(ONEPANEL_HIDDEN_ENV))?;
    apply_application_keys(&mut params, &hidden, &options.images)?;
    apply_metallb_keys(&mut params, secrets);

    let namespace = text(&params, "application.defaultNamespace");
    let domain = text(&params, "application.domain");
    let context = ResolveContext {
        namespace: &namespace,
        domain: &domain,
        insecure: params.get_bool("application.insecure").unwrap_or(false),
    };
    let mut artifact = artifact::resolve(&mut params, context, secrets)?;

    apply_default_executor(&mut params, &root)?;
    ensure_database(&mut params, options.existing_database.as_ref(), &root, secrets)?;

    let mut flat = flatten_params(&params);
    map_linked_vars(&mut flat, &root, config, true)?;

    merge_hidden_workflow_env(&mut flat, &root, artifact.is_some())?;
    if let Some(artifact) = artifact.as_mut() {
        artifact.apply_secret_names(&mut flat)?;
    }

    write_env_files(&root, &params, &flat, artifact.as_ref())?;
    inject_artifact_secret(&root, &params, &flat)?;

    let rewritten = substitute_tree(&root, &flat)?;
    tracing::debug!(keys = flat.len(), rewritten, "prepared manifests");

    Ok(PreparedManifests { root, params, flat })
}

fn text(params: &Params, key: &str) -> String {
    params.get_str(key).unwrap_or_default().to_string()
}

/// Use the executor default of the argo manifests unless the user chose one
fn apply_default_executor(params: &mut Params, root: &Path) -> Result<()> {
    if params.has_key(EXECUTOR_KEY) {
        return Ok(());
    }

    let argo_vars = Params::from_file(root.join(ARGO_VARS_FILE))?;
    let default_key = format!("{}.default", EXECUTOR_KEY);
    let executor = argo_vars
        .get(&default_key)
        .cloned()
        .ok_or(EngineError::MissingManifestDefault { key: default_key })?;

    params.put("workflowEngineContainerRuntimeExecutor", executor);
    Ok(())
}
