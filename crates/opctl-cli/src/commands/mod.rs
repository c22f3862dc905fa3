//! CLI command implementations

pub mod apply;
pub mod auth;
pub mod build;
pub mod delete;
pub mod init;
pub mod status;

use clap::Args;
use opctl_core::{DatabaseConfig, DeploymentConfig, Params};
use opctl_engine::{GenerateOptions, ImageOptions, KustomizeCommand};
use std::path::{Path, PathBuf};

use crate::error::{CliError, Result};

/// Where `apply` and `delete` keep the generated manifests
pub const KUBERNETES_YAML: &str = ".onepanel/kubernetes.yaml";

/// Options shared by the commands that generate manifests
#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Deployment configuration written by `opctl init`
    #[arg(default_value = "config.yaml")]
    pub config: PathBuf,

    /// Tag of the core image
    #[arg(long, env = "OPCTL_CORE_IMAGE_TAG")]
    pub core_image_tag: Option<String>,

    /// Tag of the core UI image (defaults to the core image tag)
    #[arg(long, env = "OPCTL_CORE_UI_IMAGE_TAG")]
    pub core_ui_image_tag: Option<String>,

    /// Use the latest images and always pull them
    #[arg(long)]
    pub latest: bool,

    /// Skip reading the database settings of a running deployment
    #[arg(long)]
    pub offline: bool,

    /// kustomize binary
    #[arg(long, default_value = "kustomize")]
    pub kustomize: PathBuf,
}

impl GenerateArgs {
    fn options(&self, existing_database: Option<DatabaseConfig>) -> GenerateOptions {
        GenerateOptions {
            images: ImageOptions {
                core_image_tag: self.core_image_tag.clone(),
                core_ui_image_tag: self.core_ui_image_tag.clone(),
                dev: self.latest,
            },
            existing_database,
            ..GenerateOptions::default()
        }
    }
}

/// Load the deployment configuration, pointing at `opctl init` when it is missing
pub fn load_config(path: &Path) -> Result<DeploymentConfig> {
    if !path.exists() {
        return Err(CliError::Manifest {
            message: format!("the configuration file does not exist at {}", path.display()),
            help: Some("run 'opctl init' first, or pass the path of your config.yaml".to_string()),
        });
    }

    Ok(DeploymentConfig::from_file(path)?)
}

/// Run the generation pipeline and return the built manifests
pub async fn generate_manifests(args: &GenerateArgs) -> Result<(DeploymentConfig, String)> {
    let config = load_config(&args.config)?;

    let existing_database = if args.offline {
        None
    } else {
        existing_database().await?
    };

    let options = args.options(existing_database);
    let kustomizer = KustomizeCommand::new(&args.kustomize);
    let manifests = opctl_engine::generate(&config, &options, &kustomizer)?;

    Ok((config, manifests))
}

/// Database settings of the platform already running in the cluster.
///
/// An unreachable cluster is tolerated so manifests can be previewed offline.
async fn existing_database() -> Result<Option<DatabaseConfig>> {
    let discovered = match opctl_kube::default_client().await {
        Ok(client) => opctl_kube::discover_database(&client).await,
        Err(err) => Err(err),
    };
    tolerate_unreachable(discovered)
}

/// Errors the API server answered with stay fatal
fn tolerate_unreachable(
    discovered: opctl_kube::Result<Option<DatabaseConfig>>,
) -> Result<Option<DatabaseConfig>> {
    match discovered {
        Err(err) if err.is_unreachable() => {
            tracing::warn!(error = %err, "cluster unreachable, database settings will be generated");
            Ok(None)
        }
        other => Ok(other?),
    }
}

/// Write the generated manifests where `kubectl` reads them
pub fn write_kubernetes_yaml(manifests: &str) -> Result<PathBuf> {
    let path = PathBuf::from(KUBERNETES_YAML);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, manifests)?;
    Ok(path)
}

/// `http(s)://<fqdn>` of the deployed application
pub fn application_url(params: &Params) -> Option<String> {
    let fqdn = params.get_str("application.fqdn")?;
    let scheme = if params.get_bool("application.insecure").unwrap_or(false) {
        "http"
    } else {
        "https"
    };
    Some(format!("{}://{}", scheme, fqdn))
}
