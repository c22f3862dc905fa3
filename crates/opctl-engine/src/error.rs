//! Engine error types

use miette::Diagnostic;
use opctl_core::CoreError;
use thiserror::Error;

/// Main engine error type
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("unknown key {key}")]
    UnknownLinkedKey { key: String },

    #[error("unsupported artifactRepository configuration")]
    UnsupportedArtifactRepository,

    #[error("artifactRepository must declare exactly one provider, found: {}", .providers.join(", "))]
    AmbiguousArtifactRepository { providers: Vec<String> },

    #[error("no version set. If you are running in dev mode, add the --latest flag")]
    MissingImageTag,

    #[error("missing '{key}'")]
    MissingFlatKey { key: String },

    #[error("missing required values in params.yaml: {}", .keys.join(", "))]
    MissingParams { keys: Vec<String> },

    #[error("{key} does not exist in manifests")]
    MissingManifestDefault { key: String },

    #[error(transparent)]
    Kustomize(#[from] KustomizeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to walk manifests tree: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Failure of the external kustomize build
#[derive(Error, Debug, Diagnostic, Clone)]
#[error("Kustomizer Run for path '{path}' failed: {message}")]
#[diagnostic(
    code(opctl::kustomize::build),
    help("check that kustomize is installed and the manifests in the cache directory build")
)]
pub struct KustomizeError {
    pub path: String,
    pub message: String,
}

pub type Result<T> = std::result::Result<T, EngineError>;
