//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps library errors to appropriate exit codes.

use miette::Diagnostic;
use opctl_core::CoreError;
use opctl_engine::EngineError;
use opctl_kube::KubeError;
use thiserror::Error;

use crate::exit_codes;

const INIT_HELP: &str = "Are you in the directory where you ran 'opctl init'?";

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// The parameters file holds invalid or missing values
    #[error("Validation failed: {message}")]
    #[diagnostic(code(opctl::cli::validation))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// kustomize failed on the generated manifests
    #[error("Build failed: {message}")]
    #[diagnostic(code(opctl::cli::build))]
    Build {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Manifests tree or config.yaml error
    #[error("Manifest error: {message}")]
    #[diagnostic(code(opctl::cli::manifest))]
    Manifest {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// The cluster rejected a request or kubectl failed
    #[error("Cluster error: {message}")]
    #[diagnostic(code(opctl::cli::cluster))]
    Cluster {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(opctl::cli::io))]
    Io { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Build { .. } => exit_codes::BUILD_ERROR,
            CliError::Manifest { .. } => exit_codes::MANIFEST_ERROR,
            CliError::Cluster { .. } => exit_codes::ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            help: None,
        }
    }

    /// Create a validation error with help text
    pub fn validation_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a manifest error
    pub fn manifest(message: impl Into<String>) -> Self {
        Self::Manifest {
            message: message.into(),
            help: None,
        }
    }

    fn manifest_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Manifest {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Params(params) => {
                CliError::validation_with_help(params.to_string(), params.humanize())
            }
            CoreError::FqdnDomainMismatch => CliError::validation_with_help(
                err.to_string(),
                "application.fqdn must be a subdomain of application.domain in your params.yaml",
            ),
            CoreError::ManifestsRepoNotFound { .. } | CoreError::ParamsFileNotFound { .. } => {
                CliError::manifest_with_help(err.to_string(), INIT_HELP)
            }
            CoreError::Io(io) => CliError::from(io),
            other => CliError::manifest(other.to_string()),
        }
    }
}

impl From<EngineError> for CliError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Core(core) => CliError::from(core),
            EngineError::Kustomize(kustomize) => CliError::Build {
                message: kustomize.to_string(),
                help: Some(
                    "check that kustomize is installed and the manifests in the cache directory build"
                        .to_string(),
                ),
            },
            EngineError::MissingImageTag => CliError::validation_with_help(
                err.to_string(),
                "set --core-image-tag or OPCTL_CORE_IMAGE_TAG",
            ),
            EngineError::UnknownLinkedKey { .. }
            | EngineError::UnsupportedArtifactRepository
            | EngineError::AmbiguousArtifactRepository { .. }
            | EngineError::MissingFlatKey { .. }
            | EngineError::MissingParams { .. } => CliError::validation(err.to_string()),
            EngineError::Io(io) => CliError::from(io),
            other => CliError::manifest(other.to_string()),
        }
    }
}

impl From<KubeError> for CliError {
    fn from(err: KubeError) -> Self {
        match err {
            KubeError::Io(io) => CliError::from(io),
            KubeError::RetriesExhausted { .. } => CliError::Cluster {
                message: err.to_string(),
                help: Some("the CRDs may still be registering, run 'opctl apply' again".to_string()),
            },
            KubeError::TokenNotFound { .. } => CliError::Cluster {
                message: err.to_string(),
                help: Some("check that the platform is deployed with 'opctl status'".to_string()),
            },
            other if other.is_unreachable() => CliError::Cluster {
                message: other.to_string(),
                help: Some("check the current context of your kubeconfig".to_string()),
            },
            other => CliError::Cluster {
                message: other.to_string(),
                help: None,
            },
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
