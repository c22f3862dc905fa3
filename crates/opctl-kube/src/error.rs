//! Error types for opctl-kube

use thiserror::Error;

/// Result type for opctl-kube operations
pub type Result<T> = std::result::Result<T, KubeError>;

/// Errors that can occur while talking to the cluster
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KubeError {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    /// kubectl exited with an error
    #[error("kubectl {action} failed: {stderr}")]
    Kubectl { action: String, stderr: String },

    /// The transient error persisted over every attempt
    #[error("kubectl {action} still failing after {attempts} attempts: {stderr}")]
    RetriesExhausted {
        action: String,
        attempts: u32,
        stderr: String,
    },

    /// No `<service_account>-token-*` secret in the platform namespaces
    #[error("could not find a token for '{service_account}'")]
    TokenNotFound { service_account: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl KubeError {
    /// Check if this is a Kubernetes 404 Not Found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, KubeError::Api(kube::Error::Api(resp)) if resp.code == 404)
    }

    /// The request never got an answer from the API server: no usable
    /// kubeconfig, connection refused, TLS failure and the like
    pub fn is_unreachable(&self) -> bool {
        matches!(self, KubeError::Api(err) if !matches!(err, kube::Error::Api(_)))
    }
}
