//! opctl Kube - Cluster side of a deployment
//!
//! - `discover_database`: reuse the database settings of a running platform
//! - `Kubectl`: apply generated manifests with bounded retry, delete them
//! - `deployment_status`: namespaces and application controller of a deployment
//! - `bearer_token`: service account token a user logs in with

pub mod auth;
pub mod database;
pub mod error;
pub mod kubectl;
pub mod status;

pub use auth::{bearer_token, find_token, login_token};
pub use database::{database_from_data, discover_database};
pub use error::{KubeError, Result};
pub use kubectl::{Kubectl, KubectlOutput, RetryPolicy};
pub use status::{DeploymentStatus, deployment_status, namespaces_to_check};

/// Connect with the default kubeconfig / in-cluster configuration
pub async fn default_client() -> Result<kube::Client> {
    Ok(kube::Client::try_default().await?)
}

/// Name of the current kubeconfig context, if a kubeconfig can be read
pub fn current_context() -> Option<String> {
    match kube::config::Kubeconfig::read() {
        Ok(config) => config.current_context,
        Err(err) => {
            tracing::debug!(error = %err, "no readable kubeconfig");
            None
        }
    }
}
