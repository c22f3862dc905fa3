//! Readiness of a deployed platform

use k8s_openapi::api::core::v1::{Namespace, Pod};
use kube::api::Api;
use kube::Client;
use opctl_core::Params;

use crate::error::Result;

/// Namespace of the application controller
pub const APPLICATION_NAMESPACE: &str = "application-system";
pub const CONTROLLER_POD: &str = "application-controller-manager-0";

const REQUIRED_NAMESPACES: &[&str] = &[APPLICATION_NAMESPACE, "onepanel", "istio-system"];

/// What `opctl status` found in the cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentStatus {
    pub missing_namespaces: Vec<String>,
    /// Phase of the controller pod, `None` when the pod does not exist
    pub controller_phase: Option<String>,
}

impl DeploymentStatus {
    pub fn is_ready(&self) -> bool {
        self.missing_namespaces.is_empty() && self.controller_phase.as_deref() == Some("Running")
    }
}

/// Namespaces a deployment creates, given its parameters
pub fn namespaces_to_check(params: &Params) -> Vec<String> {
    let mut namespaces: Vec<String> = REQUIRED_NAMESPACES.iter().map(|ns| ns.to_string()).collect();
    if params.has_key("certManager") {
        namespaces.push("cert-manager".to_string());
    }
    if params.has_key("logging") {
        namespaces.push("kube-logging".to_string());
    }
    namespaces
}

/// Phase reported by a pod
pub fn pod_phase(pod: &Pod) -> Option<String> {
    pod.status.as_ref().and_then(|status| status.phase.clone())
}

/// Check the namespaces and the application controller
pub async fn deployment_status(client: &Client, namespaces: &[String]) -> Result<DeploymentStatus> {
    let namespace_api: Api<Namespace> = Api::all(client.clone());
    let mut missing_namespaces = Vec::new();
    for namespace in namespaces {
        if namespace_api.get_opt(namespace).await?.is_none() {
            tracing::debug!(namespace = %namespace, "namespace missing");
            missing_namespaces.push(namespace.clone());
        }
    }

    let pods: Api<Pod> = Api::namespaced(client.clone(), APPLICATION_NAMESPACE);
    let controller_phase = pods.get_opt(CONTROLLER_POD).await?.as_ref().and_then(pod_phase);

    Ok(DeploymentStatus {
        missing_namespaces,
        controller_phase,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::PodStatus;

    fn pod(phase: Option<&str>) -> Pod {
        Pod {
            status: Some(PodStatus {
                phase: phase.map(str::to_string),
                ..PodStatus::default()
            }),
            ..Pod::default()
        }
    }

    #[test]
    fn test_namespaces_to_check() {
        let params = Params::from_yaml("application:\n  domain: example.com\n").unwrap();
        assert_eq!(
            namespaces_to_check(&params),
            vec!["application-system", "onepanel", "istio-system"]
        );

        let params = Params::from_yaml("certManager:\n  email: a@b.c\nlogging:\n  image: fluentd\n").unwrap();
        assert_eq!(
            namespaces_to_check(&params),
            vec![
                "application-system",
                "onepanel",
                "istio-system",
                "cert-manager",
                "kube-logging"
            ]
        );
    }

    #[test]
    fn test_pod_phase() {
        assert_eq!(pod_phase(&pod(Some("Running"))).as_deref(), Some("Running"));
        assert_eq!(pod_phase(&pod(None)), None);
        assert_eq!(pod_phase(&Pod::default()), None);
    }

    #[test]
    fn test_ready_needs_namespaces_and_running_controller() {
        let ready = DeploymentStatus {
            missing_namespaces: vec![],
            controller_phase: Some("Running".to_string()),
        };
        assert!(ready.is_ready());

        let pending = DeploymentStatus {
            controller_phase: Some("Pending".to_string()),
            ..ready.clone()
        };
        assert!(!pending.is_ready());

        let no_controller = DeploymentStatus {
            controller_phase: None,
            ..ready.clone()
        };
        assert!(!no_controller.is_ready());

        let missing = DeploymentStatus {
            missing_namespaces: vec!["istio-system".to_string()],
            ..ready
        };
        assert!(!missing.is_ready());
    }

    #[tokio::test]
    async fn test_unreachable_cluster_fails() {
        let client = crate::testing::unreachable_client().await;

        let err = deployment_status(&client, &["onepanel".to_string()])
            .await
            .unwrap_err();

        assert!(err.is_unreachable());
    }
}
