//! Status command - is the deployed platform ready

use console::style;
use opctl_core::Params;
use opctl_kube::DeploymentStatus;
use std::path::Path;

use super::load_config;
use crate::error::Result;

/// Run the status command
pub async fn run(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let params = Params::from_file(&config.spec.params)?;
    let namespaces = opctl_kube::namespaces_to_check(&params);

    let client = opctl_kube::default_client().await?;
    let status = opctl_kube::deployment_status(&client, &namespaces).await?;

    if status.is_ready() {
        println!("{} {}", style("✓").green().bold(), summary(&status));
    } else {
        println!("{} {}", style("✗").red().bold(), summary(&status));
        for reason in not_ready_reasons(&status) {
            println!("  {}", reason);
        }
    }

    Ok(())
}

fn summary(status: &DeploymentStatus) -> &'static str {
    if status.is_ready() {
        "Deployment is reporting as ready."
    } else {
        "Deployment is not ready."
    }
}

fn not_ready_reasons(status: &DeploymentStatus) -> Vec<String> {
    let mut reasons: Vec<String> = status
        .missing_namespaces
        .iter()
        .map(|namespace| format!("namespace '{}' does not exist", namespace))
        .collect();

    match status.controller_phase.as_deref() {
        Some("Running") => {}
        Some(phase) => reasons.push(format!(
            "{} is {}",
            opctl_kube::status::CONTROLLER_POD,
            phase
        )),
        None => reasons.push(format!(
            "{} is not running",
            opctl_kube::status::CONTROLLER_POD
        )),
    }
    reasons
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_summary() {
        let status = DeploymentStatus {
            missing_namespaces: vec![],
            controller_phase: Some("Running".to_string()),
        };

        assert_eq!(summary(&status), "Deployment is reporting as ready.");
        assert!(not_ready_reasons(&status).is_empty());
    }

    #[test]
    fn test_not_ready_reasons() {
        let status = DeploymentStatus {
            missing_namespaces: vec!["istio-system".to_string()],
            controller_phase: Some("Pending".to_string()),
        };

        assert_eq!(summary(&status), "Deployment is not ready.");
        assert_eq!(
            not_ready_reasons(&status),
            vec![
                "namespace 'istio-system' does not exist",
                "application-controller-manager-0 is Pending"
            ]
        );

        let status = DeploymentStatus {
            missing_namespaces: vec![],
            controller_phase: None,
        };
        assert_eq!(
            not_ready_reasons(&status),
            vec!["application-controller-manager-0 is not running"]
        );
    }
}
