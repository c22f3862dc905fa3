//! Apply command - generate the manifests and apply them to the cluster

use console::style;
use opctl_core::Params;
use opctl_kube::{Kubectl, RetryPolicy};
use std::path::Path;

use super::{GenerateArgs, application_url, generate_manifests, write_kubernetes_yaml};
use crate::error::Result;

/// Run the apply command
pub async fn run(args: &GenerateArgs, kubectl: &Path) -> Result<()> {
    println!("{} Starting deployment...", style("→").blue().bold());

    let (config, manifests) = generate_manifests(args).await?;
    let path = write_kubernetes_yaml(&manifests)?;

    println!(
        "{} Applying {}",
        style("→").blue().bold(),
        style(path.display()).cyan()
    );

    let output = Kubectl::new(kubectl)
        .apply_with_retry(&path, RetryPolicy::default())
        .await?;
    tracing::debug!(stdout = %output.stdout, "kubectl apply");

    println!("{} Deployment is complete.", style("✓").green().bold());

    let params = Params::from_file(&config.spec.params)?;
    match application_url(&params) {
        Some(url) => println!("  Your application is now running at: {}", style(url).cyan()),
        None => tracing::warn!("application.fqdn is not set, the application url is unknown"),
    }

    Ok(())
}
