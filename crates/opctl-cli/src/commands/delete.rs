//! Delete command - remove the generated resources from the cluster

use console::style;
use opctl_core::Params;
use opctl_kube::Kubectl;
use std::io::{BufRead, Write};
use std::path::Path;

use super::{GenerateArgs, generate_manifests, load_config, write_kubernetes_yaml};
use crate::error::{CliError, Result};

const NAMESPACE_KEY: &str = "application.defaultNamespace";

/// Run the delete command
pub async fn run(args: &GenerateArgs, kubectl: &Path, yes: bool) -> Result<()> {
    let config = load_config(&args.config)?;
    let params = Params::from_file(&config.spec.params)?;
    let namespace = deletable_namespace(&params, &config.spec.params)?;

    if !yes && !confirm(namespace)? {
        println!("{} Delete cancelled", style("✗").red().bold());
        return Ok(());
    }

    let (_, manifests) = generate_manifests(args).await?;
    let path = write_kubernetes_yaml(&manifests)?;

    println!(
        "{} Deleting the platform from your cluster...",
        style("→").blue().bold()
    );
    let output = Kubectl::new(kubectl).delete(&path).await?;
    tracing::debug!(stdout = %output.stdout, "kubectl delete");

    println!("{} Delete is complete.", style("✓").green().bold());
    Ok(())
}

/// The namespace to delete, refusing namespaces that were never set or are shared
fn deletable_namespace<'p>(params: &'p Params, params_path: &Path) -> Result<&'p str> {
    let Some(namespace) = params.get_str(NAMESPACE_KEY) else {
        return Err(CliError::validation(format!(
            "{} is missing from your '{}' file",
            NAMESPACE_KEY,
            params_path.display()
        )));
    };

    match namespace {
        "default" => Err(CliError::validation(
            "unable to delete the platform in the 'default' namespace",
        )),
        "<namespace>" => Err(CliError::validation_with_help(
            "unable to delete the platform, no namespace set",
            format!("set {} in your params.yaml", NAMESPACE_KEY),
        )),
        namespace => Ok(namespace),
    }
}

fn confirm(namespace: &str) -> Result<bool> {
    if let Some(context) = opctl_kube::current_context() {
        println!("The current kubernetes context is: {}", style(context).cyan());
    }
    print!(
        "Are you sure you want to delete the platform from namespace '{}'? ('y' or 'yes' to confirm. Anything else to cancel): ",
        namespace
    );
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "yes"))
}
