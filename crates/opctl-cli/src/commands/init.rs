//! Init command - select components and write config.yaml and params.yaml

use clap::ValueEnum;
use console::style;
use opctl_core::{Builder, DeploymentConfig, Manifest, Params};
use opctl_engine::application::is_local_provider;
use std::fmt;
use std::path::Path;

use crate::error::Result;

/// Where the platform runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Provider {
    Aws,
    Gcp,
    Azure,
    Minikube,
    Microk8s,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Aws => "aws",
            Provider::Gcp => "gcp",
            Provider::Azure => "azure",
            Provider::Minikube => "minikube",
            Provider::Microk8s => "microk8s",
        }
    }

    pub fn is_local(&self) -> bool {
        is_local_provider(self.as_str())
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// DNS provider used by cert-manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Dns {
    /// Route53
    Aws,
}

impl fmt::Display for Dns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dns::Aws => f.write_str("aws"),
        }
    }
}

/// What `opctl init` selects and where it writes
#[derive(Debug, Clone)]
pub struct InitOptions<'a> {
    pub manifests: &'a Path,
    pub provider: Provider,
    pub dns: Option<Dns>,
    pub logging: bool,
    pub config: &'a Path,
    pub params: &'a Path,
}

/// Run the init command
pub fn run(options: &InitOptions<'_>) -> Result<()> {
    println!(
        "{} Loading manifests from {}",
        style("→").blue().bold(),
        style(options.manifests.display()).cyan()
    );

    let manifest = Manifest::load(options.manifests)?;
    let mut builder = Builder::new(&manifest);
    select(&mut builder, options.provider, options.dns, options.logging)?;

    let mut params = if options.params.exists() {
        Params::from_file(options.params)?
    } else {
        Params::new()
    };
    for vars in builder.yamls()? {
        params.merge(&vars);
    }
    params.write_to_file(options.params)?;

    let mut config = DeploymentConfig::new(options.manifests, options.params);
    config.record_selection(&builder.selection());
    config.save(options.config)?;

    println!("{} Configuration has been created with", style("✓").green().bold());
    println!("  - Provider: {}", style(options.provider).cyan());
    if let Some(dns) = options.dns {
        println!("  - Dns: {}", style(dns).cyan());
    }
    println!("  - Configuration file: {}", options.config.display());
    println!(
        "  - Parameters file has been created with placeholders: {}",
        options.params.display()
    );

    Ok(())
}

/// Select the components and overlays of a deployment
pub fn select(
    builder: &mut Builder<'_>,
    provider: Provider,
    dns: Option<Dns>,
    logging: bool,
) -> opctl_core::Result<()> {
    builder.add_common_components(&[])?;

    if !provider.is_local() {
        builder.add_component("storage")?;
        builder.add_component("cert-manager")?;
        builder.add_overlay(&format!("storage/overlays/{}", provider))?;
        builder.add_overlay_contender("cloud");
    }

    if let Some(dns) = dns {
        builder.add_overlay(&format!("cert-manager/overlays/{}", dns))?;
    }

    if logging {
        builder.add_component("logging")?;
        if provider == Provider::Minikube {
            builder.add_overlay("logging/overlays/minikube")?;
        }
    }

    builder.add_overlay_contender(provider.as_str());
    builder.build()
}
