//! opctl - Configure and deploy an ML platform on Kubernetes

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;
mod exit_codes;

use commands::GenerateArgs;
use commands::init::{Dns, InitOptions, Provider};

#[derive(Parser)]
#[command(name = "opctl")]
#[command(version)]
#[command(about = "Configure and deploy an ML platform on Kubernetes", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Select components for a provider and write config.yaml and params.yaml
    Init {
        /// Manifests tree to deploy from
        #[arg(short, long)]
        manifests: PathBuf,

        /// Where the cluster runs
        #[arg(short, long, value_enum, default_value_t = Provider::Minikube)]
        provider: Provider,

        /// DNS provider for certificates
        #[arg(short, long, value_enum)]
        dns: Option<Dns>,

        /// Add the logging component
        #[arg(short, long)]
        logging: bool,

        /// File path of the resulting config file
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// File path of the resulting parameters file
        #[arg(short = 'e', long, default_value = "params.yaml")]
        params: PathBuf,
    },

    /// Build the Kubernetes manifests for preview
    Build {
        #[command(flatten)]
        generate: GenerateArgs,
    },

    /// Build the manifests and apply them to the cluster
    Apply {
        #[command(flatten)]
        generate: GenerateArgs,

        /// kubectl binary
        #[arg(long, default_value = "kubectl")]
        kubectl: PathBuf,
    },

    /// Delete the deployed resources from the cluster
    Delete {
        #[command(flatten)]
        generate: GenerateArgs,

        /// kubectl binary
        #[arg(long, default_value = "kubectl")]
        kubectl: PathBuf,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Check whether the deployed platform is ready
    Status {
        /// Deployment configuration written by `opctl init`
        #[arg(default_value = "config.yaml")]
        config: PathBuf,
    },

    /// Platform credentials
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
}

#[derive(Subcommand)]
enum AuthCommands {
    /// Print the token a user logs in with
    Token {
        /// User to get the token for
        #[arg(short, long, default_value = "admin")]
        username: String,
    },
}

fn main() {
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(err) = run(cli) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

/// Log to stderr so `opctl build` output stays plain YAML
fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();
}

fn run(cli: Cli) -> error::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match cli.command {
        Commands::Init {
            manifests,
            provider,
            dns,
            logging,
            config,
            params,
        } => commands::init::run(&InitOptions {
            manifests: &manifests,
            provider,
            dns,
            logging,
            config: &config,
            params: &params,
        }),

        Commands::Build { generate } => runtime.block_on(commands::build::run(&generate)),

        Commands::Apply { generate, kubectl } => {
            runtime.block_on(commands::apply::run(&generate, &kubectl))
        }

        Commands::Delete {
            generate,
            kubectl,
            yes,
        } => runtime.block_on(commands::delete::run(&generate, &kubectl, yes)),

        Commands::Status { config } => runtime.block_on(commands::status::run(&config)),

        Commands::Auth {
            command: AuthCommands::Token { username },
        } => runtime.block_on(commands::auth::token(&username)),
    }
}
