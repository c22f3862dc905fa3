//! Build command - print the generated manifests

use console::style;

use super::{GenerateArgs, generate_manifests};
use crate::error::Result;

/// Run the build command
pub async fn run(args: &GenerateArgs) -> Result<()> {
    eprintln!(
        "{} Building manifests from {}",
        style("→").blue().bold(),
        style(args.config.display()).cyan()
    );

    let (_, manifests) = generate_manifests(args).await?;
    print!("{}", manifests);

    Ok(())
}
