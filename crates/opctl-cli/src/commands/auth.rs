//! Auth command - print the token a user logs in with

use console::style;

use crate::error::Result;

/// Run `auth token`
pub async fn token(username: &str) -> Result<()> {
    let client = opctl_kube::default_client().await?;
    let bearer = opctl_kube::bearer_token(&client, username).await?;

    println!("{} {}", style("Username:").bold(), username);
    println!("{} {}", style("Token:").bold(), opctl_kube::login_token(&bearer));

    Ok(())
}
