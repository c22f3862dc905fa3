//! Login token of a platform user

use k8s_openapi::api::core::v1::{Namespace, Secret};
use kube::api::{Api, ListParams};
use kube::{Client, ResourceExt};
use md5::{Digest, Md5};

use crate::database::PLATFORM_NAMESPACE;
use crate::error::{KubeError, Result};

/// Label of the namespaces the platform manages
pub const ENABLED_LABEL: &str = "onepanel.io/enabled=true";

/// Token of the first `<service_account>-token-*` secret holding one
pub fn find_token(secrets: &[Secret], service_account: &str) -> Option<String> {
    let prefix = format!("{}-token-", service_account);

    secrets
        .iter()
        .filter(|secret| secret.name_any().starts_with(&prefix))
        .find_map(|secret| {
            let token = secret.data.as_ref()?.get("token")?;
            Some(String::from_utf8_lossy(&token.0).into_owned())
        })
}

/// The token users log in with: the md5 hex digest of the service account token
pub fn login_token(bearer: &str) -> String {
    hex::encode(Md5::digest(bearer.as_bytes()))
}

/// Platform namespace first, then the enabled ones
pub async fn enabled_namespaces(client: &Client) -> Result<Vec<String>> {
    let namespaces: Api<Namespace> = Api::all(client.clone());
    let enabled = namespaces
        .list(&ListParams::default().labels(ENABLED_LABEL))
        .await?;

    let mut names = vec![PLATFORM_NAMESPACE.to_string()];
    for namespace in enabled {
        let name = namespace.name_any();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    Ok(names)
}

/// Find the service account token of `username` in the platform namespaces
pub async fn bearer_token(client: &Client, username: &str) -> Result<String> {
    for namespace in enabled_namespaces(client).await? {
        let secrets: Api<Secret> = Api::namespaced(client.clone(), &namespace);
        let listed = secrets.list(&ListParams::default()).await?;
        if let Some(token) = find_token(&listed.items, username) {
            tracing::debug!(namespace = %namespace, "found service account token");
            return Ok(token);
        }
    }

    Err(KubeError::TokenNotFound {
        service_account: username.to_string(),
    })
}
