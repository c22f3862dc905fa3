//! Database settings of an existing deployment

use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::api::Api;
use kube::Client;
use opctl_core::DatabaseConfig;
use std::collections::BTreeMap;

use crate::error::Result;

/// Namespace and name of the platform secret and config map
pub const PLATFORM_NAMESPACE: &str = "onepanel";
pub const PLATFORM_RESOURCE: &str = "onepanel";

/// Read the database settings of a running platform.
///
/// Returns `None` when the platform secret or config map does not exist.
pub async fn discover_database(client: &Client) -> Result<Option<DatabaseConfig>> {
    let secrets: Api<Secret> = Api::namespaced(client.clone(), PLATFORM_NAMESPACE);
    let Some(secret) = secrets.get_opt(PLATFORM_RESOURCE).await? else {
        tracing::debug!("no platform secret, database settings will be generated");
        return Ok(None);
    };

    let config_maps: Api<ConfigMap> = Api::namespaced(client.clone(), PLATFORM_NAMESPACE);
    let Some(config_map) = config_maps.get_opt(PLATFORM_RESOURCE).await? else {
        tracing::debug!("no platform config map, database settings will be generated");
        return Ok(None);
    };

    let secret_data: BTreeMap<String, String> = secret
        .data
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| (key, String::from_utf8_lossy(&value.0).into_owned()))
        .collect();

    Ok(Some(database_from_data(
        &secret_data,
        &config_map.data.unwrap_or_default(),
    )))
}

/// Assemble the settings from the secret and config map entries
pub fn database_from_data(
    secret: &BTreeMap<String, String>,
    config_map: &BTreeMap<String, String>,
) -> DatabaseConfig {
    let field = |data: &BTreeMap<String, String>, key: &str| data.get(key).cloned().unwrap_or_default();

    DatabaseConfig {
        host: field(config_map, "databaseHost"),
        username: field(secret, "databaseUsername"),
        password: field(secret, "databasePassword"),
        port: field(config_map, "databasePort"),
        database_name: field(config_map, "databaseName"),
        driver_name: field(config_map, "databaseDriverName"),
    }
}
