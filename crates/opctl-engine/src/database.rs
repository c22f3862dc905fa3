//! Database settings of the deployment

use opctl_core::{DatabaseConfig, Params};
use std::path::Path;

use crate::error::Result;
use crate::secrets::{SecretCharset, SecretGenerator};

/// Vars file holding the database defaults, relative to the manifests root
pub const DATABASE_VARS_FILE: &str = "common/onepanel/base/vars.yaml";

const USERNAME_PREFIX: &str = "onepanel";

/// Make sure `params` carries a `database` section.
///
/// User provided settings are kept. Otherwise the settings of an existing
/// deployment are reused, or fresh credentials are generated on top of the
/// defaults of the manifests.
pub fn ensure_database(
    params: &mut Params,
    existing: Option<&DatabaseConfig>,
    root: &Path,
    secrets: &mut SecretGenerator,
) -> Result<()> {
    if params.has_key("database") {
        tracing::debug!("using database settings from params");
        return Ok(());
    }

    let database = match existing {
        Some(database) => {
            tracing::debug!(host = %database.host, "reusing database settings of the cluster");
            database.clone()
        }
        None => {
            let vars = Params::from_file(root.join(DATABASE_VARS_FILE))?;
            let mut database = DatabaseConfig::from_vars(&vars);
            database.password = secrets.generate(16, SecretCharset::Alphanumeric);
            database.username = format!(
                "{}{}",
                USERNAME_PREFIX,
                secrets.generate(8, SecretCharset::Alphanumeric)
            );
            database
        }
    };

    database.apply_to(params);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manifests() -> TempDir {
        let temp = TempDir::new().unwrap();
        let base = temp.path().join("common/onepanel/base");
        std::fs::create_dir_all(&base).unwrap();
        std::fs::write(
            base.join("vars.yaml"),
            r#"
database:
  host:
    default: postgres
  port:
    default: 5432
  databaseName:
    default: onepanel
  driverName:
    default: postgres
"#,
        )
        .unwrap();
        temp
    }

    #[test]
    fn test_user_settings_kept() {
        let temp = manifests();
        let mut params = Params::from_yaml("database:\n  host: my-db\n").unwrap();

        ensure_database(&mut params, None, temp.path(), &mut SecretGenerator::seeded(1)).unwrap();

        assert_eq!(params.get_str("database.host"), Some("my-db"));
        assert!(!params.has_key("database.password"));
    }

    #[test]
    fn test_generated_from_defaults() {
        let temp = manifests();
        let mut params = Params::new();

        ensure_database(&mut params, None, temp.path(), &mut SecretGenerator::seeded(1)).unwrap();

        assert_eq!(params.get_str("database.host"), Some("postgres"));
        assert_eq!(params.get_str("database.port"), Some("\"5432\""));
        assert_eq!(params.get_str("database.password").map(str::len), Some(16));

        let username = params.get_str("database.username").unwrap();
        assert!(username.starts_with("onepanel"));
        assert_eq!(username.len(), 16);
    }

    #[test]
    fn test_cluster_settings_reused() {
        let temp = manifests();
        let existing = DatabaseConfig {
            host: "cluster-db".into(),
            username: "admin".into(),
            password: "secret".into(),
            port: "5433".into(),
            database_name: "onepanel".into(),
            driver_name: "postgres".into(),
        };
        let mut params = Params::new();

        ensure_database(
            &mut params,
            Some(&existing),
            temp.path(),
            &mut SecretGenerator::seeded(1),
        )
        .unwrap();

        assert_eq!(params.get_str("database.host"), Some("cluster-db"));
        assert_eq!(params.get_str("database.username"), Some("admin"));
        assert_eq!(params.get_str("database.port"), Some("\"5433\""));
    }
}
