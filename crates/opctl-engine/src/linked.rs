//! Linked variables
//!
//! Some components ship a `default-vars.yaml` whose values are not literal
//! defaults but dotted references to other parameters:
//!
//! ```yaml
//! modeldb:
//!   database:
//!     host: database.host
//! ```
//!
//! Each entry copies the referenced value of the flattened map under its own
//! key (`modeldbDatabaseHost`).

use opctl_core::{DeploymentConfig, KeyFormat, Params, lower_camel_key};
use serde_yaml::Value;
use std::path::{Path, PathBuf};

use crate::error::{EngineError, Result};
use crate::flat::FlatMap;

const LINKED_VARS_FILE: &str = "default-vars.yaml";

/// Locate the linked vars files that apply to the recorded selection
pub fn linked_vars_files(root: &Path, config: &DeploymentConfig) -> Vec<PathBuf> {
    let mut files = Vec::new();

    if config.spec.components.iter().any(|c| c.contains("modeldb")) {
        files.push(root.join("modeldb").join("base").join(LINKED_VARS_FILE));
    }

    if config
        .spec
        .overlays
        .iter()
        .any(|o| o.contains("artifact-repository/overlays/abs"))
    {
        files.push(
            root.join("common/artifact-repository/overlays/abs")
                .join(LINKED_VARS_FILE),
        );
    }

    files
}

/// Resolve linked variables into `flat`.
///
/// With `replace` unset, keys already present in the map are kept.
pub fn map_linked_vars(
    flat: &mut FlatMap,
    root: &Path,
    config: &DeploymentConfig,
    replace: bool,
) -> Result<()> {
    for path in linked_vars_files(root, config) {
        let linked = Params::from_file(&path)?;
        apply_linked(flat, &linked, replace)?;
        tracing::debug!(path = %path.display(), "mapped linked vars");
    }
    Ok(())
}

fn apply_linked(flat: &mut FlatMap, linked: &Params, replace: bool) -> Result<()> {
    for (key, reference) in linked.flatten(KeyFormat::LowerCamel) {
        if !replace && flat.contains_key(&key) {
            continue;
        }

        let reference = match reference {
            Value::String(s) => s.clone(),
            other => serde_yaml::to_string(other)?.trim_end().to_string(),
        };
        let value_key = lower_camel_key(&reference, ".");
        let value = flat
            .get(&value_key)
            .cloned()
            .ok_or(EngineError::UnknownLinkedKey { key: value_key })?;

        flat.insert(key, value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flat::FlatValue;
    use tempfile::TempDir;

    fn flat() -> FlatMap {
        let mut flat = FlatMap::new();
        flat.insert("databaseHost".into(), FlatValue::from("postgres"));
        flat.insert("databasePort".into(), FlatValue::Int(5432));
        flat.insert("modeldbDatabaseHost".into(), FlatValue::from("custom"));
        flat
    }

    fn linked() -> Params {
        Params::from_yaml(
            r#"
modeldb:
  database:
    host: database.host
    port: database.port
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_replace_overwrites() {
        let mut flat = flat();

        apply_linked(&mut flat, &linked(), true).unwrap();

        assert_eq!(flat["modeldbDatabaseHost"], FlatValue::from("postgres"));
        assert_eq!(flat["modeldbDatabasePort"], FlatValue::Int(5432));
    }

    #[test]
    fn test_existing_keys_kept_without_replace() {
        let mut flat = flat();

        apply_linked(&mut flat, &linked(), false).unwrap();

        assert_eq!(flat["modeldbDatabaseHost"], FlatValue::from("custom"));
        assert_eq!(flat["modeldbDatabasePort"], FlatValue::Int(5432));
    }

    #[test]
    fn test_unknown_reference() {
        let mut flat = FlatMap::new();
        let linked = Params::from_yaml("modeldb:\n  user: database.username\n").unwrap();

        let err = apply_linked(&mut flat, &linked, true).unwrap_err();

        assert_eq!(err.to_string(), "unknown key databaseUsername");
    }

    #[test]
    fn test_files_follow_selection() {
        let temp = TempDir::new().unwrap();
        let mut config = DeploymentConfig::new(temp.path(), "params.yaml");
        assert!(linked_vars_files(temp.path(), &config).is_empty());

        config.add_component("modeldb/base");
        config.add_overlay("common/artifact-repository/overlays/abs");

        let files = linked_vars_files(temp.path(), &config);
        assert_eq!(
            files,
            vec![
                temp.path().join("modeldb/base/default-vars.yaml"),
                temp.path()
                    .join("common/artifact-repository/overlays/abs/default-vars.yaml"),
            ]
        );
    }

    #[test]
    fn test_map_linked_vars_reads_files() {
        let temp = TempDir::new().unwrap();
        let base = temp.path().join("modeldb/base");
        std::fs::create_dir_all(&base).unwrap();
        std::fs::write(base.join("default-vars.yaml"), "modeldb:\n  host: database.host\n")
            .unwrap();

        let mut config = DeploymentConfig::new(temp.path(), "params.yaml");
        config.add_component("modeldb/base");
        let mut flat = flat();

        map_linked_vars(&mut flat, temp.path(), &config, true).unwrap();

        assert_eq!(flat["modeldbHost"], FlatValue::from("postgres"));
    }
}
