//! Kustomization assembly and the external kustomize build

use opctl_core::SelectedComponent;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{KustomizeError, Result};

pub const KUSTOMIZATION_FILE: &str = "kustomization.yaml";

const API_VERSION: &str = "kustomize.config.k8s.io/v1beta1";
const KIND: &str = "Kustomization";
const VAR_REFERENCE_CONFIG: &str = "configs/varreference.yaml";

/// The root `kustomization.yaml` of a deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kustomization {
    pub api_version: String,
    pub kind: String,
    pub resources: Vec<String>,
    pub configurations: Vec<String>,
}

impl Kustomization {
    /// Resources of the selection, ordered by component path
    pub fn from_selection(selection: &[SelectedComponent]) -> Self {
        let mut sorted: Vec<&SelectedComponent> = selection.iter().collect();
        sorted.sort_by(|a, b| a.component.cmp(&b.component));

        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            resources: sorted.iter().flat_map(|s| s.resources()).collect(),
            configurations: vec![VAR_REFERENCE_CONFIG.to_string()],
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Write `kustomization.yaml` into `dir`
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(KUSTOMIZATION_FILE);
        std::fs::write(&path, self.to_yaml()?)?;
        Ok(path)
    }
}

/// Builds a kustomization directory into Kubernetes manifests
pub trait Kustomizer {
    fn build(&self, path: &Path) -> Result<String>;
}

/// Runs the `kustomize` binary
#[derive(Debug, Clone)]
pub struct KustomizeCommand {
    program: PathBuf,
}

impl KustomizeCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for KustomizeCommand {
    fn default() -> Self {
        Self::new("kustomize")
    }
}

impl Kustomizer for KustomizeCommand {
    fn build(&self, path: &Path) -> Result<String> {
        let failed = |message: String| KustomizeError {
            path: path.display().to_string(),
            message,
        };

        tracing::debug!(program = %self.program.display(), path = %path.display(), "running kustomize build");

        let output = Command::new(&self.program)
            .arg("build")
            .arg(path)
            .args(["--load-restrictor", "LoadRestrictionsNone"])
            .output()
            .map_err(|e| failed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(failed(stderr.trim().to_string()).into());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn selection() -> Vec<SelectedComponent> {
        vec![
            SelectedComponent {
                component: "storage".into(),
                overlays: vec!["storage/overlays/gcp".into()],
            },
            SelectedComponent {
                component: "common/argo".into(),
                overlays: vec![
                    "common/argo/overlays/gcp".into(),
                    "common/argo/overlays/logging".into(),
                ],
            },
            SelectedComponent {
                component: "common/application".into(),
                overlays: vec![],
            },
        ]
    }

    #[test]
    fn test_kustomization_yaml() {
        let kustomization = Kustomization::from_selection(&selection());

        insta::assert_snapshot!(kustomization.to_yaml().unwrap(), @r"
        apiVersion: kustomize.config.k8s.io/v1beta1
        kind: Kustomization
        resources:
        - common/application/base
        - common/argo/overlays/gcp
        - common/argo/overlays/logging
        - storage/overlays/gcp
        configurations:
        - configs/varreference.yaml
        ");
    }

    #[test]
    fn test_write() {
        let temp = TempDir::new().unwrap();
        let kustomization = Kustomization::from_selection(&selection());

        let path = kustomization.write(temp.path()).unwrap();

        let written: Kustomization =
            serde_yaml::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written, kustomization);
    }

    #[test]
    fn test_missing_program() {
        let temp = TempDir::new().unwrap();
        let kustomize = KustomizeCommand::new(temp.path().join("no-such-kustomize"));

        let err = kustomize.build(temp.path()).unwrap_err();

        assert!(
            err.to_string()
                .starts_with(&format!("Kustomizer Run for path '{}' failed: ", temp.path().display()))
        );
    }
}
