//! Deployment configuration (`config.yaml`)
//!
//! ```yaml
//! apiVersion: opdef.apps.onepanel.io/v1alpha1
//! kind: OpDef
//! spec:
//!   manifestsRepo: .onepanel/manifests
//!   params: params.yaml
//!   components:
//!     - common/argo/base
//!   overlays:
//!     - common/argo/overlays/gcp
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};

pub const API_VERSION: &str = "opdef.apps.onepanel.io/v1alpha1";
pub const KIND: &str = "OpDef";

const BASE_SUFFIX: &str = "/base";
const OVERLAYS_SEGMENT: &str = "/overlays/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentConfig {
    pub api_version: String,
    pub kind: String,
    pub spec: DeploymentSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSpec {
    pub manifests_repo: PathBuf,
    pub params: PathBuf,
    #[serde(default)]
    pub components: Vec<String>,
    #[serde(default)]
    pub overlays: Vec<String>,
}

/// A component (without `/base`) and the overlays selected for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedComponent {
    pub component: String,
    pub overlays: Vec<String>,
}

impl SelectedComponent {
    /// Kustomize resources: the overlays, or the base when there are none
    pub fn resources(&self) -> Vec<String> {
        if self.overlays.is_empty() {
            vec![format!("{}{}", self.component, BASE_SUFFIX)]
        } else {
            self.overlays.clone()
        }
    }
}

impl DeploymentConfig {
    pub fn new(manifests_repo: impl Into<PathBuf>, params: impl Into<PathBuf>) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            spec: DeploymentSpec {
                manifests_repo: manifests_repo.into(),
                params: params.into(),
                components: Vec::new(),
                overlays: Vec::new(),
            },
        }
    }

    /// Load and validate a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the manifests repo and the parameters file exist
    pub fn validate(&self) -> Result<()> {
        if self.kind != KIND {
            return Err(CoreError::InvalidConfig {
                message: format!("expected kind '{}', found '{}'", KIND, self.kind),
            });
        }

        if !self.spec.manifests_repo.exists() {
            return Err(CoreError::ManifestsRepoNotFound {
                path: self.spec.manifests_repo.display().to_string(),
            });
        }

        if !self.spec.params.exists() {
            return Err(CoreError::ParamsFileNotFound {
                path: self.spec.params.display().to_string(),
            });
        }

        Ok(())
    }

    /// Record a component by its base path (`common/argo/base`)
    pub fn add_component(&mut self, path_with_base: impl Into<String>) {
        self.spec.components.push(path_with_base.into());
    }

    pub fn add_overlay(&mut self, path: impl Into<String>) {
        self.spec.overlays.push(path.into());
    }

    /// Record a builder selection
    pub fn record_selection(&mut self, selection: &[SelectedComponent]) {
        for selected in selection {
            self.add_component(format!("{}{}", selected.component, BASE_SUFFIX));
            for overlay in &selected.overlays {
                self.add_overlay(overlay.clone());
            }
        }
    }

    /// Group the recorded overlays under their components, sorted by component path.
    ///
    /// An overlay belongs to the path before its last `/overlays/` segment.
    /// Overlays whose component was not recorded are ignored.
    pub fn overlayed_selection(&self) -> Vec<SelectedComponent> {
        let mut selection: Vec<SelectedComponent> = self
            .spec
            .components
            .iter()
            .map(|component| SelectedComponent {
                component: component
                    .strip_suffix(BASE_SUFFIX)
                    .unwrap_or(component)
                    .to_string(),
                overlays: Vec::new(),
            })
            .collect();

        for overlay in &self.spec.overlays {
            let Some(index) = overlay.rfind(OVERLAYS_SEGMENT) else {
                continue;
            };
            let owner = &overlay[..index];
            if let Some(selected) = selection.iter_mut().find(|s| s.component == owner) {
                if !selected.overlays.contains(overlay) {
                    selected.overlays.push(overlay.clone());
                }
            }
        }

        selection.sort_by(|a, b| a.component.cmp(&b.component));
        selection
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_yaml()?)?;
        Ok(())
    }
}
