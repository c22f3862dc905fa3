//! The manifests tree
//!
//! A directory `<path>/base` makes `<path>` a component and a directory
//! `<path>/overlays/<name>` is an overlay of the component at `<path>`.
//! All paths are relative to the manifests root and `/`-separated.

mod loader;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Prefix of components selected by `Builder::add_common_components`
pub const COMMON_PREFIX: &str = "common";

/// Name of the per-directory variables file
pub const VARS_FILE: &str = "vars.yaml";

/// A deployable unit with a `base` directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    path: String,
    overlays: Vec<String>,
}

impl Component {
    pub(crate) fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            overlays: Vec::new(),
        }
    }

    /// Path relative to the manifests root (`common/argo`)
    pub fn path(&self) -> &str {
        &self.path
    }

    /// `common/argo/base`
    pub fn path_with_base(&self) -> String {
        join(&self.path, "base")
    }

    /// `common/argo/base/vars.yaml`
    pub fn vars_file_path(&self) -> String {
        join(&self.path_with_base(), VARS_FILE)
    }

    /// Whether this component lives under the `common` prefix
    pub fn is_common(&self) -> bool {
        self.path.starts_with(COMMON_PREFIX)
    }

    /// Paths of the overlays known for this component, in discovery order
    pub fn overlays(&self) -> &[String] {
        &self.overlays
    }
}

/// A named variant of a component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    path: String,
    component: String,
}

impl Overlay {
    /// Path relative to the manifests root (`common/argo/overlays/gcp`)
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path of the owning component (`common/argo`)
    pub fn component(&self) -> &str {
        &self.component
    }

    /// `common/argo/overlays/gcp/vars.yaml`
    pub fn vars_file_path(&self) -> String {
        join(&self.path, VARS_FILE)
    }
}

/// Components and overlays discovered under a manifests root
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    root: PathBuf,
    components: BTreeMap<String, Component>,
    overlays: BTreeMap<String, Overlay>,
}

impl Manifest {
    pub(crate) fn empty(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            components: BTreeMap::new(),
            overlays: BTreeMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn component(&self, path: &str) -> Option<&Component> {
        self.components.get(path)
    }

    pub fn overlay(&self, path: &str) -> Option<&Overlay> {
        self.overlays.get(path)
    }

    /// Components sorted by path
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    /// Overlays sorted by path
    pub fn overlays(&self) -> impl Iterator<Item = &Overlay> {
        self.overlays.values()
    }

    /// Absolute location of a manifest-relative path
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Register a component; re-adding an existing path is a no-op
    pub(crate) fn add_component(&mut self, path: &str) -> &Component {
        self.components
            .entry(path.to_string())
            .or_insert_with(|| Component::new(path))
    }

    /// Register an overlay and its owning component
    pub(crate) fn add_overlay(&mut self, path: &str, component: &str) -> &Overlay {
        if !self.overlays.contains_key(path) {
            self.add_component(component);
            if let Some(owner) = self.components.get_mut(component) {
                owner.overlays.push(path.to_string());
            }
        }

        self.overlays
            .entry(path.to_string())
            .or_insert_with(|| Overlay {
                path: path.to_string(),
                component: component.to_string(),
            })
    }
}

fn join(path: &str, part: &str) -> String {
    if path.is_empty() {
        part.to_string()
    } else {
        format!("{}/{}", path, part)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_paths() {
        let component = Component::new("common/argo");

        assert_eq!(component.path_with_base(), "common/argo/base");
        assert_eq!(component.vars_file_path(), "common/argo/base/vars.yaml");
        assert!(component.is_common());
        assert!(!Component::new("logging").is_common());
    }

    #[test]
    fn test_add_overlay_registers_component_once() {
        let mut manifest = Manifest::empty(Path::new("/manifests"));
        manifest.add_overlay("storage/overlays/gcp", "storage");
        manifest.add_overlay("storage/overlays/gcp", "storage");
        manifest.add_overlay("storage/overlays/aws", "storage");

        let storage = manifest.component("storage").unwrap();
        assert_eq!(
            storage.overlays(),
            &["storage/overlays/gcp".to_string(), "storage/overlays/aws".to_string()]
        );
        assert_eq!(
            manifest.overlay("storage/overlays/gcp").unwrap().vars_file_path(),
            "storage/overlays/gcp/vars.yaml"
        );
    }
}
