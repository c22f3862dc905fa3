//! Component and overlay selection
//!
//! The `Builder` accumulates a selection over a loaded `Manifest`: components
//! and overlays are added explicitly, and overlay contenders (a cloud provider
//! name, `cloud`, `https`, ...) select every overlay of an already selected
//! component whose path ends with the contender.

use indexmap::IndexMap;
use std::path::PathBuf;

use crate::config::SelectedComponent;
use crate::error::{CoreError, Result};
use crate::manifest::{Component, Manifest, Overlay};
use crate::params::Params;

/// A selected component with its selected overlays (insertion order, no duplicates)
#[derive(Debug, Clone)]
pub struct OverlayedComponent<'m> {
    component: &'m Component,
    overlays: Vec<&'m Overlay>,
}

impl<'m> OverlayedComponent<'m> {
    fn new(component: &'m Component) -> Self {
        Self {
            component,
            overlays: Vec::new(),
        }
    }

    pub fn component(&self) -> &'m Component {
        self.component
    }

    pub fn overlays(&self) -> &[&'m Overlay] {
        &self.overlays
    }

    /// Append an overlay unless one with the same path is already selected
    fn add_overlay(&mut self, overlay: &'m Overlay) {
        if self.overlays.iter().any(|o| o.path() == overlay.path()) {
            return;
        }
        self.overlays.push(overlay);
    }

    /// Manifest-relative vars files: the component base, then each overlay
    pub fn vars_file_paths(&self) -> Vec<String> {
        std::iter::once(self.component.vars_file_path())
            .chain(self.overlays.iter().map(|o| o.vars_file_path()))
            .collect()
    }

    pub fn to_selection(&self) -> SelectedComponent {
        SelectedComponent {
            component: self.component.path().to_string(),
            overlays: self.overlays.iter().map(|o| o.path().to_string()).collect(),
        }
    }
}

/// Selection over a manifests tree
#[derive(Debug)]
pub struct Builder<'m> {
    manifest: &'m Manifest,
    selection: IndexMap<String, OverlayedComponent<'m>>,
    contenders: Vec<String>,
}

impl<'m> Builder<'m> {
    pub fn new(manifest: &'m Manifest) -> Self {
        Self {
            manifest,
            selection: IndexMap::new(),
            contenders: Vec::new(),
        }
    }

    pub fn manifest(&self) -> &'m Manifest {
        self.manifest
    }

    pub fn is_selected(&self, component: &str) -> bool {
        self.selection.contains_key(component)
    }

    /// Select a component. Unknown or already selected paths are errors.
    pub fn add_component(&mut self, path: &str) -> Result<()> {
        let manifest = self.manifest;
        let component = manifest
            .component(path)
            .ok_or_else(|| CoreError::UnknownComponent {
                path: path.to_string(),
            })?;

        if self.selection.contains_key(path) {
            return Err(CoreError::ComponentAlreadyAdded {
                path: path.to_string(),
            });
        }

        self.selection
            .insert(path.to_string(), OverlayedComponent::new(component));
        Ok(())
    }

    /// Select an overlay, selecting its component first if needed
    pub fn add_overlay(&mut self, path: &str) -> Result<()> {
        let manifest = self.manifest;
        let overlay = manifest
            .overlay(path)
            .ok_or_else(|| CoreError::UnknownOverlay {
                path: path.to_string(),
            })?;

        if !self.selection.contains_key(overlay.component()) {
            self.add_component(overlay.component())?;
        }

        if let Some(selected) = self.selection.get_mut(overlay.component()) {
            selected.add_overlay(overlay);
        }
        Ok(())
    }

    /// Select every `common/...` component not listed in `skip`
    pub fn add_common_components(&mut self, skip: &[&str]) -> Result<()> {
        let manifest = self.manifest;
        for component in manifest.components() {
            if !component.is_common() || skip.contains(&component.path()) {
                continue;
            }
            self.add_component(component.path())?;
        }
        Ok(())
    }

    pub fn add_overlay_contender(&mut self, contender: impl Into<String>) {
        self.contenders.push(contender.into());
    }

    /// Add every overlay of a selected component whose path ends with a contender.
    ///
    /// Contenders are applied in insertion order, overlays in path order, and
    /// all matches are added.
    pub fn build(&mut self) -> Result<()> {
        let manifest = self.manifest;
        let contenders = self.contenders.clone();

        for contender in &contenders {
            for overlay in manifest.overlays() {
                if !self.selection.contains_key(overlay.component()) {
                    continue;
                }
                if overlay.path().ends_with(contender.as_str()) {
                    tracing::debug!(overlay = overlay.path(), contender = %contender, "contender matched");
                    self.add_overlay(overlay.path())?;
                }
            }
        }
        Ok(())
    }

    /// The current selection, in selection order
    pub fn overlayed_components(&self) -> impl Iterator<Item = &OverlayedComponent<'m>> {
        self.selection.values()
    }

    pub fn selection(&self) -> Vec<SelectedComponent> {
        self.selection
            .values()
            .map(OverlayedComponent::to_selection)
            .collect()
    }

    /// Absolute paths of the selection's vars files that exist on disk
    pub fn vars_file_paths(&self) -> Vec<PathBuf> {
        self.selection
            .values()
            .flat_map(OverlayedComponent::vars_file_paths)
            .map(|relative| self.manifest.resolve(&relative))
            .filter(|path| path.is_file())
            .collect()
    }

    /// Load every existing vars file with its declarations collapsed
    pub fn yamls(&self) -> Result<Vec<Params>> {
        self.vars_file_paths()
            .into_iter()
            .map(|path| {
                let mut vars = Params::from_file(&path)?;
                vars.flatten_required_default();
                Ok(vars)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn manifest(dirs: &[&str]) -> (TempDir, Manifest) {
        let temp = TempDir::new().unwrap();
        for dir in dirs {
            fs::create_dir_all(temp.path().join(dir)).unwrap();
        }
        let manifest = Manifest::load(temp.path()).unwrap();
        (temp, manifest)
    }

    fn overlay_paths(builder: &Builder<'_>, component: &str) -> Vec<String> {
        builder
            .selection()
            .into_iter()
            .find(|s| s.component == component)
            .map(|s| s.overlays)
            .unwrap_or_default()
    }

    #[test]
    fn test_add_component_twice_fails() {
        let (_temp, manifest) = manifest(&["common/argo/base"]);
        let mut builder = Builder::new(&manifest);

        builder.add_component("common/argo").unwrap();
        let err = builder.add_component("common/argo").unwrap_err();

        assert_eq!(
            err.to_string(),
            "component 'common/argo' has already been added"
        );
    }

    #[test]
    fn test_unknown_paths() {
        let (_temp, manifest) = manifest(&["common/argo/base"]);
        let mut builder = Builder::new(&manifest);

        assert_eq!(
            builder.add_component("logging").unwrap_err().to_string(),
            "unknown component 'logging'"
        );
        assert_eq!(
            builder.add_overlay("logging/overlays/aws").unwrap_err().to_string(),
            "unknown overlay 'logging/overlays/aws'"
        );
    }

    #[test]
    fn test_add_overlay_selects_component() {
        let (_temp, manifest) = manifest(&["storage/base", "storage/overlays/gcp"]);
        let mut builder = Builder::new(&manifest);

        builder.add_overlay("storage/overlays/gcp").unwrap();

        assert!(builder.is_selected("storage"));
        assert_eq!(overlay_paths(&builder, "storage"), vec!["storage/overlays/gcp"]);
    }

    #[test]
    fn test_overlay_dedup() {
        let (_temp, manifest) = manifest(&["storage/base", "storage/overlays/gcp"]);
        let mut builder = Builder::new(&manifest);

        builder.add_overlay("storage/overlays/gcp").unwrap();
        builder.add_overlay("storage/overlays/gcp").unwrap();

        assert_eq!(overlay_paths(&builder, "storage").len(), 1);
    }

    #[test]
    fn test_add_common_components_with_skip() {
        let (_temp, manifest) = manifest(&[
            "common/application/base",
            "common/argo/base",
            "common/istio/base",
            "logging/base",
        ]);
        let mut builder = Builder::new(&manifest);

        builder.add_common_components(&["common/istio"]).unwrap();

        let selected: Vec<String> = builder.selection().into_iter().map(|s| s.component).collect();
        assert_eq!(selected, vec!["common/application", "common/argo"]);
    }

    #[test]
    fn test_contender_exact_suffix() {
        let (_temp, manifest) = manifest(&[
            "a/base",
            "a/overlays/gcp",
            "b/base",
            "b/overlays/gcp-extra",
        ]);
        let mut builder = Builder::new(&manifest);
        builder.add_component("a").unwrap();
        builder.add_component("b").unwrap();
        builder.add_overlay_contender("gcp");

        builder.build().unwrap();

        assert_eq!(overlay_paths(&builder, "a"), vec!["a/overlays/gcp"]);
        assert!(overlay_paths(&builder, "b").is_empty());
    }

    #[test]
    fn test_contender_requires_selected_component() {
        let (_temp, manifest) = manifest(&["storage/base", "storage/overlays/aws", "logging/base"]);
        let mut builder = Builder::new(&manifest);
        builder.add_component("logging").unwrap();
        builder.add_overlay_contender("aws");

        builder.build().unwrap();

        assert!(!builder.is_selected("storage"));
    }

    #[test]
    fn test_contender_matches_every_overlay() {
        let (_temp, manifest) = manifest(&[
            "common/argo/base",
            "common/argo/overlays/cloud",
            "common/argo/overlays/gcp",
            "storage/base",
            "storage/overlays/gcp",
        ]);
        let mut builder = Builder::new(&manifest);
        builder.add_common_components(&[]).unwrap();
        builder.add_component("storage").unwrap();
        builder.add_overlay_contender("gcp");
        builder.add_overlay_contender("cloud");

        builder.build().unwrap();

        assert_eq!(
            overlay_paths(&builder, "common/argo"),
            vec!["common/argo/overlays/gcp", "common/argo/overlays/cloud"]
        );
        assert_eq!(overlay_paths(&builder, "storage"), vec!["storage/overlays/gcp"]);
    }

    #[test]
    fn test_contender_plain_suffix_also_matches_longer_names() {
        // `gcp` is a plain string suffix of `xgcp`
        let (_temp, manifest) = manifest(&["storage/base", "storage/overlays/xgcp"]);
        let mut builder = Builder::new(&manifest);
        builder.add_component("storage").unwrap();
        builder.add_overlay_contender("gcp");

        builder.build().unwrap();

        assert_eq!(overlay_paths(&builder, "storage"), vec!["storage/overlays/xgcp"]);
    }

    #[test]
    fn test_yamls_flatten_existing_vars_files() {
        let (temp, manifest) = manifest(&["common/argo/base", "common/argo/overlays/gcp"]);
        fs::write(
            temp.path().join("common/argo/base/vars.yaml"),
            "workflowEngine:\n  containerRuntimeExecutor:\n    default: docker\n",
        )
        .unwrap();

        let mut builder = Builder::new(&manifest);
        builder.add_overlay("common/argo/overlays/gcp").unwrap();

        assert_eq!(builder.vars_file_paths().len(), 1);
        let yamls = builder.yamls().unwrap();
        assert_eq!(yamls.len(), 1);
        assert_eq!(
            yamls[0].get_str("workflowEngine.containerRuntimeExecutor"),
            Some("docker")
        );
    }
}
