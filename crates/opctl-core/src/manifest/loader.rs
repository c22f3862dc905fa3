//! Manifests tree discovery

use std::path::Path;
use walkdir::WalkDir;

use super::Manifest;
use crate::error::{CoreError, Result};

const BASE_DIR: &str = "base";
const OVERLAYS_DIR: &str = "overlays";

impl Manifest {
    /// Walk `root` and register every component and overlay directory
    pub fn load<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(CoreError::ManifestsRepoNotFound {
                path: root.display().to_string(),
            });
        }

        let mut manifest = Manifest::empty(root);

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_dir() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let parts: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            if parts.is_empty() {
                continue;
            }

            manifest.register(&parts);
        }

        tracing::debug!(
            root = %root.display(),
            components = manifest.components.len(),
            overlays = manifest.overlays.len(),
            "loaded manifests tree"
        );

        Ok(manifest)
    }

    fn register(&mut self, parts: &[String]) {
        for (i, part) in parts.iter().enumerate() {
            if part == BASE_DIR {
                self.add_component(&parts[..i].join("/"));
            }

            if i > 0 && parts[i - 1] == OVERLAYS_DIR {
                let overlay = parts[..=i].join("/");
                let component = parts[..i - 1].join("/");
                self.add_overlay(&overlay, &component);
            }
        }
    }
}
