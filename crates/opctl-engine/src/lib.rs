//! opctl Engine - Turns a deployment configuration into Kubernetes manifests
//!
//! The pipeline copies the manifests tree into a scratch directory, resolves
//! the parameters into a flat map (application keys, artifact repository,
//! database, linked vars, hidden settings), writes the env fragments,
//! substitutes `$(key)` placeholders and runs `kustomize build`.

pub mod application;
pub mod artifact;
pub mod database;
pub mod env_files;
pub mod error;
pub mod flat;
pub mod fs_util;
pub mod generate;
pub mod kustomize;
pub mod linked;
pub mod placeholder;
pub mod secrets;

pub use application::{HiddenSettings, ImageOptions, format_url_for_ui};
pub use artifact::{
    AbsConfig, ArtifactRepository, GcsConfig, ResolveContext, ResolvedArtifactRepository,
    S3Config, SecretRef,
};
pub use error::{EngineError, KustomizeError, Result};
pub use flat::{FlatMap, FlatValue, flatten_params};
pub use generate::{DEFAULT_SCRATCH_DIR, GenerateOptions, PreparedManifests, generate, prepare};
pub use kustomize::{Kustomization, KustomizeCommand, Kustomizer};
pub use placeholder::{substitute, substitute_tree};
pub use secrets::{SecretCharset, SecretGenerator};
