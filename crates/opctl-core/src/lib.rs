//! opctl Core - Core types for composing a platform deployment
//!
//! This crate provides the foundational types used throughout opctl:
//! - `Params`: The user parameters document with dotted-path access
//! - `Manifest`: Components and overlays discovered in a manifests tree
//! - `Builder`: Component/overlay selection driven by explicit adds and contenders
//! - `DeploymentConfig`: The persisted selection (`config.yaml`)
//! - `validate_params`: Namespace/domain checks on the parameters document

pub mod builder;
pub mod config;
pub mod database;
pub mod error;
pub mod keys;
pub mod manifest;
pub mod params;
pub mod validate;
pub mod vars;

pub use builder::{Builder, OverlayedComponent};
pub use config::{DeploymentConfig, DeploymentSpec, SelectedComponent};
pub use database::DatabaseConfig;
pub use error::{CoreError, Result};
pub use keys::{KeyFormat, lower_camel_key};
pub use manifest::{Component, Manifest, Overlay};
pub use params::Params;
pub use validate::{ParamsError, ParamsErrorKind, validate_params};
pub use vars::{ManifestVariable, declared_variables};
