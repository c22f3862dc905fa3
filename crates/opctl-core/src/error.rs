//! Core error types

use thiserror::Error;

use crate::validate::ParamsError;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("unknown component '{path}'")]
    UnknownComponent { path: String },

    #[error("unknown overlay '{path}'")]
    UnknownOverlay { path: String },

    #[error("component '{path}' has already been added")]
    ComponentAlreadyAdded { path: String },

    #[error("the manifests repo directory does not exist at {path}")]
    ManifestsRepoNotFound { path: String },

    #[error("configuration file error: the parameters file does not exist at {path}")]
    ParamsFileNotFound { path: String },

    #[error("invalid configuration file: {message}")]
    InvalidConfig { message: String },

    #[error(transparent)]
    Params(#[from] ParamsError),

    #[error("application.fqdn does not end in application.domain")]
    FqdnDomainMismatch,

    #[error("'{key}' is not a mapping")]
    NotAMapping { key: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to walk manifests tree: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
