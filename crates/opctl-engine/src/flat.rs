//! The flattened parameter map
//!
//! Every scalar of the parameters document keyed by its lower camel path
//! (`artifactRepository.s3.bucket` -> `artifactRepositoryS3Bucket`).

use base64::Engine as _;
use opctl_core::{KeyFormat, Params};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A scalar of the flattened map
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlatValue {
    Str(String),
    Bool(bool),
    Int(i64),
}

pub type FlatMap = BTreeMap<String, FlatValue>;

impl FlatValue {
    /// Convert a YAML scalar. Floats and nulls keep their textual form.
    pub fn from_yaml(value: &Value) -> Self {
        match value {
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Str(n.to_string()),
            },
            Value::String(s) => Self::Str(s.clone()),
            Value::Tagged(tagged) => Self::from_yaml(&tagged.value),
            Value::Null | Value::Mapping(_) | Value::Sequence(_) => Self::Str(String::new()),
        }
    }

    /// Form used for `$(key)`: integers are quoted so they stay strings in YAML
    pub fn embedded(&self) -> String {
        match self {
            Self::Int(i) => format!("\"{}\"", i),
            other => other.raw(),
        }
    }

    /// Form used for `$raw(key)`
    pub fn raw(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
        }
    }

    /// Form used for `$base64(key)`: base64 of the raw form
    pub fn base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.raw())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FlatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw())
    }
}

impl From<&str> for FlatValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for FlatValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<bool> for FlatValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for FlatValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

/// Flatten a parameters document into lower camel keys
pub fn flatten_params(params: &Params) -> FlatMap {
    params
        .flatten(KeyFormat::LowerCamel)
        .into_iter()
        .map(|(key, value)| (key, FlatValue::from_yaml(value)))
        .collect()
}
