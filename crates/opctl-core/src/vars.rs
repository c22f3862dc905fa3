//! Variable declarations in `vars.yaml` files
//!
//! ```yaml
//! application:
//!   defaultNamespace:
//!     required: true
//!   insecure:
//!     default: false
//! ```

use serde_yaml::Value;

use crate::keys::KeyFormat;
use crate::params::{Params, key_to_string};

/// One declared variable of a vars document
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestVariable {
    /// Dotted key (`application.defaultNamespace`)
    pub key: String,
    pub required: bool,
    /// Typed default, as written in the vars file
    pub default: Option<Value>,
}

impl ManifestVariable {
    /// Last segment of the dotted key
    pub fn short_key(&self) -> &str {
        self.key.rsplit('.').next().unwrap_or(&self.key)
    }

    /// A variable that is neither required nor defaulted contributes nothing
    pub fn is_inert(&self) -> bool {
        !self.required && self.default.is_none()
    }
}

/// Collect every `required`/`default` declaration of a document, in document order
pub fn declared_variables(params: &Params) -> Vec<ManifestVariable> {
    let mut out = Vec::new();
    collect("", params.as_value(), &mut out);
    out
}

fn collect(path: &str, node: &Value, out: &mut Vec<ManifestVariable>) {
    let Value::Mapping(map) = node else {
        return;
    };

    for (key, value) in map {
        let Some(key) = key_to_string(key) else {
            continue;
        };
        let key = KeyFormat::Dotted.join(path, &key);

        match as_declaration(&key, value) {
            Some(variable) => out.push(variable),
            None => collect(&key, value, out),
        }
    }
}

fn as_declaration(key: &str, node: &Value) -> Option<ManifestVariable> {
    let Value::Mapping(map) = node else {
        return None;
    };

    let default = map.get("default").filter(|v| is_scalar(v)).cloned();
    let required = map.get("required").and_then(Value::as_bool);

    if default.is_none() && required.is_none() {
        return None;
    }

    Some(ManifestVariable {
        key: key.to_string(),
        required: required.unwrap_or(false),
        default,
    })
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Mapping(_) | Value::Sequence(_))
}
