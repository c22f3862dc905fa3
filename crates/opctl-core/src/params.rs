//! Parameters document with dotted-path access
//!
//! `Params` wraps a YAML document (`params.yaml`, a `vars.yaml`, ...) and
//! exposes get/put/delete by dotted path, flattening into single-level keys,
//! and a merge where existing values always win.

use serde_yaml::{Mapping, Value};
use std::path::Path;

use crate::error::Result;
use crate::keys::KeyFormat;
use crate::vars::declared_variables;

/// A parameters document
#[derive(Debug, Clone, PartialEq)]
pub struct Params(Value);

impl Default for Params {
    fn default() -> Self {
        Self::new()
    }
}

impl Params {
    /// Create an empty document
    pub fn new() -> Self {
        Self(Value::Mapping(Mapping::new()))
    }

    /// Load a document from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse a document from a YAML string; an empty string is an empty document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(yaml)?;
        Ok(Self::from_value(value))
    }

    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null => Self::new(),
            other => Self(other),
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Mapping(map) => map.is_empty(),
            Value::Null => true,
            _ => false,
        }
    }

    /// Get a value by dotted path (e.g. `application.defaultNamespace`)
    pub fn get(&self, key: &str) -> Option<&Value> {
        key.split('.').try_fold(&self.0, |node, part| match node {
            Value::Mapping(map) => map.get(part),
            _ => None,
        })
    }

    /// Get a string value by dotted path
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Get a boolean by dotted path, accepting `true`/`false` strings as well
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn has_keys(&self, keys: &[&str]) -> bool {
        keys.iter().all(|key| self.has_key(key))
    }

    /// Return the keys from `keys` that are not present, in the given order
    pub fn find_missing_keys(&self, keys: &[&str]) -> Vec<String> {
        keys.iter()
            .filter(|key| !self.has_key(key))
            .map(|key| key.to_string())
            .collect()
    }

    /// Set a value by dotted path, creating intermediate mappings
    pub fn put(&mut self, key: &str, value: impl Into<Value>) {
        self.put_with_separator(key, value, ".");
    }

    /// Set a value by a path split on `separator`.
    ///
    /// A key that does not contain the separator is a top-level key, so
    /// `put_with_separator("applicationApiUrl", v, ".")` writes the root.
    pub fn put_with_separator(&mut self, key: &str, value: impl Into<Value>, separator: &str) {
        let parts: Vec<&str> = key.split(separator).collect();
        put_parts(&mut self.0, &parts, value.into());
    }

    /// Remove a value by dotted path. Returns whether something was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        let parts: Vec<&str> = key.split('.').collect();
        let Some((last, parents)) = parts.split_last() else {
            return false;
        };

        let mut node = &mut self.0;
        for part in parents {
            node = match node {
                Value::Mapping(map) => match map.get_mut(*part) {
                    Some(child) => child,
                    None => return false,
                },
                _ => return false,
            };
        }

        match node {
            Value::Mapping(map) => map.remove(*last).is_some(),
            _ => false,
        }
    }

    /// Merge `other` into this document.
    ///
    /// Keys already present here keep their value; only mappings present on
    /// both sides are merged recursively, and missing keys are copied over.
    pub fn merge(&mut self, other: &Params) {
        if matches!(self.0, Value::Null) {
            self.0 = Value::Mapping(Mapping::new());
        }
        merge_missing(&mut self.0, &other.0);
    }

    /// Flatten every scalar leaf into `(key, value)` pairs in document order.
    ///
    /// Sequence items contribute an `[i]` path part; only mapping or sequence
    /// items are descended into.
    pub fn flatten(&self, format: KeyFormat) -> Vec<(String, &Value)> {
        let mut out = Vec::new();
        flatten_node("", format, &self.0, &mut out);
        out
    }

    /// Collapse `required`/`default` declarations into plain values.
    ///
    /// `foo: {required: true, default: baz}` becomes `foo: baz`. A required
    /// declaration without a default becomes the `<foo>` placeholder and an
    /// optional declaration without a default is removed.
    pub fn flatten_required_default(&mut self) {
        for variable in declared_variables(self) {
            let inert = variable.is_inert();
            match variable.default {
                Some(default) => self.put(&variable.key, default),
                None if inert => {
                    self.delete(&variable.key);
                }
                None => {
                    let placeholder = format!("<{}>", variable.short_key());
                    self.put(&variable.key, placeholder);
                }
            }
        }
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.0)?)
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_yaml_string()?)?;
        Ok(())
    }
}

/// String form of a mapping key; non-scalar keys are skipped
pub(crate) fn key_to_string(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn put_parts(node: &mut Value, parts: &[&str], value: Value) {
    let Some((first, rest)) = parts.split_first() else {
        *node = value;
        return;
    };

    if !matches!(node, Value::Mapping(_)) {
        *node = Value::Mapping(Mapping::new());
    }

    if let Value::Mapping(map) = node {
        let child = map
            .entry(Value::String(first.to_string()))
            .or_insert(Value::Null);
        put_parts(child, rest, value);
    }
}

fn merge_missing(dest: &mut Value, src: &Value) {
    let (Value::Mapping(dest_map), Value::Mapping(src_map)) = (dest, src) else {
        return;
    };

    for (key, src_value) in src_map {
        match dest_map.get_mut(key) {
            Some(dest_value) => merge_missing(dest_value, src_value),
            None => {
                dest_map.insert(key.clone(), src_value.clone());
            }
        }
    }
}

fn flatten_node<'a>(
    path: &str,
    format: KeyFormat,
    node: &'a Value,
    out: &mut Vec<(String, &'a Value)>,
) {
    match node {
        Value::Mapping(map) => {
            for (key, value) in map {
                let Some(key) = key_to_string(key) else {
                    continue;
                };
                let key = format.join(path, &key);
                match value {
                    Value::Mapping(_) | Value::Sequence(_) => flatten_node(&key, format, value, out),
                    scalar => out.push((key, scalar)),
                }
            }
        }
        Value::Sequence(items) => {
            for (i, item) in items.iter().enumerate() {
                if matches!(item, Value::Mapping(_) | Value::Sequence(_)) {
                    let key = format.join(path, &format!("[{}]", i));
                    flatten_node(&key, format, item, out);
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_by_dotted_path() {
        let params = Params::from_yaml(
            r#"
application:
  defaultNamespace: example
  insecure: "true"
  nodePool:
    label: node.kubernetes.io/instance-type
"#,
        )
        .unwrap();

        assert_eq!(params.get_str("application.defaultNamespace"), Some("example"));
        assert_eq!(
            params.get_str("application.nodePool.label"),
            Some("node.kubernetes.io/instance-type")
        );
        assert_eq!(params.get_bool("application.insecure"), Some(true));
        assert!(params.get("application.missing").is_none());
        assert!(params.get("application.defaultNamespace.deeper").is_none());
    }

    #[test]
    fn test_find_missing_keys() {
        let params = Params::from_yaml("a:\n  b: 1\nc: 2\n").unwrap();

        assert!(params.has_keys(&["a.b", "c"]));
        assert_eq!(
            params.find_missing_keys(&["a.b", "a.x", "d"]),
            vec!["a.x".to_string(), "d".to_string()]
        );
    }

    #[test]
    fn test_put_creates_intermediate_mappings() {
        let mut params = Params::new();
        params.put("database.host", "postgres");
        params.put("database.port", 5432);
        params.put_with_separator("applicationApiUrl", "https://app.test/api", ".");

        assert_eq!(params.get_str("database.host"), Some("postgres"));
        assert_eq!(params.get("database.port").and_then(Value::as_i64), Some(5432));
        assert_eq!(
            params.get_str("applicationApiUrl"),
            Some("https://app.test/api")
        );
    }

    #[test]
    fn test_put_replaces_scalar_with_mapping() {
        let mut params = Params::from_yaml("a: 1\n").unwrap();
        params.put("a.b", "x");
        assert_eq!(params.get_str("a.b"), Some("x"));
    }

    #[test]
    fn test_delete() {
        let mut params = Params::from_yaml("a:\n  b: 1\n  c: 2\n").unwrap();

        assert!(params.delete("a.b"));
        assert!(!params.delete("a.b"));
        assert!(!params.delete("x.y"));
        assert!(params.has_key("a.c"));
    }

    #[test]
    fn test_merge_existing_values_win() {
        let mut user = Params::from_yaml("foo: 2\n").unwrap();
        let defaults = Params::from_yaml("foo: 1\nbar:\n  x: 1\n").unwrap();

        user.merge(&defaults);

        let expected = Params::from_yaml("foo: 2\nbar:\n  x: 1\n").unwrap();
        assert_eq!(user, expected);
    }

    #[test]
    fn test_merge_recurses_into_mappings_only() {
        let mut user = Params::from_yaml(
            r#"
application:
  domain: example.com
list:
  - a
"#,
        )
        .unwrap();
        let defaults = Params::from_yaml(
            r#"
application:
  domain: default.com
  fqdn: app.default.com
list:
  - b
  - c
"#,
        )
        .unwrap();

        user.merge(&defaults);

        assert_eq!(user.get_str("application.domain"), Some("example.com"));
        assert_eq!(user.get_str("application.fqdn"), Some("app.default.com"));
        assert_eq!(
            user.get("list").and_then(Value::as_sequence).map(Vec::len),
            Some(1)
        );
    }

    #[test]
    fn test_merge_into_empty_document() {
        let mut user = Params::from_yaml("").unwrap();
        let defaults = Params::from_yaml("a: 1\n").unwrap();

        user.merge(&defaults);

        assert!(user.has_key("a"));
    }

    #[test]
    fn test_flatten_dotted() {
        let params = Params::from_yaml(
            r#"
application:
  domain: example.com
  insecure: false
  nodePool:
    options:
      - name: small
        value: t2.small
      - plain
"#,
        )
        .unwrap();

        let keys: Vec<String> = params
            .flatten(KeyFormat::Dotted)
            .into_iter()
            .map(|(key, _)| key)
            .collect();

        assert_eq!(
            keys,
            vec![
                "application.domain",
                "application.insecure",
                "application.nodePool.options.[0].name",
                "application.nodePool.options.[0].value",
            ]
        );
    }

    #[test]
    fn test_flatten_lower_camel() {
        let params = Params::from_yaml("artifactRepository:\n  s3:\n    bucket: data\n").unwrap();
        let flat = params.flatten(KeyFormat::LowerCamel);

        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].0, "artifactRepositoryS3Bucket");
        assert_eq!(flat[0].1.as_str(), Some("data"));
    }

    #[test]
    fn test_flatten_required_default() {
        let mut vars = Params::from_yaml(
            r#"
foo:
  bar:
    required: true
    default: "baz"
"#,
        )
        .unwrap();

        vars.flatten_required_default();

        assert_eq!(vars, Params::from_yaml("foo:\n  bar: baz\n").unwrap());
    }

    #[test]
    fn test_flatten_required_default_keeps_types() {
        let mut vars = Params::from_yaml(
            r#"
application:
  insecure:
    default: false
  port:
    default: 8887
  domain:
    required: true
  optional:
    required: false
"#,
        )
        .unwrap();

        vars.flatten_required_default();

        assert_eq!(vars.get("application.insecure"), Some(&Value::Bool(false)));
        assert_eq!(
            vars.get("application.port").and_then(Value::as_i64),
            Some(8887)
        );
        assert_eq!(vars.get_str("application.domain"), Some("<domain>"));
        assert!(!vars.has_key("application.optional"));
    }
}
