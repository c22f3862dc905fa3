//! Parameters validation
//!
//! Checks the deployment namespace, domain and fqdn, then rejects any value
//! that still holds a `<placeholder>`.

use miette::Diagnostic;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::Value;
use std::fmt;
use thiserror::Error;

use crate::error::{CoreError, Result};
use crate::keys::KeyFormat;
use crate::params::Params;

const NAMESPACE_KEY: &str = "application.defaultNamespace";
const DOMAIN_KEY: &str = "application.domain";
const FQDN_KEY: &str = "application.fqdn";

const RESERVED_NAMESPACES: &[&str] = &[
    "onepanel",
    "application-system",
    "cert-manager",
    "istio-system",
    "knative-serving",
    "kube-public",
    "kube-system",
    "default",
];

const MAX_NAMESPACE_LEN: usize = 63;

static NAMESPACE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])$").expect("valid regex")
});

/// Category of an invalid parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamsErrorKind {
    Missing,
    Blank,
    Parameter,
    Reserved,
}

impl fmt::Display for ParamsErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Missing => "missing",
            Self::Blank => "blank",
            Self::Parameter => "parameter",
            Self::Reserved => "reserved",
        };
        f.write_str(name)
    }
}

/// An invalid entry of the parameters document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", describe(.key, .value.as_deref()))]
pub struct ParamsError {
    /// Full key (`application.domain`)
    pub key: String,
    /// Last segment of the key (`domain`)
    pub short_key: String,
    pub value: Option<String>,
    pub kind: ParamsErrorKind,
    /// Extra explanation, empty when there is none
    pub message: String,
}

fn describe(key: &str, value: Option<&str>) -> String {
    match value {
        Some(value) => format!("{}: {} is invalid", key, value),
        None => format!("{} is invalid", key),
    }
}

impl Diagnostic for ParamsError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!("opctl::params::{}", self.kind)))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.humanize()))
    }
}

impl ParamsError {
    fn new(key: &str, kind: ParamsErrorKind) -> Self {
        Self {
            key: key.to_string(),
            short_key: key.rsplit('.').next().unwrap_or(key).to_string(),
            value: None,
            kind,
            message: String::new(),
        }
    }

    fn with_value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    fn with_message(mut self, message: &str) -> Self {
        self.message = message.to_string();
        self
    }

    /// The sentence shown to the user
    pub fn humanize(&self) -> String {
        let value = self.value.as_deref().unwrap_or_default();
        match self.kind {
            ParamsErrorKind::Missing => format!("{} is missing in your params.yaml", self.key),
            ParamsErrorKind::Parameter => format!(
                "{} can not be '{}', please enter a different value for {}. {}",
                self.key, value, self.short_key, self.message
            ),
            ParamsErrorKind::Blank => format!(
                "{} can not be blank, please use a different {} in your params.yaml",
                self.key, self.short_key
            ),
            ParamsErrorKind::Reserved => format!(
                "{} can not be '{}' please use a different {} in your params.yaml",
                self.key, value, self.short_key
            ),
        }
    }
}

/// Validate a parameters document, stopping at the first problem
pub fn validate_params(params: &Params) -> Result<()> {
    let namespace = required_text(params, NAMESPACE_KEY)?;
    validate_namespace(&namespace)?;

    let domain = required_text(params, DOMAIN_KEY)?;
    let fqdn = required_text(params, FQDN_KEY)?;
    if !fqdn.ends_with(&domain) {
        return Err(CoreError::FqdnDomainMismatch);
    }

    let mut leaves = params.flatten(KeyFormat::Dotted);
    leaves.sort_by(|a, b| a.0.cmp(&b.0));

    for (key, value) in leaves {
        let Value::String(text) = value else {
            continue;
        };
        if text.starts_with('<') {
            return Err(ParamsError::new(&key, ParamsErrorKind::Parameter)
                .with_value(text)
                .into());
        }
    }

    Ok(())
}

fn required_text(params: &Params, key: &str) -> Result<String> {
    let value = params
        .get(key)
        .ok_or_else(|| ParamsError::new(key, ParamsErrorKind::Missing))?;

    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    };

    if text.is_empty() {
        return Err(ParamsError::new(key, ParamsErrorKind::Blank).into());
    }
    Ok(text)
}

fn validate_namespace(namespace: &str) -> std::result::Result<(), ParamsError> {
    let invalid = |kind| ParamsError::new(NAMESPACE_KEY, kind).with_value(namespace);

    if namespace == "<namespace>" {
        return Err(invalid(ParamsErrorKind::Parameter)
            .with_message("Namespace can not be <namespace> please provide a value like 'example'"));
    }
    if RESERVED_NAMESPACES.contains(&namespace) {
        return Err(invalid(ParamsErrorKind::Reserved));
    }
    if namespace.len() > MAX_NAMESPACE_LEN {
        return Err(invalid(ParamsErrorKind::Parameter)
            .with_message("Namespace must be less than 63 characters"));
    }
    if namespace.starts_with("kube-") {
        return Err(invalid(ParamsErrorKind::Parameter)
            .with_message("A namespace can not start with 'kube-'"));
    }
    if !NAMESPACE_RE.is_match(namespace) {
        return Err(invalid(ParamsErrorKind::Parameter).with_message(
            "A namespace can not start with 'kube-', must be lowercase, and can not start or end with dashes '-'",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(namespace: &str) -> Params {
        let mut params = Params::from_yaml(
            r#"
application:
  domain: example.com
  fqdn: app.example.com
"#,
        )
        .unwrap();
        params.put(NAMESPACE_KEY, namespace);
        params
    }

    fn params_error(result: Result<()>) -> ParamsError {
        match result {
            Err(CoreError::Params(err)) => err,
            other => panic!("expected a params error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_namespace() {
        assert!(validate_params(&params("my-app")).is_ok());
    }

    #[test]
    fn test_kube_prefix_rejected() {
        let err = params_error(validate_params(&params("kube-foo")));
        assert_eq!(err.kind, ParamsErrorKind::Parameter);
        assert_eq!(err.message, "A namespace can not start with 'kube-'");
    }

    #[test]
    fn test_reserved_namespace() {
        let err = params_error(validate_params(&params("default")));
        assert_eq!(err.kind, ParamsErrorKind::Reserved);
        assert_eq!(
            err.humanize(),
            "application.defaultNamespace can not be 'default' please use a different defaultNamespace in your params.yaml"
        );
    }

    #[test]
    fn test_long_namespace() {
        let err = params_error(validate_params(&params(&"a".repeat(64))));
        assert_eq!(err.message, "Namespace must be less than 63 characters");
        assert!(validate_params(&params(&"a".repeat(63))).is_ok());
    }

    #[test]
    fn test_namespace_pattern() {
        let err = params_error(validate_params(&params("My-App")));
        assert_eq!(err.kind, ParamsErrorKind::Parameter);
        assert!(validate_params(&params("-app")).is_err());
        assert!(validate_params(&params("app-")).is_err());
    }

    #[test]
    fn test_namespace_placeholder() {
        let err = params_error(validate_params(&params("<namespace>")));
        assert_eq!(
            err.humanize(),
            "application.defaultNamespace can not be '<namespace>', please enter a different value for defaultNamespace. Namespace can not be <namespace> please provide a value like 'example'"
        );
    }

    #[test]
    fn test_missing_and_blank() {
        let err = params_error(validate_params(&Params::new()));
        assert_eq!(err.kind, ParamsErrorKind::Missing);
        assert_eq!(err.humanize(), "application.defaultNamespace is missing in your params.yaml");

        let mut blank_domain = params("my-app");
        blank_domain.put(DOMAIN_KEY, "");
        let err = params_error(validate_params(&blank_domain));
        assert_eq!(err.kind, ParamsErrorKind::Blank);
        assert_eq!(
            err.humanize(),
            "application.domain can not be blank, please use a different domain in your params.yaml"
        );
    }

    #[test]
    fn test_fqdn_must_end_with_domain() {
        let mut params = params("my-app");
        params.put(FQDN_KEY, "app.other.org");

        let err = validate_params(&params).unwrap_err();
        assert!(matches!(err, CoreError::FqdnDomainMismatch));
    }

    #[test]
    fn test_unfilled_placeholder() {
        let mut params = params("my-app");
        params.put("artifactRepository.s3.bucket", "<bucket-name>");
        params.put("artifactRepository.s3.accessKey", "<access-key>");

        let err = params_error(validate_params(&params));
        assert_eq!(err.key, "artifactRepository.s3.accessKey");
        assert_eq!(err.short_key, "accessKey");
        assert_eq!(err.value.as_deref(), Some("<access-key>"));
        assert_eq!(err.to_string(), "artifactRepository.s3.accessKey: <access-key> is invalid");
    }
}
