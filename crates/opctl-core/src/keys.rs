//! Key formats used when flattening a parameters document
//!
//! A flattened key is built segment by segment: `KeyFormat::join("", "a")`
//! starts a key and `KeyFormat::join("a", "b")` extends it.

/// How path segments are joined into a single flat key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyFormat {
    /// `application.defaultNamespace`
    #[default]
    Dotted,
    /// `applicationDefaultNamespace`
    LowerCamel,
    /// `APPLICATION_DEFAULTNAMESPACE`
    UpperSnake,
}

impl KeyFormat {
    /// Append `part` to an already formatted `path`
    pub fn join(self, path: &str, part: &str) -> String {
        match self {
            Self::Dotted => {
                if path.is_empty() {
                    part.to_string()
                } else {
                    format!("{}.{}", path, part)
                }
            }
            Self::LowerCamel => {
                if path.is_empty() {
                    to_lower_camel(part)
                } else {
                    format!("{}{}", path, to_camel(part))
                }
            }
            Self::UpperSnake => {
                if path.is_empty() {
                    part.to_uppercase()
                } else {
                    format!("{}_{}", path, part.to_uppercase())
                }
            }
        }
    }
}

/// Convert a separated reference (`artifactRepository.s3.bucket`) into the
/// lower camel key the flattened map uses (`artifactRepositoryS3Bucket`)
pub fn lower_camel_key(value: &str, separator: &str) -> String {
    value
        .split(separator)
        .fold(String::new(), |key, part| KeyFormat::LowerCamel.join(&key, part))
}

/// `node_pool` -> `NodePool`, `s3` -> `S3`, `abc3def` -> `Abc3Def`
pub fn to_camel(s: &str) -> String {
    camel_case(s, true)
}

/// `NodePool` -> `nodePool`, `default_namespace` -> `defaultNamespace`
pub fn to_lower_camel(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() => {
            let lowered: String = first.to_ascii_lowercase().to_string() + chars.as_str();
            camel_case(&lowered, false)
        }
        Some(_) => camel_case(s, false),
        None => String::new(),
    }
}

fn camel_case(s: &str, capitalize_first: bool) -> String {
    let mut out = String::with_capacity(s.len());
    let mut cap_next = capitalize_first;
    let mut prev_letter = false;
    // A digit run that directly follows a letter marks a word boundary
    let mut digits_after_letter = false;

    for c in s.trim_matches(' ').chars() {
        if c.is_ascii_digit() {
            digits_after_letter = prev_letter || digits_after_letter;
            out.push(c);
            cap_next = false;
            prev_letter = false;
            continue;
        }

        if c.is_ascii_alphabetic() {
            if c.is_ascii_uppercase() {
                out.push(c);
            } else if cap_next || digits_after_letter {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
            cap_next = false;
            prev_letter = true;
            digits_after_letter = false;
            continue;
        }

        cap_next = matches!(c, '_' | ' ' | '-' | '.');
        prev_letter = false;
        digits_after_letter = false;
    }

    out
}
