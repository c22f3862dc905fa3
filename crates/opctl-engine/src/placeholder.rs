//! Placeholder substitution
//!
//! Three token forms are recognised:
//! - `$(key)`: the value as it should be embedded in YAML (integers quoted)
//! - `$raw(key)`: the value as is
//! - `$base64(key)`: base64 of the raw value
//!
//! Only complete tokens whose key is in the map are replaced; anything else
//! (including kustomize's own `$(VAR)` references) is copied verbatim.

use std::path::Path;
use walkdir::WalkDir;

use crate::error::Result;
use crate::flat::{FlatMap, FlatValue};

#[derive(Debug, Clone, Copy)]
enum Form {
    Embedded,
    Raw,
    Base64,
}

impl Form {
    fn render(self, value: &FlatValue) -> String {
        match self {
            Self::Embedded => value.embedded(),
            Self::Raw => value.raw(),
            Self::Base64 => value.base64(),
        }
    }
}

const FORMS: [(&str, Form); 3] = [
    ("$(", Form::Embedded),
    ("$raw(", Form::Raw),
    ("$base64(", Form::Base64),
];

/// Replace every known placeholder token in `content`
pub fn substitute(content: &str, map: &FlatMap) -> String {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        match token(tail, map) {
            Some((replacement, consumed)) => {
                out.push_str(&replacement);
                rest = &tail[consumed..];
            }
            None => {
                out.push('$');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Match a token at the start of `tail`, returning its replacement and length
fn token(tail: &str, map: &FlatMap) -> Option<(String, usize)> {
    FORMS.iter().find_map(|(prefix, form)| {
        let after = tail.strip_prefix(prefix)?;
        let end = after.find(')')?;
        let key = &after[..end];
        if !is_key(key) {
            return None;
        }
        let value = map.get(key)?;
        Some((form.render(value), prefix.len() + end + 1))
    })
}

fn is_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Substitute placeholders in one file, rewriting it only when it changed
pub fn substitute_file(path: &Path, map: &FlatMap) -> Result<bool> {
    let bytes = std::fs::read(path)?;
    let Ok(content) = String::from_utf8(bytes) else {
        tracing::debug!(path = %path.display(), "skipping non UTF-8 file");
        return Ok(false);
    };

    let replaced = substitute(&content, map);
    if replaced == content {
        return Ok(false);
    }

    std::fs::write(path, replaced)?;
    Ok(true)
}

/// Substitute placeholders in every regular file under `root`, skipping `.git`.
///
/// Returns the number of files rewritten.
pub fn substitute_tree(root: &Path, map: &FlatMap) -> Result<usize> {
    let mut rewritten = 0;

    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| !entry.file_name().to_string_lossy().starts_with(".git"));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if substitute_file(entry.path(), map)? {
            rewritten += 1;
        }
    }

    tracing::debug!(root = %root.display(), rewritten, "substituted placeholders");
    Ok(rewritten)
}
