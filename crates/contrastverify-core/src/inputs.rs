//! Layered input lookup.
//!
//! Inputs arrive as environment variables in one of three formats, tried
//! in order with first-match-wins precedence:
//!
//! 1. `INPUT_<NAME>` with underscores removed (GitHub Actions input format)
//! 2. `<NAME>` (plain environment variable)
//! 3. `CONTRAST_<NAME>` (prefixed form)
//!
//! For `AUTH_HEADER` the candidates are `INPUT_AUTHHEADER`, `AUTH_HEADER`,
//! then `CONTRAST_AUTH_HEADER`.

use std::collections::HashMap;

use contrastverify_types::{Severity, ALL_SEVERITIES};

/// A named-value source that inputs are resolved from.
///
/// The production source is the process environment; tests substitute a map.
pub trait InputSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads from the process environment.
pub struct EnvSource;

impl InputSource for EnvSource {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl InputSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Resolves a named input, trying each supported format in order.
pub fn lookup(source: &dyn InputSource, name: &str) -> Option<String> {
    let candidates = [
        format!("INPUT_{}", name.replace('_', "")),
        name.to_string(),
        format!("CONTRAST_{name}"),
    ];
    candidates.into_iter().find_map(|key| source.get(&key))
}

/// Like [`lookup`], but treats empty-string values as absent.
pub fn lookup_non_empty(source: &dyn InputSource, name: &str) -> Option<String> {
    lookup(source, name).filter(|value| !value.is_empty())
}

/// Parses a CSV severities input into the recognized severities, in
/// descending severity order, deduplicated. Tokens are trimmed and matched
/// case-insensitively; unknown tokens are dropped.
pub fn included_severities(csv: &str) -> Vec<Severity> {
    let requested: Vec<Option<Severity>> =
        csv.split(',').map(Severity::from_token).collect();

    ALL_SEVERITIES
        .into_iter()
        .filter(|severity| requested.contains(&Some(*severity)))
        .collect()
}
