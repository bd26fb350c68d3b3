//! Validated git branch/ref names.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

use crate::domain::foundation::ValidationError;

static SAFE_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9._/-]{0,254}$").expect("static ref pattern compiles")
});

/// A branch or ref name restricted to a safe character set.
///
/// Rejects path traversal (`..`), lock-file suffixes (`.lock`) and trailing
/// separators, so the name can be interpolated into git host API paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct GitRef(String);

impl GitRef {
    /// Validates `name` for the payload field `field`.
    pub fn parse(field: &str, name: &str) -> Result<Self, ValidationError> {
        if name.is_empty() {
            return Err(ValidationError::empty_field(field));
        }
        if !SAFE_REF.is_match(name) {
            return Err(ValidationError::invalid_format(
                field,
                format!("invalid git ref name: {:?}", name),
            ));
        }
        if name.contains("..") || name.ends_with(".lock") || name.ends_with('/') {
            return Err(ValidationError::invalid_format(
                field,
                format!("invalid git ref name: {:?}", name),
            ));
        }
        Ok(Self(name.to_string()))
    }

    /// The conventional default branch, `main`.
    pub fn main() -> Self {
        Self("main".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
