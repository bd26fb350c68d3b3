//! Claim content formats and payload text normalization.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Markup format of a claim's content file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    #[default]
    Markdown,
    Latex,
    Plain,
}

impl ContentFormat {
    /// File extension used for the content file in the claim repository.
    pub fn extension(&self) -> &'static str {
        match self {
            ContentFormat::Markdown => "md",
            ContentFormat::Latex => "tex",
            ContentFormat::Plain => "txt",
        }
    }

    /// Path of the single content file committed for a claim.
    pub fn content_path(&self) -> String {
        format!("claim.{}", self.extension())
    }
}

impl fmt::Display for ContentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContentFormat::Markdown => "markdown",
            ContentFormat::Latex => "latex",
            ContentFormat::Plain => "plain",
        };
        f.write_str(s)
    }
}

impl FromStr for ContentFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "markdown" => Ok(ContentFormat::Markdown),
            "latex" => Ok(ContentFormat::Latex),
            "plain" => Ok(ContentFormat::Plain),
            other => Err(ValidationError::invalid_format(
                "format",
                format!("{:?} must be one of markdown, latex, plain", other),
            )),
        }
    }
}

/// Cuts `value` to at most `max_chars` characters and trims surrounding whitespace.
pub fn sanitize(value: &str, max_chars: usize) -> String {
    let cut: String = value.chars().take(max_chars).collect();
    cut.trim().to_string()
}

/// Cuts `value` to at most `max_chars` characters, respecting char boundaries.
pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((idx, _)) => value[..idx].to_string(),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_maps_to_extension() {
        assert_eq!(ContentFormat::Markdown.content_path(), "claim.md");
        assert_eq!(ContentFormat::Latex.content_path(), "claim.tex");
        assert_eq!(ContentFormat::Plain.content_path(), "claim.txt");
    }

    #[test]
    fn format_defaults_to_markdown() {
        assert_eq!(ContentFormat::default(), ContentFormat::Markdown);
    }

    #[test]
    fn format_rejects_unknown_values() {
        assert!("html".parse::<ContentFormat>().is_err());
        assert_eq!("latex".parse::<ContentFormat>().unwrap(), ContentFormat::Latex);
    }

    #[test]
    fn format_deserializes_lowercase() {
        let format: ContentFormat = serde_json::from_str("\"plain\"").unwrap();
        assert_eq!(format, ContentFormat::Plain);
        assert!(serde_json::from_str::<ContentFormat>("\"rtf\"").is_err());
    }

    #[test]
    fn sanitize_cuts_then_trims() {
        assert_eq!(sanitize("  hello world  ", 100), "hello world");
        assert_eq!(sanitize("abcdef", 3), "abc");
        assert_eq!(sanitize("ab  cdef", 4), "ab");
    }

    #[test]
    fn truncate_respects_multibyte_chars() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 100), "short");
    }
}
