//! Settings shared by the operation handlers, and payload normalization.

use crate::domain::outbox::{sanitize, GitRef};
use crate::ports::CommitAuthor;

pub const MAX_TITLE_CHARS: usize = 500;
pub const MAX_AUTHOR_NAME_CHARS: usize = 100;
pub const MAX_MESSAGE_CHARS: usize = 200;

const DEFAULT_AUTHOR: &str = "service";
const DEFAULT_MESSAGE: &str = "Update claim content";

/// Host-wide values the handlers need but payloads do not carry.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationSettings {
    /// Branch that receives content commits and protection.
    pub default_branch: GitRef,
    /// Domain used to build commit author emails.
    pub author_email_domain: String,
}

impl Default for OperationSettings {
    fn default() -> Self {
        Self {
            default_branch: GitRef::main(),
            author_email_domain: "claims.local".to_string(),
        }
    }
}

impl OperationSettings {
    pub fn new(default_branch: GitRef, author_email_domain: impl Into<String>) -> Self {
        Self {
            default_branch,
            author_email_domain: author_email_domain.into(),
        }
    }

    /// Commit author for a payload's author fields.
    pub fn author(&self, author_id: &str, author_name: &str) -> CommitAuthor {
        let id = or_default(author_id.trim().to_string(), DEFAULT_AUTHOR);
        CommitAuthor {
            name: or_default(sanitize(author_name, MAX_AUTHOR_NAME_CHARS), DEFAULT_AUTHOR),
            email: format!("{}@{}", id, self.author_email_domain),
        }
    }
}

pub fn commit_message(message: &str) -> String {
    or_default(sanitize(message, MAX_MESSAGE_CHARS), DEFAULT_MESSAGE)
}

pub fn initial_commit_message(title: &str) -> String {
    format!("Initial claim: {}", sanitize(title, MAX_TITLE_CHARS))
}

fn or_default(value: String, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_email_uses_configured_domain() {
        let settings = OperationSettings::new(GitRef::main(), "example.org");
        let author = settings.author("user-1", "Ada");

        assert_eq!(author.name, "Ada");
        assert_eq!(author.email, "user-1@example.org");
    }

    #[test]
    fn blank_author_falls_back_to_service() {
        let author = OperationSettings::default().author("  ", "   ");

        assert_eq!(author.name, "service");
        assert_eq!(author.email, "service@claims.local");
    }

    #[test]
    fn author_name_is_cut() {
        let author = OperationSettings::default().author("u", &"n".repeat(150));
        assert_eq!(author.name.chars().count(), MAX_AUTHOR_NAME_CHARS);
    }

    #[test]
    fn commit_message_is_cut_and_defaulted() {
        assert_eq!(commit_message(""), "Update claim content");
        assert_eq!(commit_message(&"m".repeat(300)).chars().count(), MAX_MESSAGE_CHARS);
    }

    #[test]
    fn initial_message_includes_trimmed_title() {
        assert_eq!(initial_commit_message("  Riemann  "), "Initial claim: Riemann");
    }
}
