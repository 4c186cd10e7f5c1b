//! Question value object

use super::error::DomainError;
use serde::{Deserialize, Serialize};

/// Maximum number of characters kept when a question is turned into a title
const TITLE_MAX_CHARS: usize = 50;

/// A question posed to the council (Value Object)
///
/// Holds the user's text for one turn. Construction rejects empty or
/// whitespace-only input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Question {
    content: String,
}

impl Question {
    /// Create a new question, rejecting blank content
    pub fn new(content: impl Into<String>) -> Result<Self, DomainError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(DomainError::InvalidQuestion(
                "question cannot be empty".to_string(),
            ));
        }
        Ok(Self { content })
    }

    /// Get the question content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Consume and return the inner content
    pub fn into_content(self) -> String {
        self.content
    }

    /// Short single-line form used as a conversation title
    pub fn title_snippet(&self) -> String {
        let first_line = self.content.trim().lines().next().unwrap_or_default();
        let mut title: String = first_line.chars().take(TITLE_MAX_CHARS).collect();
        if first_line.chars().count() > TITLE_MAX_CHARS {
            title = title.trim_end().to_string();
            title.push_str("...");
        }
        title
    }
}

impl std::fmt::Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

impl TryFrom<String> for Question {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Question::new(s)
    }
}

impl TryFrom<&str> for Question {
    type Error = DomainError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Question::new(s)
    }
}

impl From<Question> for String {
    fn from(q: Question) -> Self {
        q.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_creation() {
        let q = Question::new("What is Rust?").unwrap();
        assert_eq!(q.content(), "What is Rust?");
    }

    #[test]
    fn test_empty_question_rejected() {
        assert!(Question::new("").is_err());
        assert!(Question::new("   \n").is_err());
    }

    #[test]
    fn test_title_snippet_short() {
        let q = Question::new("  What is Rust?\nMore detail here").unwrap();
        assert_eq!(q.title_snippet(), "What is Rust?");
    }

    #[test]
    fn test_title_snippet_truncates_long_lines() {
        let q = Question::new("a".repeat(80)).unwrap();
        let title = q.title_snippet();
        assert_eq!(title, format!("{}...", "a".repeat(50)));
    }

    #[test]
    fn test_deserialize_rejects_blank() {
        let result: Result<Question, _> = serde_json::from_str("\"  \"");
        assert!(result.is_err());
    }
}
