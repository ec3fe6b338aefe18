//! Operator prompts: the interface recipes use to ask for a choice or a typed value.
//!
//! The core only describes what to ask. A front end (terminal, editor, test script) implements
//! [`Prompter`]. Both operations return `None` when the operator cancels.

use async_trait::async_trait;
use regex::Regex;

/// One entry of a single-select list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectItem {
    pub label: String,
    /// Secondary line shown under the label.
    pub detail: String,
    /// Short annotation shown next to the label.
    pub description: String,
}

/// Title and placeholder text for a single-select list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectOptions {
    pub title: String,
    pub placeholder: String,
}

/// Live validation for a free-text prompt.
#[derive(Clone, Debug)]
pub struct Validation {
    pub pattern: Regex,
    /// Shown to the operator when the text does not match.
    pub message: String,
}

impl Validation {
    /// Returns the error message when `text` does not match, `None` when it is acceptable.
    pub fn check(&self, text: &str) -> Option<&str> {
        if self.pattern.is_match(text) {
            None
        } else {
            Some(&self.message)
        }
    }
}

/// A free-text prompt.
#[derive(Clone, Debug, Default)]
pub struct TextPrompt {
    pub title: String,
    pub prompt: String,
    pub placeholder: String,
    /// Pre-filled value; accepted as-is when the operator submits nothing.
    pub default: Option<String>,
    pub validation: Option<Validation>,
}

#[async_trait]
pub trait Prompter: Send + Sync {
    /// Asks the operator to pick one item; returns its index.
    async fn select_one(&self, options: &SelectOptions, items: &[SelectItem]) -> Option<usize>;

    /// Asks the operator to type a value.
    ///
    /// Implementations must not return text rejected by `prompt.validation`.
    async fn prompt_text(&self, prompt: &TextPrompt) -> Option<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_reports_message_on_mismatch() {
        let v = Validation {
            pattern: Regex::new("^[A-Z][A-Za-z]*$").unwrap(),
            message: "PascalCase please".to_string(),
        };
        assert_eq!(v.check("Widget"), None);
        assert_eq!(v.check("widget"), Some("PascalCase please"));
    }

    #[test]
    fn unanchored_pattern_matches_anywhere() {
        let v = Validation {
            pattern: Regex::new("[0-9]").unwrap(),
            message: "needs a digit".to_string(),
        };
        assert_eq!(v.check("abc1def"), None);
    }
}
