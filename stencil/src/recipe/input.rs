//! Recipe inputs: one prompt each, answered by the operator to produce a symbol value.

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use super::schema::{decode, entry_name, non_empty, parse_list, Reasons};
use crate::error::SchemaError;
use crate::prompt::{Prompter, SelectItem, SelectOptions, TextPrompt, Validation};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawInput {
    title: Option<String>,
    suggestion: Option<String>,
    prompt: Option<String>,
    symbol: Option<String>,
    regex_validator: Option<String>,
    regex_error_description: Option<String>,
    fixed_choices: Option<Vec<RawChoice>>,
    default_value: Option<String>,
}

#[derive(Deserialize)]
struct RawChoice {
    title: Option<String>,
    description: Option<String>,
    value: Option<String>,
}

/// One selectable answer of a fixed-choice input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FixedChoice {
    pub title: String,
    pub description: String,
    pub value: String,
}

/// How an input is answered.
#[derive(Clone, Debug)]
pub enum InputKind {
    FreeText {
        default: Option<String>,
        validation: Option<Validation>,
    },
    FixedChoice(Vec<FixedChoice>),
}

/// An operator's answer to one input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Answer {
    pub symbol: String,
    pub value: String,
}

#[derive(Clone, Debug)]
pub struct Input {
    pub title: String,
    /// Placeholder text shown in the empty prompt.
    pub suggestion: String,
    /// Detail text explaining what to enter.
    pub prompt: String,
    /// Symbol the answer is bound to.
    pub symbol: String,
    pub kind: InputKind,
}

impl Input {
    /// Validates and converts one raw configuration entry.
    pub fn from_value(value: &Value) -> Result<Input, SchemaError> {
        let raw: RawInput = decode("input", value)?;
        let name = entry_name(value);
        let mut reasons = Reasons::new();

        let title = reasons.require("title", raw.title);
        let suggestion = reasons.require("suggestion", raw.suggestion);
        let prompt = reasons.require("prompt", raw.prompt);
        let symbol = reasons.require("symbol", raw.symbol);

        let validation = match (
            non_empty(raw.regex_validator),
            non_empty(raw.regex_error_description),
        ) {
            (Some(pattern), Some(message)) => match Regex::new(&pattern) {
                Ok(pattern) => Some(Validation { pattern, message }),
                Err(e) => {
                    reasons.push(format!("invalid 'regexValidator': {}", e));
                    None
                }
            },
            (Some(_), None) => {
                reasons.push("'regexValidator' requires 'regexErrorDescription'");
                None
            }
            (None, Some(_)) => {
                reasons.push("'regexErrorDescription' requires 'regexValidator'");
                None
            }
            (None, None) => None,
        };

        let mut choices = Vec::new();
        for (i, choice) in raw.fixed_choices.unwrap_or_default().into_iter().enumerate() {
            match (
                non_empty(choice.title),
                non_empty(choice.description),
                non_empty(choice.value),
            ) {
                (Some(title), Some(description), Some(value)) => choices.push(FixedChoice {
                    title,
                    description,
                    value,
                }),
                _ => reasons.push(format!(
                    "'fixedChoices[{}]' needs 'title', 'description' and 'value'",
                    i
                )),
            }
        }

        reasons.into_result("input", name, || {
            let kind = if choices.is_empty() {
                InputKind::FreeText {
                    default: non_empty(raw.default_value),
                    validation,
                }
            } else {
                InputKind::FixedChoice(choices)
            };
            Input {
                title,
                suggestion,
                prompt,
                symbol,
                kind,
            }
        })
    }

    /// Converts every valid entry; invalid ones are logged and dropped.
    pub fn parse(values: &[Value]) -> Vec<Input> {
        parse_list(values, Input::from_value)
    }

    /// Asks the operator for this input's value.
    ///
    /// `None` means the operator cancelled (or submitted nothing); the whole run must stop.
    pub async fn prompt_for_input(&self, prompter: &dyn Prompter) -> Option<Answer> {
        let value = match &self.kind {
            InputKind::FixedChoice(choices) => {
                let items: Vec<SelectItem> = choices
                    .iter()
                    .map(|choice| SelectItem {
                        label: choice.title.clone(),
                        detail: choice.description.clone(),
                        description: String::new(),
                    })
                    .collect();
                let options = SelectOptions {
                    title: self.title.clone(),
                    placeholder: self.suggestion.clone(),
                };
                let index = prompter.select_one(&options, &items).await?;
                choices.get(index)?.value.clone()
            }
            InputKind::FreeText {
                default,
                validation,
            } => {
                let prompt = TextPrompt {
                    title: self.title.clone(),
                    prompt: self.prompt.clone(),
                    placeholder: self.suggestion.clone(),
                    default: default.clone(),
                    validation: validation.clone(),
                };
                prompter.prompt_text(&prompt).await?
            }
        };
        if value.is_empty() {
            return None;
        }
        Some(Answer {
            symbol: self.symbol.clone(),
            value,
        })
    }
}
