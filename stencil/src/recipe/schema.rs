//! Shared schema checks for recipe entries decoded from configuration values.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::SchemaError;

/// Decodes one configuration entry, rejecting anything that is not an object.
pub(crate) fn decode<T: DeserializeOwned>(
    entity: &'static str,
    value: &Value,
) -> Result<T, SchemaError> {
    let name = entry_name(value);
    if !value.is_object() {
        return Err(SchemaError::new(
            entity,
            name,
            vec![format!("expected an object, found {}", kind(value))],
        ));
    }
    serde_json::from_value(value.clone())
        .map_err(|e| SchemaError::new(entity, name, vec![e.to_string()]))
}

/// Label used in error messages: the entry's `name`, or `title` for inputs.
pub(crate) fn entry_name(value: &Value) -> Option<String> {
    value
        .get("name")
        .or_else(|| value.get("title"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Decodes every entry with `convert`, logging and dropping those that fail.
pub(crate) fn parse_list<T>(
    values: &[Value],
    convert: impl Fn(&Value) -> Result<T, SchemaError>,
) -> Vec<T> {
    values
        .iter()
        .filter_map(|value| match convert(value) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!(error = %e, "dropping configuration entry");
                None
            }
        })
        .collect()
}

/// Collects every problem found in one entry.
#[derive(Debug, Default)]
pub(crate) struct Reasons(Vec<String>);

impl Reasons {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, reason: impl Into<String>) {
        self.0.push(reason.into());
    }

    /// Returns the value when present and non-empty; records a reason otherwise.
    pub(crate) fn require(&mut self, field: &str, value: Option<String>) -> String {
        match value.filter(|v| !v.is_empty()) {
            Some(v) => v,
            None => {
                self.push(format!("missing '{}'", field));
                String::new()
            }
        }
    }

    /// Records a reason for every empty entry of a string list.
    pub(crate) fn no_empty_entries(&mut self, field: &str, values: &[String]) {
        if values.iter().any(String::is_empty) {
            self.push(format!("'{}' contains an empty entry", field));
        }
    }

    /// Ends validation early with whatever has been collected so far.
    pub(crate) fn into_error(self, entity: &'static str, name: Option<String>) -> SchemaError {
        SchemaError::new(entity, name, self.0)
    }

    pub(crate) fn into_result<T>(
        self,
        entity: &'static str,
        name: Option<String>,
        ok: impl FnOnce() -> T,
    ) -> Result<T, SchemaError> {
        if self.0.is_empty() {
            Ok(ok())
        } else {
            Err(self.into_error(entity, name))
        }
    }
}

/// Treats an empty string the same as an absent one.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
