//! Per-field validation messages
//!
//! Both client-side form checks and server 400 responses end up here, so a
//! form can show every message next to the field it belongs to.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

/// Key used for messages that do not belong to a single field
pub const NON_FIELD_KEY: &str = "non_field_errors";

/// Ordered map from field name to its message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: BTreeMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field`; the first message for a field wins
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.entry(field.into()).or_insert_with(|| message.into());
    }

    /// Record the error of a validation result, if any
    pub fn check(&mut self, field: &str, result: Result<(), String>) {
        if let Err(message) = result {
            self.add(field, message);
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when nothing was recorded, otherwise the collected errors
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// Build from a JSON error body such as `{"email": ["Already taken."]}`
    ///
    /// Lists are joined with a space, scalars are used as-is, and a body that
    /// is not an object is stored under [`NON_FIELD_KEY`].
    pub fn from_json(body: &Value) -> Self {
        let mut errors = FieldErrors::new();
        match body {
            Value::Object(map) => {
                for (field, value) in map {
                    errors.add(field.clone(), flatten_message(value));
                }
            }
            Value::Null => {}
            other => errors.add(NON_FIELD_KEY, flatten_message(other)),
        }
        errors
    }
}

fn flatten_message(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(flatten_message)
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string(),
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}
