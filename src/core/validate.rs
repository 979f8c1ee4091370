//! Request body validation.
//!
//! Bodies arrive as loose JSON. A [`Validator`] walks the fields a request
//! type cares about, collects every failure under a dotted field path
//! (`chapters.0.id`) and only then hands back typed values. Failures surface
//! as [`CoursekitError::ValidationError`], which the HTTP layer renders as 422.
//!
//! "Required" follows the usual form-request meaning: a missing key, `null`,
//! an empty string and an empty array all count as absent.

use crate::core::error::CoursekitError;
use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use std::fmt;
use std::sync::LazyLock;

/// Pattern shared by course slugs and chapter ids.
pub static SLUG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 _-]*$").unwrap());

/// Field path -> messages, in the order the failures were recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<(String, Vec<String>)>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, msgs)| msgs.as_slice())
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    /// The first message recorded, used as the summary line of a 422 response.
    pub fn first_message(&self) -> Option<&str> {
        self.0
            .iter()
            .flat_map(|(_, msgs)| msgs.iter())
            .next()
            .map(String::as_str)
    }

    fn push(&mut self, field: &str, message: String) {
        match self.0.iter_mut().find(|(name, _)| name == field) {
            Some((_, msgs)) => msgs.push(message),
            None => self.0.push((field.to_string(), vec![message])),
        }
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (field, msgs) in &self.0 {
            map.serialize_entry(field, msgs)?;
        }
        map.end()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, msgs)| format!("{}: {}", field, msgs.join(", ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Outcome for an optional field: absent, explicitly null, or a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Presence<T> {
    Absent,
    Null,
    Value(T),
}

impl<T> Presence<T> {
    /// `None` when absent, `Some(None)` for explicit null.
    pub fn into_option(self) -> Option<Option<T>> {
        match self {
            Presence::Absent => None,
            Presence::Null => Some(None),
            Presence::Value(v) => Some(Some(v)),
        }
    }
}

#[derive(Debug, Default)]
pub struct Validator {
    errors: ValidationErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(field, message.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn finish(self) -> Result<(), CoursekitError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(CoursekitError::ValidationError(self.errors))
        }
    }

    /// Required string, optionally length-capped.
    pub fn required_string(
        &mut self,
        field: &str,
        value: Option<&Value>,
        max: Option<usize>,
        required_message: Option<&str>,
    ) -> Option<String> {
        match value {
            None | Some(Value::Null) => {
                self.fail(field, required_message.map(str::to_string).unwrap_or_else(|| required(field)));
                None
            }
            Some(Value::String(s)) if s.is_empty() => {
                self.fail(field, required_message.map(str::to_string).unwrap_or_else(|| required(field)));
                None
            }
            Some(Value::String(s)) => self.check_max(field, s, max).then(|| s.clone()),
            Some(_) => {
                self.fail(field, format!("The {} field must be a string.", field));
                None
            }
        }
    }

    /// String that may be absent; `null` is accepted only when `nullable`.
    pub fn optional_string(
        &mut self,
        field: &str,
        value: Option<&Value>,
        max: Option<usize>,
        nullable: bool,
    ) -> Presence<String> {
        match value {
            None => Presence::Absent,
            Some(Value::Null) if nullable => Presence::Null,
            Some(Value::String(s)) => {
                if self.check_max(field, s, max) {
                    Presence::Value(s.clone())
                } else {
                    Presence::Absent
                }
            }
            Some(_) => {
                self.fail(field, format!("The {} field must be a string.", field));
                Presence::Absent
            }
        }
    }

    pub fn matches(&mut self, field: &str, value: &str, pattern: &Regex, message: Option<&str>) -> bool {
        if pattern.is_match(value) {
            return true;
        }
        self.fail(
            field,
            message
                .map(str::to_string)
                .unwrap_or_else(|| format!("The {} field format is invalid.", field)),
        );
        false
    }

    /// Required array with at least `min` elements.
    pub fn required_array<'v>(
        &mut self,
        field: &str,
        value: Option<&'v Value>,
        min: usize,
        required_message: Option<&str>,
    ) -> Option<&'v Vec<Value>> {
        match value {
            None | Some(Value::Null) => {
                self.fail(field, required_message.map(str::to_string).unwrap_or_else(|| required(field)));
                None
            }
            Some(Value::Array(items)) if items.is_empty() => {
                self.fail(field, required_message.map(str::to_string).unwrap_or_else(|| required(field)));
                None
            }
            Some(Value::Array(items)) if items.len() < min => {
                self.fail(field, format!("The {} field must have at least {} items.", field, min));
                None
            }
            Some(Value::Array(items)) => Some(items),
            Some(_) => {
                self.fail(field, format!("The {} field must be an array.", field));
                None
            }
        }
    }

    pub fn nullable_array<'v>(
        &mut self,
        field: &str,
        value: Option<&'v Value>,
        message: Option<&str>,
    ) -> Presence<&'v Vec<Value>> {
        match value {
            None => Presence::Absent,
            Some(Value::Null) => Presence::Null,
            Some(Value::Array(items)) => Presence::Value(items),
            Some(_) => {
                self.fail(
                    field,
                    message
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("The {} field must be an array.", field)),
                );
                Presence::Absent
            }
        }
    }

    /// Required integer in `[min, max]`.
    pub fn required_integer(
        &mut self,
        field: &str,
        value: Option<&Value>,
        min: u64,
        max: Option<u64>,
        required_message: Option<&str>,
    ) -> Option<u64> {
        let number = match value {
            None | Some(Value::Null) => {
                self.fail(field, required_message.map(str::to_string).unwrap_or_else(|| required(field)));
                return None;
            }
            Some(Value::Number(n)) => n,
            Some(_) => {
                self.fail(field, format!("The {} field must be an integer.", field));
                return None;
            }
        };

        let Some(n) = number.as_u64() else {
            if number.as_i64().is_some() {
                self.fail(field, format!("The {} field must be at least {}.", field, min));
            } else {
                self.fail(field, format!("The {} field must be an integer.", field));
            }
            return None;
        };

        if n < min {
            self.fail(field, format!("The {} field must be at least {}.", field, min));
            return None;
        }
        if let Some(max) = max
            && n > max
        {
            self.fail(field, format!("The {} field must not be greater than {}.", field, max));
            return None;
        }
        Some(n)
    }

    fn check_max(&mut self, field: &str, value: &str, max: Option<usize>) -> bool {
        match max {
            Some(max) if value.chars().count() > max => {
                self.fail(
                    field,
                    format!("The {} field must not be greater than {} characters.", field, max),
                );
                false
            }
            _ => true,
        }
    }
}

fn required(field: &str) -> String {
    format!("The {} field is required.", field)
}
