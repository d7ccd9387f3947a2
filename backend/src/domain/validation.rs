//! Field-level validation failures shared by domain constructors.
//!
//! Constructors report which input field was rejected and why so the HTTP
//! adapter can surface `{ field, code }` details without knowing the rules.

use std::fmt;

use chrono::NaiveDate;
use serde_json::json;

use super::Error;

/// Machine-readable reason a field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldErrorCode {
    /// The field was absent or blank.
    MissingField,
    /// The field was present but not in an accepted form.
    InvalidValue,
    /// The field was not an ISO-8601 `YYYY-MM-DD` calendar date.
    InvalidDate,
    /// The field was outside its permitted numeric range.
    OutOfRange,
    /// The field exceeded its maximum length.
    TooLong,
}

impl FieldErrorCode {
    /// Wire representation used in error details.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::InvalidValue => "invalid_value",
            Self::InvalidDate => "invalid_date",
            Self::OutOfRange => "out_of_range",
            Self::TooLong => "too_long",
        }
    }
}

/// A rejected input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    field: &'static str,
    code: FieldErrorCode,
    message: String,
}

impl FieldError {
    /// Build a field error with an explicit message.
    pub fn new(field: &'static str, code: FieldErrorCode, message: impl Into<String>) -> Self {
        Self {
            field,
            code,
            message: message.into(),
        }
    }

    /// The field was absent or blank.
    pub fn missing(field: &'static str) -> Self {
        Self::new(
            field,
            FieldErrorCode::MissingField,
            format!("missing required field: {field}"),
        )
    }

    /// The field was not a valid calendar date.
    pub fn invalid_date(field: &'static str) -> Self {
        Self::new(
            field,
            FieldErrorCode::InvalidDate,
            format!("{field} must be a YYYY-MM-DD date"),
        )
    }

    /// Name of the rejected field.
    pub fn field(&self) -> &'static str {
        self.field
    }

    /// Rejection reason.
    pub fn code(&self) -> FieldErrorCode {
        self.code
    }

    /// Human-readable description.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Prefix the field with its container, e.g. `items[2].doctor`.
    pub(crate) fn nested(self, container: &'static str, index: usize) -> NestedFieldError {
        NestedFieldError {
            path: format!("{container}[{index}].{}", self.field),
            inner: self,
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for FieldError {}

impl From<FieldError> for Error {
    fn from(value: FieldError) -> Self {
        Error::invalid_request(value.message).with_details(json!({
            "field": value.field,
            "code": value.code.as_str(),
        }))
    }
}

/// A field error located inside an array element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedFieldError {
    path: String,
    inner: FieldError,
}

impl NestedFieldError {
    /// Dotted path of the rejected field.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl From<NestedFieldError> for Error {
    fn from(value: NestedFieldError) -> Self {
        Error::invalid_request(format!("{}: {}", value.path, value.inner.message)).with_details(
            json!({
                "field": value.path,
                "code": value.inner.code.as_str(),
            }),
        )
    }
}

/// Trim `value` and reject it when blank.
pub(crate) fn required_text(value: Option<&str>, field: &'static str) -> Result<String, FieldError> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_owned()),
        _ => Err(FieldError::missing(field)),
    }
}

/// Trim `value`, mapping blank input to `None`.
pub(crate) fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_owned)
}

/// Reject text longer than `max` characters.
pub(crate) fn bounded(text: String, field: &'static str, max: usize) -> Result<String, FieldError> {
    if text.chars().count() > max {
        return Err(FieldError::new(
            field,
            FieldErrorCode::TooLong,
            format!("{field} must be at most {max} characters"),
        ));
    }
    Ok(text)
}

/// Parse a strict `YYYY-MM-DD` Gregorian date.
///
/// Day-of-month bounds are checked, so `2023-02-29` is rejected.
pub(crate) fn parse_iso_date(raw: &str, field: &'static str) -> Result<NaiveDate, FieldError> {
    let raw = raw.trim();
    let shaped = raw.len() == 10
        && raw
            .bytes()
            .enumerate()
            .all(|(index, byte)| match index {
                4 | 7 => byte == b'-',
                _ => byte.is_ascii_digit(),
            });
    if !shaped {
        return Err(FieldError::invalid_date(field));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| FieldError::invalid_date(field))
}
