//! Field-level validation shared by the request DTOs.
//!
//! Request bodies derive [`validator::Validate`]; the helpers here supply the
//! custom checks and collect every failure into a [`FieldErrors`] map so a
//! rejected write reports all offending fields at once.

pub mod schedule;

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

/// Field name → messages, serialised as a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str(", ")?;
                }
                write!(f, "{field} {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, failures) in errors.field_errors() {
            for failure in failures {
                let message = failure
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| failure.code.to_string());
                fields.add(field.to_string(), message);
            }
        }
        fields
    }
}

/// Runs the derived validations, returning an empty map when the request is valid.
pub fn check_fields<T: Validate>(request: &T) -> FieldErrors {
    match request.validate() {
        Ok(()) => FieldErrors::new(),
        Err(errors) => errors.into(),
    }
}

fn failure(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(failure("blank", "can't be blank"));
    }
    Ok(())
}

/// A contact number as clients send it: a JSON integer or a string of digits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ContactNumber {
    Number(i64),
    Text(String),
}

impl ContactNumber {
    fn check(&self) -> Result<i64, ValidationError> {
        let parsed = match self {
            ContactNumber::Number(number) => Some(*number),
            ContactNumber::Text(text) if text.trim().is_empty() => {
                return Err(failure("blank", "can't be blank"));
            }
            ContactNumber::Text(text) => text.trim().parse::<i64>().ok(),
        };
        match parsed {
            Some(number) if number >= 0 => Ok(number),
            _ => Err(failure("not_an_integer", "must be an integer")),
        }
    }

    /// The stored value, or a `contact_number` field error.
    pub fn value(&self) -> Result<i64, FieldErrors> {
        self.check().map_err(|error| {
            let mut errors = FieldErrors::new();
            errors.add(
                "contact_number",
                error.message.map(|m| m.to_string()).unwrap_or_default(),
            );
            errors
        })
    }
}

impl From<&str> for ContactNumber {
    fn from(text: &str) -> Self {
        ContactNumber::Text(text.to_string())
    }
}

pub fn validate_contact_number(value: &ContactNumber) -> Result<(), ValidationError> {
    value.check().map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_number_accepts_only_integers() {
        assert!(validate_contact_number(&"131313".into()).is_ok());
        assert!(validate_contact_number(&" 42 ".into()).is_ok());
        assert!(validate_contact_number(&ContactNumber::Number(131313)).is_ok());
        assert!(validate_contact_number(&"13.5".into()).is_err());
        assert!(validate_contact_number(&"+91 555".into()).is_err());
        assert!(validate_contact_number(&"-1".into()).is_err());
        assert!(validate_contact_number(&ContactNumber::Number(-1)).is_err());
        assert_eq!(ContactNumber::from("007").value().unwrap(), 7);

        let errors = ContactNumber::from("").value().unwrap_err();
        assert_eq!(errors.get("contact_number").unwrap(), ["can't be blank"]);
    }

    #[test]
    fn test_contact_number_deserializes_from_integer_or_string() {
        let number: ContactNumber = serde_json::from_str("131313").unwrap();
        assert_eq!(number, ContactNumber::Number(131313));

        let text: ContactNumber = serde_json::from_str("\"9876543210\"").unwrap();
        assert_eq!(text.value().unwrap(), 9_876_543_210);
    }

    #[test]
    fn test_not_blank_rejects_whitespace() {
        assert!(validate_not_blank("x").is_ok());
        assert!(validate_not_blank(" \t ").is_err());
    }

    #[test]
    fn test_field_errors_merge_and_display() {
        let mut errors = FieldErrors::new();
        errors.add("name", "can't be blank");

        let mut more = FieldErrors::new();
        more.add("name", "is taken");
        more.add("city", "can't be blank");
        errors.merge(more);

        assert_eq!(errors.get("name").unwrap().len(), 2);
        assert_eq!(
            errors.to_string(),
            "city can't be blank, name can't be blank, name is taken"
        );
        assert!(errors.into_result().is_err());
        assert!(FieldErrors::new().into_result().is_ok());
    }
}
