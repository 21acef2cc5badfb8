//! Aggregated, field-scoped validation results.

use crate::{Error, ErrorCode, Failure};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One violation against one named property. The same property may appear
/// more than once in a [`ValidationResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub property_name: String,
    pub error_message: String,
}

impl ValidationError {
    pub fn new(property_name: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            error_message: error_message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.property_name, self.error_message)
    }
}

/// Every violation found while checking a multi-field input.
///
/// A successful validation is simply an instance with no errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// A validation with no violations.
    pub fn success() -> Self {
        Self::default()
    }

    pub fn with_errors(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }

    /// Shorthand for a result holding exactly one violation.
    pub fn single(property_name: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            errors: vec![ValidationError::new(property_name, error_message)],
        }
    }

    /// Records one more violation.
    pub fn add(&mut self, property_name: impl Into<String>, error_message: impl Into<String>) {
        self.errors
            .push(ValidationError::new(property_name, error_message));
    }

    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Appends every violation from `other`.
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Violations joined as `"prop: message; prop: message"`.
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Converts into a [`Result`](crate::Result): `Ok(())` when valid,
    /// otherwise one [`Error`] per violation, all carrying `code` and a
    /// `property` detail, aggregated into a single [`Failure`].
    pub fn into_result(self, code: ErrorCode) -> crate::Result<()> {
        let errors: Vec<Error> = self
            .errors
            .into_iter()
            .map(|v| {
                let message = if v.error_message.trim().is_empty() {
                    format!("{} is invalid", v.property_name)
                } else {
                    v.error_message
                };
                Error::from_code(code, message).with_detail("property", v.property_name)
            })
            .collect();
        match Failure::from_errors(errors) {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }
}

impl FromIterator<ValidationError> for ValidationResult {
    fn from_iter<I: IntoIterator<Item = ValidationError>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}
