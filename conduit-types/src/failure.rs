//! The failure side of [`Result`](crate::Result).

use crate::{Error, ErrorCode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An ordered, non-empty list of [`Error`] records.
///
/// There is no way to build an empty `Failure`: a failed result always
/// carries at least one error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Error>", into = "Vec<Error>")]
pub struct Failure {
    errors: Vec<Error>,
}

impl Failure {
    /// A failure carrying a single error.
    pub fn new(error: Error) -> Self {
        Self {
            errors: vec![error],
        }
    }

    /// Shorthand for a single framework error.
    pub fn of(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(Error::from_code(code, message))
    }

    /// Builds a failure from an ordered list. Returns `None` for an empty list.
    pub fn from_errors(errors: Vec<Error>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self { errors })
        }
    }

    /// Appends another error, keeping order.
    pub fn push(&mut self, error: Error) {
        self.errors.push(error);
    }

    /// Appends every error from another failure.
    pub fn extend(&mut self, other: Failure) {
        self.errors.extend(other.errors);
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// The first error; always present.
    pub fn first(&self) -> &Error {
        &self.errors[0]
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Always `false`; present for API symmetry with collections.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether any contained error carries the given code.
    pub fn has_code(&self, code: ErrorCode) -> bool {
        self.errors.iter().any(|e| e.has_code(code))
    }

    pub fn into_errors(self) -> Vec<Error> {
        self.errors
    }

    /// All messages joined with `"; "`.
    pub fn message(&self) -> String {
        self.errors
            .iter()
            .map(Error::message)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        f.write_str(&rendered.join("; "))
    }
}

impl std::error::Error for Failure {}

impl From<Error> for Failure {
    fn from(error: Error) -> Self {
        Self::new(error)
    }
}

impl TryFrom<Vec<Error>> for Failure {
    type Error = &'static str;

    fn try_from(errors: Vec<Error>) -> Result<Self, Self::Error> {
        Self::from_errors(errors).ok_or("a failure must carry at least one error")
    }
}

impl From<Failure> for Vec<Error> {
    fn from(failure: Failure) -> Self {
        failure.errors
    }
}
