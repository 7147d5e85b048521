//! Error taxonomy for the model server
//!
//! Three kinds of request-scoped errors: validation (bad input), contract
//! (a candidate model lacks a required capability), and operation (a
//! precondition for predict/learn is unmet). None are fatal to the process.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Message attached to a missing required request field.
pub const MISSING_FIELD: &str = "Missing data for required field.";

/// Detail carried by a validation error: either a plain message or a
/// field-name to message-list map, serialized as-is in API responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Fields(BTreeMap<String, Vec<String>>),
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorDetail::Message(message) => f.write_str(message),
            ErrorDetail::Fields(fields) => {
                let rendered = serde_json::to_string(fields).map_err(|_| fmt::Error)?;
                f.write_str(&rendered)
            }
        }
    }
}

/// Errors surfaced by the engine and its collaborators
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// Malformed or disallowed input, recoverable by correcting the request
    #[error("{0}")]
    Validation(ErrorDetail),

    /// A supplied model fails the capability contract
    #[error("{0}")]
    Contract(String),

    /// A predict/learn precondition is unmet
    #[error("{0}")]
    Operation(String),
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        EngineError::Validation(ErrorDetail::Message(message.into()))
    }

    /// Validation error for a single missing required field
    pub fn missing_field(field: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(field.into(), vec![MISSING_FIELD.to_string()]);
        EngineError::Validation(ErrorDetail::Fields(fields))
    }

    pub fn contract(message: impl Into<String>) -> Self {
        EngineError::Contract(message.into())
    }

    pub fn operation(message: impl Into<String>) -> Self {
        EngineError::Operation(message.into())
    }

    /// Stable kind label, used for error counters
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "validation",
            EngineError::Contract(_) => "contract",
            EngineError::Operation(_) => "operation",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_renders_field_map() {
        let err = EngineError::missing_field("features");
        let EngineError::Validation(detail) = &err else {
            panic!("expected validation error");
        };
        let json = serde_json::to_value(detail).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"features": ["Missing data for required field."]})
        );
    }

    #[test]
    fn kinds_are_stable() {
        assert_eq!(EngineError::validation("x").kind(), "validation");
        assert_eq!(EngineError::contract("x").kind(), "contract");
        assert_eq!(EngineError::operation("x").kind(), "operation");
    }

    #[test]
    fn display_uses_plain_message() {
        let err = EngineError::operation("You first need to provide a model.");
        assert_eq!(err.to_string(), "You first need to provide a model.");
    }
}
