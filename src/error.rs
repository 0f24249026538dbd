//! Error types for the rule engine

use pyo3::exceptions::{PyKeyError, PyRuntimeError, PyValueError};
use pyo3::PyErr;
use thiserror::Error;

/// Main error type for the rule engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleEngineError {
    #[error("Unrecognized character '{character}' at offset {offset}")]
    LexError { offset: usize, character: char },

    #[error("Empty rule")]
    EmptyRule,

    #[error("Syntax error at token {position}: {message}")]
    SyntaxError { position: usize, message: String },

    #[error("Unsupported comparator: {0}")]
    UnsupportedComparator(String),

    #[error("Type mismatch: cannot compare {value} with {literal}")]
    TypeMismatch { value: String, literal: String },

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("No rules to combine")]
    NoRulesToCombine,

    #[error("Rule nests {depth} levels deep, at most {max} are supported")]
    RuleTooDeep { depth: usize, max: usize },

    #[error("Rule not found: {0}")]
    RuleNotFound(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Invalid value for field {field}: unsupported type {type_name}")]
    InvalidRecordValue { field: String, type_name: String },
}

impl RuleEngineError {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        RuleEngineError::SyntaxError {
            position,
            message: message.into(),
        }
    }

    /// Whether the failure was caused by the caller's input rather than by
    /// stored data or the storage backend
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            RuleEngineError::DeserializationError(_) | RuleEngineError::StorageError(_)
        )
    }
}

impl From<serde_json::Error> for RuleEngineError {
    fn from(err: serde_json::Error) -> Self {
        RuleEngineError::DeserializationError(err.to_string())
    }
}

impl From<RuleEngineError> for PyErr {
    fn from(err: RuleEngineError) -> PyErr {
        match err {
            RuleEngineError::MissingField(_) | RuleEngineError::RuleNotFound(_) => {
                PyKeyError::new_err(err.to_string())
            }
            _ if err.is_client_error() => PyValueError::new_err(err.to_string()),
            _ => PyRuntimeError::new_err(err.to_string()),
        }
    }
}

/// Result type alias for the rule engine
pub type Result<T> = std::result::Result<T, RuleEngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(RuleEngineError::EmptyRule.is_client_error());
        assert!(RuleEngineError::syntax(2, "expected ')'").is_client_error());
        assert!(RuleEngineError::RuleNotFound("r1".to_string()).is_client_error());
        assert!(!RuleEngineError::StorageError("down".to_string()).is_client_error());
        assert!(!RuleEngineError::DeserializationError("bad".to_string()).is_client_error());
        assert!(RuleEngineError::RuleTooDeep { depth: 101, max: 100 }.is_client_error());
    }

    #[test]
    fn test_syntax_error_message() {
        let err = RuleEngineError::syntax(3, "expected ')'");
        assert_eq!(err.to_string(), "Syntax error at token 3: expected ')'");
    }
}
