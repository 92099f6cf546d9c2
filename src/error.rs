//! Error types for smartform
//!
//! Every error signals programmer misuse of the registration API. Whether a
//! field's value is acceptable is never an error: that is reported through
//! the boolean returned by `validate()`.

use thiserror::Error;

/// Result type alias using smartform Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for smartform operations
#[derive(Error, Debug)]
pub enum Error {
    /// A parameter has the wrong shape
    #[error("type error: {0}")]
    Type(String),

    /// A referenced field or form is not registered
    #[error("key error: {0}")]
    Key(String),

    /// An identity is already registered or is reserved by a built-in
    #[error("key exists: {0}")]
    KeyExists(String),

    /// A required string parameter is empty after trimming
    #[error("empty value: {0}")]
    Empty(String),

    /// An operation was called in a state that does not allow it
    #[error("state error: {0}")]
    State(String),

    /// A value could not be used (e.g. an invalid regular expression)
    #[error("value error: {0}")]
    Value(String),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Missing-reference error for a field id that was never registered
    pub fn field_not_registered(id: impl std::fmt::Display) -> Self {
        Error::Key(format!("field '{}' is not registered", id))
    }

    /// Uniqueness violation for a validator or effect identity
    pub fn key_exists(kind: &str, identity: &str) -> Self {
        Error::KeyExists(format!("{} '{}' already exists", kind, identity))
    }

    /// Uniqueness violation against a built-in identity
    pub fn reserved(kind: &str, identity: &str) -> Self {
        Error::KeyExists(format!(
            "{} '{}' is reserved by a built-in {}",
            kind, identity, kind
        ))
    }

    /// Empty-value error for a named parameter
    pub fn empty(parameter: &str) -> Self {
        Error::Empty(format!("'{}' must not be empty", parameter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::field_not_registered("email");
        assert_eq!(err.to_string(), "key error: field 'email' is not registered");

        let err = Error::key_exists("effect", "a.x");
        assert_eq!(err.to_string(), "key exists: effect 'a.x' already exists");

        let err = Error::reserved("validator", "email");
        assert!(err.to_string().contains("reserved by a built-in validator"));

        let err = Error::empty("name");
        assert!(matches!(err, Error::Empty(_)));
    }

    #[test]
    fn test_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
