//! Schema-based payload decoding.
//!
//! Every inbound payload is untrusted wire data: a raw [`Value`] that only
//! becomes a typed domain value after validation against the target type's
//! serde schema. Decoding is a pure function of `(schema, raw value)`; a
//! failure names the path within the structure where validation stopped.

// ============================================================================
// Imports
// ============================================================================

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// DecodeError
// ============================================================================

/// A payload failed validation against its schema.
///
/// `path` is the dotted route into the structure where decoding failed
/// (`"."` for the top level), `message` the underlying reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Decode error at {path}: {message}")]
pub struct DecodeError {
    /// Dotted path into the structure.
    pub path: String,
    /// Why the value was rejected.
    pub message: String,
}

impl DecodeError {
    /// Creates a decode error for the given path.
    #[inline]
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// Validates and converts a raw value into `T`.
///
/// # Errors
///
/// Returns [`DecodeError`] with the failing path and reason if the value
/// does not match `T`'s schema.
pub fn decode<T: DeserializeOwned>(raw: Value) -> Result<T, DecodeError> {
    serde_path_to_error::deserialize(raw)
        .map_err(|e| DecodeError::new(e.path().to_string(), e.inner().to_string()))
}

/// Validates and converts a raw JSON string into `T`.
///
/// # Errors
///
/// Returns [`DecodeError`] if the text is not valid JSON or does not match
/// `T`'s schema.
pub fn decode_str<T: DeserializeOwned>(raw: &str) -> Result<T, DecodeError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|e| DecodeError::new(e.path().to_string(), e.inner().to_string()))
}

// ============================================================================
// Tests
// ============================================================================
