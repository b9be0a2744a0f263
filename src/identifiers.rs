//! Type-safe identifiers for protocol entities.
//!
//! Newtype wrappers prevent mixing raw integers with correlation ids at
//! compile time.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// RequestId
// ============================================================================

/// Correlation id linking an outbound request to its inbound response.
///
/// Ids are allocated by the request registry: monotonically increasing,
/// unique for the lifetime of a connection, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(u64);

impl RequestId {
    /// Creates a request id from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw id value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Returns the id following this one.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_ordering() {
        let first = RequestId::new(0);
        let second = first.next();

        assert!(second > first);
        assert_eq!(second.value(), 1);
    }

    #[test]
    fn test_request_id_display() {
        assert_eq!(RequestId::new(42).to_string(), "42");
    }

    #[test]
    fn test_request_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&RequestId::new(7)).expect("serialize");
        assert_eq!(json, "7");

        let id: RequestId = serde_json::from_str("7").expect("deserialize");
        assert_eq!(id, RequestId::new(7));
    }
}
