//! Error types for the musicbox remote client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use musicbox_remote::{Client, Result};
//!
//! async fn example(client: &Client) -> Result<()> {
//!     let state = client.app_state().await?;
//!     println!("volume: {}", state.volume);
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Connection | [`Error::InvalidUrl`], [`Error::Connection`], [`Error::ConnectionClosed`] |
//! | Protocol | [`Error::Protocol`], [`Error::UnmatchedResponse`] |
//! | Decoding | [`Error::Decode`], [`Error::Json`] |
//! | External | [`Error::Io`], [`Error::WebSocket`], [`Error::Http`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::RequestId;
use crate::schema::DecodeError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// The server URL could not be parsed or uses an unsupported scheme.
    ///
    /// Returned at connect time, before any socket is opened.
    #[error("Invalid server URL: {url}")]
    InvalidUrl {
        /// The offending URL text.
        url: String,
    },

    /// Connection to the server failed.
    ///
    /// Returned when a socket cannot be established or breaks mid-exchange.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// The connection was closed while an exchange was outstanding.
    ///
    /// Every request pending at the moment of a transport loss settles with
    /// this error before the replacement socket carries any frame.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Protocol violation or unexpected frame.
    ///
    /// Returned when a well-formed JSON frame does not fit the wire
    /// vocabulary.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    /// A response arrived for a correlation id with no pending request.
    ///
    /// Dispatch treats this as a diagnostic, not a failure; the variant
    /// exists for surfaces that must report one.
    #[error("No pending request with id {id}")]
    UnmatchedResponse {
        /// The unmatched correlation id.
        id: RequestId,
    },

    // ========================================================================
    // Decoding Errors
    // ========================================================================
    /// A payload failed schema validation.
    ///
    /// Carries the path into the structure where decoding failed.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Channel receive error.
    #[error("Channel closed")]
    ChannelClosed(#[from] RecvError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates an invalid URL error.
    #[inline]
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates an unmatched response error.
    #[inline]
    pub fn unmatched_response(id: RequestId) -> Self {
        Self::UnmatchedResponse { id }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidUrl { .. }
                | Self::Connection { .. }
                | Self::ConnectionClosed
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this is a decode error.
    #[inline]
    #[must_use]
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Self::Decode(_))
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed on retry once the connection is
    /// reestablished.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::ConnectionClosed | Self::WebSocket(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::connection("failed to connect");
        assert_eq!(err.to_string(), "Connection failed: failed to connect");
    }

    #[test]
    fn test_invalid_url() {
        let err = Error::invalid_url("ftp://example.com");
        assert_eq!(err.to_string(), "Invalid server URL: ftp://example.com");
    }

    #[test]
    fn test_unmatched_response_display() {
        let err = Error::unmatched_response(RequestId::new(99));
        assert_eq!(err.to_string(), "No pending request with id 99");
    }

    #[test]
    fn test_is_connection_error() {
        let conn_err = Error::connection("test");
        let closed_err = Error::ConnectionClosed;
        let other_err = Error::protocol("test");

        assert!(conn_err.is_connection_error());
        assert!(closed_err.is_connection_error());
        assert!(!other_err.is_connection_error());
    }

    #[test]
    fn test_is_recoverable() {
        let closed_err = Error::ConnectionClosed;
        let protocol_err = Error::protocol("test");

        assert!(closed_err.is_recoverable());
        assert!(!protocol_err.is_recoverable());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
