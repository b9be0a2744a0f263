//! Wire envelopes for the bidirectional channel.
//!
//! Both directions use a tagged union discriminated by a literal `"type"`
//! string. Request and response payloads are opaque [`Value`]s at this layer;
//! conversion to a concrete type is deferred to the endpoint's schema. The
//! envelope types never widen to carry domain-specific fields.
//!
//! # Message Kinds
//!
//! | Envelope | Direction | Purpose |
//! |----------|-----------|---------|
//! | `Request` | Client → Server | Correlated request |
//! | `Command` | Client → Server | Fire-and-forget control action |
//! | `Response` | Server → Client | Reply matching a request id |
//! | `Event` | Server → Client | Unsolicited notification |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identifiers::RequestId;

use super::{Command, Event};

// ============================================================================
// ClientMessage
// ============================================================================

/// An outbound frame, client to server.
///
/// # Format
///
/// ```json
/// { "type": "Request", "id": 0, "path": "state", "data": null }
/// { "type": "Command", "command": { "type": "PlayPause" } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// A correlated request expecting exactly one response.
    Request {
        /// Correlation id assigned at send time.
        id: RequestId,
        /// Endpoint path the request addresses.
        path: String,
        /// Opaque request payload, absent for zero-argument endpoints.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
    },

    /// A fire-and-forget control action.
    Command {
        /// The control action.
        command: Command,
    },
}

// ============================================================================
// ServerMessage
// ============================================================================

/// An inbound frame, server to client.
///
/// # Format
///
/// ```json
/// { "type": "Response", "id": 0, "response": { ... } }
/// { "type": "Event", "event": { "type": "PlaybackStarted" } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// The reply to a previously sent request.
    Response {
        /// Correlation id matching the request.
        id: RequestId,
        /// Opaque response payload, decoded by the requesting endpoint.
        response: Value,
    },

    /// An unsolicited push notification.
    Event {
        /// The pushed event.
        event: Event,
    },
}

// ============================================================================
// Tests
// ============================================================================
