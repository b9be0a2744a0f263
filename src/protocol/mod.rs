//! Wire protocol message types.
//!
//! This module defines the message format for the bidirectional channel
//! between the client and the playback server.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `Request` | Client → Server | Correlated request |
//! | `Command` | Client → Server | Fire-and-forget control action |
//! | `Response` | Server → Client | Reply matching a request id |
//! | `Event` | Server → Client | Unsolicited notification |
//!
//! All four shapes are tagged unions discriminated by a literal `"type"`
//! field. A frame whose tag falls outside this vocabulary is a protocol
//! error: logged and discarded, never fatal.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Control-action vocabulary |
//! | `event` | Push-notification vocabulary |
//! | `envelope` | Outbound and inbound envelope unions |

// ============================================================================
// Submodules
// ============================================================================

/// Control-action vocabulary.
pub mod command;

/// Wire envelope unions.
pub mod envelope;

/// Push-notification vocabulary.
pub mod event;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::Command;
pub use envelope::{ClientMessage, ServerMessage};
pub use event::Event;
