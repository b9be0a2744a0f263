//! WebSocket transport layer.
//!
//! This module carries all traffic between the client and the playback
//! server over a single long-lived socket.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐                             ┌─────────────────┐
//! │  Client (Rust)   │         WebSocket           │  Playback       │
//! │                  │◄───────────────────────────►│  Server         │
//! │  Connection      │        host:port/ws         │                 │
//! │  + RequestRegistry│                            │                 │
//! └──────────────────┘                             └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Connection::connect` - validate the URL, spawn the event loop
//! 2. The loop establishes a socket and transitions to `Open`
//! 3. Requests multiplex over the socket by correlation id; events fan out
//!    to subscribers
//! 4. On error or close the socket is replaced, pending requests are
//!    rejected, and the loop reconnects with capped backoff
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | Socket lifecycle, framing, dispatch, reconnect |
//! | `registry` | In-flight request tracking by correlation id |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection and event loop.
pub mod connection;

/// In-flight request tracking.
mod registry;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, ConnectionState};
