//! Async client for remote control of a musicbox playback server.
//!
//! This library maintains a single long-lived WebSocket channel to the
//! server and gives callers a stable, typed request API on top of it.
//!
//! # Architecture
//!
//! - **One socket, many exchanges**: concurrent requests multiplex over the
//!   channel by correlation id; responses settle each caller individually.
//! - **Events are out-of-band**: server pushes bypass request correlation
//!   entirely and fan out to any number of subscribers.
//! - **Self-healing**: on error or close the socket is replaced and the
//!   channel reconnects with capped backoff; requests pending at the moment
//!   of loss are rejected rather than left hanging.
//! - **Nothing untyped escapes**: every inbound payload is validated against
//!   a schema and surfaces as a typed value or a path-qualified decode
//!   failure.
//!
//! # Quick Start
//!
//! ```no_run
//! use musicbox_remote::{Client, Event, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Client::connect("ws://musicbox.local:8080/ws")?;
//!
//!     // Typed request/response
//!     let state = client.app_state().await?;
//!     println!("volume: {}", state.volume);
//!
//!     // Fire-and-forget command
//!     client.start_playlist("morning", false)?;
//!
//!     // Out-of-band events
//!     let mut events = client.events();
//!     while let Ok(event) = events.recv().await {
//!         if let Event::PlaybackPosition { duration } = event {
//!             println!("at {duration}s");
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`api`] | Typed endpoint surface |
//! | [`client`] | High-level [`Client`] handle |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`http`] | One-shot HTTP JSON exchanges |
//! | [`identifiers`] | Type-safe id wrappers |
//! | [`protocol`] | Wire message types |
//! | [`schema`] | Payload decoding |
//! | [`state`] | Decoded domain state |
//! | [`transport`] | WebSocket transport layer |

// ============================================================================
// Modules
// ============================================================================

/// Typed endpoint surface.
pub mod api;

/// High-level client handle.
pub mod client;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// One-shot HTTP JSON exchanges.
pub mod http;

/// Type-safe identifiers.
///
/// Newtype wrappers prevent mixing incompatible ids at compile time.
pub mod identifiers;

/// Wire protocol message types.
pub mod protocol;

/// Schema-based payload decoding.
pub mod schema;

/// Decoded domain state.
pub mod state;

/// WebSocket transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::Client;

// Transport types
pub use transport::{Connection, ConnectionState};

// Protocol types
pub use protocol::{ClientMessage, Command, Event, ServerMessage};

// Domain state types
pub use state::{AppState, PlayState, StoredPlaylist, Track};

// Endpoint types
pub use api::Endpoint;

// HTTP types
pub use http::{Http, RequestOptions};

// Schema types
pub use schema::DecodeError;

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::RequestId;
