//! High-level client handle.
//!
//! [`Client`] bundles a [`Connection`] with the typed endpoints and one
//! method per wire command, so a caller never touches envelopes or raw
//! payloads directly.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use tokio::sync::broadcast;

use crate::api::{APP_STATE, UPDATE_STORED_PLAYLIST};
use crate::error::Result;
use crate::protocol::{Command, Event};
use crate::state::{AppState, StoredPlaylist};
use crate::transport::{Connection, ConnectionState};

// ============================================================================
// Client
// ============================================================================

/// A handle to a playback server.
///
/// Cheap to clone; all clones share one connection.
///
/// # Example
///
/// ```no_run
/// use musicbox_remote::{Client, Result};
///
/// #[tokio::main]
/// async fn main() -> Result<()> {
///     let client = Client::connect("ws://musicbox.local:8080/ws")?;
///
///     let state = client.app_state().await?;
///     println!("{} stored playlists", state.stored_playlists.len());
///
///     client.play_pause()?;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Client {
    connection: Connection,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("connection", &self.connection)
            .finish()
    }
}

impl Client {
    /// Connects to a playback server at a `ws://` or `wss://` endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`](crate::Error::InvalidUrl) if the URL
    /// does not parse.
    pub fn connect(url: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            connection: Connection::connect(url)?,
        })
    }

    /// Wraps an existing connection.
    #[inline]
    #[must_use]
    pub fn from_connection(connection: Connection) -> Self {
        Self { connection }
    }

    /// Returns the underlying connection.
    #[inline]
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Returns the connection's lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Subscribes to server events.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.connection.subscribe()
    }
}

// ============================================================================
// Client - Typed Endpoints
// ============================================================================

impl Client {
    /// Fetches the current playback state snapshot.
    ///
    /// # Errors
    ///
    /// Propagates transport and decode failures.
    pub async fn app_state(&self) -> Result<AppState> {
        APP_STATE.fetch(&self.connection).await
    }

    /// Replaces a stored playlist on the server.
    ///
    /// Returns the playlist as stored.
    ///
    /// # Errors
    ///
    /// Propagates transport and decode failures.
    pub async fn update_stored_playlist(&self, playlist: &StoredPlaylist) -> Result<StoredPlaylist> {
        UPDATE_STORED_PLAYLIST.submit(&self.connection, playlist).await
    }
}

// ============================================================================
// Client - Commands
// ============================================================================

impl Client {
    /// Skips back to the previous track.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`](crate::Error::ConnectionClosed)
    /// if the connection was shut down.
    pub fn previous_track(&self) -> Result<()> {
        self.connection.send_command(Command::PreviousTrack)
    }

    /// Skips forward to the next track.
    ///
    /// # Errors
    ///
    /// As [`previous_track`](Self::previous_track).
    pub fn next_track(&self) -> Result<()> {
        self.connection.send_command(Command::NextTrack)
    }

    /// Toggles between playing and paused.
    ///
    /// # Errors
    ///
    /// As [`previous_track`](Self::previous_track).
    pub fn play_pause(&self) -> Result<()> {
        self.connection.send_command(Command::PlayPause)
    }

    /// Raises the output volume one step.
    ///
    /// # Errors
    ///
    /// As [`previous_track`](Self::previous_track).
    pub fn volume_up(&self) -> Result<()> {
        self.connection.send_command(Command::VolumeUp)
    }

    /// Lowers the output volume one step.
    ///
    /// # Errors
    ///
    /// As [`previous_track`](Self::previous_track).
    pub fn volume_down(&self) -> Result<()> {
        self.connection.send_command(Command::VolumeDown)
    }

    /// Begins playing a stored playlist.
    ///
    /// With `force` set, restarts from the top even if that playlist is
    /// already playing.
    ///
    /// # Errors
    ///
    /// As [`previous_track`](Self::previous_track).
    pub fn start_playlist(&self, name: impl Into<String>, force: bool) -> Result<()> {
        self.connection.send_command(Command::StartPlaylist {
            name: name.into(),
            force,
        })
    }

    /// Asks the server to rescan its stored playlists.
    ///
    /// # Errors
    ///
    /// As [`previous_track`](Self::previous_track).
    pub fn reload(&self) -> Result<()> {
        self.connection.send_command(Command::Reload)
    }

    /// Asks the server to re-emit its current status events.
    ///
    /// # Errors
    ///
    /// As [`previous_track`](Self::previous_track).
    pub fn status(&self) -> Result<()> {
        self.connection.send_command(Command::Status)
    }

    /// Shuts the playback server down.
    ///
    /// This is the remote command; use
    /// [`Connection::shutdown`](crate::Connection::shutdown) to close only
    /// the local connection.
    ///
    /// # Errors
    ///
    /// As [`previous_track`](Self::previous_track).
    pub fn shutdown_server(&self) -> Result<()> {
        self.connection.send_command(Command::Shutdown)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::Error;

    #[test]
    fn test_connect_rejects_bad_url() {
        let err = Client::connect("file:///tmp/socket").unwrap_err();
        assert!(matches!(err, Error::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn test_clones_share_connection() {
        let client = Client::connect("ws://127.0.0.1:1/ws").expect("connect");
        let clone = client.clone();
        assert_eq!(client.state(), clone.state());
    }
}
