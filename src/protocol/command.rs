//! Playback control commands.
//!
//! Commands are fire-and-forget control actions sent from the client to the
//! server. They carry no correlation id and receive no response; the server
//! reports resulting changes through events instead.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

// ============================================================================
// Command
// ============================================================================

/// A control action understood by the playback server.
///
/// The set is closed: the server rejects anything outside this vocabulary.
///
/// # Format
///
/// ```json
/// { "type": "StartPlaylist", "name": "morning", "force": false }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    /// Skip back to the previous track.
    PreviousTrack,

    /// Skip forward to the next track.
    NextTrack,

    /// Toggle between playing and paused.
    PlayPause,

    /// Raise the output volume one step.
    VolumeUp,

    /// Lower the output volume one step.
    VolumeDown,

    /// Begin playing a stored playlist.
    StartPlaylist {
        /// Name of the stored playlist.
        name: String,
        /// Restart from the top even if this playlist is already playing.
        force: bool,
    },

    /// Shut the playback server down.
    Shutdown,

    /// Rescan stored playlists from disk.
    Reload,

    /// Ask the server to re-emit its current status events.
    Status,
}

// ============================================================================
// Tests
// ============================================================================
