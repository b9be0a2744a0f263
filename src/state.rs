//! Decoded domain state.
//!
//! These are the shapes a presentation layer consumes: the server owns the
//! authoritative state and this client only decodes snapshots of it. Field
//! names are camelCase on the wire.

// ============================================================================
// Imports
// ============================================================================

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ============================================================================
// Track
// ============================================================================

/// A single playable track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// File name of the track within its playlist directory.
    pub path: String,
    /// Human-readable title.
    pub title: String,
}

// ============================================================================
// StoredPlaylist
// ============================================================================

/// A named playlist persisted on the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPlaylist {
    /// Unique playlist name.
    pub name: String,
    /// Tracks in playback order.
    pub tracks: Vec<Track>,
}

// ============================================================================
// PlayState
// ============================================================================

/// Progress of the track currently playing.
///
/// Absent from [`AppState`] whenever nothing is playing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayState {
    /// Index of the playing track within the active playlist.
    pub position: usize,
    /// Seconds into the playing track.
    pub duration: f64,
    /// Whether playback is paused.
    pub paused: bool,
}

// ============================================================================
// AppState
// ============================================================================

/// A full snapshot of the server's playback state.
///
/// # Format
///
/// ```json
/// {
///   "storedPlaylists": { "morning": { "name": "morning", "tracks": [] } },
///   "playlist": [],
///   "playState": null,
///   "volume": 50.0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    /// Stored playlists keyed by name.
    pub stored_playlists: HashMap<String, StoredPlaylist>,
    /// The active playlist in playback order.
    pub playlist: Vec<Track>,
    /// Progress of the playing track, absent when idle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub play_state: Option<PlayState>,
    /// Output volume.
    pub volume: f64,
}

impl AppState {
    /// Returns `true` if a track is currently playing or paused.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.play_state.is_some()
    }

    /// Returns the playing track, if any.
    #[must_use]
    pub fn current_track(&self) -> Option<&Track> {
        self.play_state
            .as_ref()
            .and_then(|play_state| self.playlist.get(play_state.position))
    }
}

// ============================================================================
// Tests
// ============================================================================
