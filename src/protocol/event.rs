//! Server-initiated event notifications.
//!
//! Events are unsolicited pushes from the playback server: they are not tied
//! to any request and bypass the request registry entirely. Subscribers see
//! them through [`Connection::subscribe`](crate::Connection::subscribe).

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

// ============================================================================
// Event
// ============================================================================

/// A push notification from the playback server.
///
/// # Format
///
/// ```json
/// { "type": "PlaybackPosition", "duration": 120.0 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// The active playlist changed.
    PlaylistUpdated,

    /// Playback of a track began.
    PlaybackStarted,

    /// Playback was paused.
    PlaybackPaused,

    /// Playback resumed from pause.
    PlaybackUnpaused,

    /// The active playlist finished.
    PlaybackEnded,

    /// Periodic progress report for the playing track.
    PlaybackPosition {
        /// Seconds into the current track.
        duration: f64,
    },

    /// The server is shutting down.
    Shutdown,
}

impl Event {
    /// Returns `true` if this event reports playback progress.
    #[inline]
    #[must_use]
    pub fn is_position(&self) -> bool {
        matches!(self, Self::PlaybackPosition { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_unit_event_round_trip() {
        let json = serde_json::to_value(Event::PlaybackStarted).expect("serialize");
        assert_eq!(json, json!({"type": "PlaybackStarted"}));

        let back: Event = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, Event::PlaybackStarted);
    }

    #[test]
    fn test_playback_position_deserialization() {
        let event: Event =
            serde_json::from_value(json!({"type": "PlaybackPosition", "duration": 120}))
                .expect("deserialize");

        assert!(event.is_position());
        match event {
            Event::PlaybackPosition { duration } => assert_eq!(duration, 120.0),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_event_tag_rejected() {
        let result = serde_json::from_value::<Event>(json!({"type": "TrackSkipped"}));
        assert!(result.is_err());
    }
}
