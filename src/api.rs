//! Typed endpoint surface.
//!
//! An [`Endpoint`] pairs a request path with the schema of its response.
//! Calling one sends a correlated request over a [`Connection`], then decodes
//! the raw payload into the endpoint's type — so callers only ever see typed
//! results or a decode failure, never raw wire data.

// ============================================================================
// Imports
// ============================================================================

use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::schema;
use crate::state::{AppState, StoredPlaylist};
use crate::transport::Connection;

// ============================================================================
// Endpoint
// ============================================================================

/// A typed request endpoint: a path plus the response schema `T`.
///
/// Two call shapes exist: [`fetch`](Self::fetch) for zero-argument
/// endpoints and [`submit`](Self::submit) for endpoints taking a typed
/// payload.
#[derive(Debug)]
pub struct Endpoint<T> {
    path: &'static str,
    _response: PhantomData<fn() -> T>,
}

impl<T> Clone for Endpoint<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Endpoint<T> {}

impl<T: DeserializeOwned> Endpoint<T> {
    /// Creates an endpoint for `path` decoding responses as `T`.
    #[inline]
    #[must_use]
    pub const fn new(path: &'static str) -> Self {
        Self {
            path,
            _response: PhantomData,
        }
    }

    /// Returns the endpoint's request path.
    #[inline]
    #[must_use]
    pub const fn path(&self) -> &'static str {
        self.path
    }

    /// Requests the endpoint with no payload and decodes the response.
    ///
    /// # Errors
    ///
    /// Propagates transport failures from the request and
    /// [`Error::Decode`](crate::Error::Decode) if the response does not
    /// match `T`'s schema.
    pub async fn fetch(&self, connection: &Connection) -> Result<T> {
        let raw = connection.request(self.path, None).await?;
        Ok(schema::decode(raw)?)
    }

    /// Requests the endpoint with a typed payload and decodes the response.
    ///
    /// # Errors
    ///
    /// As [`fetch`](Self::fetch), plus
    /// [`Error::Json`](crate::Error::Json) if the payload cannot be
    /// serialized.
    pub async fn submit<P: Serialize>(&self, connection: &Connection, payload: &P) -> Result<T> {
        let data = serde_json::to_value(payload)?;
        let raw = connection.request(self.path, Some(data)).await?;
        Ok(schema::decode(raw)?)
    }
}

// ============================================================================
// Endpoints
// ============================================================================

/// Fetches the full playback state snapshot.
pub const APP_STATE: Endpoint<AppState> = Endpoint::new("state");

/// Replaces a stored playlist; the server echoes the stored result.
pub const UPDATE_STORED_PLAYLIST: Endpoint<StoredPlaylist> = Endpoint::new("playlist/update");

// ============================================================================
// Tests
// ============================================================================
