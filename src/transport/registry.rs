//! In-flight request tracking.
//!
//! The registry owns the pending side of every correlated exchange: it
//! allocates correlation ids, holds each caller's completion channel until
//! the matching response arrives, and settles everything left outstanding
//! when the transport is lost.
//!
//! # Ownership
//!
//! The registry is the sole owner of a pending entry's completion sender.
//! Removal from the map is atomic with settlement, so every entry completes
//! exactly once and an id is never reused while pending.

// ============================================================================
// Imports
// ============================================================================

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::RequestId;

// ============================================================================
// Types
// ============================================================================

/// Map of correlation ids to response channels.
type PendingMap = FxHashMap<RequestId, oneshot::Sender<Result<Value>>>;

// ============================================================================
// RequestRegistry
// ============================================================================

/// Tracks in-flight requests by correlation id.
///
/// Ids are monotonically increasing for the lifetime of the registry and
/// assigned at registration time.
pub(crate) struct RequestRegistry {
    inner: Mutex<Inner>,
}

struct Inner {
    next_id: RequestId,
    pending: PendingMap,
}

impl RequestRegistry {
    /// Creates an empty registry starting at id 0.
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: RequestId::new(0),
                pending: PendingMap::default(),
            }),
        }
    }

    /// Allocates the next correlation id and stores a pending entry for it.
    ///
    /// Returns the id plus the receiver the caller awaits.
    pub(crate) fn register(&self) -> (RequestId, oneshot::Receiver<Result<Value>>) {
        let (tx, rx) = oneshot::channel();

        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id = id.next();
        inner.pending.insert(id, tx);

        (id, rx)
    }

    /// Fulfills the pending entry for `id` with a raw payload.
    ///
    /// Returns `false` without touching any other entry if `id` is not
    /// pending. An unmatched id is not an error here; the original caller
    /// may simply have been abandoned.
    pub(crate) fn resolve(&self, id: RequestId, payload: Value) -> bool {
        match self.inner.lock().pending.remove(&id) {
            Some(tx) => {
                // The caller may have dropped its receiver; that is fine.
                let _ = tx.send(Ok(payload));
                true
            }
            None => false,
        }
    }

    /// Fails the pending entry for `id`.
    ///
    /// Symmetric to [`resolve`](Self::resolve); a no-op for unmatched ids.
    pub(crate) fn reject(&self, id: RequestId, error: Error) -> bool {
        match self.inner.lock().pending.remove(&id) {
            Some(tx) => {
                let _ = tx.send(Err(error));
                true
            }
            None => false,
        }
    }

    /// Fails every pending entry and clears the registry.
    ///
    /// Invoked on transport loss so no caller waits forever across a
    /// reconnect. Id allocation continues from where it left off; ids are
    /// never reused.
    pub(crate) fn reject_all(&self) {
        let drained: Vec<_> = {
            let mut inner = self.inner.lock();
            inner.pending.drain().collect()
        };
        let count = drained.len();

        for (_, tx) in drained {
            let _ = tx.send(Err(Error::ConnectionClosed));
        }

        if count > 0 {
            debug!(count, "Rejected pending requests on connection loss");
        }
    }

    /// Returns `true` if `id` has a pending entry.
    pub(crate) fn is_pending(&self, id: RequestId) -> bool {
        self.inner.lock().pending.contains_key(&id)
    }

    /// Returns the number of pending requests.
    pub(crate) fn pending_count(&self) -> usize {
        self.inner.lock().pending.len()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_ids_strictly_increasing() {
        let registry = RequestRegistry::new();

        let (first, _rx1) = registry.register();
        let (second, _rx2) = registry.register();
        let (third, _rx3) = registry.register();

        assert_eq!(first, RequestId::new(0));
        assert!(second > first);
        assert!(third > second);
        assert_eq!(registry.pending_count(), 3);
    }

    #[test]
    fn test_resolve_settles_caller() {
        let registry = RequestRegistry::new();
        let (id, mut rx) = registry.register();

        assert!(registry.resolve(id, json!({"ok": true})));
        assert!(!registry.is_pending(id));

        let payload = rx.try_recv().expect("settled").expect("resolved");
        assert_eq!(payload, json!({"ok": true}));
    }

    #[test]
    fn test_reject_settles_caller_with_error() {
        let registry = RequestRegistry::new();
        let (id, mut rx) = registry.register();

        assert!(registry.reject(id, Error::ConnectionClosed));

        let result = rx.try_recv().expect("settled");
        assert!(matches!(result, Err(Error::ConnectionClosed)));
    }

    #[test]
    fn test_unmatched_id_is_noop() {
        let registry = RequestRegistry::new();
        let (id, mut rx) = registry.register();

        assert!(!registry.resolve(RequestId::new(99), json!({})));
        assert!(!registry.reject(RequestId::new(99), Error::ConnectionClosed));

        // The real pending entry is untouched.
        assert!(registry.is_pending(id));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_settled_id_cannot_settle_twice() {
        let registry = RequestRegistry::new();
        let (id, _rx) = registry.register();

        assert!(registry.resolve(id, json!(1)));
        assert!(!registry.resolve(id, json!(2)));
        assert!(!registry.reject(id, Error::ConnectionClosed));
    }

    #[test]
    fn test_reject_all_settles_everything() {
        let registry = RequestRegistry::new();
        let mut receivers = Vec::new();
        for _ in 0..5 {
            let (_, rx) = registry.register();
            receivers.push(rx);
        }

        registry.reject_all();
        assert_eq!(registry.pending_count(), 0);

        for mut rx in receivers {
            let result = rx.try_recv().expect("settled");
            assert!(matches!(result, Err(Error::ConnectionClosed)));
        }
    }

    #[test]
    fn test_ids_continue_after_reject_all() {
        let registry = RequestRegistry::new();
        let (before, _rx) = registry.register();
        registry.reject_all();
        let (after, _rx) = registry.register();

        assert!(after > before);
    }

    #[test]
    fn test_resolve_tolerates_abandoned_caller() {
        let registry = RequestRegistry::new();
        let (id, rx) = registry.register();
        drop(rx);

        // Entry settles even though nobody is listening.
        assert!(registry.resolve(id, json!(null)));
        assert!(!registry.is_pending(id));
    }

    proptest! {
        #[test]
        fn prop_ids_unique_and_increasing(count in 1usize..64) {
            let registry = RequestRegistry::new();
            let mut receivers = Vec::new();
            let mut previous: Option<RequestId> = None;

            for _ in 0..count {
                let (id, rx) = registry.register();
                receivers.push(rx);
                if let Some(prev) = previous {
                    prop_assert!(id > prev);
                }
                previous = Some(id);
            }

            prop_assert_eq!(registry.pending_count(), count);
        }
    }
}
