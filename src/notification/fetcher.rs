use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

use crate::auth::session::SessionState;
use crate::notification::model::{NotifyError, UnreadSnapshot};
use crate::notification::store::NotificationStore;

/// Issues the unread query and owns the cached snapshot.
///
/// Cache-and-revalidate: subscribers always see the cached snapshot
/// immediately, and `revalidate` refreshes it from the store. The snapshot is
/// only ever replaced wholesale with a fresh server response, never patched,
/// which is the flow's whole concurrency-safety strategy.
pub struct UnreadFetcher {
    store: Arc<dyn NotificationStore>,
    session: watch::Receiver<SessionState>,
    snapshot: watch::Sender<UnreadSnapshot>,
    // Revalidations are tagged with a sequence token so a slow response can
    // never overwrite a snapshot produced by a later request.
    issued: AtomicU64,
    applied: Mutex<u64>,
}

impl UnreadFetcher {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        session: watch::Receiver<SessionState>,
    ) -> Self {
        let initial = if session.borrow().is_authenticated() {
            UnreadSnapshot::loading()
        } else {
            UnreadSnapshot::empty()
        };

        Self {
            store,
            session,
            snapshot: watch::channel(initial).0,
            issued: AtomicU64::new(0),
            applied: Mutex::new(0),
        }
    }

    /// The cached snapshot, available without any network round trip.
    pub fn snapshot(&self) -> UnreadSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Watch channel carrying every applied snapshot replacement.
    pub fn subscribe(&self) -> watch::Receiver<UnreadSnapshot> {
        self.snapshot.subscribe()
    }

    /// Re-derive the unread set from the remote source of truth.
    ///
    /// Skipped entirely for anonymous sessions: no request is issued and the
    /// unread count is zero. A failed fetch leaves the prior snapshot in
    /// place; staleness until the next revalidation is the accepted cost.
    pub async fn revalidate(&self) -> Result<(), NotifyError> {
        let token = self.issued.fetch_add(1, Ordering::SeqCst) + 1;

        if !self.session.borrow().is_authenticated() {
            debug!("skipping unread fetch for anonymous session");
            self.apply(token, UnreadSnapshot::empty()).await;
            return Ok(());
        }

        match self.store.fetch_unread().await {
            Ok(notifications) => {
                debug!("unread revalidation returned {} notifications", notifications.len());
                self.apply(token, UnreadSnapshot::ready(notifications)).await;
                Ok(())
            }
            Err(err) => {
                warn!("unread revalidation failed, keeping cached snapshot: {}", err);
                Err(NotifyError::FetchFailed(err.to_string()))
            }
        }
    }

    async fn apply(&self, token: u64, snapshot: UnreadSnapshot) {
        let mut applied = self.applied.lock().await;
        if token > *applied {
            *applied = token;
            self.snapshot.send_replace(snapshot);
        } else {
            debug!(
                "discarding stale unread response (token {} <= {})",
                token, *applied
            );
        }
    }
}
