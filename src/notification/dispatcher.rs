use std::sync::Arc;

use tracing::{error, info, warn};

use crate::notification::fetcher::UnreadFetcher;
use crate::notification::model::{NotificationId, NotifyError};
use crate::notification::store::NotificationStore;

/// Issues mark-read mutations and keeps local state consistent afterwards.
///
/// Every acknowledgement awaits a revalidation before resolving, so callers
/// observe updated unread state once the returned future completes. The
/// revalidation runs even when the mutation failed: converging to server
/// truth is always the right outcome.
pub struct AcknowledgementDispatcher {
    store: Arc<dyn NotificationStore>,
    fetcher: Arc<UnreadFetcher>,
}

impl AcknowledgementDispatcher {
    pub fn new(store: Arc<dyn NotificationStore>, fetcher: Arc<UnreadFetcher>) -> Self {
        Self { store, fetcher }
    }

    /// Mark one notification as read. Idempotent from the store's
    /// perspective: acknowledging an already-read notification is a no-op.
    pub async fn acknowledge(&self, id: &NotificationId) -> Result<(), NotifyError> {
        let key = id.remote_key()?;
        let outcome = self.store.mark_read(key).await;

        if let Err(err) = self.fetcher.revalidate().await {
            warn!("revalidation after acknowledgement failed: {}", err);
        }

        match outcome {
            Ok(()) => {
                info!("notification {} acknowledged", id);
                Ok(())
            }
            Err(err) => {
                error!("failed to mark notification {} as read: {}", id, err);
                Err(NotifyError::AcknowledgementFailed(err.to_string()))
            }
        }
    }

    /// Mark every unread notification for the current user as read.
    pub async fn acknowledge_all(&self) -> Result<(), NotifyError> {
        let outcome = self.store.mark_all_read().await;

        if let Err(err) = self.fetcher.revalidate().await {
            warn!("revalidation after acknowledgement failed: {}", err);
        }

        match outcome {
            Ok(()) => {
                info!("all notifications acknowledged");
                Ok(())
            }
            Err(err) => {
                error!("failed to mark all notifications as read: {}", err);
                Err(NotifyError::AcknowledgementFailed(err.to_string()))
            }
        }
    }
}
