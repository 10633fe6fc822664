use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::notification::model::{Notification, NotifyError};

/// Remote notification store, reached over whatever transport the embedder
/// wires in. Scoping to the current user happens server-side; the client
/// never filters by recipient.
///
/// Mark-read operations are idempotent from the store's perspective: marking
/// an already-read notification read again is a no-op, not an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Fetch the current unread set for the authenticated user.
    async fn fetch_unread(&self) -> Result<Vec<Notification>, NotifyError>;

    /// Mark a single notification as read.
    async fn mark_read(&self, key: i64) -> Result<(), NotifyError>;

    /// Mark every unread notification for the current user as read.
    async fn mark_all_read(&self) -> Result<(), NotifyError>;
}

/// A payload delivered on the live subscription channel.
///
/// The payload is never merged into local state. It only serves as a trigger
/// for a full revalidation, which keeps the client's view aligned with
/// server-computed unread status even when another session already
/// acknowledged the same notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum LiveEvent {
    NotificationAdded { notification: Notification },
}
