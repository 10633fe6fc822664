use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque notification identity, stable across fetches.
///
/// The remote API serves ids as strings, but keys its mark-read mutation
/// numerically, so the id must be coercible to an `i64` before dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(String);

impl NotificationId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Coerce to the numeric key the remote store expects for mutations.
    pub fn remote_key(&self) -> Result<i64, NotifyError> {
        self.0
            .trim()
            .parse::<i64>()
            .map_err(|_| NotifyError::InvalidId(self.0.clone()))
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Category of the event that produced a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", from = "String")]
pub enum NotificationKind {
    ArticleSubmitted,
    ArticleApproved,
    ArticleRejected,
    ArticlePublished,
    Other,
}

impl NotificationKind {
    /// The remote is known to emit padded values, so parsing trims first.
    /// Unrecognized kinds fold to `Other` rather than failing the fetch.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "ARTICLE_SUBMITTED" => Self::ArticleSubmitted,
            "ARTICLE_APPROVED" => Self::ArticleApproved,
            "ARTICLE_REJECTED" => Self::ArticleRejected,
            "ARTICLE_PUBLISHED" => Self::ArticlePublished,
            _ => Self::Other,
        }
    }

    /// Display symbol shown next to the message in the list view.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::ArticleSubmitted => "📝",
            Self::ArticleApproved => "✅",
            Self::ArticleRejected => "❌",
            Self::ArticlePublished => "🚀",
            Self::Other => "📢",
        }
    }
}

impl From<String> for NotificationKind {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

/// Reference to the article a notification is about. The slug is enough to
/// build a navigation path without another round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRef {
    pub slug: String,
}

/// A single notification addressed to the current user. Read/unread status is
/// implicit: a notification is unread exactly while it appears in the unread
/// set served by the remote store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "notificationType")]
    pub kind: NotificationKind,
    pub message: String,
    pub article: ArticleRef,
    pub created_at: DateTime<Utc>,
}

/// Load phase of the unread snapshot. `Loading` only lasts until the first
/// fetch resolves; afterwards the snapshot is always `Ready`, possibly stale
/// until the next revalidation lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotPhase {
    Loading,
    Ready,
}

/// Client-local materialization of the unread set.
///
/// This is not independently owned state: it is a cached reflection of server
/// truth, replaced wholesale after every revalidation. No component may patch
/// it in place.
#[derive(Debug, Clone)]
pub struct UnreadSnapshot {
    notifications: Vec<Notification>,
    phase: SnapshotPhase,
}

impl UnreadSnapshot {
    pub fn loading() -> Self {
        Self {
            notifications: Vec::new(),
            phase: SnapshotPhase::Loading,
        }
    }

    pub fn empty() -> Self {
        Self {
            notifications: Vec::new(),
            phase: SnapshotPhase::Ready,
        }
    }

    /// Build a ready snapshot. No ordering contract is assumed from the
    /// remote set; the client sorts newest-first itself.
    pub fn ready(mut notifications: Vec<Notification>) -> Self {
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Self {
            notifications,
            phase: SnapshotPhase::Ready,
        }
    }

    pub fn count(&self) -> usize {
        self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.phase == SnapshotPhase::Loading
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn contains(&self, id: &NotificationId) -> bool {
        self.notifications.iter().any(|n| &n.id == id)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("unread fetch failed: {0}")]
    FetchFailed(String),

    #[error("acknowledgement failed: {0}")]
    AcknowledgementFailed(String),

    #[error("live subscription dropped: {0}")]
    SubscriptionDropped(String),

    #[error("notification id '{0}' is not a valid remote key")]
    InvalidId(String),

    #[error("request error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}
