pub mod routes;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::error;

use crate::auth::session::SessionState;
use crate::notification::dispatcher::AcknowledgementDispatcher;
use crate::notification::fetcher::UnreadFetcher;
use crate::notification::model::Notification;
use crate::surface::routes::{Navigator, Route};

/// Counts above this render as "99+" on the badge.
pub const BADGE_DISPLAY_MAX: usize = 99;

pub fn badge_label(count: usize) -> String {
    if count > BADGE_DISPLAY_MAX {
        format!("{}+", BADGE_DISPLAY_MAX)
    } else {
        count.to_string()
    }
}

/// Human-readable creation time for the list view.
pub fn format_created_at(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(created_at);
    if delta.num_seconds() < 60 {
        "just now".to_string()
    } else if delta.num_minutes() < 60 {
        format!("{}m ago", delta.num_minutes())
    } else if delta.num_hours() < 24 {
        format!("{}h ago", delta.num_hours())
    } else if delta.num_days() < 7 {
        format!("{}d ago", delta.num_days())
    } else {
        created_at.format("%b %-d, %Y").to_string()
    }
}

/// One row of the expandable list: symbol, message, formatted time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BellItem {
    pub symbol: &'static str,
    pub message: String,
    pub created_label: String,
}

impl BellItem {
    fn from_notification(notification: &Notification, now: DateTime<Utc>) -> Self {
        Self {
            symbol: notification.kind.symbol(),
            message: notification.message.clone(),
            created_label: format_created_at(notification.created_at, now),
        }
    }
}

/// Observable contract of the bell indicator: badge text, list content, and
/// the select / mark-all actions. Rendering itself belongs to the embedder.
pub struct NotificationBell {
    session: watch::Receiver<SessionState>,
    fetcher: Arc<UnreadFetcher>,
    dispatcher: Arc<AcknowledgementDispatcher>,
    navigator: Arc<dyn Navigator>,
    open: AtomicBool,
}

impl NotificationBell {
    pub fn new(
        session: watch::Receiver<SessionState>,
        fetcher: Arc<UnreadFetcher>,
        dispatcher: Arc<AcknowledgementDispatcher>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            session,
            fetcher,
            dispatcher,
            navigator,
            open: AtomicBool::new(false),
        }
    }

    /// The bell renders only for authenticated staff roles.
    pub fn is_visible(&self) -> bool {
        self.session
            .borrow()
            .role()
            .map(|role| role.sees_notifications())
            .unwrap_or(false)
    }

    pub fn badge(&self) -> String {
        badge_label(self.fetcher.snapshot().count())
    }

    pub fn is_loading(&self) -> bool {
        self.fetcher.snapshot().is_loading()
    }

    pub fn items(&self) -> Vec<BellItem> {
        let now = Utc::now();
        self.fetcher
            .snapshot()
            .notifications()
            .iter()
            .map(|n| BellItem::from_notification(n, now))
            .collect()
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    pub fn open(&self) {
        self.open.store(true, Ordering::SeqCst);
    }

    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    pub fn toggle(&self) {
        self.open.fetch_xor(true, Ordering::SeqCst);
    }

    /// Selecting a notification navigates immediately, closes the list, and
    /// acknowledges in the background. Navigation never waits on the
    /// mutation; a failed acknowledgement is logged and the notification
    /// simply stays unread until the next retry.
    pub fn select(&self, notification: &Notification) -> Route {
        let route = Route::for_notification(self.session.borrow().role(), &notification.article);
        self.navigator.navigate(route.clone());
        self.close();

        let dispatcher = self.dispatcher.clone();
        let id = notification.id.clone();
        tokio::spawn(async move {
            if let Err(err) = dispatcher.acknowledge(&id).await {
                error!("error marking notification as read: {}", err);
            }
        });

        route
    }

    /// The mark-all action is only offered while the unread set is non-empty.
    pub fn can_mark_all(&self) -> bool {
        !self.fetcher.snapshot().is_empty()
    }

    /// Acknowledge everything, then close the list. On failure the list stays
    /// open so the user can retry.
    pub async fn mark_all_read(&self) {
        match self.dispatcher.acknowledge_all().await {
            Ok(()) => self.close(),
            Err(err) => error!("error marking all notifications as read: {}", err),
        }
    }
}
