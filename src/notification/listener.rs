use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::auth::session::SessionState;
use crate::notification::fetcher::UnreadFetcher;
use crate::notification::model::NotifyError;
use crate::notification::store::LiveEvent;

/// How long to keep draining a burst of live events before revalidating once
/// for all of them.
const COALESCE_WINDOW: Duration = Duration::from_millis(250);

/// Spawn the live update listener.
///
/// The task consumes "notification added" events from the transport and
/// triggers a full revalidation for each burst; the payload itself is never
/// merged into local state. It exits when the session becomes anonymous or
/// the event channel closes, so no stale-auth refetches can fire after
/// logout.
pub fn spawn(
    fetcher: Arc<UnreadFetcher>,
    mut events: mpsc::Receiver<LiveEvent>,
    mut session: watch::Receiver<SessionState>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if !session.borrow().is_authenticated() {
            info!("live update listener not started: session is anonymous");
            return;
        }

        loop {
            tokio::select! {
                changed = session.changed() => {
                    match changed {
                        Ok(()) if session.borrow().is_authenticated() => continue,
                        _ => {
                            info!("session ended, stopping live update listener");
                            break;
                        }
                    }
                }
                event = events.recv() => {
                    match event {
                        Some(LiveEvent::NotificationAdded { notification }) => {
                            debug!("live event: notification {} added", notification.id);
                            let burst = drain_burst(&mut events).await;
                            if burst > 0 {
                                debug!("coalesced {} live events into one revalidation", burst + 1);
                            }
                            if let Err(err) = fetcher.revalidate().await {
                                warn!("revalidation after live event failed: {}", err);
                            }
                        }
                        None => {
                            warn!(
                                "{}",
                                NotifyError::SubscriptionDropped("event channel closed".to_string())
                            );
                            break;
                        }
                    }
                }
            }
        }
    })
}

/// Drain events arriving within the coalesce window, returning how many were
/// absorbed. The caller still revalidates once, so a burst of N events yields
/// at least one and at most N revalidations.
async fn drain_burst(events: &mut mpsc::Receiver<LiveEvent>) -> usize {
    let mut absorbed = 0;
    let window = tokio::time::sleep(COALESCE_WINDOW);
    tokio::pin!(window);

    loop {
        tokio::select! {
            _ = &mut window => break,
            more = events.recv() => match more {
                Some(_) => absorbed += 1,
                None => break,
            }
        }
    }

    absorbed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::{Identity, Role, Session};
    use crate::notification::model::{ArticleRef, Notification, NotificationId, NotificationKind};
    use crate::notification::store::MockNotificationStore;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    fn added_event(id: &str) -> LiveEvent {
        LiveEvent::NotificationAdded {
            notification: Notification {
                id: NotificationId::new(id),
                kind: NotificationKind::ArticleSubmitted,
                message: "new article".to_string(),
                article: ArticleRef {
                    slug: "slug".to_string(),
                },
                created_at: Utc::now(),
            },
        }
    }

    fn writer_session() -> Session {
        let session = Session::anonymous();
        session.authenticate(Identity {
            user_id: Uuid::new_v4(),
            role: Role::Writer,
        });
        session
    }

    fn counting_store(calls: Arc<AtomicUsize>) -> MockNotificationStore {
        let mut store = MockNotificationStore::new();
        store.expect_fetch_unread().returning(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        });
        store
    }

    #[tokio::test]
    async fn test_burst_of_events_coalesces_into_one_revalidation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let store = counting_store(calls.clone());
        let session = writer_session();
        let fetcher = Arc::new(UnreadFetcher::new(Arc::new(store), session.subscribe()));

        let (tx, rx) = mpsc::channel(16);
        for i in 0..5 {
            tx.send(added_event(&i.to_string())).await.unwrap();
        }

        let handle = spawn(fetcher, rx, session.subscribe());
        tokio::time::sleep(Duration::from_millis(600)).await;

        let revalidations = calls.load(Ordering::SeqCst);
        assert!(revalidations >= 1, "a live event must trigger a revalidation");
        assert!(
            revalidations < 5,
            "rapid events should coalesce, saw {} revalidations",
            revalidations
        );
        handle.abort();
    }

    #[tokio::test]
    async fn test_listener_stops_on_logout() {
        let calls = Arc::new(AtomicUsize::new(0));
        let store = counting_store(calls.clone());
        let session = writer_session();
        let fetcher = Arc::new(UnreadFetcher::new(Arc::new(store), session.subscribe()));

        let (tx, rx) = mpsc::channel(16);
        let handle = spawn(fetcher, rx, session.subscribe());

        session.logout();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("listener should exit after logout")
            .unwrap();

        // Events sent after teardown trigger nothing.
        tx.send(added_event("late")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_listener_exits_when_channel_closes() {
        let calls = Arc::new(AtomicUsize::new(0));
        let store = counting_store(calls.clone());
        let session = writer_session();
        let fetcher = Arc::new(UnreadFetcher::new(Arc::new(store), session.subscribe()));

        let (tx, rx) = mpsc::channel(16);
        let handle = spawn(fetcher, rx, session.subscribe());
        drop(tx);

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("listener should exit when the transport drops the channel")
            .unwrap();
    }

    #[tokio::test]
    async fn test_listener_never_starts_for_anonymous_session() {
        let calls = Arc::new(AtomicUsize::new(0));
        let store = counting_store(calls.clone());
        let session = Session::anonymous();
        let fetcher = Arc::new(UnreadFetcher::new(Arc::new(store), session.subscribe()));

        let (tx, rx) = mpsc::channel(16);
        let handle = spawn(fetcher, rx, session.subscribe());
        tx.send(added_event("1")).await.unwrap();

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("listener should exit immediately")
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
