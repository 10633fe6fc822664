use std::sync::Arc;

use tracing::{error, info, warn};

use newsroom_notify::notification::listener;
use newsroom_notify::surface::{badge_label, routes::Route};
use newsroom_notify::transport::ws;
use newsroom_notify::{
    ClientConfig, HttpNotificationStore, NotificationStore, Session, UnreadFetcher,
};

/// Headless notification monitor: connects to the configured store, keeps
/// the unread snapshot fresh, and logs every change until Ctrl-C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let config = ClientConfig::from_env()?;
    let session = Session::from_token(&config.token)?;
    let role = session.current().role();

    let store: Arc<dyn NotificationStore> = Arc::new(HttpNotificationStore::new(&config)?);
    let fetcher = Arc::new(UnreadFetcher::new(store, session.subscribe()));

    let events = ws::connect(&config).await?;
    let listener = listener::spawn(fetcher.clone(), events, session.subscribe());

    if let Err(err) = fetcher.revalidate().await {
        warn!("initial unread fetch failed: {}", err);
    }

    let mut snapshots = fetcher.subscribe();
    report(&snapshots.borrow().clone(), role);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    error!("snapshot channel closed");
                    break;
                }
                let snapshot = snapshots.borrow().clone();
                report(&snapshot, role);
            }
        }
    }

    listener.abort();
    session.logout();
    Ok(())
}

fn report(
    snapshot: &newsroom_notify::UnreadSnapshot,
    role: Option<newsroom_notify::Role>,
) {
    info!(
        "unread notifications: {} (badge {})",
        snapshot.count(),
        badge_label(snapshot.count())
    );
    for notification in snapshot.notifications() {
        let target = Route::for_notification(role, &notification.article);
        info!(
            "  {} {} -> {}",
            notification.kind.symbol(),
            notification.message,
            target.path()
        );
    }
}
