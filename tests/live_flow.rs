//! End-to-end tests for the notification flow against an in-process remote
//! store speaking the same HTTP and WebSocket shapes as the production one.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

use newsroom_notify::auth::session::Claims;
use newsroom_notify::notification::listener;
use newsroom_notify::transport::ws;
use newsroom_notify::{
    AcknowledgementDispatcher, ArticleRef, ClientConfig, HttpNotificationStore, LiveEvent,
    Notification, NotificationId, NotificationKind, NotificationStore, Session, UnreadFetcher,
};

#[derive(Clone)]
struct RemoteState {
    unread: Arc<Mutex<Vec<Notification>>>,
    live: broadcast::Sender<LiveEvent>,
}

async fn unread_handler(State(state): State<RemoteState>) -> Json<Vec<Notification>> {
    Json(state.unread.lock().await.clone())
}

async fn mark_read_handler(State(state): State<RemoteState>, Path(key): Path<i64>) {
    let mut unread = state.unread.lock().await;
    // Marking an unknown or already-read notification is a no-op.
    unread.retain(|n| n.id.as_str() != key.to_string());
}

async fn mark_all_handler(State(state): State<RemoteState>) {
    state.unread.lock().await.clear();
}

async fn ws_handler(
    upgrade: WebSocketUpgrade,
    State(state): State<RemoteState>,
) -> impl IntoResponse {
    let mut live = state.live.subscribe();
    upgrade.on_upgrade(move |mut socket| async move {
        while let Ok(event) = live.recv().await {
            let payload = serde_json::to_string(&event).expect("serializable event");
            if socket.send(Message::Text(payload)).await.is_err() {
                break;
            }
        }
    })
}

async fn start_remote(seed: Vec<Notification>) -> (SocketAddr, RemoteState) {
    let state = RemoteState {
        unread: Arc::new(Mutex::new(seed)),
        live: broadcast::channel(16).0,
    };

    let app = Router::new()
        .route("/api/notifications/unread", get(unread_handler))
        .route("/api/notifications/:key/read", post(mark_read_handler))
        .route("/api/notifications/read-all", post(mark_all_handler))
        .route("/api/notifications/ws", get(ws_handler))
        .with_state(state.clone());

    let server = axum::Server::bind(&"127.0.0.1:0".parse().unwrap())
        .serve(app.into_make_service());
    let addr = server.local_addr();
    tokio::spawn(server);

    (addr, state)
}

fn config_for(addr: SocketAddr, token: &str) -> ClientConfig {
    ClientConfig::new(
        format!("http://{}/", addr).parse().unwrap(),
        format!("ws://{}/api/notifications/ws", addr).parse().unwrap(),
        token.to_string(),
        Duration::from_secs(5),
    )
}

fn writer_token() -> String {
    let now = Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: Uuid::new_v4().to_string(),
        role: "writer".to_string(),
        exp: now + 3600,
        iat: now,
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(b"integration"),
    )
    .unwrap()
}

fn notification(id: i64, slug: &str) -> Notification {
    Notification {
        id: NotificationId::new(id.to_string()),
        kind: NotificationKind::ArticleSubmitted,
        message: format!("Article {} submitted", slug),
        article: ArticleRef {
            slug: slug.to_string(),
        },
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_acknowledgement_flow_against_remote_store() {
    let (addr, _state) = start_remote(vec![
        notification(1, "one"),
        notification(2, "two"),
        notification(3, "three"),
    ])
    .await;

    let token = writer_token();
    let config = config_for(addr, &token);
    let session = Session::from_token(&token).unwrap();
    let store: Arc<dyn NotificationStore> =
        Arc::new(HttpNotificationStore::new(&config).unwrap());
    let fetcher = Arc::new(UnreadFetcher::new(store.clone(), session.subscribe()));
    let dispatcher = AcknowledgementDispatcher::new(store, fetcher.clone());

    fetcher.revalidate().await.unwrap();
    assert_eq!(fetcher.snapshot().count(), 3);

    // Acknowledge one: the id is gone once the call resolves.
    dispatcher
        .acknowledge(&NotificationId::new("1"))
        .await
        .unwrap();
    let snapshot = fetcher.snapshot();
    assert_eq!(snapshot.count(), 2);
    assert!(!snapshot.contains(&NotificationId::new("1")));

    // Acknowledging the same id again is a no-op, not an error.
    dispatcher
        .acknowledge(&NotificationId::new("1"))
        .await
        .unwrap();
    assert_eq!(fetcher.snapshot().count(), 2);

    dispatcher.acknowledge_all().await.unwrap();
    assert!(fetcher.snapshot().is_empty());
}

#[tokio::test]
async fn test_live_event_drives_revalidation_over_websocket() {
    let (addr, state) = start_remote(Vec::new()).await;

    let token = writer_token();
    let config = config_for(addr, &token);
    let session = Session::from_token(&token).unwrap();
    let store: Arc<dyn NotificationStore> =
        Arc::new(HttpNotificationStore::new(&config).unwrap());
    let fetcher = Arc::new(UnreadFetcher::new(store, session.subscribe()));

    let events = ws::connect(&config).await.unwrap();
    let listener = listener::spawn(fetcher.clone(), events, session.subscribe());

    fetcher.revalidate().await.unwrap();
    let mut snapshots = fetcher.subscribe();
    snapshots.borrow_and_update();
    assert_eq!(fetcher.snapshot().count(), 0);

    // A notification lands server-side and an event goes out on the wire.
    let added = notification(7, "harbor-expansion");
    state.unread.lock().await.push(added.clone());
    tokio::time::sleep(Duration::from_millis(100)).await;
    state
        .live
        .send(LiveEvent::NotificationAdded {
            notification: added,
        })
        .unwrap();

    tokio::time::timeout(Duration::from_secs(5), snapshots.changed())
        .await
        .expect("live event should trigger a revalidation")
        .unwrap();

    let snapshot = snapshots.borrow().clone();
    assert_eq!(snapshot.count(), 1);
    assert!(snapshot.contains(&NotificationId::new("7")));

    listener.abort();
}
