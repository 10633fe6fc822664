//! Client side of the newsroom notification flow: unread-set fetching with
//! cache-and-revalidate semantics, a live update listener, acknowledgement
//! dispatch, and the observable contract of the bell surface. The remote
//! store itself is a collaborator, reached over HTTP and WebSocket.

pub mod auth;
pub mod config;
pub mod notification;
pub mod surface;
pub mod transport;

pub use auth::session::{Identity, Role, Session, SessionState};
pub use config::ClientConfig;
pub use notification::dispatcher::AcknowledgementDispatcher;
pub use notification::fetcher::UnreadFetcher;
pub use notification::model::{
    ArticleRef, Notification, NotificationId, NotificationKind, NotifyError, UnreadSnapshot,
};
pub use notification::store::{LiveEvent, NotificationStore};
pub use surface::routes::{Navigator, Route};
pub use surface::NotificationBell;
pub use transport::http::HttpNotificationStore;
